//! Host-agnostic snapshot of the rendered form.
//!
//! Hosts keep one [`StepView`] per step in sync with what the user sees. The
//! extractor reads it, `populate` writes it back and the step validator
//! records per-field marks on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::spec::field::FieldKind;
use crate::spec::step::StepNumber;

/// A named input control.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Control {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Control {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text, value)
    }

    pub fn new(name: impl Into<String>, kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            checked: false,
            disabled: false,
        }
    }

    pub fn checkbox(name: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, FieldKind::Checkbox, "")
        }
    }

    /// One option of a radio group; several controls share `name`.
    pub fn radio(name: impl Into<String>, value: impl Into<String>, checked: bool) -> Self {
        Self {
            checked,
            ..Self::new(name, FieldKind::Radio, value)
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A door option in an access-level row. Custom doors carry a free-text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorChoice {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default)]
    pub custom: bool,
}

impl DoorChoice {
    pub fn predefined(id: impl Into<String>, checked: bool) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            checked,
            custom: false,
        }
    }

    pub fn custom(label: impl Into<String>, checked: bool) -> Self {
        let label = label.into();
        Self {
            id: format!("custom_{}", label.to_lowercase().replace(' ', "_")),
            label,
            checked,
            custom: true,
        }
    }

    /// Value recorded in the payload for this door.
    pub fn payload_value(&self) -> &str {
        if self.custom { self.label.trim() } else { self.id.as_str() }
    }
}

/// One repeated record (storage unit, user, access level).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordRow {
    /// Hidden row cloned when the user adds a record; never extracted.
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub checks: BTreeMap<String, bool>,
    #[serde(default)]
    pub doors: Vec<DoorChoice>,
}

impl RecordRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template() -> Self {
        Self {
            template: true,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with_check(mut self, name: impl Into<String>, checked: bool) -> Self {
        self.checks.insert(name.into(), checked);
        self
    }

    pub fn with_door(mut self, door: DoorChoice) -> Self {
        self.doors.push(door);
        self
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checks.get(name).copied().unwrap_or(false)
    }
}

/// A file chosen in an upload control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: default_content_type(),
            bytes,
        }
    }
}

/// Address of a markable field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    Control(String),
    /// `row` indexes [`StepView::rows`], template row included.
    Record { row: usize, field: String },
}

impl FieldPath {
    pub fn control(name: impl Into<String>) -> Self {
        FieldPath::Control(name.into())
    }

    pub fn record(row: usize, field: impl Into<String>) -> Self {
        FieldPath::Record {
            row,
            field: field.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMark {
    Valid,
    Invalid,
}

/// Everything rendered for one step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepView {
    #[serde(default)]
    pub controls: Vec<Control>,
    #[serde(default)]
    pub rows: Vec<RecordRow>,
    #[serde(default)]
    pub uploads: BTreeMap<String, Vec<UploadedFile>>,
    #[serde(skip)]
    pub marks: BTreeMap<FieldPath, FieldMark>,
}

impl StepView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }

    pub fn with_row(mut self, row: RecordRow) -> Self {
        self.rows.push(row);
        self
    }

    pub fn with_upload(mut self, document_type: impl Into<String>, file: UploadedFile) -> Self {
        self.uploads.entry(document_type.into()).or_default().push(file);
        self
    }

    /// First control named `name`.
    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.iter().find(|control| control.name == name)
    }

    pub fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls.iter_mut().find(|control| control.name == name)
    }

    pub fn has_control(&self, name: &str) -> bool {
        self.control(name).is_some()
    }

    /// Value as submitted: the checked option for radio groups, `"on"` or `""`
    /// for checkboxes, the last same-named control's value otherwise. `None`
    /// when no control exists.
    pub fn effective_value(&self, name: &str) -> Option<String> {
        let first = self.control(name)?;
        let value = match first.kind {
            FieldKind::Radio => self
                .controls
                .iter()
                .find(|control| control.name == name && control.checked)
                .map(|control| control.value.clone())
                .unwrap_or_default(),
            FieldKind::Checkbox => {
                if first.checked {
                    "on".to_string()
                } else {
                    String::new()
                }
            }
            _ => self
                .controls
                .iter()
                .rev()
                .find(|control| control.name == name)
                .map(|control| control.value.clone())
                .unwrap_or_default(),
        };
        Some(value)
    }

    /// Non-template rows paired with their index in `rows`.
    pub fn record_rows(&self) -> impl Iterator<Item = (usize, &RecordRow)> {
        self.rows.iter().enumerate().filter(|(_, row)| !row.template)
    }

    pub fn mark(&mut self, path: FieldPath, mark: FieldMark) {
        self.marks.insert(path, mark);
    }

    pub fn mark_of(&self, path: &FieldPath) -> Option<FieldMark> {
        self.marks.get(path).copied()
    }

    pub fn clear_marks(&mut self) {
        self.marks.clear();
    }

    pub fn invalid_marks(&self) -> usize {
        self.marks
            .values()
            .filter(|mark| **mark == FieldMark::Invalid)
            .count()
    }
}

/// Views for every rendered step, keyed by step number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormView {
    #[serde(default)]
    pub steps: BTreeMap<StepNumber, StepView>,
}

impl FormView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self, number: StepNumber) -> Option<&StepView> {
        self.steps.get(&number)
    }

    pub fn step_mut(&mut self, number: StepNumber) -> Option<&mut StepView> {
        self.steps.get_mut(&number)
    }

    pub fn insert(&mut self, number: StepNumber, view: StepView) {
        self.steps.insert(number, view);
    }

    pub fn with_step(mut self, number: StepNumber, view: StepView) -> Self {
        self.insert(number, view);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_value_follows_control_kind() {
        let view = StepView::new()
            .with_control(Control::radio("seguridad", "ssl", false))
            .with_control(Control::radio("seguridad", "tls", true))
            .with_control(Control::checkbox("acepto", true))
            .with_control(Control::text("nombre", "Acme"));
        assert_eq!(view.effective_value("seguridad").as_deref(), Some("tls"));
        assert_eq!(view.effective_value("acepto").as_deref(), Some("on"));
        assert_eq!(view.effective_value("nombre").as_deref(), Some("Acme"));
        assert_eq!(view.effective_value("missing"), None);
    }

    #[test]
    fn record_rows_skip_template() {
        let view = StepView::new()
            .with_row(RecordRow::template())
            .with_row(RecordRow::new().with_value("nombre", "A"));
        let indices: Vec<_> = view.record_rows().map(|(idx, _)| idx).collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn custom_door_payload_uses_label() {
        let door = DoorChoice::custom(" Puerta trasera ", true);
        assert_eq!(door.payload_value(), "Puerta trasera");
        assert_eq!(DoorChoice::predefined("montacargas", true).payload_value(), "montacargas");
    }
}
