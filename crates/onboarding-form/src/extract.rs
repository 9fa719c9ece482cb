use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::form_data::value_has_data;
use crate::spec::field::{FieldKind, FieldSpec};
use crate::spec::step::{DocumentSpec, RecordSpec, StepDescriptor, StepLayout};
use crate::view::{Control, DoorChoice, RecordRow, StepView, UploadedFile};

/// Files and notes collected by the documentation step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentBundle {
    /// Files keyed by document type, in selection order.
    pub files: BTreeMap<String, Vec<UploadedFile>>,
    #[serde(default)]
    pub notes: String,
}

impl DocumentBundle {
    pub fn file_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.file_count() == 0 && self.notes.trim().is_empty()
    }

    /// JSON view stored in the form data once the upload succeeded.
    pub fn summary(&self, notes_field: &str) -> Value {
        let files: Map<String, Value> = self
            .files
            .iter()
            .map(|(kind, files)| {
                let names = files
                    .iter()
                    .map(|file| Value::String(file.file_name.clone()))
                    .collect();
                (kind.clone(), Value::Array(names))
            })
            .collect();
        let mut summary = Map::new();
        summary.insert("documentos".into(), Value::Object(files));
        summary.insert(notes_field.to_string(), Value::String(self.notes.clone()));
        Value::Object(summary)
    }
}

/// Serializes the view of one step into its payload.
pub fn extract(descriptor: &StepDescriptor, view: &StepView) -> Value {
    match &descriptor.layout {
        StepLayout::Flat { .. } => extract_flat(view),
        StepLayout::Records(spec) => extract_records(spec, view),
        StepLayout::Documents(spec) => build_bundle(spec, view).summary(&spec.notes_field),
    }
}

/// Bundle for document steps; `None` for every other layout.
pub fn extract_documents(descriptor: &StepDescriptor, view: &StepView) -> Option<DocumentBundle> {
    match &descriptor.layout {
        StepLayout::Documents(spec) => Some(build_bundle(spec, view)),
        _ => None,
    }
}

/// Writes `payload` back into the view. Empty payloads leave the view untouched.
pub fn populate(descriptor: &StepDescriptor, payload: &Value, view: &mut StepView) {
    if !value_has_data(payload) {
        return;
    }
    match &descriptor.layout {
        StepLayout::Flat { fields } => populate_flat(fields, payload, view),
        StepLayout::Records(spec) => populate_records(spec, payload, view),
        StepLayout::Documents(spec) => populate_documents(spec, payload, view),
    }
}

/// Later controls sharing a name overwrite earlier ones.
fn extract_flat(view: &StepView) -> Value {
    let mut payload = Map::new();
    for control in &view.controls {
        if control.name.is_empty() {
            continue;
        }
        match control.kind {
            FieldKind::Checkbox => {
                payload.insert(control.name.clone(), Value::Bool(control.checked));
            }
            FieldKind::Radio => {
                if control.checked {
                    payload.insert(control.name.clone(), Value::String(control.value.clone()));
                }
            }
            kind => {
                payload.insert(
                    control.name.clone(),
                    Value::String(submitted_text(kind, &control.value)),
                );
            }
        }
    }
    Value::Object(payload)
}

fn submitted_text(kind: FieldKind, raw: &str) -> String {
    if kind == FieldKind::Password {
        raw.to_string()
    } else {
        raw.trim().to_string()
    }
}

fn extract_records(spec: &RecordSpec, view: &StepView) -> Value {
    let records: Vec<Value> = view
        .record_rows()
        .map(|(_, row)| row)
        .filter(|row| !is_blank_row(spec, row))
        .map(|row| Value::Object(record_payload(spec, row)))
        .collect();
    let mut payload = Map::new();
    payload.insert(spec.list_key.clone(), Value::Array(records));
    Value::Object(payload)
}

/// A row counts as blank when no field differs from its default, no box is
/// ticked and no door is chosen.
pub fn is_blank_row(spec: &RecordSpec, row: &RecordRow) -> bool {
    let any_field = spec.fields.iter().any(|field| {
        if field.is_toggle() {
            row.is_checked(&field.name)
        } else {
            field.is_filled(row.value(&field.name))
        }
    });
    let any_flag = spec.groups.iter().any(|group| {
        group
            .flags
            .iter()
            .any(|flag| row.is_checked(&group.control_name(flag)))
    });
    let any_door = row.doors.iter().any(|door| door.checked);
    !(any_field || any_flag || any_door)
}

fn record_payload(spec: &RecordSpec, row: &RecordRow) -> Map<String, Value> {
    let mut record = Map::new();
    for field in &spec.fields {
        record.insert(field.name.clone(), record_value(field, row));
    }
    for group in &spec.groups {
        let flags: Map<String, Value> = group
            .flags
            .iter()
            .map(|flag| {
                (
                    flag.clone(),
                    Value::Bool(row.is_checked(&group.control_name(flag))),
                )
            })
            .collect();
        record.insert(group.key.clone(), Value::Object(flags));
    }
    if let Some(doors) = &spec.doors {
        let mut seen = BTreeSet::new();
        let chosen: Vec<Value> = row
            .doors
            .iter()
            .filter(|door| door.checked)
            .map(DoorChoice::payload_value)
            .filter(|value| !value.is_empty() && seen.insert(value.to_string()))
            .map(|value| Value::String(value.to_string()))
            .collect();
        record.insert(doors.key.clone(), Value::Array(chosen));
    }
    record
}

fn record_value(field: &FieldSpec, row: &RecordRow) -> Value {
    if field.is_toggle() {
        return Value::Bool(row.is_checked(&field.name));
    }
    let text = submitted_text(field.kind, row.value(&field.name));
    if !text.trim().is_empty() {
        return Value::String(text);
    }
    match &field.default_value {
        Some(default) => Value::String(default.clone()),
        None if field.nullable => Value::Null,
        None => Value::String(String::new()),
    }
}

fn build_bundle(spec: &DocumentSpec, view: &StepView) -> DocumentBundle {
    let notes = view
        .control(&spec.notes_field)
        .map(|control| control.value.trim().to_string())
        .unwrap_or_default();
    let files = view
        .uploads
        .iter()
        .filter(|(kind, files)| !files.is_empty() && spec.document_types.contains(*kind))
        .map(|(kind, files)| (kind.clone(), files.clone()))
        .collect();
    DocumentBundle { files, notes }
}

fn populate_flat(fields: &[FieldSpec], payload: &Value, view: &mut StepView) {
    let Some(object) = payload.as_object() else {
        return;
    };
    for field in fields.iter().filter(|field| !object.contains_key(&field.name)) {
        reset_control(field, view);
    }
    for (name, value) in object {
        let field = fields.iter().find(|field| &field.name == name);
        assign_control(name, field, value, view);
    }
}

/// Catalog field absent from the payload: back to its default, or empty.
fn reset_control(field: &FieldSpec, view: &mut StepView) {
    match field.kind {
        FieldKind::Checkbox => match view.control_mut(&field.name) {
            Some(control) => control.checked = false,
            None => view.controls.push(Control::checkbox(&field.name, false)),
        },
        FieldKind::Radio => {
            for control in view
                .controls
                .iter_mut()
                .filter(|control| control.name == field.name)
            {
                control.checked = false;
            }
        }
        kind => {
            let text = field.default_value.clone().unwrap_or_default();
            match view.control_mut(&field.name) {
                Some(control) => control.value = text,
                None => view.controls.push(Control::new(&field.name, kind, text)),
            }
        }
    }
}

/// Writes one payload entry into every control named `name`. Catalog fields
/// missing from the view are added; unknown names without a control are skipped.
fn assign_control(name: &str, field: Option<&FieldSpec>, value: &Value, view: &mut StepView) {
    let mut found = false;
    for control in view
        .controls
        .iter_mut()
        .filter(|control| control.name == name)
    {
        found = true;
        match field.map_or(control.kind, |field| field.kind) {
            FieldKind::Checkbox => control.checked = truthy(value),
            FieldKind::Radio => {
                let selected = text_of(value);
                control.checked = !selected.is_empty() && control.value == selected;
            }
            _ => control.value = text_of(value),
        }
    }
    if found {
        return;
    }
    let Some(field) = field else {
        return;
    };
    match field.kind {
        FieldKind::Checkbox => view.controls.push(Control::checkbox(name, truthy(value))),
        FieldKind::Radio => {}
        kind => view.controls.push(Control::new(name, kind, text_of(value))),
    }
}

fn populate_records(spec: &RecordSpec, payload: &Value, view: &mut StepView) {
    let records = match payload {
        Value::Array(items) => items,
        Value::Object(object) => match object.get(&spec.list_key) {
            Some(Value::Array(items)) => items,
            _ => return,
        },
        _ => return,
    };

    view.rows.retain(|row| row.template);
    view.clear_marks();
    for record in records.iter().filter_map(Value::as_object) {
        view.rows.push(row_from_record(spec, record));
    }
}

fn row_from_record(spec: &RecordSpec, record: &Map<String, Value>) -> RecordRow {
    let mut row = RecordRow::new();
    for field in &spec.fields {
        let value = record.get(&field.name);
        if field.is_toggle() {
            row.checks
                .insert(field.name.clone(), value.is_some_and(truthy));
        } else {
            let text = value
                .map(text_of)
                .filter(|text| !text.is_empty())
                .or_else(|| field.default_value.clone())
                .unwrap_or_default();
            row.values.insert(field.name.clone(), text);
        }
    }
    for group in &spec.groups {
        let flags = record.get(&group.key).and_then(Value::as_object);
        for flag in &group.flags {
            let checked = flags.and_then(|flags| flags.get(flag)).is_some_and(truthy);
            row.checks.insert(group.control_name(flag), checked);
        }
    }
    if let Some(doors) = &spec.doors {
        let chosen: Vec<String> = record
            .get(&doors.key)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(text_of).collect())
            .unwrap_or_default();
        for id in &doors.predefined {
            row.doors
                .push(DoorChoice::predefined(id, chosen.iter().any(|c| c == id)));
        }
        for label in chosen
            .iter()
            .filter(|label| !label.is_empty() && !doors.predefined.contains(*label))
        {
            row.doors.push(DoorChoice::custom(label, true));
        }
    }
    row
}

fn populate_documents(spec: &DocumentSpec, payload: &Value, view: &mut StepView) {
    let Some(notes) = payload.get(&spec.notes_field) else {
        return;
    };
    let notes = text_of(notes);
    match view.control_mut(&spec.notes_field) {
        Some(control) => control.value = notes,
        None => view
            .controls
            .push(Control::new(&spec.notes_field, FieldKind::Textarea, notes)),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::String(text) => matches!(text.as_str(), "on" | "true" | "1"),
        Value::Number(number) => number.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}
