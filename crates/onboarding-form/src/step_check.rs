use std::collections::BTreeMap;

use thiserror::Error;

use crate::extract::is_blank_row;
use crate::spec::catalog::StepCatalog;
use crate::spec::field::FieldSpec;
use crate::spec::step::{RecordSpec, StepDescriptor, StepLayout, StepNumber};
use crate::validate::{FieldFailure, FieldOutcome, validate_field};
use crate::view::{FieldMark, FieldPath, FormView, StepView};

pub const INCOMPLETE_STEP_MESSAGE: &str = "Complete los campos obligatorios del paso actual";

/// Step-level failure that is not tied to one field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralFailure {
    #[error("Debe agregar al menos un {record}")]
    NoRecords { record: String },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StepOutcome {
    pub is_valid: bool,
    /// Labels of offending fields, in form order.
    pub invalid_field_labels: Vec<String>,
    pub structural: Option<StructuralFailure>,
}

impl StepOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    pub fn failing_count(&self) -> usize {
        self.invalid_field_labels.len()
    }

    /// Message shown to the user when the step is rejected.
    pub fn notice(&self) -> Option<String> {
        if self.is_valid {
            return None;
        }
        Some(match &self.structural {
            Some(failure) => failure.to_string(),
            None => INCOMPLETE_STEP_MESSAGE.to_string(),
        })
    }

    fn from_labels(labels: Vec<String>) -> Self {
        Self {
            is_valid: labels.is_empty(),
            invalid_field_labels: labels,
            structural: None,
        }
    }
}

/// Validates one step and marks its fields. A missing view counts as valid.
///
/// Existing marks are replaced, so repeated calls on the same view agree.
pub fn validate_step(descriptor: &StepDescriptor, view: Option<&mut StepView>) -> StepOutcome {
    let Some(view) = view else {
        return StepOutcome::valid();
    };
    view.clear_marks();
    match &descriptor.layout {
        StepLayout::Flat { fields } => check_flat(fields, view),
        StepLayout::Records(spec) => check_records(spec, view),
        StepLayout::Documents(_) => StepOutcome::valid(),
    }
}

fn check_flat(fields: &[FieldSpec], view: &mut StepView) -> StepOutcome {
    let mut labels = Vec::new();
    for field in fields {
        let Some(control) = view.control(&field.name) else {
            continue;
        };
        let disabled = control.disabled;
        let value = view.effective_value(&field.name).unwrap_or_default();
        if !field.required && value.trim().is_empty() {
            continue;
        }
        let valid = disabled || validate_field(field, &value).is_valid;
        let mark = if valid {
            FieldMark::Valid
        } else {
            labels.push(field.label.clone());
            FieldMark::Invalid
        };
        view.mark(FieldPath::control(&field.name), mark);
    }
    StepOutcome::from_labels(labels)
}

fn check_records(spec: &RecordSpec, view: &mut StepView) -> StepOutcome {
    let qualifying: Vec<usize> = view
        .record_rows()
        .filter(|(_, row)| !is_blank_row(spec, row))
        .map(|(idx, _)| idx)
        .collect();

    if qualifying.is_empty() {
        return StepOutcome {
            is_valid: false,
            invalid_field_labels: Vec::new(),
            structural: Some(StructuralFailure::NoRecords {
                record: spec.label.to_lowercase(),
            }),
        };
    }

    let mut labels = Vec::new();
    let mut marks = Vec::new();
    for (ordinal, idx) in qualifying.iter().copied().enumerate() {
        let row = &view.rows[idx];
        let prefix = format!("{} {}", spec.label, ordinal + 1);

        for field in spec.fields.iter().filter(|field| !field.is_toggle()) {
            let value = row.value(&field.name);
            if !field.required && value.trim().is_empty() {
                continue;
            }
            let valid = validate_field(field, value).is_valid;
            if !valid {
                labels.push(format!("{prefix}: {}", field.label));
            }
            marks.push((FieldPath::record(idx, &field.name), valid));
        }

        if let Some(pair) = &spec.confirm {
            let original = row.value(&pair.field);
            let confirmation = row.value(&pair.confirmation);
            if !original.is_empty() && !confirmation.is_empty() && original != confirmation {
                let path = FieldPath::record(idx, &pair.confirmation);
                let label = spec
                    .fields
                    .iter()
                    .find(|field| field.name == pair.confirmation)
                    .map(|field| field.label.as_str())
                    .unwrap_or(pair.confirmation.as_str());
                let entry = format!("{prefix}: {label}");
                if !labels.contains(&entry) {
                    labels.push(entry);
                }
                marks.push((path, false));
            }
        }
    }

    for (path, valid) in marks {
        let mark = if valid {
            FieldMark::Valid
        } else {
            FieldMark::Invalid
        };
        view.mark(path, mark);
    }
    StepOutcome::from_labels(labels)
}

/// Checks the single field at `path` after an edit and marks it. `None` when
/// the path names no catalog field rendered in the view.
pub fn validate_control(
    descriptor: &StepDescriptor,
    view: &mut StepView,
    path: &FieldPath,
) -> Option<FieldOutcome> {
    let outcome = match (&descriptor.layout, path) {
        (StepLayout::Flat { .. }, FieldPath::Control(name)) => {
            let field = descriptor.flat_field(name)?;
            if view.control(name)?.disabled {
                FieldOutcome::valid()
            } else {
                let value = view.effective_value(name).unwrap_or_default();
                validate_field(field, &value)
            }
        }
        (StepLayout::Records(spec), FieldPath::Record { row, field }) => {
            let record = view.rows.get(*row).filter(|record| !record.template)?;
            let spec_field = spec
                .fields
                .iter()
                .find(|candidate| &candidate.name == field && !candidate.is_toggle())?;
            let outcome = validate_field(spec_field, record.value(field));
            match &spec.confirm {
                Some(pair) if outcome.is_valid && &pair.confirmation == field => {
                    let original = record.value(&pair.field);
                    let confirmation = record.value(field);
                    if !original.is_empty() && !confirmation.is_empty() && original != confirmation
                    {
                        FieldOutcome::invalid(FieldFailure::Mismatch)
                    } else {
                        outcome
                    }
                }
                _ => outcome,
            }
        }
        _ => return None,
    };
    let mark = if outcome.is_valid {
        FieldMark::Valid
    } else {
        FieldMark::Invalid
    };
    view.mark(path.clone(), mark);
    Some(outcome)
}

/// Per-step results of a whole-form check.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormCheck {
    pub results: BTreeMap<StepNumber, bool>,
    pub first_invalid: Option<StepNumber>,
}

impl FormCheck {
    pub fn is_valid(&self) -> bool {
        self.first_invalid.is_none()
    }
}

/// Runs [`validate_step`] over every step of the catalog.
pub fn validate_all(catalog: &StepCatalog, form: &mut FormView) -> FormCheck {
    let mut check = FormCheck::default();
    for descriptor in catalog.iter() {
        let outcome = validate_step(descriptor, form.step_mut(descriptor.number));
        if !outcome.is_valid && check.first_invalid.is_none() {
            check.first_invalid = Some(descriptor.number);
        }
        check.results.insert(descriptor.number, outcome.is_valid);
    }
    check
}
