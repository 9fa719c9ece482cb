use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::form_data::{FormData, value_has_data};
use crate::spec::catalog::StepCatalog;
use crate::spec::step::{StepDescriptor, StepLayout, StepNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeState {
    Active,
    Completed,
    Pending,
}

/// Sidebar entry for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBadge {
    pub number: StepNumber,
    pub name: String,
    pub state: BadgeState,
}

/// The current step is always active; earlier steps with stored data are
/// completed; everything else is pending.
pub fn sidebar_badges(
    catalog: &StepCatalog,
    form_data: &FormData,
    current: StepNumber,
) -> Vec<StepBadge> {
    catalog
        .iter()
        .map(|step| {
            let state = if step.number == current {
                BadgeState::Active
            } else if step.number < current && form_data.has_data(step.key) {
                BadgeState::Completed
            } else {
                BadgeState::Pending
            };
            StepBadge {
                number: step.number,
                name: step.name.clone(),
                state,
            }
        })
        .collect()
}

/// Share of complete steps, rounded down.
pub fn completion_percentage(catalog: &StepCatalog, form_data: &FormData) -> u8 {
    let total = catalog.len();
    if total == 0 {
        return 0;
    }
    let complete = catalog
        .iter()
        .filter(|step| is_step_complete(step, form_data.get(step.key)))
        .count();
    (complete * 100 / total) as u8
}

/// Whether a stored payload satisfies a step: every required flat field is
/// non-empty, record steps hold at least one record, documentation always passes.
pub fn is_step_complete(descriptor: &StepDescriptor, payload: Option<&Value>) -> bool {
    match &descriptor.layout {
        StepLayout::Documents(_) => true,
        StepLayout::Flat { fields } => payload.and_then(Value::as_object).is_some_and(|object| {
            fields
                .iter()
                .filter(|field| field.required)
                .all(|field| object.get(&field.name).is_some_and(value_has_data))
        }),
        StepLayout::Records(spec) => {
            let records = match payload {
                Some(Value::Array(items)) => Some(items),
                Some(Value::Object(object)) => object.get(&spec.list_key).and_then(Value::as_array),
                _ => None,
            };
            records.is_some_and(|items| !items.is_empty())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::spec::step::StepKey;

    #[test]
    fn badges_mark_only_earlier_steps_with_data() {
        let catalog = StepCatalog::onboarding();
        let mut data = FormData::new();
        data.insert(StepKey::CompanyInfo, json!({"nombre": "Acme"}));
        data.insert(StepKey::MailConfig, json!({"puerto": "25"}));
        let badges = sidebar_badges(&catalog, &data, 3);
        let states: Vec<_> = badges.iter().map(|badge| badge.state).collect();
        assert_eq!(
            states,
            vec![
                BadgeState::Completed,
                BadgeState::Pending,
                BadgeState::Active,
                BadgeState::Pending,
                BadgeState::Pending,
                BadgeState::Pending,
            ]
        );
    }

    #[test]
    fn empty_form_counts_documentation_only() {
        let catalog = StepCatalog::onboarding();
        assert_eq!(completion_percentage(&catalog, &FormData::new()), 16);
    }

    #[test]
    fn percentage_requires_every_required_key() {
        let catalog = StepCatalog::onboarding();
        let mut data = FormData::new();
        data.insert(
            StepKey::CompanyInfo,
            json!({
                "nombre": "Acme", "nif": "A58818501", "direccion": "Calle 1",
                "codigo_postal": "28001", "provincia": "Madrid",
                "telefono": "612345678", "email": "info@acme.es"
            }),
        );
        data.insert(StepKey::StorageUnits, json!({"trasteros": [{"numero_trastero": "1"}]}));
        assert_eq!(completion_percentage(&catalog, &data), 50);

        data.insert(StepKey::CompanyInfo, json!({"nombre": "Acme"}));
        assert_eq!(completion_percentage(&catalog, &data), 33);
    }
}
