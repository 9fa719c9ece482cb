use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::form_data::FormData;
use crate::spec::step::StepNumber;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("bootstrap data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bootstrap `datosFormulario` must be an object")]
    FormData,
}

/// Customer identifier as issued by the server; numeric ids are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => ClientId(text),
            Raw::Number(number) => ClientId(number.to_string()),
        })
    }
}

/// Page bootstrap data handed to the wizard at start-up.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bootstrap {
    #[serde(deserialize_with = "non_blank_client_id")]
    pub cliente_id: Option<ClientId>,
    pub paso_actual: Option<i64>,
    pub total_pasos: Option<StepNumber>,
    pub step_names: Vec<String>,
    pub datos_formulario: Value,
    pub porcentaje_completado: Option<f64>,
}

fn non_blank_client_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ClientId>, D::Error> {
    let id = Option::<ClientId>::deserialize(deserializer)?;
    Ok(id.filter(|id| !id.as_str().trim().is_empty()))
}

impl Bootstrap {
    pub fn from_json(raw: &str) -> Result<Self, BootstrapError> {
        let bootstrap: Bootstrap = serde_json::from_str(raw)?;
        if !(bootstrap.datos_formulario.is_null() || bootstrap.datos_formulario.is_object()) {
            return Err(BootstrapError::FormData);
        }
        Ok(bootstrap)
    }

    /// Stored form data; legacy `paso_N` keys are accepted.
    pub fn form_data(&self) -> FormData {
        FormData::from_wire_value(&self.datos_formulario)
    }

    /// Starting step clamped to `[1, total]`; 1 when absent.
    pub fn initial_step(&self, total: StepNumber) -> StepNumber {
        let total = total.max(1);
        match self.paso_actual {
            Some(step) => step.clamp(1, i64::from(total)) as StepNumber,
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::spec::step::StepKey;

    #[test]
    fn numeric_client_id_and_legacy_keys() {
        let raw = json!({
            "clienteId": 42,
            "pasoActual": 9,
            "datosFormulario": {"paso_1": {"nombre": "Acme"}}
        })
        .to_string();
        let bootstrap = Bootstrap::from_json(&raw).expect("bootstrap");
        assert_eq!(bootstrap.cliente_id, Some(ClientId::new("42")));
        assert_eq!(bootstrap.initial_step(6), 6);
        assert!(bootstrap.form_data().has_data(StepKey::CompanyInfo));
    }

    #[test]
    fn missing_fields_default_to_first_step() {
        let bootstrap = Bootstrap::from_json("{}").expect("bootstrap");
        assert_eq!(bootstrap.cliente_id, None);
        assert_eq!(bootstrap.initial_step(6), 1);
        assert!(bootstrap.form_data().is_empty());

        let negative = Bootstrap::from_json(r#"{"pasoActual": -3, "clienteId": " "}"#)
            .expect("bootstrap");
        assert_eq!(negative.initial_step(6), 1);
        assert_eq!(negative.cliente_id, None);
    }

    #[test]
    fn rejects_non_object_form_data() {
        let err = Bootstrap::from_json(r#"{"datosFormulario": [1, 2]}"#).unwrap_err();
        assert!(matches!(err, BootstrapError::FormData));
    }
}
