//! Persistence seam between the wizard and the `/api/save` endpoint.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use onboarding_form::{
    ClientId, DocumentBundle, FormData, StepCatalog, StepKey, StepNumber, completion_percentage,
};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::WizardConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistenceError {
    #[error("save rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode save response: {0}")]
    Decode(String),
    #[error("invalid save endpoint: {0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for PersistenceError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            PersistenceError::Rejected {
                status: status.as_u16(),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            PersistenceError::Decode(error.to_string())
        } else {
            PersistenceError::Transport(error.to_string())
        }
    }
}

/// Server-confirmed outcome of a save.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaveReceipt {
    /// Only the keys the server sent back.
    pub updated_form_data: FormData,
    pub completion_percentage: Option<u8>,
}

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn save(
        &self,
        client_id: &ClientId,
        step: StepNumber,
        payload: Value,
    ) -> Result<SaveReceipt, PersistenceError>;

    async fn save_documents(
        &self,
        client_id: &ClientId,
        bundle: DocumentBundle,
    ) -> Result<SaveReceipt, PersistenceError>;
}

/// Gateway speaking the existing server's `/api/save` protocol.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    save_url: Url,
    documents_step: StepNumber,
    notes_field: String,
}

impl HttpGateway {
    pub fn new(config: &WizardConfig) -> Result<Self, PersistenceError> {
        let save_url = config
            .save_url()
            .map_err(|err| PersistenceError::InvalidEndpoint(err.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| PersistenceError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            save_url,
            documents_step: 6,
            notes_field: "notas_adicionales".to_string(),
        })
    }

    pub fn save_url(&self) -> &Url {
        &self.save_url
    }
}

/// Request body for a JSON save.
pub fn save_body(client_id: &ClientId, step: StepNumber, payload: &Value) -> Value {
    json!({
        "cliente_id": client_id,
        "paso": step,
        "datos": payload,
    })
}

/// Maps a raw `/api/save` response to a receipt or an error.
///
/// A response succeeds when the status is 2xx, there is no `error` field and
/// `success` is not `false`. Failure messages come from `mensaje`, then `error`.
pub fn interpret_response(status: u16, body: &str) -> Result<SaveReceipt, PersistenceError> {
    let ok_status = (200..300).contains(&status);
    let parsed: Result<Value, _> = serde_json::from_str(body);
    let value = match parsed {
        Ok(value) => value,
        Err(err) if ok_status => return Err(PersistenceError::Decode(err.to_string())),
        Err(_) => {
            let message = if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            };
            return Err(PersistenceError::Rejected { status, message });
        }
    };

    let error_field = value.get("error").filter(|error| !error.is_null());
    let declined = value.get("success").and_then(Value::as_bool) == Some(false);
    if !ok_status || error_field.is_some() || declined {
        let message = value
            .get("mensaje")
            .and_then(Value::as_str)
            .or_else(|| error_field.and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(PersistenceError::Rejected { status, message });
    }

    let updated_form_data = value
        .get("formulario_data_actualizada")
        .or_else(|| value.get("updated_form_data"))
        .map(FormData::from_wire_value)
        .unwrap_or_default();
    let completion_percentage = value
        .get("porcentaje")
        .or_else(|| value.get("percentage"))
        .and_then(Value::as_f64)
        .map(|percent| percent.clamp(0.0, 100.0) as u8);
    Ok(SaveReceipt {
        updated_form_data,
        completion_percentage,
    })
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn save(
        &self,
        client_id: &ClientId,
        step: StepNumber,
        payload: Value,
    ) -> Result<SaveReceipt, PersistenceError> {
        debug!(client = %client_id, step, "posting step");
        let response = self
            .client
            .post(self.save_url.clone())
            .json(&save_body(client_id, step, &payload))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }

    async fn save_documents(
        &self,
        client_id: &ClientId,
        bundle: DocumentBundle,
    ) -> Result<SaveReceipt, PersistenceError> {
        debug!(client = %client_id, files = bundle.file_count(), "uploading documents");
        let mut form = Form::new()
            .text("cliente_id", client_id.to_string())
            .text("paso", self.documents_step.to_string());
        for (document_type, files) in bundle.files {
            for file in files {
                let part = Part::bytes(file.bytes)
                    .file_name(file.file_name)
                    .mime_str(&file.content_type)
                    .map_err(|err| PersistenceError::Transport(err.to_string()))?;
                form = form.part(format!("documentos[{document_type}][]"), part);
            }
        }
        form = form.text(self.notes_field.clone(), bundle.notes);

        let response = self
            .client
            .post(self.save_url.clone())
            .multipart(form)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        interpret_response(status, &body)
    }
}

/// A save observed by [`MemoryGateway`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSave {
    pub client_id: ClientId,
    pub step: StepNumber,
    pub payload: Value,
}

#[derive(Debug, Default)]
struct MemoryState {
    stored: BTreeMap<String, FormData>,
    saves: Vec<RecordedSave>,
    uploads: Vec<(ClientId, DocumentBundle)>,
    failures: VecDeque<Option<PersistenceError>>,
    delays: VecDeque<Duration>,
}

/// In-process stand-in for the server. Scripted failures and delays are
/// consumed in call order, one per call.
#[derive(Debug, Clone)]
pub struct MemoryGateway {
    catalog: Arc<StepCatalog>,
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new(StepCatalog::onboarding())
    }
}

impl MemoryGateway {
    pub fn new(catalog: StepCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            state: Arc::new(Mutex::new(MemoryState::default())),
        }
    }

    /// Fails the next call that has no earlier scripted outcome.
    pub fn fail_next(&self, error: PersistenceError) {
        self.lock().failures.push_back(Some(error));
    }

    /// Lets the next call succeed; used to position a later failure.
    pub fn succeed_next(&self) {
        self.lock().failures.push_back(None);
    }

    pub fn delay_next(&self, delay: Duration) {
        self.lock().delays.push_back(delay);
    }

    pub fn seed(&self, client_id: &ClientId, data: FormData) {
        self.lock()
            .stored
            .insert(client_id.as_str().to_string(), data);
    }

    pub fn saves(&self) -> Vec<RecordedSave> {
        self.lock().saves.clone()
    }

    pub fn uploads(&self) -> Vec<(ClientId, DocumentBundle)> {
        self.lock().uploads.clone()
    }

    pub fn stored(&self, client_id: &ClientId) -> FormData {
        self.lock()
            .stored
            .get(client_id.as_str())
            .cloned()
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_script(&self) -> (Option<Duration>, Option<PersistenceError>) {
        let mut state = self.lock();
        let delay = state.delays.pop_front();
        let failure = state.failures.pop_front().flatten();
        (delay, failure)
    }

    fn store(&self, client_id: &ClientId, key: StepKey, payload: Value) -> SaveReceipt {
        let mut state = self.lock();
        let stored = state
            .stored
            .entry(client_id.as_str().to_string())
            .or_default();
        stored.insert(key, payload.clone());
        let percentage = completion_percentage(&self.catalog, stored);
        SaveReceipt {
            updated_form_data: [(key, payload)].into_iter().collect(),
            completion_percentage: Some(percentage),
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn save(
        &self,
        client_id: &ClientId,
        step: StepNumber,
        payload: Value,
    ) -> Result<SaveReceipt, PersistenceError> {
        let (delay, failure) = self.next_script();
        self.lock().saves.push(RecordedSave {
            client_id: client_id.clone(),
            step,
            payload: payload.clone(),
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        let key = self
            .catalog
            .get(step)
            .map(|descriptor| descriptor.key)
            .ok_or_else(|| PersistenceError::Rejected {
                status: 400,
                message: format!("Paso inválido: {step}"),
            })?;
        Ok(self.store(client_id, key, payload))
    }

    async fn save_documents(
        &self,
        client_id: &ClientId,
        bundle: DocumentBundle,
    ) -> Result<SaveReceipt, PersistenceError> {
        let (delay, failure) = self.next_script();
        self.lock().uploads.push((client_id.clone(), bundle.clone()));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        let notes_field = self
            .catalog
            .by_key(StepKey::Documentation)
            .and_then(|descriptor| match &descriptor.layout {
                onboarding_form::StepLayout::Documents(spec) => Some(spec.notes_field.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "notas_adicionales".to_string());
        Ok(self.store(
            client_id,
            StepKey::Documentation,
            bundle.summary(&notes_field),
        ))
    }
}
