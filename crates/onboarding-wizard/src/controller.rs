use std::collections::BTreeMap;
use std::sync::Arc;

use onboarding_form::{
    Bootstrap, ClientId, DocumentBundle, FieldOutcome, FieldPath, FormData, StepCatalog, StepKey,
    StepNumber, StepOutcome, extract, populate, sidebar_badges, validate_control, validate_step,
};
use serde_json::Value;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::config::{ResponseOrdering, WizardConfig};
use crate::gateway::{PersistenceError, PersistenceGateway, SaveReceipt};
use crate::host::{FormHost, Notice, SaveStatus, StepIndicator};

pub const NOT_SEQUENTIAL_MESSAGE: &str = "Debe completar los pasos en orden secuencial";
pub const COMPLETED_MESSAGE: &str = "¡Formulario completado exitosamente!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Step(StepNumber),
    /// Terminal; no further transitions.
    Completed,
}

/// Session state. Only [`WizardController`] mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    current_step: StepNumber,
    total_steps: StepNumber,
    client_id: Option<ClientId>,
    is_submitting: bool,
    form_data: FormData,
    phase: WizardPhase,
}

impl WizardState {
    pub fn current_step(&self) -> StepNumber {
        self.current_step
    }

    pub fn total_steps(&self) -> StepNumber {
        self.total_steps
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationRejection {
    OutOfRange(StepNumber),
    NotSequential {
        current: StepNumber,
        target: StepNumber,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    Moved { from: StepNumber, to: StepNumber },
    Completed,
    /// Already there, or nowhere to go.
    Unchanged,
    /// Dropped because the form is being submitted.
    Ignored,
    /// The current step failed validation.
    Blocked(StepOutcome),
    Rejected(NavigationRejection),
}

impl NavigationOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, NavigationOutcome::Moved { .. })
    }
}

enum SaveRequest {
    Step(Value),
    Documents(DocumentBundle),
}

struct SaveCompletion {
    seq: u64,
    step: StepNumber,
    documents: bool,
    result: Result<SaveReceipt, PersistenceError>,
}

/// Drives step navigation, validation and persistence for one session.
pub struct WizardController<H: FormHost> {
    catalog: StepCatalog,
    config: WizardConfig,
    gateway: Arc<dyn PersistenceGateway>,
    host: H,
    state: WizardState,
    next_seq: u64,
    key_versions: BTreeMap<StepKey, u64>,
    status_version: u64,
    progress_version: u64,
    saves: JoinSet<SaveCompletion>,
}

impl<H: FormHost> WizardController<H> {
    /// Builds the controller from bootstrap data and renders the initial step.
    pub fn new(
        mut catalog: StepCatalog,
        config: WizardConfig,
        gateway: Arc<dyn PersistenceGateway>,
        host: H,
        bootstrap: &Bootstrap,
    ) -> Self {
        catalog.rename_steps(&bootstrap.step_names);
        let total_steps = catalog.total();
        if let Some(declared) = bootstrap.total_pasos
            && declared != total_steps
        {
            warn!(declared, total_steps, "bootstrap step count differs from catalog");
        }
        let current_step = bootstrap.initial_step(total_steps);
        let state = WizardState {
            current_step,
            total_steps,
            client_id: bootstrap.cliente_id.clone(),
            is_submitting: false,
            form_data: bootstrap.form_data(),
            phase: WizardPhase::Step(current_step),
        };
        let mut controller = Self {
            catalog,
            config,
            gateway,
            host,
            state,
            next_seq: 0,
            key_versions: BTreeMap::new(),
            status_version: 0,
            progress_version: 0,
            saves: JoinSet::new(),
        };
        if let Some(percentage) = bootstrap.porcentaje_completado {
            controller
                .host
                .set_progress(percentage.clamp(0.0, 100.0) as u8);
        }
        controller.render_current();
        controller
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> StepNumber {
        self.state.current_step
    }

    pub fn form_data(&self) -> &FormData {
        &self.state.form_data
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Saves started but not yet applied.
    pub fn in_flight(&self) -> usize {
        self.saves.len()
    }

    pub fn request_next(&mut self) -> NavigationOutcome {
        if self.state.is_submitting {
            return NavigationOutcome::Ignored;
        }
        self.reconcile();
        let current = self.state.current_step;
        if current >= self.state.total_steps {
            self.complete();
            return NavigationOutcome::Completed;
        }
        self.advance_from(current)
    }

    pub fn request_previous(&mut self) -> NavigationOutcome {
        if self.state.phase == WizardPhase::Completed {
            return NavigationOutcome::Ignored;
        }
        self.reconcile();
        let current = self.state.current_step;
        if current <= 1 {
            return NavigationOutcome::Unchanged;
        }
        self.move_to(current - 1)
    }

    /// Jumps to `target`: backwards freely, forwards one step at a time.
    pub fn request_direct(&mut self, target: StepNumber) -> NavigationOutcome {
        if self.state.is_submitting {
            return NavigationOutcome::Ignored;
        }
        if target < 1 || target > self.state.total_steps {
            warn!(target, "step out of range");
            return NavigationOutcome::Rejected(NavigationRejection::OutOfRange(target));
        }
        self.reconcile();
        let current = self.state.current_step;
        if target == current {
            NavigationOutcome::Unchanged
        } else if target < current {
            self.move_to(target)
        } else if target == current + 1 {
            self.advance_from(current)
        } else {
            warn!(current, target, "refusing to skip steps");
            self.host.notify(Notice::warning(NOT_SEQUENTIAL_MESSAGE));
            NavigationOutcome::Rejected(NavigationRejection::NotSequential { current, target })
        }
    }

    /// Re-checks one field after the user edited it and marks it in the view.
    pub fn field_changed(&mut self, step: StepNumber, path: &FieldPath) -> Option<FieldOutcome> {
        let descriptor = self.catalog.get(step)?;
        let view = self.host.view_mut(step)?;
        validate_control(descriptor, view, path)
    }

    /// Periodic save of the current step. Returns true when a save was issued.
    pub fn auto_save_tick(&mut self) -> bool {
        if self.state.is_submitting {
            return false;
        }
        self.reconcile();
        let current = self.state.current_step;
        if !self.check_step(current, false).is_valid {
            debug!(step = current, "auto-save skipped, step invalid");
            return false;
        }
        self.save_step(current)
    }

    /// Persists the documentation step. Returns true when an upload was issued.
    pub fn upload_documents(&mut self, bundle: DocumentBundle) -> bool {
        let Some(client_id) = self.state.client_id.clone() else {
            debug!("no client id, upload skipped");
            return false;
        };
        let Some(step) = self
            .catalog
            .by_key(StepKey::Documentation)
            .map(|descriptor| descriptor.number)
        else {
            return false;
        };
        self.spawn_save(client_id, step, SaveRequest::Documents(bundle));
        true
    }

    /// Applies saves that already finished, without waiting.
    pub fn reconcile(&mut self) -> usize {
        let mut applied = 0;
        while let Some(joined) = self.saves.try_join_next() {
            self.apply(joined);
            applied += 1;
        }
        applied
    }

    /// Waits for the next in-flight save and applies it. `None` when idle.
    pub async fn next_completion(&mut self) -> Option<()> {
        let joined = self.saves.join_next().await?;
        self.apply(joined);
        Some(())
    }

    /// Waits for every in-flight save.
    pub async fn settle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    /// Final best-effort save of the current step, then waits for all saves.
    pub async fn teardown(&mut self) {
        let current = self.state.current_step;
        self.save_step(current);
        self.settle().await;
    }

    fn advance_from(&mut self, current: StepNumber) -> NavigationOutcome {
        let outcome = self.check_step(current, true);
        if !outcome.is_valid {
            warn!(
                step = current,
                failing = outcome.failing_count(),
                "step validation failed"
            );
            return NavigationOutcome::Blocked(outcome);
        }
        self.save_step(current);
        self.move_to(current + 1)
    }

    fn check_step(&mut self, step: StepNumber, notify: bool) -> StepOutcome {
        let Some(descriptor) = self.catalog.get(step) else {
            return StepOutcome::valid();
        };
        let outcome = validate_step(descriptor, self.host.view_mut(step));
        if notify && let Some(message) = outcome.notice() {
            self.host.notify(Notice::warning(message));
        }
        outcome
    }

    fn move_to(&mut self, target: StepNumber) -> NavigationOutcome {
        let from = self.state.current_step;
        self.state.current_step = target;
        self.state.phase = WizardPhase::Step(target);
        debug!(from, to = target, "step changed");
        self.render_current();
        NavigationOutcome::Moved { from, to: target }
    }

    fn complete(&mut self) {
        self.state.is_submitting = true;
        self.state.phase = WizardPhase::Completed;
        info!(client = ?self.state.client_id, "form completed");
        self.host.notify(Notice::success(COMPLETED_MESSAGE));
        let delay = self.config.redirect_delay();
        self.host.schedule_redirect(&self.config.redirect_url, delay);
    }

    fn render_current(&mut self) {
        let step = self.state.current_step;
        let total = self.state.total_steps;
        let Some(descriptor) = self.catalog.get(step) else {
            return;
        };
        self.host.show_step(StepIndicator {
            number: step,
            name: descriptor.name.clone(),
            total,
            is_first: step == 1,
            is_last: step == total,
        });
        let badges = sidebar_badges(&self.catalog, &self.state.form_data, step);
        self.host.render_sidebar(&badges);
        if let Some(payload) = self.state.form_data.get(descriptor.key)
            && let Some(view) = self.host.view_mut(step)
        {
            populate(descriptor, payload, view);
        }
    }

    /// Starts a generic save of `step`. Documentation is never saved this way.
    fn save_step(&mut self, step: StepNumber) -> bool {
        let Some(descriptor) = self.catalog.get(step) else {
            return false;
        };
        if !descriptor.persists_generically() {
            debug!(step, "step is only saved through uploads");
            return false;
        }
        let Some(client_id) = self.state.client_id.clone() else {
            debug!(step, "no client id, save skipped");
            return false;
        };
        let Some(view) = self.host.view(step) else {
            return false;
        };
        let payload = extract(descriptor, view);
        self.spawn_save(client_id, step, SaveRequest::Step(payload));
        true
    }

    fn spawn_save(&mut self, client_id: ClientId, step: StepNumber, request: SaveRequest) {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.status_version = seq;
        self.host.set_save_status(SaveStatus::Saving);
        debug!(seq, step, "save started");

        let gateway = Arc::clone(&self.gateway);
        self.saves.spawn(async move {
            let (documents, result) = match request {
                SaveRequest::Step(payload) => {
                    (false, gateway.save(&client_id, step, payload).await)
                }
                SaveRequest::Documents(bundle) => {
                    (true, gateway.save_documents(&client_id, bundle).await)
                }
            };
            SaveCompletion {
                seq,
                step,
                documents,
                result,
            }
        });
    }

    fn apply(&mut self, joined: Result<SaveCompletion, JoinError>) {
        let completion = match joined {
            Ok(completion) => completion,
            Err(err) => {
                warn!(error = %err, "save task aborted");
                self.host.set_save_status(SaveStatus::Error);
                return;
            }
        };
        let sequenced = self.config.response_ordering == ResponseOrdering::Sequenced;
        let owns_status = !sequenced || completion.seq >= self.status_version;

        match completion.result {
            Ok(receipt) => {
                self.merge(completion.seq, completion.documents, receipt.updated_form_data);
                if let Some(percentage) = receipt.completion_percentage
                    && (!sequenced || completion.seq > self.progress_version)
                {
                    self.progress_version = completion.seq;
                    self.host.set_progress(percentage);
                }
                if owns_status {
                    self.host.set_save_status(SaveStatus::Saved);
                }
                debug!(seq = completion.seq, step = completion.step, "save applied");
            }
            Err(err) => {
                warn!(
                    seq = completion.seq,
                    step = completion.step,
                    error = %err,
                    "save failed"
                );
                if owns_status {
                    self.host.set_save_status(SaveStatus::Error);
                }
            }
        }
    }

    fn merge(&mut self, seq: u64, documents: bool, update: FormData) {
        let sequenced = self.config.response_ordering == ResponseOrdering::Sequenced;
        for (key, value) in update.iter() {
            if documents && key != StepKey::Documentation {
                continue;
            }
            let last = self.key_versions.get(&key).copied().unwrap_or(0);
            if sequenced && seq <= last {
                debug!(seq, last, key = key.wire_name(), "stale response ignored");
                continue;
            }
            self.key_versions.insert(key, seq.max(last));
            self.state.form_data.insert(key, value.clone());
        }
    }
}
