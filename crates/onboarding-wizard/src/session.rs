use std::time::Duration;

use onboarding_form::{DocumentBundle, FieldOutcome, FieldPath, StepNumber};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::controller::{NavigationOutcome, WizardController};
use crate::host::FormHost;

/// Requests a host sends to a running session.
#[derive(Debug)]
pub enum WizardCommand {
    Next(Option<oneshot::Sender<NavigationOutcome>>),
    Previous(Option<oneshot::Sender<NavigationOutcome>>),
    GoTo(StepNumber, Option<oneshot::Sender<NavigationOutcome>>),
    /// A field was edited; the reply carries its check result.
    FieldChanged(StepNumber, FieldPath, oneshot::Sender<Option<FieldOutcome>>),
    UploadDocuments(DocumentBundle),
    /// Final save, then the session ends.
    Teardown,
}

/// Sender half used by hosts.
#[derive(Debug, Clone)]
pub struct WizardHandle {
    commands: mpsc::Sender<WizardCommand>,
}

impl WizardHandle {
    pub async fn next(&self) -> Option<NavigationOutcome> {
        self.ask(WizardCommand::Next).await
    }

    pub async fn previous(&self) -> Option<NavigationOutcome> {
        self.ask(WizardCommand::Previous).await
    }

    pub async fn go_to(&self, step: StepNumber) -> Option<NavigationOutcome> {
        self.ask(|reply| WizardCommand::GoTo(step, reply)).await
    }

    /// `None` when the session ended or the path names no rendered field.
    pub async fn field_changed(&self, step: StepNumber, path: FieldPath) -> Option<FieldOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(WizardCommand::FieldChanged(step, path, reply))
            .await
            .ok()?;
        outcome.await.ok().flatten()
    }

    pub async fn upload_documents(&self, bundle: DocumentBundle) -> bool {
        self.commands
            .send(WizardCommand::UploadDocuments(bundle))
            .await
            .is_ok()
    }

    pub async fn teardown(&self) -> bool {
        self.commands.send(WizardCommand::Teardown).await.is_ok()
    }

    async fn ask(
        &self,
        command: impl FnOnce(Option<oneshot::Sender<NavigationOutcome>>) -> WizardCommand,
    ) -> Option<NavigationOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.commands.send(command(Some(reply))).await.ok()?;
        outcome.await.ok()
    }
}

/// Event loop owning the controller: host commands, the auto-save timer and
/// save completions are handled one at a time.
pub struct WizardSession<H: FormHost> {
    controller: WizardController<H>,
    commands: mpsc::Receiver<WizardCommand>,
    autosave: Duration,
}

impl<H: FormHost> WizardSession<H> {
    pub fn new(controller: WizardController<H>) -> (Self, WizardHandle) {
        let (tx, rx) = mpsc::channel(16);
        let autosave = controller.config().autosave_interval();
        let session = Self {
            controller,
            commands: rx,
            autosave,
        };
        (session, WizardHandle { commands: tx })
    }

    /// Runs until teardown or until every handle is dropped, then returns the
    /// controller after the final save settled.
    pub async fn run(mut self) -> WizardController<H> {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.autosave, self.autosave);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let busy = self.controller.in_flight() > 0;
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(WizardCommand::Teardown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = ticker.tick() => {
                    let issued = self.controller.auto_save_tick();
                    debug!(issued, "auto-save tick");
                }
                Some(()) = self.controller.next_completion(), if busy => {}
            }
        }

        self.controller.teardown().await;
        self.controller
    }

    fn handle(&mut self, command: WizardCommand) {
        let (outcome, reply) = match command {
            WizardCommand::Next(reply) => (self.controller.request_next(), reply),
            WizardCommand::Previous(reply) => (self.controller.request_previous(), reply),
            WizardCommand::GoTo(step, reply) => (self.controller.request_direct(step), reply),
            WizardCommand::FieldChanged(step, path, reply) => {
                let _ = reply.send(self.controller.field_changed(step, &path));
                return;
            }
            WizardCommand::UploadDocuments(bundle) => {
                self.controller.upload_documents(bundle);
                return;
            }
            WizardCommand::Teardown => return,
        };
        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }
}
