#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod gateway;
pub mod host;
pub mod session;

pub use config::{ConfigError, ResponseOrdering, WizardConfig};
pub use controller::{
    COMPLETED_MESSAGE, NOT_SEQUENTIAL_MESSAGE, NavigationOutcome, NavigationRejection,
    WizardController, WizardPhase, WizardState,
};
pub use gateway::{
    HttpGateway, MemoryGateway, PersistenceError, PersistenceGateway, RecordedSave, SaveReceipt,
    interpret_response, save_body,
};
pub use host::{FormHost, HostEvent, InMemoryHost, Notice, NoticeLevel, SaveStatus, StepIndicator};
pub use session::{WizardCommand, WizardHandle, WizardSession};
