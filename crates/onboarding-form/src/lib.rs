#![allow(missing_docs)]

pub mod bootstrap;
pub mod checksum;
pub mod extract;
pub mod form_data;
pub mod format;
pub mod progress;
pub mod spec;
pub mod step_check;
pub mod validate;
pub mod view;

pub use bootstrap::{Bootstrap, BootstrapError, ClientId};
pub use checksum::{
    is_valid_cif, is_valid_iban, is_valid_national_id, is_valid_nie, is_valid_nif, mod97,
};
pub use extract::{DocumentBundle, extract, extract_documents, populate};
pub use form_data::FormData;
pub use format::{format_iban, format_phone};
pub use progress::{BadgeState, StepBadge, completion_percentage, sidebar_badges};
pub use spec::{
    Constraint, CustomRule, FieldKind, FieldSpec, RecordSpec, StepCatalog, StepDescriptor,
    StepKey, StepLayout, StepNumber,
};
pub use step_check::{
    FormCheck, StepOutcome, StructuralFailure, validate_all, validate_control, validate_step,
};
pub use validate::{FieldFailure, FieldOutcome, validate_field, validate_rule};
pub use view::{
    Control, DoorChoice, FieldMark, FieldPath, FormView, RecordRow, StepView, UploadedFile,
};
