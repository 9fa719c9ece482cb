pub mod catalog;
pub mod field;
pub mod step;

pub use catalog::StepCatalog;
pub use field::{Constraint, CustomRule, FieldKind, FieldSpec};
pub use step::{
    ConfirmPair, DocumentSpec, DoorSpec, FieldGroup, RecordSpec, StepDescriptor, StepKey,
    StepLayout, StepNumber,
};
