use serde::{Deserialize, Serialize};

use crate::spec::field::FieldSpec;

/// One-based step index.
pub type StepNumber = u8;

/// Closed set of keys under which step payloads live in the shared form data.
///
/// Serialized with the persistence server's names; English names and the
/// legacy `paso_N` keys are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepKey {
    #[serde(rename = "datos_empresa", alias = "company_info", alias = "paso_1")]
    CompanyInfo,
    #[serde(rename = "info_trasteros", alias = "storage_units", alias = "paso_2")]
    StorageUnits,
    #[serde(rename = "usuarios_app", alias = "app_users", alias = "paso_3")]
    AppUsers,
    #[serde(rename = "config_correo", alias = "mail_config", alias = "paso_4")]
    MailConfig,
    #[serde(rename = "niveles_acceso", alias = "access_levels", alias = "paso_5")]
    AccessLevels,
    #[serde(rename = "documentacion", alias = "documentation", alias = "paso_6")]
    Documentation,
}

impl StepKey {
    pub const ALL: [StepKey; 6] = [
        StepKey::CompanyInfo,
        StepKey::StorageUnits,
        StepKey::AppUsers,
        StepKey::MailConfig,
        StepKey::AccessLevels,
        StepKey::Documentation,
    ];

    pub fn wire_name(self) -> &'static str {
        match self {
            StepKey::CompanyInfo => "datos_empresa",
            StepKey::StorageUnits => "info_trasteros",
            StepKey::AppUsers => "usuarios_app",
            StepKey::MailConfig => "config_correo",
            StepKey::AccessLevels => "niveles_acceso",
            StepKey::Documentation => "documentacion",
        }
    }

    fn english_name(self) -> &'static str {
        match self {
            StepKey::CompanyInfo => "company_info",
            StepKey::StorageUnits => "storage_units",
            StepKey::AppUsers => "app_users",
            StepKey::MailConfig => "mail_config",
            StepKey::AccessLevels => "access_levels",
            StepKey::Documentation => "documentation",
        }
    }

    fn legacy_name(self) -> &'static str {
        match self {
            StepKey::CompanyInfo => "paso_1",
            StepKey::StorageUnits => "paso_2",
            StepKey::AppUsers => "paso_3",
            StepKey::MailConfig => "paso_4",
            StepKey::AccessLevels => "paso_5",
            StepKey::Documentation => "paso_6",
        }
    }

    /// Resolves any accepted spelling of a key.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| {
            key.wire_name() == name || key.english_name() == name || key.legacy_name() == name
        })
    }

    pub fn is_legacy_name(name: &str) -> bool {
        Self::ALL.into_iter().any(|key| key.legacy_name() == name)
    }
}

/// Nested boolean sub-object captured per record (e.g. user permissions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGroup {
    pub key: String,
    pub flags: Vec<String>,
}

impl FieldGroup {
    /// Name of the row checkbox that backs `flag`.
    pub fn control_name(&self, flag: &str) -> String {
        format!("{}_{}", self.key, flag)
    }
}

/// Door selection captured per access-level record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub key: String,
    pub predefined: Vec<String>,
}

/// Two fields of a record that must hold the same value when both are filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPair {
    pub field: String,
    pub confirmation: String,
}

/// Repeating record definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Payload key holding the record list.
    pub list_key: String,
    /// Singular human label, used in messages.
    pub label: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<FieldGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doors: Option<DoorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm: Option<ConfirmPair>,
}

/// Upload-bearing step definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub document_types: Vec<String>,
    pub notes_field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum StepLayout {
    Flat { fields: Vec<FieldSpec> },
    Records(RecordSpec),
    Documents(DocumentSpec),
}

/// Static description of one wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub number: StepNumber,
    pub key: StepKey,
    pub name: String,
    #[serde(flatten)]
    pub layout: StepLayout,
}

impl StepDescriptor {
    /// Documentation is only persisted through an explicit upload.
    pub fn persists_generically(&self) -> bool {
        !matches!(self.layout, StepLayout::Documents(_))
    }

    /// Field `name` of a flat step.
    pub fn flat_field(&self, name: &str) -> Option<&FieldSpec> {
        self.flat_fields().iter().find(|field| field.name == name)
    }

    pub fn flat_fields(&self) -> &[FieldSpec] {
        match &self.layout {
            StepLayout::Flat { fields } => fields,
            _ => &[],
        }
    }
}
