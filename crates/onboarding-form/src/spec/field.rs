use serde::{Deserialize, Serialize};

/// Input control types understood by the validation engine and the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Tel,
    Url,
    Number,
    Password,
    Checkbox,
    Radio,
    Select,
    Textarea,
    Time,
}

/// Named checksum or format validators attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomRule {
    /// NIF, NIE or CIF.
    NationalId,
    Iban,
    Bic,
    PostalCode,
}

/// Attribute-style constraints, mirroring `pattern`/`min`/`max`/`minlength`/`maxlength`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

/// Definition of a single input inside a step or a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<CustomRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Empty values serialize as `null` instead of `""`.
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            constraint: None,
            rules: Vec::new(),
            default_value: None,
            nullable: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraint_mut().pattern = Some(pattern.into());
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        let constraint = self.constraint_mut();
        constraint.min = min;
        constraint.max = max;
        self
    }

    pub fn with_length(mut self, min_len: Option<usize>, max_len: Option<usize>) -> Self {
        let constraint = self.constraint_mut();
        constraint.min_len = min_len;
        constraint.max_len = max_len;
        self
    }

    pub fn with_rule(mut self, rule: CustomRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self.kind, FieldKind::Checkbox)
    }

    /// True when `value` should count as user input for this field.
    pub fn is_filled(&self, value: &str) -> bool {
        let value = value.trim();
        !value.is_empty() && self.default_value.as_deref() != Some(value)
    }

    fn constraint_mut(&mut self) -> &mut Constraint {
        self.constraint.get_or_insert_with(Constraint::default)
    }
}
