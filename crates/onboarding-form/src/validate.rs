use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::checksum::{is_valid_iban, is_valid_national_id, normalize};
use crate::spec::field::{Constraint, CustomRule, FieldKind, FieldSpec};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));
static SPANISH_MOBILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+34|0034|34)?[6-9][0-9]{8}$").expect("telephone regex"));
static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("postal regex"));
static BIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{6}[A-Z0-9]{2}([A-Z0-9]{3})?$").expect("bic regex"));

/// Reason a single value was rejected. Display strings are user-facing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldFailure {
    #[error("Este campo es obligatorio")]
    Required,
    #[error("Formato de email inválido")]
    Email,
    #[error("Formato de teléfono inválido (ej: +34 612 345 678)")]
    Telephone,
    #[error("Formato de URL inválido")]
    Url,
    #[error("Debe ser un valor numérico")]
    NotANumber,
    #[error("El valor mínimo es {0}")]
    BelowMin(f64),
    #[error("El valor máximo es {0}")]
    AboveMax(f64),
    #[error("El formato no es válido")]
    Pattern,
    #[error("Debe tener al menos {0} caracteres")]
    TooShort(usize),
    #[error("No puede tener más de {0} caracteres")]
    TooLong(usize),
    #[error("Documento de identidad inválido (ej: 12345678Z, X1234567L, A58818501)")]
    NationalId,
    #[error("Formato de IBAN español inválido")]
    Iban,
    #[error("Formato de BIC/SWIFT inválido")]
    Bic,
    #[error("El código postal debe tener 5 dígitos")]
    PostalCode,
    #[error("Las contraseñas no coinciden")]
    Mismatch,
}

impl FieldFailure {
    pub fn code(&self) -> &'static str {
        match self {
            FieldFailure::Required => "required",
            FieldFailure::Email => "email",
            FieldFailure::Telephone => "telephone",
            FieldFailure::Url => "url",
            FieldFailure::NotANumber => "number",
            FieldFailure::BelowMin(_) => "min",
            FieldFailure::AboveMax(_) => "max",
            FieldFailure::Pattern => "pattern",
            FieldFailure::TooShort(_) => "min_length",
            FieldFailure::TooLong(_) => "max_length",
            FieldFailure::NationalId => "national_id",
            FieldFailure::Iban => "iban",
            FieldFailure::Bic => "bic",
            FieldFailure::PostalCode => "postal_code",
            FieldFailure::Mismatch => "mismatch",
        }
    }
}

/// Result of checking one value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    pub is_valid: bool,
    pub failure: Option<FieldFailure>,
}

impl FieldOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            failure: None,
        }
    }

    pub fn invalid(failure: FieldFailure) -> Self {
        Self {
            is_valid: false,
            failure: Some(failure),
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        self.failure.as_ref().map(ToString::to_string)
    }
}

impl From<Result<(), FieldFailure>> for FieldOutcome {
    fn from(result: Result<(), FieldFailure>) -> Self {
        match result {
            Ok(()) => FieldOutcome::valid(),
            Err(failure) => FieldOutcome::invalid(failure),
        }
    }
}

/// Checks `raw` against `spec`: required, type, pattern, length, custom rules,
/// stopping at the first failure. Only the required rule rejects empty input.
pub fn validate_field(spec: &FieldSpec, raw: &str) -> FieldOutcome {
    check_field(spec, raw.trim()).into()
}

/// Runs a single named rule. Empty values pass.
pub fn validate_rule(rule: CustomRule, raw: &str) -> FieldOutcome {
    let value = raw.trim();
    if value.is_empty() {
        return FieldOutcome::valid();
    }
    check_rule(rule, value).into()
}

fn check_field(spec: &FieldSpec, value: &str) -> Result<(), FieldFailure> {
    if value.is_empty() {
        return if spec.required {
            Err(FieldFailure::Required)
        } else {
            Ok(())
        };
    }

    let default_constraint = Constraint::default();
    let constraint = spec.constraint.as_ref().unwrap_or(&default_constraint);

    check_kind(spec.kind, value, constraint)?;

    if let Some(pattern) = &constraint.pattern
        && let Ok(regex) = Regex::new(&format!("^(?:{pattern})$"))
        && !regex.is_match(value)
    {
        return Err(FieldFailure::Pattern);
    }

    let length = value.chars().count();
    if let Some(min_len) = constraint.min_len
        && length < min_len
    {
        return Err(FieldFailure::TooShort(min_len));
    }
    if let Some(max_len) = constraint.max_len
        && length > max_len
    {
        return Err(FieldFailure::TooLong(max_len));
    }

    for rule in &spec.rules {
        check_rule(*rule, value)?;
    }

    Ok(())
}

fn check_kind(kind: FieldKind, value: &str, constraint: &Constraint) -> Result<(), FieldFailure> {
    match kind {
        FieldKind::Email if !EMAIL.is_match(value) => Err(FieldFailure::Email),
        FieldKind::Tel if !is_spanish_mobile(value) => Err(FieldFailure::Telephone),
        FieldKind::Url if url::Url::parse(value).is_err() => Err(FieldFailure::Url),
        FieldKind::Number => {
            let number: f64 = value.parse().map_err(|_| FieldFailure::NotANumber)?;
            if let Some(min) = constraint.min
                && number < min
            {
                return Err(FieldFailure::BelowMin(min));
            }
            if let Some(max) = constraint.max
                && number > max
            {
                return Err(FieldFailure::AboveMax(max));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_rule(rule: CustomRule, value: &str) -> Result<(), FieldFailure> {
    let ok = match rule {
        CustomRule::NationalId => is_valid_national_id(value),
        CustomRule::Iban => is_valid_iban(value),
        CustomRule::Bic => BIC.is_match(&normalize(value)),
        CustomRule::PostalCode => POSTAL_CODE.is_match(value),
    };
    if ok {
        Ok(())
    } else {
        Err(match rule {
            CustomRule::NationalId => FieldFailure::NationalId,
            CustomRule::Iban => FieldFailure::Iban,
            CustomRule::Bic => FieldFailure::Bic,
            CustomRule::PostalCode => FieldFailure::PostalCode,
        })
    }
}

/// Spanish mobile number, whitespace ignored, optional +34/0034/34 prefix.
pub fn is_spanish_mobile(value: &str) -> bool {
    let compact: String = value.chars().filter(|ch| !ch.is_whitespace()).collect();
    SPANISH_MOBILE.is_match(&compact)
}
