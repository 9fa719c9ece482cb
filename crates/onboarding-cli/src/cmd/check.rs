use anyhow::Result;
use clap::{Args, ValueEnum};
use onboarding_form::{CustomRule, FieldKind, FieldOutcome, FieldSpec, validate_field};
use serde::Serialize;
use tracing::debug;

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[arg(value_enum)]
    pub rule: Rule,
    /// Value to check; surrounding whitespace is ignored
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// NIF, NIE or CIF
    NationalId,
    Iban,
    Bic,
    PostalCode,
    /// Spanish mobile number
    Phone,
    Email,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    rule: Rule,
    value: &'a str,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub fn run(args: &CheckArgs, json: bool) -> Result<bool> {
    let outcome = evaluate(args.rule, &args.value);
    debug!(rule = ?args.rule, valid = outcome.is_valid, "checked value");

    let report = CheckReport {
        rule: args.rule,
        value: args.value.trim(),
        valid: outcome.is_valid,
        code: outcome.failure.as_ref().map(|failure| failure.code()),
        message: outcome.failure_reason(),
    };
    if json {
        super::print_json(&report)?;
    } else if let Some(message) = &report.message {
        println!("invalid: {message}");
    } else {
        println!("valid");
    }
    Ok(outcome.is_valid)
}

/// An empty value is reported as missing rather than passing silently.
pub fn evaluate(rule: Rule, value: &str) -> FieldOutcome {
    match rule {
        Rule::NationalId => required_rule(CustomRule::NationalId, value),
        Rule::Iban => required_rule(CustomRule::Iban, value),
        Rule::Bic => required_rule(CustomRule::Bic, value),
        Rule::PostalCode => required_rule(CustomRule::PostalCode, value),
        Rule::Phone => typed(FieldKind::Tel, value),
        Rule::Email => typed(FieldKind::Email, value),
    }
}

fn typed(kind: FieldKind, value: &str) -> FieldOutcome {
    validate_field(&FieldSpec::new("value", "Valor", kind).required(), value)
}

fn required_rule(rule: CustomRule, value: &str) -> FieldOutcome {
    let spec = FieldSpec::new("value", "Valor", FieldKind::Text)
        .required()
        .with_rule(rule);
    validate_field(&spec, value)
}

#[cfg(test)]
mod tests {
    use onboarding_form::FieldFailure;

    use super::*;

    #[test]
    fn empty_value_is_required() {
        let outcome = evaluate(Rule::Iban, "  ");
        assert_eq!(outcome.failure, Some(FieldFailure::Required));
    }

    #[test]
    fn phone_accepts_prefixed_mobile() {
        assert!(evaluate(Rule::Phone, "+34 612 345 678").is_valid);
        assert!(!evaluate(Rule::Phone, "512345678").is_valid);
    }

    #[test]
    fn national_id_covers_all_document_kinds() {
        for value in ["12345678Z", "X1234567L", "A58818501"] {
            assert!(evaluate(Rule::NationalId, value).is_valid, "{value}");
        }
        assert_eq!(
            evaluate(Rule::NationalId, "12345678A").failure,
            Some(FieldFailure::NationalId)
        );
    }
}
