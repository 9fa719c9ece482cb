use onboarding_form::checksum::nif_control_letter;
use onboarding_form::validate::is_spanish_mobile;
use onboarding_form::{
    CustomRule, FieldFailure, FieldKind, FieldSpec, is_valid_iban, is_valid_national_id,
    is_valid_nif, validate_field, validate_rule,
};
use proptest::prelude::*;

const REFERENCE_IBAN: &str = "ES9121000418450200051332";

fn phone_field() -> FieldSpec {
    FieldSpec::new("telefono", "Teléfono", FieldKind::Tel).required()
}

#[test]
fn spanish_mobile_accepts_prefix_and_whitespace_variants() {
    for raw in [
        "612345678",
        "612 345 678",
        "+34612345678",
        "+34 612 345 678",
        "0034612345678",
        "34 612345678",
        "912345678",
    ] {
        assert!(validate_field(&phone_field(), raw).is_valid, "{raw}");
    }
}

#[test]
fn spanish_mobile_rejects_wrong_lead_digit_or_length() {
    for raw in ["512345678", "61234567", "6123456789", "+44612345678", "61234567a"] {
        let outcome = validate_field(&phone_field(), raw);
        assert_eq!(outcome.failure, Some(FieldFailure::Telephone), "{raw}");
    }
    assert!(!is_spanish_mobile(""));
}

#[test]
fn nif_reference_value() {
    assert!(is_valid_nif("12345678Z"));
    assert!(is_valid_national_id("12345678Z"));
    assert!(!is_valid_national_id("12345678A"));
}

#[test]
fn national_id_rule_reports_its_own_failure() {
    let spec = FieldSpec::new("nif", "NIF/CIF", FieldKind::Text)
        .required()
        .with_rule(CustomRule::NationalId);
    assert!(validate_field(&spec, "x1234567l").is_valid);
    let outcome = validate_field(&spec, "B00000001");
    assert_eq!(outcome.failure, Some(FieldFailure::NationalId));
    assert_eq!(outcome.failure.map(|f| f.code()), Some("national_id"));
}

#[test]
fn iban_reference_value_passes_the_rule() {
    assert!(validate_rule(CustomRule::Iban, REFERENCE_IBAN).is_valid);
    assert!(validate_rule(CustomRule::Iban, "ES91 2100 0418 4502 0005 1332").is_valid);
    assert_eq!(
        validate_rule(CustomRule::Iban, "ES9121000418450200051333").failure,
        Some(FieldFailure::Iban)
    );
}

proptest! {
    #[test]
    fn iban_single_digit_change_is_rejected(pos in 2usize..24, delta in 1u8..10) {
        let mut bytes = REFERENCE_IBAN.as_bytes().to_vec();
        let digit = bytes[pos] - b'0';
        bytes[pos] = b'0' + (digit + delta) % 10;
        let mutated = String::from_utf8(bytes).expect("ascii");
        prop_assert!(!is_valid_iban(&mutated));
    }

    #[test]
    fn nif_accepts_only_its_control_letter(
        number in 0u32..100_000_000,
        letter in proptest::char::range('A', 'Z'),
    ) {
        let candidate = format!("{number:08}{letter}");
        prop_assert_eq!(is_valid_nif(&candidate), letter == nif_control_letter(number));
    }
}
