use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};

fn onboarding() -> Command {
    Command::cargo_bin("onboarding").expect("onboarding binary")
}

fn company_view(nif: &str) -> Value {
    json!({
        "controls": [
            { "name": "nombre", "value": "Trasteros Acme SL" },
            { "name": "nif", "value": nif },
            { "name": "direccion", "value": "Calle Mayor 1" },
            { "name": "codigo_postal", "value": "28001" },
            { "name": "provincia", "value": "Madrid" },
            { "name": "telefono", "type": "tel", "value": "612 345 678" },
            { "name": "email", "type": "email", "value": "info@acme.es" }
        ]
    })
}

#[test]
fn check_accepts_valid_nif() {
    onboarding()
        .args(["check", "national-id", "12345678Z"])
        .assert()
        .success()
        .stdout("valid\n");
}

#[test]
fn check_rejects_mutated_iban_with_message() {
    onboarding()
        .args(["check", "iban", "ES9121000418450200051333"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("IBAN"));
}

#[test]
fn check_json_reports_failure_code() {
    let output = onboarding()
        .args(["--json", "check", "postal-code", "2800"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["valid"], json!(false));
    assert_eq!(report["code"], json!("postal_code"));
    assert_eq!(report["rule"], json!("postal-code"));
}

#[test]
fn format_groups_iban_and_phone() {
    onboarding()
        .args(["format", "iban", "es9121000418450200051332"])
        .assert()
        .success()
        .stdout("ES91 2100 0418 4502 0005 1332\n");
    onboarding()
        .args(["format", "phone", "0034612345678"])
        .assert()
        .success()
        .stdout("+34 612 345 678\n");
}

#[test]
fn format_without_digits_is_an_error() {
    onboarding()
        .args(["format", "phone", "n/a"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("nothing to format"));
}

#[test]
fn validate_step_passes_complete_company_view() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("step1.json");
    std::fs::write(&path, company_view("A58818501").to_string()).expect("write view");

    onboarding()
        .args(["validate-step", "--step", "1", "--view"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 (Datos de la Empresa): valid"));
}

#[test]
fn validate_step_lists_invalid_fields() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("step1.json");
    std::fs::write(&path, company_view("12345678A").to_string()).expect("write view");

    let output = onboarding()
        .args(["validate-step", "--json", "--step", "1", "--view"])
        .arg(&path)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["invalid_fields"], json!(["NIF/CIF"]));
    assert_eq!(
        report["notice"],
        json!("Complete los campos obligatorios del paso actual")
    );
}

#[test]
fn validate_step_requires_a_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("step2.json");
    std::fs::write(&path, json!({ "rows": [{ "template": true }] }).to_string())
        .expect("write view");

    onboarding()
        .args(["validate-step", "--step", "2", "--view"])
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Debe agregar al menos un trastero"));
}

#[test]
fn validate_step_rejects_unknown_step_and_bad_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("view.json");
    std::fs::write(&path, "not json").expect("write view");

    onboarding()
        .args(["validate-step", "--step", "9", "--view"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("step 9 does not exist"));
    onboarding()
        .args(["validate-step", "--step", "1", "--view"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("is not a valid step view"));
}
