use onboarding_form::{
    Control, DoorChoice, FieldKind, RecordRow, StepCatalog, StepView, UploadedFile, extract,
    extract_documents, populate,
};
use serde_json::{Value, json};

fn catalog() -> StepCatalog {
    StepCatalog::onboarding()
}

#[test]
fn flat_step_trims_text_but_not_passwords() {
    let catalog = catalog();
    let mail = catalog.get(4).expect("mail step");
    let view = StepView::new()
        .with_control(Control::text("servidor_saliente", "  smtp.acme.es "))
        .with_control(Control::new("password_email", FieldKind::Password, " s3cret "))
        .with_control(Control::radio("seguridad", "ssl", false))
        .with_control(Control::radio("seguridad", "tls", true))
        .with_control(Control::checkbox("usar_auth", true));
    let payload = extract(mail, &view);
    assert_eq!(
        payload,
        json!({
            "servidor_saliente": "smtp.acme.es",
            "password_email": " s3cret ",
            "seguridad": "tls",
            "usar_auth": true
        })
    );
}

#[test]
fn unchecked_radio_group_is_absent() {
    let catalog = catalog();
    let mail = catalog.get(4).expect("mail step");
    let view = StepView::new().with_control(Control::radio("seguridad", "ssl", false));
    assert_eq!(extract(mail, &view), json!({}));
}

#[test]
fn blank_and_template_rows_are_excluded() {
    let catalog = catalog();
    let users = catalog.get(3).expect("users step");
    let view = StepView::new()
        .with_row(RecordRow::template().with_value("nombre_usuario", "plantilla"))
        .with_row(RecordRow::new().with_value("rol_usuario", "usuario"))
        .with_row(
            RecordRow::new()
                .with_value("nombre_usuario", "Ana")
                .with_value("email_usuario", "ana@acme.es")
                .with_check("permisos_reportes", true),
        );
    let payload = extract(users, &view);
    assert_eq!(
        payload,
        json!({
            "usuarios": [{
                "nombre_usuario": "Ana",
                "email_usuario": "ana@acme.es",
                "password_usuario": "",
                "confirm_password_usuario": "",
                "rol_usuario": "usuario",
                "departamento_usuario": "",
                "permisos": {"facturacion": false, "reportes": true, "configuracion": false}
            }]
        })
    );
}

#[test]
fn access_levels_union_doors_and_null_times() {
    let catalog = catalog();
    let levels = catalog.get(5).expect("levels step");
    let view = StepView::new().with_row(
        RecordRow::new()
            .with_value("nombre", "Completo")
            .with_value("descripcion", "Todo")
            .with_check("acceso_24h", true)
            .with_door(DoorChoice::predefined("puerta_principal", true))
            .with_door(DoorChoice::predefined("puerta_garaje", false))
            .with_door(DoorChoice::custom("Almacén", true))
            .with_door(DoorChoice::custom("Almacén", true)),
    );
    let payload = extract(levels, &view);
    let record = &payload["niveles_acceso"][0];
    assert_eq!(record["acceso_24h"], json!(true));
    assert_eq!(record["hora_inicio"], Value::Null);
    assert_eq!(record["puertas"], json!(["puerta_principal", "Almacén"]));
}

#[test]
fn a_single_checked_door_keeps_the_row() {
    let catalog = catalog();
    let levels = catalog.get(5).expect("levels step");
    let view = StepView::new()
        .with_row(RecordRow::new().with_door(DoorChoice::predefined("montacargas", true)));
    let payload = extract(levels, &view);
    assert_eq!(payload["niveles_acceso"].as_array().map(Vec::len), Some(1));
}

#[test]
fn documents_bundle_collects_uploads_and_notes() {
    let catalog = catalog();
    let docs = catalog.get(6).expect("documentation step");
    let view = StepView::new()
        .with_control(Control::new("notas_adicionales", FieldKind::Textarea, " urgente "))
        .with_upload("escrituras", UploadedFile::new("escritura.pdf", vec![1, 2, 3]));
    let bundle = extract_documents(docs, &view).expect("document bundle");
    assert_eq!(bundle.file_count(), 1);
    assert_eq!(bundle.notes, "urgente");
    assert_eq!(
        extract(docs, &view),
        json!({"documentos": {"escrituras": ["escritura.pdf"]}, "notas_adicionales": "urgente"})
    );
    assert!(extract_documents(catalog.get(1).expect("company"), &view).is_none());
}

#[test]
fn populate_ignores_empty_payloads() {
    let catalog = catalog();
    let company = catalog.get(1).expect("company step");
    let mut view = StepView::new().with_control(Control::text("nombre", "Sin guardar"));
    let before = view.clone();
    populate(company, &json!({}), &mut view);
    populate(company, &Value::Null, &mut view);
    assert_eq!(view, before);
}

#[test]
fn populate_flat_defaults_missing_keys() {
    let catalog = catalog();
    let company = catalog.get(1).expect("company step");
    let mut view = StepView::new()
        .with_control(Control::text("nombre", "Viejo"))
        .with_control(Control::text("provincia", "Cádiz"));
    populate(company, &json!({"nombre": "Acme", "telefono": 612345678}), &mut view);
    assert_eq!(view.control("nombre").map(|c| c.value.as_str()), Some("Acme"));
    assert_eq!(view.control("provincia").map(|c| c.value.as_str()), Some(""));
    assert_eq!(view.control("telefono").map(|c| c.value.as_str()), Some("612345678"));
}

#[test]
fn populate_restores_controls_outside_the_catalog() {
    let catalog = catalog();
    let company = catalog.get(1).expect("company step");
    let rendered = |nombre: &str, cargo: &str, lopd: bool, size: Option<&str>| {
        StepView::new()
            .with_control(Control::text("nombre", nombre))
            .with_control(Control::text("cargo_representante", cargo))
            .with_control(Control::checkbox("acepta_lopd", lopd))
            .with_control(Control::radio("tamano", "pyme", size == Some("pyme")))
            .with_control(Control::radio("tamano", "grande", size == Some("grande")))
    };

    let payload = extract(company, &rendered("Acme", "Gerente", true, Some("grande")));
    assert_eq!(payload["cargo_representante"], json!("Gerente"));

    let mut revisited = rendered("", "", false, None);
    populate(company, &payload, &mut revisited);
    assert_eq!(revisited.effective_value("nombre").as_deref(), Some("Acme"));
    assert_eq!(
        revisited.effective_value("cargo_representante").as_deref(),
        Some("Gerente")
    );
    assert_eq!(revisited.effective_value("acepta_lopd").as_deref(), Some("on"));
    assert_eq!(revisited.effective_value("tamano").as_deref(), Some("grande"));

    let again = extract(company, &revisited);
    for key in ["nombre", "cargo_representante", "acepta_lopd", "tamano"] {
        assert_eq!(again[key], payload[key], "{key}");
    }
}

#[test]
fn populate_skips_unknown_keys_without_a_control() {
    let catalog = catalog();
    let company = catalog.get(1).expect("company step");
    let mut view = StepView::new().with_control(Control::text("nombre", ""));
    populate(company, &json!({"nombre": "Acme", "campo_retirado": "x"}), &mut view);
    assert!(!view.has_control("campo_retirado"));
    assert_eq!(view.control("nombre").map(|c| c.value.as_str()), Some("Acme"));
}

#[test]
fn last_control_with_a_shared_name_wins() {
    let catalog = catalog();
    let company = catalog.get(1).expect("company step");
    let view = StepView::new()
        .with_control(Control::text("localidad", "Sevilla"))
        .with_control(Control::text("localidad", "Dos Hermanas"));
    assert_eq!(extract(company, &view)["localidad"], json!("Dos Hermanas"));
    assert_eq!(view.effective_value("localidad").as_deref(), Some("Dos Hermanas"));
}

#[test]
fn undeclared_document_types_are_not_uploaded() {
    let catalog = catalog();
    let docs = catalog.get(6).expect("documentation step");
    let view = StepView::new()
        .with_upload("escrituras", UploadedFile::new("escritura.pdf", vec![1]))
        .with_upload("nominas", UploadedFile::new("nomina.pdf", vec![2]));
    let bundle = extract_documents(docs, &view).expect("document bundle");
    assert_eq!(bundle.files.keys().collect::<Vec<_>>(), vec!["escrituras"]);
    assert_eq!(bundle.file_count(), 1);
}

#[test]
fn populate_then_extract_restores_records() {
    let catalog = catalog();
    let levels = catalog.get(5).expect("levels step");
    let stored = json!({
        "niveles_acceso": [{
            "nombre": "Mañanas",
            "prioridad": "alta",
            "descripcion": "Horario de mañana",
            "acceso_24h": false,
            "hora_inicio": "08:00",
            "hora_fin": null,
            "puertas": ["puerta_peatonal", "Sótano"]
        }]
    });
    let mut view = StepView::new()
        .with_row(RecordRow::template())
        .with_row(RecordRow::new().with_value("nombre", "descartado"));
    populate(levels, &stored, &mut view);
    assert_eq!(view.rows.len(), 2);
    assert!(view.rows[0].template);
    assert_eq!(extract(levels, &view), stored);
}

#[test]
fn populate_accepts_bare_record_array() {
    let catalog = catalog();
    let units = catalog.get(2).expect("units step");
    let mut view = StepView::new();
    populate(units, &json!([{"numero_trastero": "A-1", "metros": "4"}]), &mut view);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].value("numero_trastero"), "A-1");
    assert_eq!(view.rows[0].value("precio_sin_iva"), "");
}
