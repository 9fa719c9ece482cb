#![allow(dead_code)]

use std::sync::Arc;

use onboarding_form::{
    Bootstrap, ClientId, Control, FieldKind, RecordRow, StepCatalog, StepView,
};
use onboarding_wizard::{InMemoryHost, MemoryGateway, WizardConfig, WizardController};
use serde_json::{Value, json};

pub const CLIENT: &str = "1001";

pub fn company_view() -> StepView {
    StepView::new()
        .with_control(Control::text("nombre", "Trasteros Acme SL"))
        .with_control(Control::text("nif", "A58818501"))
        .with_control(Control::text("direccion", "Calle Mayor 1"))
        .with_control(Control::text("codigo_postal", "28001"))
        .with_control(Control::text("provincia", "Madrid"))
        .with_control(Control::new("telefono", FieldKind::Tel, "612345678"))
        .with_control(Control::new("email", FieldKind::Email, "info@acme.es"))
}

pub fn units_view() -> StepView {
    StepView::new().with_row(RecordRow::template()).with_row(
        RecordRow::new()
            .with_value("numero_trastero", "A-1")
            .with_value("metros", "4")
            .with_value("precio_sin_iva", "40"),
    )
}

pub fn users_view() -> StepView {
    StepView::new().with_row(
        RecordRow::new()
            .with_value("nombre_usuario", "Ana")
            .with_value("email_usuario", "ana@acme.es")
            .with_value("password_usuario", "clave")
            .with_value("confirm_password_usuario", "clave"),
    )
}

pub fn mail_view() -> StepView {
    StepView::new()
        .with_control(Control::text("servidor_saliente", "smtp.acme.es"))
        .with_control(Control::text("direccion_servidor", "mail.acme.es"))
        .with_control(Control::new("puerto", FieldKind::Number, "587"))
        .with_control(Control::new("usuario_email", FieldKind::Email, "info@acme.es"))
}

pub fn levels_view() -> StepView {
    StepView::new().with_row(
        RecordRow::new()
            .with_value("nombre", "General")
            .with_value("descripcion", "Acceso general"),
    )
}

/// Stored company payload that passes validation once populated.
pub fn company_payload() -> Value {
    json!({
        "nombre": "Trasteros Acme SL",
        "nif": "A58818501",
        "direccion": "Calle Mayor 1",
        "codigo_postal": "28001",
        "provincia": "Madrid",
        "telefono": "612345678",
        "email": "info@acme.es"
    })
}

/// Host where every step passes validation.
pub fn complete_host() -> InMemoryHost {
    InMemoryHost::blank(6)
        .with_view(1, company_view())
        .with_view(2, units_view())
        .with_view(3, users_view())
        .with_view(4, mail_view())
        .with_view(5, levels_view())
}

pub fn bootstrap(step: Option<i64>, form_data: Value) -> Bootstrap {
    Bootstrap {
        cliente_id: Some(ClientId::new(CLIENT)),
        paso_actual: step,
        total_pasos: Some(6),
        datos_formulario: form_data,
        ..Bootstrap::default()
    }
}

pub fn controller(
    gateway: &MemoryGateway,
    host: InMemoryHost,
    bootstrap: &Bootstrap,
) -> WizardController<InMemoryHost> {
    controller_with(WizardConfig::default(), gateway, host, bootstrap)
}

pub fn controller_with(
    config: WizardConfig,
    gateway: &MemoryGateway,
    host: InMemoryHost,
    bootstrap: &Bootstrap,
) -> WizardController<InMemoryHost> {
    WizardController::new(
        StepCatalog::onboarding(),
        config,
        Arc::new(gateway.clone()),
        host,
        bootstrap,
    )
}
