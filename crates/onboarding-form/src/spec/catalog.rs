use crate::spec::field::{CustomRule, FieldKind, FieldSpec};
use crate::spec::step::{
    ConfirmPair, DocumentSpec, DoorSpec, FieldGroup, RecordSpec, StepDescriptor, StepKey,
    StepLayout, StepNumber,
};

/// Ordered, immutable set of step descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct StepCatalog {
    steps: Vec<StepDescriptor>,
}

impl StepCatalog {
    /// Builds a catalog; steps are renumbered from 1 in the given order.
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(idx, mut step)| {
                step.number = (idx + 1) as StepNumber;
                step
            })
            .collect();
        Self { steps }
    }

    /// The six-step business onboarding form.
    pub fn onboarding() -> Self {
        Self::new(vec![
            company_step(),
            storage_units_step(),
            app_users_step(),
            mail_step(),
            access_levels_step(),
            documentation_step(),
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total(&self) -> StepNumber {
        self.steps.len() as StepNumber
    }

    pub fn get(&self, number: StepNumber) -> Option<&StepDescriptor> {
        let idx = usize::from(number).checked_sub(1)?;
        self.steps.get(idx)
    }

    pub fn by_key(&self, key: StepKey) -> Option<&StepDescriptor> {
        self.steps.iter().find(|step| step.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepDescriptor> {
        self.steps.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name.clone()).collect()
    }

    /// Replaces display names, keeping the current ones where `names` runs short.
    pub fn rename_steps(&mut self, names: &[String]) {
        for (step, name) in self.steps.iter_mut().zip(names) {
            if !name.trim().is_empty() {
                step.name = name.clone();
            }
        }
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::onboarding()
    }
}

fn descriptor(key: StepKey, name: &str, layout: StepLayout) -> StepDescriptor {
    StepDescriptor {
        number: 0,
        key,
        name: name.to_string(),
        layout,
    }
}

fn company_step() -> StepDescriptor {
    descriptor(
        StepKey::CompanyInfo,
        "Datos de la Empresa",
        StepLayout::Flat {
            fields: vec![
                FieldSpec::new("nombre", "Nombre de la empresa", FieldKind::Text).required(),
                FieldSpec::new("nif", "NIF/CIF", FieldKind::Text)
                    .required()
                    .with_rule(CustomRule::NationalId),
                FieldSpec::new("direccion", "Dirección", FieldKind::Text).required(),
                FieldSpec::new("codigo_postal", "Código postal", FieldKind::Text)
                    .required()
                    .with_rule(CustomRule::PostalCode),
                FieldSpec::new("localidad", "Localidad", FieldKind::Text),
                FieldSpec::new("provincia", "Provincia", FieldKind::Text).required(),
                FieldSpec::new("telefono", "Teléfono", FieldKind::Tel).required(),
                FieldSpec::new("email", "Email", FieldKind::Email).required(),
                FieldSpec::new("web", "Página web", FieldKind::Url),
                FieldSpec::new("iban", "IBAN", FieldKind::Text).with_rule(CustomRule::Iban),
                FieldSpec::new("bic", "BIC/SWIFT", FieldKind::Text).with_rule(CustomRule::Bic),
                FieldSpec::new("persona_contacto", "Persona de contacto", FieldKind::Text),
            ],
        },
    )
}

fn storage_units_step() -> StepDescriptor {
    let money = |name: &str, label: &str| {
        FieldSpec::new(name, label, FieldKind::Number).with_range(Some(0.0), None)
    };
    descriptor(
        StepKey::StorageUnits,
        "Información de Trasteros",
        StepLayout::Records(RecordSpec {
            list_key: "trasteros".into(),
            label: "Trastero".into(),
            fields: vec![
                FieldSpec::new("numero_trastero", "Número", FieldKind::Text).required(),
                FieldSpec::new("metros", "Metros cuadrados", FieldKind::Number)
                    .required()
                    .with_range(Some(0.0), None),
                FieldSpec::new("metros_cubicos", "Metros cúbicos", FieldKind::Number)
                    .with_range(Some(0.0), None),
                money("precio_sin_iva", "Precio sin IVA").required(),
                money("precio_con_iva", "Precio con IVA"),
                money("fianza", "Fianza"),
                FieldSpec::new("descripcion", "Descripción", FieldKind::Textarea),
            ],
            groups: Vec::new(),
            doors: None,
            confirm: None,
        }),
    )
}

fn app_users_step() -> StepDescriptor {
    descriptor(
        StepKey::AppUsers,
        "Usuarios de la Aplicación",
        StepLayout::Records(RecordSpec {
            list_key: "usuarios".into(),
            label: "Usuario".into(),
            fields: vec![
                FieldSpec::new("nombre_usuario", "Nombre", FieldKind::Text).required(),
                FieldSpec::new("email_usuario", "Email", FieldKind::Email).required(),
                FieldSpec::new("password_usuario", "Contraseña", FieldKind::Password).required(),
                FieldSpec::new(
                    "confirm_password_usuario",
                    "Confirmar contraseña",
                    FieldKind::Password,
                )
                .required(),
                FieldSpec::new("rol_usuario", "Rol", FieldKind::Select).with_default("usuario"),
                FieldSpec::new("departamento_usuario", "Departamento", FieldKind::Text),
            ],
            groups: vec![FieldGroup {
                key: "permisos".into(),
                flags: vec![
                    "facturacion".into(),
                    "reportes".into(),
                    "configuracion".into(),
                ],
            }],
            doors: None,
            confirm: Some(ConfirmPair {
                field: "password_usuario".into(),
                confirmation: "confirm_password_usuario".into(),
            }),
        }),
    )
}

fn mail_step() -> StepDescriptor {
    descriptor(
        StepKey::MailConfig,
        "Configuración de Correo",
        StepLayout::Flat {
            fields: vec![
                FieldSpec::new("servidor_saliente", "Servidor saliente (SMTP)", FieldKind::Text)
                    .required(),
                FieldSpec::new("direccion_servidor", "Dirección del servidor", FieldKind::Text)
                    .required(),
                FieldSpec::new("puerto", "Puerto", FieldKind::Number)
                    .required()
                    .with_range(Some(1.0), Some(65535.0)),
                FieldSpec::new("usuario_email", "Usuario de correo", FieldKind::Email).required(),
                FieldSpec::new("password_email", "Contraseña de correo", FieldKind::Password),
                FieldSpec::new("seguridad", "Seguridad", FieldKind::Radio),
                FieldSpec::new("servidor_entrante", "Servidor entrante", FieldKind::Text),
                FieldSpec::new("email_remitente", "Email remitente", FieldKind::Email),
            ],
        },
    )
}

fn access_levels_step() -> StepDescriptor {
    descriptor(
        StepKey::AccessLevels,
        "Niveles de Acceso",
        StepLayout::Records(RecordSpec {
            list_key: "niveles_acceso".into(),
            label: "Nivel de acceso".into(),
            fields: vec![
                FieldSpec::new("nombre", "Nombre", FieldKind::Text).required(),
                FieldSpec::new("prioridad", "Prioridad", FieldKind::Select),
                FieldSpec::new("descripcion", "Descripción", FieldKind::Textarea).required(),
                FieldSpec::new("acceso_24h", "Acceso 24h", FieldKind::Checkbox),
                FieldSpec::new("hora_inicio", "Hora de inicio", FieldKind::Time).nullable(),
                FieldSpec::new("hora_fin", "Hora de fin", FieldKind::Time).nullable(),
            ],
            groups: Vec::new(),
            doors: Some(DoorSpec {
                key: "puertas".into(),
                predefined: vec![
                    "puerta_principal".into(),
                    "puerta_peatonal".into(),
                    "puerta_garaje".into(),
                    "montacargas".into(),
                ],
            }),
            confirm: None,
        }),
    )
}

fn documentation_step() -> StepDescriptor {
    descriptor(
        StepKey::Documentation,
        "Documentación",
        StepLayout::Documents(DocumentSpec {
            document_types: vec![
                "escrituras".into(),
                "cif_empresa".into(),
                "dni_representante".into(),
                "otros".into(),
            ],
            notes_field: "notas_adicionales".into(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onboarding_catalog_is_numbered_in_order() {
        let catalog = StepCatalog::onboarding();
        assert_eq!(catalog.total(), 6);
        for (idx, step) in catalog.iter().enumerate() {
            assert_eq!(usize::from(step.number), idx + 1);
            assert_eq!(step.key, StepKey::ALL[idx]);
        }
        assert!(catalog.get(0).is_none());
        assert!(catalog.get(7).is_none());
    }

    #[test]
    fn only_documentation_skips_generic_persistence() {
        let catalog = StepCatalog::onboarding();
        let skipped: Vec<_> = catalog
            .iter()
            .filter(|step| !step.persists_generically())
            .map(|step| step.number)
            .collect();
        assert_eq!(skipped, vec![6]);
    }

    #[test]
    fn rename_keeps_existing_names_for_blank_entries() {
        let mut catalog = StepCatalog::onboarding();
        catalog.rename_steps(&["Empresa".into(), "  ".into()]);
        assert_eq!(catalog.get(1).map(|s| s.name.as_str()), Some("Empresa"));
        assert_eq!(
            catalog.get(2).map(|s| s.name.as_str()),
            Some("Información de Trasteros")
        );
    }
}
