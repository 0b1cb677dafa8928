//! Per-kind description of a managed record: form schema, search fields and
//! table columns.
//!
//! [`EntityScreen`](crate::screen::EntityScreen) is generic over [`Entity`];
//! everything a screen needs to know about a record kind lives here.

use serde::de::DeserializeOwned;
use shared::{
    domain::EntityKind,
    format::{format_active, format_brl, format_hours, format_optional_date},
    protocol::{Course, Enrollment, Person},
};

use crate::draft::DraftValue;

const ENROLLMENT_STATUS_CODES: &[&str] = &["ATIVA", "CONCLUIDA", "CANCELADA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// ISO `yyyy-mm-dd`, sent as a string.
    Date,
    Decimal,
    Integer,
    /// Integer id of a record in another collection.
    Reference(EntityKind),
    Choice(&'static [&'static str]),
    Flag,
}

impl FieldKind {
    pub fn is_flag(self) -> bool {
        matches!(self, FieldKind::Flag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Wire name; also the draft key.
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Initial input text; `"true"`/`"false"` for flags.
    pub default: &'static str,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: "",
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn default_value(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }

    pub fn default_draft_value(&self) -> DraftValue {
        match self.kind {
            FieldKind::Flag => DraftValue::Flag(self.default == "true"),
            _ => DraftValue::Text(self.default.to_string()),
        }
    }
}

pub trait Entity: Clone + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> i64;

    fn form_fields() -> &'static [FieldSpec];

    /// Current values of the editable fields, keyed by wire name.
    fn draft_values(&self) -> Vec<(&'static str, DraftValue)>;

    /// Values matched by the client-side search box.
    fn search_fields(&self) -> Vec<&str>;

    fn columns() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;

    fn display_name(&self) -> String;

    fn form_field(name: &str) -> Option<&'static FieldSpec> {
        Self::form_fields().iter().find(|field| field.name == name)
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    fn matches_lowercase(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|value| value.to_lowercase().contains(needle))
    }
}

static PERSON_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("nome", "Nome", FieldKind::Text).required(),
    FieldSpec::new("cpf", "CPF", FieldKind::Text).required(),
    FieldSpec::new("dataNascimento", "Data de Nascimento", FieldKind::Date),
    FieldSpec::new("email", "Email", FieldKind::Text),
    FieldSpec::new("telefone", "Telefone", FieldKind::Text),
];

impl Entity for Person {
    const KIND: EntityKind = EntityKind::Person;

    fn id(&self) -> i64 {
        self.id.0
    }

    fn form_fields() -> &'static [FieldSpec] {
        &PERSON_FIELDS
    }

    fn draft_values(&self) -> Vec<(&'static str, DraftValue)> {
        vec![
            ("nome", DraftValue::text(&self.name)),
            ("cpf", DraftValue::text(&self.document_id)),
            (
                "dataNascimento",
                DraftValue::Text(self.birth_date.map(|d| d.to_string()).unwrap_or_default()),
            ),
            ("email", DraftValue::text(self.email.as_deref().unwrap_or_default())),
            ("telefone", DraftValue::text(self.phone.as_deref().unwrap_or_default())),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.document_id.as_str()]
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "Nome", "CPF", "Data de Nascimento", "Email", "Telefone"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.document_id.clone(),
            format_optional_date(self.birth_date),
            self.email.clone().unwrap_or_default(),
            self.phone.clone().unwrap_or_default(),
        ]
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

static COURSE_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("nome", "Nome", FieldKind::Text).required(),
    FieldSpec::new("descricao", "Descrição", FieldKind::Text).required(),
    FieldSpec::new("valor", "Valor (R$)", FieldKind::Decimal).required(),
    FieldSpec::new("cargaHoraria", "Carga Horária", FieldKind::Integer).required(),
    FieldSpec::new("ativo", "Ativo", FieldKind::Flag).default_value("true"),
];

impl Entity for Course {
    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> i64 {
        self.id.0
    }

    fn form_fields() -> &'static [FieldSpec] {
        &COURSE_FIELDS
    }

    fn draft_values(&self) -> Vec<(&'static str, DraftValue)> {
        vec![
            ("nome", DraftValue::text(&self.name)),
            ("descricao", DraftValue::text(&self.description)),
            ("valor", DraftValue::Text(self.price.to_string())),
            ("cargaHoraria", DraftValue::Text(self.workload_hours.to_string())),
            ("ativo", DraftValue::Flag(self.active)),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "Nome", "Descrição", "Valor", "Carga Horária", "Status"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.description.clone(),
            format_brl(self.price),
            format_hours(self.workload_hours),
            format_active(self.active).to_string(),
        ]
    }

    fn display_name(&self) -> String {
        self.name.clone()
    }
}

static ENROLLMENT_FIELDS: [FieldSpec; 5] = [
    FieldSpec::new("pessoaId", "Pessoa", FieldKind::Reference(EntityKind::Person)).required(),
    FieldSpec::new("cursoId", "Curso", FieldKind::Reference(EntityKind::Course)).required(),
    FieldSpec::new("dataMatricula", "Data da Matrícula", FieldKind::Date),
    FieldSpec::new("status", "Status", FieldKind::Choice(ENROLLMENT_STATUS_CODES))
        .required()
        .default_value("ATIVA"),
    FieldSpec::new("valorPago", "Valor Pago", FieldKind::Decimal).default_value("0"),
];

impl Entity for Enrollment {
    const KIND: EntityKind = EntityKind::Enrollment;

    fn id(&self) -> i64 {
        self.id.0
    }

    fn form_fields() -> &'static [FieldSpec] {
        &ENROLLMENT_FIELDS
    }

    fn draft_values(&self) -> Vec<(&'static str, DraftValue)> {
        vec![
            (
                "pessoaId",
                DraftValue::Text(self.person.as_ref().map(|p| p.id.to_string()).unwrap_or_default()),
            ),
            (
                "cursoId",
                DraftValue::Text(self.course.as_ref().map(|c| c.id.to_string()).unwrap_or_default()),
            ),
            (
                "dataMatricula",
                DraftValue::Text(self.enrolled_on.map(|d| d.to_string()).unwrap_or_default()),
            ),
            ("status", DraftValue::text(self.status.code().unwrap_or_default())),
            ("valorPago", DraftValue::Text(self.amount_paid.to_string())),
        ]
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = Vec::with_capacity(2);
        if let Some(person) = &self.person {
            fields.push(person.name.as_str());
        }
        if let Some(course) = &self.course {
            fields.push(course.name.as_str());
        }
        fields
    }

    fn columns() -> &'static [&'static str] {
        &["ID", "Pessoa", "Curso", "Data da Matrícula", "Status", "Valor Pago"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.person
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |p| p.name.clone()),
            self.course
                .as_ref()
                .map_or_else(|| "N/A".to_string(), |c| c.name.clone()),
            format_optional_date(self.enrolled_on),
            self.status.label().to_string(),
            format_brl(self.amount_paid),
        ]
    }

    fn display_name(&self) -> String {
        match (&self.person, &self.course) {
            (Some(person), Some(course)) => format!("{} / {}", person.name, course.name),
            _ => format!("#{}", self.id),
        }
    }
}
