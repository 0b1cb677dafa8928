use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Number, Value};

use crate::{
    entity::{Entity, FieldKind, FieldSpec},
    error::ValidationError,
};

/// A form input as the widget holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftValue {
    Text(String),
    Flag(bool),
}

impl DraftValue {
    pub fn text(value: impl Into<String>) -> Self {
        DraftValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            DraftValue::Text(value) => Some(value),
            DraftValue::Flag(_) => None,
        }
    }
}

impl From<&str> for DraftValue {
    fn from(value: &str) -> Self {
        DraftValue::Text(value.to_string())
    }
}

impl From<String> for DraftValue {
    fn from(value: String) -> Self {
        DraftValue::Text(value)
    }
}

impl From<bool> for DraftValue {
    fn from(value: bool) -> Self {
        DraftValue::Flag(value)
    }
}

/// In-progress record bound to the open dialog.
///
/// `editing` is `None` in create mode and holds the target record id in edit
/// mode. Keys are the wire names declared by the entity's form schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDraft {
    editing: Option<i64>,
    fields: &'static [FieldSpec],
    values: BTreeMap<&'static str, DraftValue>,
}

impl FormDraft {
    pub fn for_create<E: Entity>() -> Self {
        let fields = E::form_fields();
        Self {
            editing: None,
            fields,
            values: fields
                .iter()
                .map(|field| (field.name, field.default_draft_value()))
                .collect(),
        }
    }

    pub fn for_edit<E: Entity>(record: &E) -> Self {
        let mut draft = Self::for_create::<E>();
        draft.editing = Some(record.id());
        for (name, value) in record.draft_values() {
            draft.values.insert(name, value);
        }
        draft
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn is_create(&self) -> bool {
        self.editing.is_none()
    }

    pub fn get(&self, name: &str) -> Option<&DraftValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DraftValue::as_text)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Stores an input value. Text given to a switch is parsed as a boolean and
    /// a boolean given to a text input is stored as `true`/`false`.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<DraftValue>,
    ) -> Result<(), ValidationError> {
        let fields = self.fields;
        let field = fields
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| ValidationError::UnknownField {
                field: name.to_string(),
            })?;

        let value = match (field.kind.is_flag(), value.into()) {
            (true, DraftValue::Text(raw)) => DraftValue::Flag(parse_flag(field.name, &raw)?),
            (false, DraftValue::Flag(flag)) => DraftValue::Text(flag.to_string()),
            (_, value) => value,
        };
        self.values.insert(field.name, value);
        Ok(())
    }

    /// Checks required fields and builds the JSON body sent to the endpoint.
    ///
    /// Numbers are cast to JSON numbers, dates stay ISO strings and blank
    /// optional inputs become `null`.
    pub fn to_payload(&self) -> Result<Value, ValidationError> {
        let mut body = Map::with_capacity(self.fields.len());
        for field in self.fields {
            let value = self
                .values
                .get(field.name)
                .cloned()
                .unwrap_or_else(|| field.default_draft_value());
            body.insert(field.name.to_string(), encode_field(field, value)?);
        }
        Ok(Value::Object(body))
    }
}

fn encode_field(field: &FieldSpec, value: DraftValue) -> Result<Value, ValidationError> {
    let raw = match value {
        DraftValue::Flag(flag) => return Ok(Value::Bool(flag)),
        DraftValue::Text(raw) => raw,
    };
    let trimmed = raw.trim();
    // Free text is blank only when empty; typed inputs cannot hold bare spaces.
    let blank = match field.kind {
        FieldKind::Text => raw.is_empty(),
        _ => trimmed.is_empty(),
    };
    if blank {
        if field.required {
            return Err(ValidationError::MissingField { field: field.name });
        }
        return Ok(Value::Null);
    }

    match field.kind {
        FieldKind::Text => Ok(Value::String(raw)),
        FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .map_err(|_| ValidationError::InvalidDate {
                field: field.name,
                value: raw.clone(),
            }),
        FieldKind::Decimal => trimmed
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::InvalidNumber {
                field: field.name,
                value: raw.clone(),
            }),
        FieldKind::Integer | FieldKind::Reference(_) => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ValidationError::InvalidNumber {
                field: field.name,
                value: raw.clone(),
            }),
        FieldKind::Choice(allowed) => {
            if allowed.iter().any(|choice| *choice == trimmed) {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(ValidationError::InvalidChoice {
                    field: field.name,
                    value: raw.clone(),
                    allowed,
                })
            }
        }
        FieldKind::Flag => parse_flag(field.name, trimmed).map(Value::Bool),
    }
}

fn parse_flag(field: &'static str, raw: &str) -> Result<bool, ValidationError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidFlag {
            field,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::{
        domain::CourseId,
        protocol::{Course, Enrollment, Person},
    };

    use super::*;

    #[test]
    fn create_draft_starts_from_schema_defaults() {
        let draft = FormDraft::for_create::<Course>();
        assert!(draft.is_create());
        assert_eq!(draft.text("nome"), Some(""));
        assert_eq!(draft.get("ativo"), Some(&DraftValue::Flag(true)));

        let draft = FormDraft::for_create::<Enrollment>();
        assert_eq!(draft.text("status"), Some("ATIVA"));
        assert_eq!(draft.text("valorPago"), Some("0"));
    }

    #[test]
    fn edit_draft_copies_record_and_target() {
        let course = Course {
            id: CourseId(8),
            name: "Piano".into(),
            description: "Avançado".into(),
            price: 320.5,
            workload_hours: 30,
            active: false,
        };
        let draft = FormDraft::for_edit(&course);
        assert_eq!(draft.editing(), Some(8));
        assert_eq!(draft.text("valor"), Some("320.5"));
        assert_eq!(draft.get("ativo"), Some(&DraftValue::Flag(false)));
    }

    #[test]
    fn payload_casts_numbers_and_keeps_dates() {
        let mut draft = FormDraft::for_create::<Course>();
        draft.set("nome", "Canto").expect("nome");
        draft.set("descricao", "Técnica vocal").expect("descricao");
        draft.set("valor", "199,90").expect("valor");
        draft.set("cargaHoraria", " 24 ").expect("carga");
        draft.set("ativo", "false").expect("ativo");

        assert_eq!(
            draft.to_payload().expect("payload"),
            json!({
                "nome": "Canto",
                "descricao": "Técnica vocal",
                "valor": 199.9,
                "cargaHoraria": 24,
                "ativo": false
            })
        );

        let mut draft = FormDraft::for_create::<Person>();
        draft.set("nome", "Ana").expect("nome");
        draft.set("cpf", "111").expect("cpf");
        draft.set("dataNascimento", "2000-01-31").expect("date");
        let payload = draft.to_payload().expect("payload");
        assert_eq!(payload["dataNascimento"], json!("2000-01-31"));
        assert_eq!(payload["email"], Value::Null);
    }

    #[test]
    fn required_blank_fields_are_rejected() {
        let mut draft = FormDraft::for_create::<Person>();
        draft.set("cpf", "111").expect("cpf");
        draft.set("nome", "").expect("nome");
        assert_eq!(
            draft.to_payload(),
            Err(ValidationError::MissingField { field: "nome" })
        );
    }

    #[test]
    fn whitespace_text_counts_as_filled() {
        let mut draft = FormDraft::for_create::<Person>();
        draft.set("nome", "   ").expect("nome");
        draft.set("cpf", "111").expect("cpf");
        draft.set("email", " ").expect("email");
        let payload = draft.to_payload().expect("payload");
        assert_eq!(payload["nome"], json!("   "));
        assert_eq!(payload["email"], json!(" "));
        assert_eq!(payload["telefone"], Value::Null);

        let mut draft = FormDraft::for_create::<Course>();
        for (field, value) in [("nome", "Canto"), ("descricao", "Coral"), ("valor", "  ")] {
            draft.set(field, value).expect("set");
        }
        draft.set("cargaHoraria", "10").expect("carga");
        assert_eq!(
            draft.to_payload(),
            Err(ValidationError::MissingField { field: "valor" })
        );
    }

    #[test]
    fn malformed_inputs_name_the_field() {
        let mut draft = FormDraft::for_create::<Enrollment>();
        draft.set("pessoaId", "1").expect("pessoa");
        draft.set("cursoId", "dois").expect("curso");
        let err = draft.to_payload().expect_err("must fail");
        assert_eq!(err.field(), "cursoId");

        draft.set("cursoId", "2").expect("curso");
        draft.set("status", "PAUSADA").expect("status");
        assert!(matches!(
            draft.to_payload(),
            Err(ValidationError::InvalidChoice { field: "status", .. })
        ));

        draft.set("status", "CONCLUIDA").expect("status");
        draft.set("dataMatricula", "31/01/2024").expect("date");
        assert!(matches!(
            draft.to_payload(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn unknown_fields_and_bad_flags_are_rejected_on_set() {
        let mut draft = FormDraft::for_create::<Course>();
        assert!(matches!(
            draft.set("preco", "10"),
            Err(ValidationError::UnknownField { .. })
        ));
        assert!(matches!(
            draft.set("ativo", "talvez"),
            Err(ValidationError::InvalidFlag { .. })
        ));
    }
}
