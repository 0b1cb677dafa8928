use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(PersonId);
id_newtype!(CourseId);
id_newtype!(EnrollmentId);

/// Record kinds managed by the admin screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Person,
    Course,
    Enrollment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Person, EntityKind::Course, EntityKind::Enrollment];

    /// Path segment of the collection under `/api`.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Person => "pessoas",
            EntityKind::Course => "cursos",
            EntityKind::Enrollment => "matriculas",
        }
    }

    pub fn singular_label(self) -> &'static str {
        match self {
            EntityKind::Person => "person",
            EntityKind::Course => "course",
            EntityKind::Enrollment => "enrollment",
        }
    }

    pub fn plural_label(self) -> &'static str {
        match self {
            EntityKind::Person => "people",
            EntityKind::Course => "courses",
            EntityKind::Enrollment => "enrollments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Ativa,
    Concluida,
    Cancelada,
    /// Any code this client does not know, such as a payment status.
    #[serde(other)]
    Unknown,
}

impl EnrollmentStatus {
    pub const ALL: [EnrollmentStatus; 3] = [
        EnrollmentStatus::Ativa,
        EnrollmentStatus::Concluida,
        EnrollmentStatus::Cancelada,
    ];

    /// Value sent over the wire; `None` for [`EnrollmentStatus::Unknown`].
    pub fn code(self) -> Option<&'static str> {
        match self {
            EnrollmentStatus::Ativa => Some("ATIVA"),
            EnrollmentStatus::Concluida => Some("CONCLUIDA"),
            EnrollmentStatus::Cancelada => Some("CANCELADA"),
            EnrollmentStatus::Unknown => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Ativa => "ATIVA",
            EnrollmentStatus::Concluida => "CONCLUÍDA",
            EnrollmentStatus::Cancelada => "CANCELADA",
            EnrollmentStatus::Unknown => "DESCONHECIDO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == Some(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&PersonId(7)).expect("json"), "7");
        let id: CourseId = serde_json::from_str("42").expect("parse");
        assert_eq!(id, CourseId(42));
    }

    #[test]
    fn enrollment_status_uses_upper_case_codes() {
        let status: EnrollmentStatus = serde_json::from_str("\"CONCLUIDA\"").expect("parse");
        assert_eq!(status, EnrollmentStatus::Concluida);
        assert_eq!(EnrollmentStatus::from_code("CANCELADA"), Some(EnrollmentStatus::Cancelada));
        assert_eq!(EnrollmentStatus::from_code("cancelada"), None);
    }

    #[test]
    fn unrecognized_status_decodes_as_unknown() {
        let status: EnrollmentStatus = serde_json::from_str("\"PENDENTE\"").expect("parse");
        assert_eq!(status, EnrollmentStatus::Unknown);
        assert_eq!(status.code(), None);
        assert_eq!(status.label(), "DESCONHECIDO");
        assert_eq!(EnrollmentStatus::from_code("UNKNOWN"), None);
    }
}
