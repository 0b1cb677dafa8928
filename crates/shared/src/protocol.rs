use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{CourseId, EnrollmentId, EnrollmentStatus, PersonId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(rename = "nome", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "cpf", default, deserialize_with = "null_as_default")]
    pub document_id: String,
    #[serde(rename = "dataNascimento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefone", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(rename = "nome", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "descricao", default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "valor", default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(rename = "cargaHoraria", default, deserialize_with = "null_as_default")]
    pub workload_hours: i32,
    #[serde(rename = "ativo", default, deserialize_with = "null_as_default")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    #[serde(rename = "pessoa", default, skip_serializing_if = "Option::is_none")]
    pub person: Option<Person>,
    #[serde(rename = "curso", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<Course>,
    #[serde(rename = "dataMatricula", default, skip_serializing_if = "Option::is_none")]
    pub enrolled_on: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: EnrollmentStatus,
    #[serde(rename = "valorPago", default, deserialize_with = "null_as_default")]
    pub amount_paid: f64,
}

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregate counters shown on the home screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_people: usize,
    pub total_courses: usize,
    pub active_courses: usize,
    pub total_enrollments: usize,
}
