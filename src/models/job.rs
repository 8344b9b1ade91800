use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Seeded job that collects spontaneous applications when no open posting is chosen.
pub const TALENT_POOL_JOB_ID: Uuid = Uuid::from_u128(1);
pub const TALENT_POOL_JOB_TITLE: &str = "Vaga Geral - Talento";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Draft,
    Open,
    Paused,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "work_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkMode {
    Presencial,
    Hibrido,
    Remoto,
}

/// Full job record, including the confidential `salary_budget`.
/// Only recruiter-facing handlers may serialize this type.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub company_name: String,
    pub description: String,
    pub requirements: String,
    pub city: String,
    pub state: String,
    pub work_mode: WorkMode,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: String,
    pub salary_budget: Option<Decimal>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub application_count: i64,
}

/// Candidate-facing projection. It has no budget field, so a public read
/// path cannot leak it even by accident.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicJob {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub company_name: String,
    pub description: String,
    pub requirements: String,
    pub city: String,
    pub state: String,
    pub work_mode: WorkMode,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub application_count: i64,
}
