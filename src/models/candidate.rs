use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::application::Application;

/// Column list shared by every candidate read. Résumé bytes are never
/// selected here; `has_resume` stands in for them.
pub const CANDIDATE_COLUMNS: &str = "id, full_name, cpf, email, phone, cep, street, address_number, \
     complement, neighborhood, city, state, country, linkedin_url, portfolio_url, \
     resume_content_type, resume_file_name, (resume_data IS NOT NULL) AS has_resume, \
     consent_at, consent_ip, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub cpf: String,
    pub email: String,
    pub phone: String,
    pub cep: Option<String>,
    pub street: Option<String>,
    pub address_number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_content_type: Option<String>,
    pub resume_file_name: Option<String>,
    pub has_resume: bool,
    pub consent_at: Option<DateTime<Utc>>,
    pub consent_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or("")
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateWithApplications {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub applications: Vec<Application>,
}

/// Stored résumé blob.
#[derive(Debug, Clone, FromRow)]
pub struct ResumeFile {
    pub full_name: String,
    pub resume_data: Vec<u8>,
    pub resume_content_type: Option<String>,
}

/// Validated upload, ready to persist.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: bytes::Bytes,
}
