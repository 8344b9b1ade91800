use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_stage", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Applied,
    Screening,
    HrInterview,
    TechnicalInterview,
    ProposalSent,
    Hired,
    Rejected,
    TalentPool,
}

impl Stage {
    /// Board column order.
    pub const PIPELINE: [Stage; 8] = [
        Stage::Applied,
        Stage::Screening,
        Stage::HrInterview,
        Stage::TechnicalInterview,
        Stage::ProposalSent,
        Stage::Hired,
        Stage::Rejected,
        Stage::TalentPool,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Applied => "APPLIED",
            Stage::Screening => "SCREENING",
            Stage::HrInterview => "HR_INTERVIEW",
            Stage::TechnicalInterview => "TECHNICAL_INTERVIEW",
            Stage::ProposalSent => "PROPOSAL_SENT",
            Stage::Hired => "HIRED",
            Stage::Rejected => "REJECTED",
            Stage::TalentPool => "TALENT_POOL",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Applied => "Inscrito",
            Stage::Screening => "Triagem",
            Stage::HrInterview => "Entrevista RH",
            Stage::TechnicalInterview => "Entrevista Técnica",
            Stage::ProposalSent => "Proposta Enviada",
            Stage::Hired => "Contratado",
            Stage::Rejected => "Reprovado",
            Stage::TalentPool => "Banco de Talentos",
        }
    }

    /// Still moving through the pipeline (not closed out).
    pub fn is_active(self) -> bool {
        !matches!(self, Stage::Hired | Stage::Rejected | Stage::TalentPool)
    }

    pub fn is_interview(self) -> bool {
        matches!(self, Stage::HrInterview | Stage::TechnicalInterview)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub current_stage: Stage,
    pub previous_stage: Option<Stage>,
    pub last_stage_change: DateTime<Utc>,
    pub applied_at: DateTime<Utc>,
    pub recruiter_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable audit record of one stage transition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageHistory {
    pub id: Uuid,
    pub application_id: Uuid,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub changed_by: String,
    pub notes: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Flat row of an application joined with its candidate and job.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationDetailRow {
    #[sqlx(flatten)]
    pub application: Application,
    pub candidate_full_name: String,
    pub candidate_email: String,
    pub candidate_phone: String,
    pub candidate_city: Option<String>,
    pub candidate_state: Option<String>,
    pub candidate_has_resume: bool,
    pub job_title: String,
    pub job_department: String,
    pub job_company_name: String,
}
