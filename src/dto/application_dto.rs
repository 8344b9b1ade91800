use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationDetailRow, Stage};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationListQuery {
    pub stage: Option<Stage>,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MoveStagePayload {
    pub stage: Stage,
    #[validate(length(max = 2000))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    pub job_id: Option<Uuid>,
    #[validate(length(max = 5000))]
    pub recruiter_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RejectionPayload {
    #[validate(length(min = 1, message = "rejection_reason is required"))]
    pub rejection_reason: String,
    #[validate(length(min = 1, message = "email_content is required"))]
    pub email_content: String,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectionResponse {
    pub success: bool,
    pub message: String,
    pub application: Application,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub has_resume: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub department: String,
    pub company_name: String,
}

/// Application with the candidate and job it links, as shown on the board.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: Application,
    pub stage_label: &'static str,
    pub candidate: CandidateSummary,
    pub job: JobSummary,
}

impl From<ApplicationDetailRow> for ApplicationView {
    fn from(row: ApplicationDetailRow) -> Self {
        let candidate = CandidateSummary {
            id: row.application.candidate_id,
            full_name: row.candidate_full_name,
            email: row.candidate_email,
            phone: row.candidate_phone,
            city: row.candidate_city,
            state: row.candidate_state,
            has_resume: row.candidate_has_resume,
        };
        let job = JobSummary {
            id: row.application.job_id,
            title: row.job_title,
            department: row.job_department,
            company_name: row.job_company_name,
        };
        Self {
            stage_label: row.application.current_stage.label(),
            application: row.application,
            candidate,
            job,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
    pub stage: Stage,
    pub label: &'static str,
    pub count: usize,
    pub applications: Vec<ApplicationView>,
}

/// Groups applications into one column per stage, in pipeline order.
/// Empty stages still get a column.
pub fn build_board(applications: Vec<ApplicationView>) -> Vec<BoardColumn> {
    let mut columns: Vec<BoardColumn> = Stage::PIPELINE
        .iter()
        .map(|stage| BoardColumn {
            stage: *stage,
            label: stage.label(),
            count: 0,
            applications: Vec::new(),
        })
        .collect();

    for app in applications {
        if let Some(column) = columns
            .iter_mut()
            .find(|c| c.stage == app.application.current_stage)
        {
            column.applications.push(app);
        }
    }
    for column in &mut columns {
        column.count = column.applications.len();
    }
    columns
}
