use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::dto::report_dto::{PipelineReport, StageCount};
use crate::error::Result;
use crate::models::application::{Application, Stage};
use crate::services::candidate_service::APPLICATION_COLUMNS;
use crate::utils::time::{days_between, round1};

/// Pipeline figures computed over every application at `now`.
pub fn summarize(applications: &[Application], now: DateTime<Utc>) -> PipelineReport {
    let total = applications.len();
    let today = now.date_naive();

    let active: Vec<&Application> = applications
        .iter()
        .filter(|a| a.current_stage.is_active())
        .collect();
    let count_in = |stage: Stage| {
        applications
            .iter()
            .filter(|a| a.current_stage == stage)
            .count()
    };

    let average_days_open = if active.is_empty() {
        0.0
    } else {
        let total_days: f64 = active.iter().map(|a| days_between(a.applied_at, now)).sum();
        round1(total_days / active.len() as f64)
    };

    let hired = count_in(Stage::Hired);
    let conversion_rate = if total == 0 {
        0.0
    } else {
        round1(hired as f64 / total as f64 * 100.0)
    };

    PipelineReport {
        total_applications: total,
        active_applications: active.len(),
        new_today: applications
            .iter()
            .filter(|a| a.applied_at.date_naive() == today)
            .count(),
        in_interview: applications
            .iter()
            .filter(|a| a.current_stage.is_interview())
            .count(),
        hired,
        rejected: count_in(Stage::Rejected),
        average_days_open,
        conversion_rate,
        by_stage: Stage::PIPELINE
            .iter()
            .map(|stage| StageCount {
                stage: *stage,
                label: stage.label(),
                count: count_in(*stage),
            })
            .collect(),
    }
}

#[derive(Clone)]
pub struct ReportService {
    pool: PgPool,
}

impl ReportService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn summary(&self) -> Result<PipelineReport> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications");
        let applications = sqlx::query_as::<_, Application>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(summarize(&applications, Utc::now()))
    }
}
