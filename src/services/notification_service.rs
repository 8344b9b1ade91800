use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::notification_log::NotificationLog;

pub const STATUS_SIMULATED: &str = "SIMULATED";
pub const STATUS_SCHEDULED: &str = "SCHEDULED";

const LOG_COLUMNS: &str =
    "id, application_id, recipient, subject, body, status, scheduled_for, created_at";

/// Outgoing candidate notices. Nothing is actually sent: every notice is
/// written to `notification_logs` and traced.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

pub struct OutgoingNotice<'a> {
    pub application_id: Uuid,
    pub recipient: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub scheduled_for: Option<DateTime<Utc>>,
}

pub fn delivery_status(scheduled_for: Option<DateTime<Utc>>, now: DateTime<Utc>) -> &'static str {
    match scheduled_for {
        Some(at) if at > now => STATUS_SCHEDULED,
        _ => STATUS_SIMULATED,
    }
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records the notice on the caller's connection so it commits or rolls
    /// back together with the state change that triggered it.
    pub async fn record(
        &self,
        conn: &mut PgConnection,
        notice: OutgoingNotice<'_>,
    ) -> Result<NotificationLog> {
        let status = delivery_status(notice.scheduled_for, Utc::now());
        let query = format!(
            r#"
            INSERT INTO notification_logs (application_id, recipient, subject, body, status, scheduled_for)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {LOG_COLUMNS}
            "#
        );
        let log = sqlx::query_as::<_, NotificationLog>(&query)
            .bind(notice.application_id)
            .bind(notice.recipient)
            .bind(notice.subject)
            .bind(notice.body)
            .bind(status)
            .bind(notice.scheduled_for)
            .fetch_one(&mut *conn)
            .await?;

        tracing::info!(
            application_id = %log.application_id,
            recipient = %log.recipient,
            subject = %log.subject,
            status = %log.status,
            scheduled_for = ?log.scheduled_for,
            "notification email simulated"
        );
        Ok(log)
    }

    pub async fn list_for_application(&self, application_id: Uuid) -> Result<Vec<NotificationLog>> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM notification_logs WHERE application_id = $1 ORDER BY created_at DESC"
        );
        let logs = sqlx::query_as::<_, NotificationLog>(&query)
            .bind(application_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(logs)
    }
}
