use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::dto::application_dto::{
    ApplicationListQuery, ApplicationView, MoveStagePayload, RejectionPayload,
    UpdateApplicationPayload,
};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationDetailRow, Stage, StageHistory};
use crate::services::candidate_service::{insert_note, APPLICATION_COLUMNS};
use crate::services::notification_service::{NotificationService, OutgoingNotice};
use crate::services::rejection_service::{self, RejectionPreview};

const DETAIL_COLUMNS: &str = "a.id, a.candidate_id, a.job_id, a.current_stage, a.previous_stage, \
     a.last_stage_change, a.applied_at, a.recruiter_notes, a.rejection_reason, a.created_at, \
     a.updated_at, c.full_name AS candidate_full_name, c.email AS candidate_email, \
     c.phone AS candidate_phone, c.city AS candidate_city, c.state AS candidate_state, \
     (c.resume_data IS NOT NULL) AS candidate_has_resume, j.title AS job_title, \
     j.department AS job_department, j.company_name AS job_company_name";

const DETAIL_JOINS: &str = "FROM applications a \
     JOIN candidates c ON c.id = a.candidate_id \
     JOIN jobs j ON j.id = a.job_id";

const HISTORY_COLUMNS: &str = "id, application_id, from_stage, to_stage, changed_by, notes, changed_at";

/// Note text recorded on the stage history when a rejection goes through.
pub fn rejection_history_note(reason: &str) -> String {
    format!("Reprovado: {}", reason)
}

pub fn rejection_system_note(job_title: &str, reason: &str) -> String {
    format!("Candidato reprovado na vaga {}. Razão: {}", job_title, reason)
}

/// Rules for a recruiter-initiated move, checked against the locked row.
pub fn check_move(current: Stage, target: Stage) -> Result<()> {
    if target == Stage::Rejected {
        return Err(Error::BadRequest(
            "Use the rejection flow to reject a candidate".into(),
        ));
    }
    if current == target {
        return Err(Error::BadRequest(format!(
            "Application is already in stage {}",
            current
        )));
    }
    Ok(())
}

/// Company shown in candidate-facing text; jobs without one use the
/// configured default.
pub fn company_for(job_company_name: &str, default_company: &str) -> String {
    let trimmed = job_company_name.trim();
    if trimmed.is_empty() {
        default_company.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    pub async fn list(&self, query: ApplicationListQuery) -> Result<Vec<ApplicationView>> {
        let mut filters = Vec::new();
        let mut arg_count = 0;

        if query.stage.is_some() {
            arg_count += 1;
            filters.push(format!("a.current_stage = ${}", arg_count));
        }
        if query.job_id.is_some() {
            arg_count += 1;
            filters.push(format!("a.job_id = ${}", arg_count));
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let sql = format!(
            "SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} {} ORDER BY a.last_stage_change DESC",
            where_clause
        );
        let mut statement = sqlx::query_as::<_, ApplicationDetailRow>(&sql);
        if let Some(stage) = query.stage {
            statement = statement.bind(stage);
        }
        if let Some(job_id) = query.job_id {
            statement = statement.bind(job_id);
        }
        let rows = statement.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ApplicationView::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<ApplicationView> {
        Ok(self.get_detail(id).await?.into())
    }

    async fn get_detail(&self, id: Uuid) -> Result<ApplicationDetailRow> {
        let sql = format!("SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE a.id = $1");
        sqlx::query_as::<_, ApplicationDetailRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".into()))
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<StageHistory>> {
        self.get_detail(id).await?;
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM stage_history WHERE application_id = $1 ORDER BY changed_at ASC"
        );
        let entries = sqlx::query_as::<_, StageHistory>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// Moves an application to another stage and appends exactly one history
    /// entry, both in one transaction.
    pub async fn move_stage(
        &self,
        id: Uuid,
        payload: MoveStagePayload,
        actor: &str,
    ) -> Result<Application> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;
        let current = lock_application(&mut tx, id).await?;
        check_move(current.current_stage, payload.stage)?;

        let note = payload
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let updated = apply_transition(&mut tx, &current, payload.stage, None).await?;
        insert_history(&mut tx, &current, payload.stage, actor, note).await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %id,
            from = %current.current_stage,
            to = %payload.stage,
            actor = %actor,
            "application stage changed"
        );
        Ok(updated)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateApplicationPayload) -> Result<Application> {
        payload.validate()?;
        let current = self.get_detail(id).await?.application;

        if let Some(job_id) = payload.job_id.filter(|j| *j != current.job_id) {
            let job: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM jobs WHERE id = $1")
                .bind(job_id)
                .fetch_optional(&self.pool)
                .await?;
            if job.is_none() {
                return Err(Error::NotFound("Job not found".into()));
            }

            let duplicate: Option<(Uuid,)> = sqlx::query_as(
                "SELECT id FROM applications WHERE candidate_id = $1 AND job_id = $2 AND id <> $3",
            )
            .bind(current.candidate_id)
            .bind(job_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
            if duplicate.is_some() {
                return Err(Error::Conflict(
                    "Candidate already has an application for this job".into(),
                ));
            }
        }

        let sql = format!(
            r#"
            UPDATE applications
            SET
                job_id = COALESCE($2, job_id),
                recruiter_notes = COALESCE($3, recruiter_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(payload.job_id)
            .bind(payload.recruiter_notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(application)
    }

    pub async fn rejection_preview(&self, id: Uuid, default_company: &str) -> Result<RejectionPreview> {
        let detail = self.get_detail(id).await?;
        Ok(rejection_service::build_preview(
            &detail.candidate_full_name,
            &detail.candidate_email,
            &detail.job_title,
            &company_for(&detail.job_company_name, default_company),
        ))
    }

    /// Rejects an application once the submitted notice passes the
    /// checklist. Stage, history, system note and notification log commit
    /// together or not at all.
    pub async fn reject(
        &self,
        id: Uuid,
        payload: RejectionPayload,
        actor: &str,
        default_company: &str,
    ) -> Result<Application> {
        payload.validate()?;
        let reason = payload.rejection_reason.trim();
        if reason.is_empty() {
            return Err(Error::BadRequest("rejection_reason is required".into()));
        }

        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {DETAIL_COLUMNS} {DETAIL_JOINS} WHERE a.id = $1 FOR UPDATE OF a");
        let detail = sqlx::query_as::<_, ApplicationDetailRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| Error::NotFound("Application not found".into()))?;

        if detail.application.current_stage == Stage::Rejected {
            return Err(Error::Conflict("Application is already rejected".into()));
        }

        let checklist = rejection_service::check_notice(
            &payload.email_content,
            &detail.candidate_full_name,
            &detail.job_title,
            &detail.candidate_email,
        );
        if !checklist.passed() {
            tracing::warn!(
                application_id = %id,
                candidate_name_match = checklist.candidate_name_match,
                job_title_match = checklist.job_title_match,
                "rejection blocked by checklist"
            );
            return Err(Error::RejectionChecklist(checklist));
        }

        let current = &detail.application;
        let updated = apply_transition(&mut tx, current, Stage::Rejected, Some(reason)).await?;
        insert_history(
            &mut tx,
            current,
            Stage::Rejected,
            actor,
            Some(&rejection_history_note(reason)),
        )
        .await?;
        insert_note(
            &mut tx,
            current.candidate_id,
            Some(current.id),
            &rejection_system_note(&detail.job_title, reason),
            "system",
        )
        .await?;

        if checklist.email_active {
            let company = company_for(&detail.job_company_name, default_company);
            let subject = rejection_service::notice_subject(&detail.job_title, &company);
            self.notifications
                .record(
                    &mut tx,
                    OutgoingNotice {
                        application_id: current.id,
                        recipient: &detail.candidate_email,
                        subject: &subject,
                        body: &payload.email_content,
                        scheduled_for: payload.scheduled_for,
                    },
                )
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            application_id = %id,
            from = %current.current_stage,
            actor = %actor,
            "application rejected"
        );
        Ok(updated)
    }
}

async fn lock_application(conn: &mut PgConnection, id: Uuid) -> Result<Application> {
    let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Application>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".into()))
}

async fn apply_transition(
    conn: &mut PgConnection,
    current: &Application,
    target: Stage,
    rejection_reason: Option<&str>,
) -> Result<Application> {
    let sql = format!(
        r#"
        UPDATE applications
        SET
            previous_stage = current_stage,
            current_stage = $2,
            rejection_reason = COALESCE($3, rejection_reason),
            last_stage_change = NOW(),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    let application = sqlx::query_as::<_, Application>(&sql)
        .bind(current.id)
        .bind(target)
        .bind(rejection_reason)
        .fetch_one(&mut *conn)
        .await?;
    Ok(application)
}

async fn insert_history(
    conn: &mut PgConnection,
    current: &Application,
    target: Stage,
    actor: &str,
    notes: Option<&str>,
) -> Result<StageHistory> {
    let sql = format!(
        r#"
        INSERT INTO stage_history (application_id, from_stage, to_stage, changed_by, notes)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {HISTORY_COLUMNS}
        "#
    );
    let entry = sqlx::query_as::<_, StageHistory>(&sql)
        .bind(current.id)
        .bind(current.current_stage)
        .bind(target)
        .bind(actor)
        .bind(notes)
        .fetch_one(&mut *conn)
        .await?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_move_cannot_reject_or_stay() {
        assert!(matches!(
            check_move(Stage::Screening, Stage::Rejected),
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            check_move(Stage::Screening, Stage::Screening),
            Err(Error::BadRequest(_))
        ));
        assert!(check_move(Stage::Screening, Stage::HrInterview).is_ok());
        assert!(check_move(Stage::Rejected, Stage::TalentPool).is_ok());
    }

    #[test]
    fn rejection_notes_carry_reason_and_job() {
        assert_eq!(
            rejection_history_note("Perfil júnior"),
            "Reprovado: Perfil júnior"
        );
        assert_eq!(
            rejection_system_note("Analista de Dados", "Perfil júnior"),
            "Candidato reprovado na vaga Analista de Dados. Razão: Perfil júnior"
        );
    }

    #[test]
    fn blank_job_company_falls_back_to_default() {
        assert_eq!(company_for("  ", "Talento"), "Talento");
        assert_eq!(company_for("Acme", "Talento"), "Acme");
    }
}
