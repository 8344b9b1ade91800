use std::collections::HashMap;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use validator::Validate;

use crate::dto::candidate_dto::{CreateNotePayload, IntakeForm, UpdateCandidatePayload};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::candidate::{
    Candidate, CandidateWithApplications, ResumeFile, ResumeUpload, CANDIDATE_COLUMNS,
};
use crate::models::job::{JobStatus, TALENT_POOL_JOB_ID};
use crate::models::note::Note;
use crate::utils::{cpf, masking};

pub const APPLICATION_COLUMNS: &str = "id, candidate_id, job_id, current_stage, previous_stage, \
     last_stage_change, applied_at, recruiter_notes, rejection_reason, created_at, updated_at";

const NOTE_COLUMNS: &str = "id, candidate_id, application_id, content, created_by, created_at";

/// Everything the public form submits, already decoded from multipart.
pub struct IntakeRequest {
    pub form: IntakeForm,
    pub resume: Option<ResumeUpload>,
    pub client_ip: Option<String>,
}

#[derive(Debug)]
pub struct IntakeOutcome {
    pub candidate: Candidate,
    pub application: Application,
    pub created: bool,
}

/// Whether the resubmitter knows the contact data on file. Either the email
/// (case-insensitive) or the phone digits must match.
pub fn challenge_passes(
    stored_email: &str,
    stored_phone: &str,
    confirm_email: Option<&str>,
    confirm_phone: Option<&str>,
) -> bool {
    let email_ok = confirm_email
        .map(|given| {
            let given = given.trim().to_lowercase();
            let stored = stored_email.trim().to_lowercase();
            !given.is_empty() && bool::from(given.as_bytes().ct_eq(stored.as_bytes()))
        })
        .unwrap_or(false);

    let phone_ok = confirm_phone
        .map(|given| {
            let given = masking::digits_only(given);
            let stored = masking::digits_only(stored_phone);
            !given.is_empty() && bool::from(given.as_bytes().ct_eq(stored.as_bytes()))
        })
        .unwrap_or(false);

    email_ok | phone_ok
}

#[derive(Clone)]
pub struct CandidateService {
    pool: PgPool,
}

impl CandidateService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_candidate(&self, id: Uuid) -> Result<Candidate> {
        let query = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE id = $1");
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".into()))
    }

    pub async fn find_by_cpf(&self, raw_cpf: &str) -> Result<Option<Candidate>> {
        let digits = cpf::parse(raw_cpf).ok_or_else(|| Error::BadRequest("Invalid CPF".into()))?;
        let query = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE cpf = $1");
        let candidate = sqlx::query_as::<_, Candidate>(&query)
            .bind(digits)
            .fetch_optional(&self.pool)
            .await?;
        Ok(candidate)
    }

    pub async fn list_candidates(&self) -> Result<Vec<CandidateWithApplications>> {
        let query = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates ORDER BY created_at DESC");
        let candidates = sqlx::query_as::<_, Candidate>(&query)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let apps_query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE candidate_id = ANY($1) ORDER BY applied_at DESC"
        );
        let applications = sqlx::query_as::<_, Application>(&apps_query)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;

        let mut by_candidate: HashMap<Uuid, Vec<Application>> = HashMap::new();
        for app in applications {
            by_candidate.entry(app.candidate_id).or_default().push(app);
        }

        Ok(candidates
            .into_iter()
            .map(|candidate| CandidateWithApplications {
                applications: by_candidate.remove(&candidate.id).unwrap_or_default(),
                candidate,
            })
            .collect())
    }

    pub async fn get_with_applications(&self, id: Uuid) -> Result<CandidateWithApplications> {
        let candidate = self.get_candidate(id).await?;
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE candidate_id = $1 ORDER BY applied_at DESC"
        );
        let applications = sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(CandidateWithApplications {
            candidate,
            applications,
        })
    }

    /// Public intake. A new CPF creates candidate and application; a known
    /// CPF must pass the identity challenge before anything is written.
    pub async fn intake(&self, request: IntakeRequest) -> Result<IntakeOutcome> {
        let IntakeRequest {
            form,
            resume,
            client_ip,
        } = request;

        form.validate()?;
        if !form.lgpd_consent {
            return Err(Error::BadRequest(
                "LGPD consent is required to submit an application".into(),
            ));
        }
        let cpf_digits =
            cpf::parse(&form.cpf).ok_or_else(|| Error::BadRequest("Invalid CPF".into()))?;

        let mut tx = self.pool.begin().await?;
        let job_id = resolve_job(&mut tx, &form).await?;

        let query = format!("SELECT {CANDIDATE_COLUMNS} FROM candidates WHERE cpf = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, Candidate>(&query)
            .bind(&cpf_digits)
            .fetch_optional(&mut *tx)
            .await?;

        let outcome = match existing {
            None => {
                let candidate =
                    insert_candidate(&mut tx, &form, &cpf_digits, resume.as_ref(), client_ip.as_deref())
                        .await?;
                let application = insert_application(&mut tx, candidate.id, job_id).await?;
                IntakeOutcome {
                    candidate,
                    application,
                    created: true,
                }
            }
            Some(current) => {
                if !challenge_passes(
                    &current.email,
                    &current.phone,
                    form.confirm_email.as_deref(),
                    form.confirm_phone.as_deref(),
                ) {
                    tracing::warn!(candidate_id = %current.id, "intake blocked by identity challenge");
                    return Err(Error::IdentityChallenge {
                        masked_email: masking::mask_email(&current.email),
                        masked_phone: masking::mask_phone(&current.phone),
                    });
                }
                let candidate = refresh_candidate(
                    &mut tx,
                    current.id,
                    &form,
                    resume.as_ref(),
                    client_ip.as_deref(),
                )
                .await?;
                let application = find_or_insert_application(&mut tx, candidate.id, job_id).await?;
                IntakeOutcome {
                    candidate,
                    application,
                    created: false,
                }
            }
        };

        tx.commit().await?;
        tracing::info!(
            candidate_id = %outcome.candidate.id,
            application_id = %outcome.application.id,
            job_id = %job_id,
            created = outcome.created,
            "candidate intake completed"
        );
        Ok(outcome)
    }

    pub async fn update_candidate(&self, id: Uuid, payload: UpdateCandidatePayload) -> Result<Candidate> {
        payload.validate()?;
        let cpf_digits = match payload.cpf.as_deref() {
            Some(raw) => {
                Some(cpf::parse(raw).ok_or_else(|| Error::BadRequest("Invalid CPF".into()))?)
            }
            None => None,
        };

        let query = format!(
            r#"
            UPDATE candidates
            SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                cpf = COALESCE($5, cpf),
                cep = COALESCE($6, cep),
                street = COALESCE($7, street),
                address_number = COALESCE($8, address_number),
                complement = COALESCE($9, complement),
                neighborhood = COALESCE($10, neighborhood),
                city = COALESCE($11, city),
                state = COALESCE($12, state),
                country = COALESCE($13, country),
                linkedin_url = COALESCE($14, linkedin_url),
                portfolio_url = COALESCE($15, portfolio_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CANDIDATE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(payload.full_name.map(|v| v.trim().to_string()))
            .bind(payload.email.map(|v| v.trim().to_lowercase()))
            .bind(payload.phone)
            .bind(cpf_digits)
            .bind(payload.cep.map(|v| masking::digits_only(&v)))
            .bind(payload.street)
            .bind(payload.address_number)
            .bind(payload.complement)
            .bind(payload.neighborhood)
            .bind(payload.city)
            .bind(payload.state.map(|v| v.to_uppercase()))
            .bind(payload.country)
            .bind(payload.linkedin_url)
            .bind(payload.portfolio_url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".into()))
    }

    pub async fn get_resume(&self, id: Uuid) -> Result<ResumeFile> {
        self.get_candidate(id).await?;
        sqlx::query_as::<_, ResumeFile>(
            r#"
            SELECT full_name, resume_data, resume_content_type
            FROM candidates
            WHERE id = $1 AND resume_data IS NOT NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Resume not found".into()))
    }

    pub async fn list_notes(&self, candidate_id: Uuid) -> Result<Vec<Note>> {
        self.get_candidate(candidate_id).await?;
        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE candidate_id = $1 ORDER BY created_at DESC"
        );
        let notes = sqlx::query_as::<_, Note>(&query)
            .bind(candidate_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    pub async fn add_note(
        &self,
        candidate_id: Uuid,
        payload: CreateNotePayload,
        author: &str,
    ) -> Result<Note> {
        payload.validate()?;
        self.get_candidate(candidate_id).await?;

        if let Some(application_id) = payload.application_id {
            let owned: Option<(Uuid,)> = sqlx::query_as(
                "SELECT id FROM applications WHERE id = $1 AND candidate_id = $2",
            )
            .bind(application_id)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;
            if owned.is_none() {
                return Err(Error::BadRequest(
                    "application_id does not belong to this candidate".into(),
                ));
            }
        }

        let mut conn = self.pool.acquire().await?;
        insert_note(
            &mut conn,
            candidate_id,
            payload.application_id,
            payload.content.trim(),
            author,
        )
        .await
    }
}

pub async fn insert_note(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    application_id: Option<Uuid>,
    content: &str,
    author: &str,
) -> Result<Note> {
    let query = format!(
        r#"
        INSERT INTO notes (candidate_id, application_id, content, created_by)
        VALUES ($1, $2, $3, $4)
        RETURNING {NOTE_COLUMNS}
        "#
    );
    let note = sqlx::query_as::<_, Note>(&query)
        .bind(candidate_id)
        .bind(application_id)
        .bind(content)
        .bind(author)
        .fetch_one(&mut *conn)
        .await?;
    Ok(note)
}

/// Requested job when it exists and is OPEN, the talent pool otherwise.
async fn resolve_job(conn: &mut PgConnection, form: &IntakeForm) -> Result<Uuid> {
    let Some(requested) = form.requested_job_id() else {
        if form.job_id.is_some() {
            tracing::warn!(job_id = ?form.job_id, "malformed job_id on intake; using talent pool");
        }
        return Ok(TALENT_POOL_JOB_ID);
    };

    let open: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM jobs WHERE id = $1 AND status = $2")
        .bind(requested)
        .bind(JobStatus::Open)
        .fetch_optional(&mut *conn)
        .await?;

    match open {
        Some((id,)) => Ok(id),
        None => {
            tracing::warn!(job_id = %requested, "job missing or not open; using talent pool");
            Ok(TALENT_POOL_JOB_ID)
        }
    }
}

async fn insert_candidate(
    conn: &mut PgConnection,
    form: &IntakeForm,
    cpf_digits: &str,
    resume: Option<&ResumeUpload>,
    client_ip: Option<&str>,
) -> Result<Candidate> {
    let query = format!(
        r#"
        INSERT INTO candidates (
            full_name, cpf, email, phone, cep, street, address_number,
            complement, neighborhood, city, state, country,
            linkedin_url, portfolio_url,
            resume_data, resume_content_type, resume_file_name,
            consent_at, consent_ip
        ) VALUES (
            $1,$2,$3,$4,$5,$6,$7,
            $8,$9,$10,$11,COALESCE($12, 'Brasil'),
            $13,$14,
            $15,$16,$17,
            $18,$19
        )
        RETURNING {CANDIDATE_COLUMNS}
        "#
    );
    let candidate = sqlx::query_as::<_, Candidate>(&query)
        .bind(&form.full_name)
        .bind(cpf_digits)
        .bind(form.email.to_lowercase())
        .bind(&form.phone)
        .bind(form.cep.as_deref().map(masking::digits_only))
        .bind(&form.street)
        .bind(&form.address_number)
        .bind(&form.complement)
        .bind(&form.neighborhood)
        .bind(&form.city)
        .bind(&form.state)
        .bind(&form.country)
        .bind(&form.linkedin_url)
        .bind(&form.portfolio_url)
        .bind(resume.map(|r| r.data.to_vec()))
        .bind(resume.map(|r| r.content_type.clone()))
        .bind(resume.map(|r| r.file_name.clone()))
        .bind(Utc::now())
        .bind(client_ip)
        .fetch_one(&mut *conn)
        .await?;
    Ok(candidate)
}

/// Overwrites the profile with the resubmitted form. A missing résumé keeps
/// the stored one.
async fn refresh_candidate(
    conn: &mut PgConnection,
    id: Uuid,
    form: &IntakeForm,
    resume: Option<&ResumeUpload>,
    client_ip: Option<&str>,
) -> Result<Candidate> {
    let query = format!(
        r#"
        UPDATE candidates
        SET
            full_name = $2,
            email = $3,
            phone = $4,
            cep = COALESCE($5, cep),
            street = COALESCE($6, street),
            address_number = COALESCE($7, address_number),
            complement = COALESCE($8, complement),
            neighborhood = COALESCE($9, neighborhood),
            city = COALESCE($10, city),
            state = COALESCE($11, state),
            country = COALESCE($12, country),
            linkedin_url = COALESCE($13, linkedin_url),
            portfolio_url = COALESCE($14, portfolio_url),
            resume_data = COALESCE($15, resume_data),
            resume_content_type = COALESCE($16, resume_content_type),
            resume_file_name = COALESCE($17, resume_file_name),
            consent_at = $18,
            consent_ip = $19,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {CANDIDATE_COLUMNS}
        "#
    );
    let candidate = sqlx::query_as::<_, Candidate>(&query)
        .bind(id)
        .bind(&form.full_name)
        .bind(form.email.to_lowercase())
        .bind(&form.phone)
        .bind(form.cep.as_deref().map(masking::digits_only))
        .bind(&form.street)
        .bind(&form.address_number)
        .bind(&form.complement)
        .bind(&form.neighborhood)
        .bind(&form.city)
        .bind(&form.state)
        .bind(&form.country)
        .bind(&form.linkedin_url)
        .bind(&form.portfolio_url)
        .bind(resume.map(|r| r.data.to_vec()))
        .bind(resume.map(|r| r.content_type.clone()))
        .bind(resume.map(|r| r.file_name.clone()))
        .bind(Utc::now())
        .bind(client_ip)
        .fetch_one(&mut *conn)
        .await?;
    Ok(candidate)
}

async fn insert_application(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    job_id: Uuid,
) -> Result<Application> {
    let query = format!(
        r#"
        INSERT INTO applications (candidate_id, job_id)
        VALUES ($1, $2)
        RETURNING {APPLICATION_COLUMNS}
        "#
    );
    let application = sqlx::query_as::<_, Application>(&query)
        .bind(candidate_id)
        .bind(job_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(application)
}

async fn find_or_insert_application(
    conn: &mut PgConnection,
    candidate_id: Uuid,
    job_id: Uuid,
) -> Result<Application> {
    let query = format!(
        "SELECT {APPLICATION_COLUMNS} FROM applications WHERE candidate_id = $1 AND job_id = $2"
    );
    let existing = sqlx::query_as::<_, Application>(&query)
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&mut *conn)
        .await?;

    match existing {
        Some(application) => Ok(application),
        None => insert_application(conn, candidate_id, job_id).await,
    }
}
