use crate::dto::job_dto::{check_salary_range, CreateJobPayload, JobListQuery, UpdateJobPayload};
use crate::error::{Error, Result};
use crate::models::job::{
    Job, JobStatus, JobWithCount, PublicJob, WorkMode, TALENT_POOL_JOB_ID, TALENT_POOL_JOB_TITLE,
};
use sqlx::PgPool;
use uuid::Uuid;

const JOB_COLUMNS: &str = "id, title, department, company_name, description, requirements, city, state, \
     work_mode, salary_min, salary_max, currency, salary_budget, status, created_at, updated_at";

const JOB_WITH_COUNT_COLUMNS: &str = "j.id, j.title, j.department, j.company_name, j.description, \
     j.requirements, j.city, j.state, j.work_mode, j.salary_min, j.salary_max, j.currency, \
     j.salary_budget, j.status, j.created_at, j.updated_at, \
     (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS application_count";

// salary_budget is deliberately absent.
const PUBLIC_JOB_COLUMNS: &str = "j.id, j.title, j.department, j.company_name, j.description, \
     j.requirements, j.city, j.state, j.work_mode, j.salary_min, j.salary_max, j.currency, \
     j.status, j.created_at, \
     (SELECT COUNT(*) FROM applications a WHERE a.job_id = j.id) AS application_count";

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, payload: CreateJobPayload) -> Result<Job> {
        if !check_salary_range(payload.salary_min, payload.salary_max) {
            return Err(Error::BadRequest(
                "salary_min must not exceed salary_max".into(),
            ));
        }

        let query = format!(
            r#"
            INSERT INTO jobs (
                title, department, company_name, description, requirements,
                city, state, work_mode, salary_min, salary_max,
                currency, salary_budget, status
            ) VALUES (
                $1,$2,$3,$4,$5,
                $6,$7,$8,$9,$10,
                $11,$12,$13
            )
            RETURNING {JOB_COLUMNS}
            "#
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(&payload.title)
            .bind(&payload.department)
            .bind(&payload.company_name)
            .bind(&payload.description)
            .bind(&payload.requirements)
            .bind(&payload.city)
            .bind(payload.state.to_uppercase())
            .bind(payload.work_mode.unwrap_or(WorkMode::Presencial))
            .bind(payload.salary_min)
            .bind(payload.salary_max)
            .bind(payload.currency.as_deref().unwrap_or("BRL"))
            .bind(payload.salary_budget)
            .bind(payload.status.unwrap_or(JobStatus::Draft))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(job_id = %job.id, title = %job.title, "job created");
        Ok(job)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateJobPayload) -> Result<Job> {
        let current = self.get_by_id(id).await?;
        let salary_min = payload.salary_min.or(current.salary_min);
        let salary_max = payload.salary_max.or(current.salary_max);
        if !check_salary_range(salary_min, salary_max) {
            return Err(Error::BadRequest(
                "salary_min must not exceed salary_max".into(),
            ));
        }

        let query = format!(
            r#"
            UPDATE jobs
            SET
                title = COALESCE($2, title),
                department = COALESCE($3, department),
                company_name = COALESCE($4, company_name),
                description = COALESCE($5, description),
                requirements = COALESCE($6, requirements),
                city = COALESCE($7, city),
                state = COALESCE($8, state),
                work_mode = COALESCE($9, work_mode),
                salary_min = COALESCE($10, salary_min),
                salary_max = COALESCE($11, salary_max),
                currency = COALESCE($12, currency),
                salary_budget = COALESCE($13, salary_budget),
                status = COALESCE($14, status),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        );
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .bind(payload.title)
            .bind(payload.department)
            .bind(payload.company_name)
            .bind(payload.description)
            .bind(payload.requirements)
            .bind(payload.city)
            .bind(payload.state.map(|s| s.to_uppercase()))
            .bind(payload.work_mode)
            .bind(payload.salary_min)
            .bind(payload.salary_max)
            .bind(payload.currency)
            .bind(payload.salary_budget)
            .bind(payload.status)
            .fetch_one(&self.pool)
            .await?;

        Ok(job)
    }

    pub async fn list(&self, query: JobListQuery) -> Result<Vec<JobWithCount>> {
        let mut filters = Vec::new();
        let mut arg_count = 0;

        if query.status.is_some() {
            arg_count += 1;
            filters.push(format!("j.status = ${}", arg_count));
        }
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));
        if search.is_some() {
            arg_count += 1;
            filters.push(format!(
                "(j.title ILIKE ${n} OR j.department ILIKE ${n} OR j.city ILIKE ${n})",
                n = arg_count
            ));
        }

        let where_clause = if filters.is_empty() {
            "".to_string()
        } else {
            format!("WHERE {}", filters.join(" AND "))
        };

        let items_query = format!(
            "SELECT {JOB_WITH_COUNT_COLUMNS} FROM jobs j {} ORDER BY j.created_at DESC",
            where_clause
        );

        let mut statement = sqlx::query_as::<_, JobWithCount>(&items_query);
        if let Some(status) = query.status {
            statement = statement.bind(status);
        }
        if let Some(search) = search {
            statement = statement.bind(search);
        }
        let items = statement.fetch_all(&self.pool).await?;
        Ok(items)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Job> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))?;
        Ok(job)
    }

    pub async fn get_with_count(&self, id: Uuid) -> Result<JobWithCount> {
        let query = format!("SELECT {JOB_WITH_COUNT_COLUMNS} FROM jobs j WHERE j.id = $1");
        sqlx::query_as::<_, JobWithCount>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    /// Applications are never deleted, so a job that still has any cannot go.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if id == TALENT_POOL_JOB_ID {
            return Err(Error::Conflict("The talent pool job cannot be deleted".into()));
        }
        self.get_by_id(id).await?;

        let (applications,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM applications WHERE job_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if applications > 0 {
            return Err(Error::Conflict(format!(
                "Job has {} application(s) and cannot be deleted; close it instead",
                applications
            )));
        }

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::info!(job_id = %id, "job deleted");
        Ok(())
    }

    pub async fn list_public(&self) -> Result<Vec<PublicJob>> {
        let query = format!(
            "SELECT {PUBLIC_JOB_COLUMNS} FROM jobs j WHERE j.status = $1 ORDER BY j.created_at DESC"
        );
        let items = sqlx::query_as::<_, PublicJob>(&query)
            .bind(JobStatus::Open)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn get_public(&self, id: Uuid) -> Result<PublicJob> {
        let query = format!(
            "SELECT {PUBLIC_JOB_COLUMNS} FROM jobs j WHERE j.id = $1 AND j.status = $2"
        );
        sqlx::query_as::<_, PublicJob>(&query)
            .bind(id)
            .bind(JobStatus::Open)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Job not found".into()))
    }

    /// Recreates the seeded talent-pool job if it went missing.
    pub async fn ensure_talent_pool(&self) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, department, status)
            VALUES ($1, $2, 'RH', $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(TALENT_POOL_JOB_ID)
        .bind(TALENT_POOL_JOB_TITLE)
        .bind(JobStatus::Open)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
