use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{CreateJobPayload, JobListQuery, PublicJobListResponse, UpdateJobPayload},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Invalid payload or salary range"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    tag = "jobs"
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    patch,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    request_body = UpdateJobPayload,
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 400, description = "Invalid payload or salary range"),
        (status = 404, description = "Job not found")
    ),
    tag = "jobs"
)]
#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update(id, payload).await?;
    Ok(Json(job))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job still has applications or is the talent pool")
    ),
    tag = "jobs"
)]
#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.job_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/jobs",
    params(
        ("status" = Option<String>, Query, description = "DRAFT, OPEN, PAUSED or CLOSED"),
        ("search" = Option<String>, Query, description = "Matches title, department or city")
    ),
    responses(
        (status = 200, description = "All jobs with application counts", body = [JobWithCount])
    ),
    tag = "jobs"
)]
#[axum::debug_handler]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse> {
    let jobs = state.job_service.list(query).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Job found", body = JobWithCount),
        (status = 404, description = "Job not found")
    ),
    tag = "jobs"
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_with_count(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    get,
    path = "/api/jobs/public",
    responses(
        (status = 200, description = "Open jobs without the internal budget", body = PublicJobListResponse)
    ),
    tag = "public"
)]
#[axum::debug_handler]
pub async fn list_public_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let items = state.job_service.list_public().await?;
    Ok(Json(PublicJobListResponse { items }))
}

#[utoipa::path(
    get,
    path = "/api/jobs/public/{id}",
    params(
        ("id" = Uuid, Path, description = "Job ID")
    ),
    responses(
        (status = 200, description = "Open job without the internal budget", body = PublicJob),
        (status = 404, description = "Job not found or not open")
    ),
    tag = "public"
)]
#[axum::debug_handler]
pub async fn get_public_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_public(id).await?;
    Ok(Json(job))
}
