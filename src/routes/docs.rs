use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::routes::{applications, jobs, reports};

#[derive(OpenApi)]
#[openapi(
    info(title = "Talento ATS", description = "Jobs, candidates and hiring pipeline"),
    paths(
        jobs::list_public_jobs,
        jobs::get_public_job,
        jobs::list_jobs,
        jobs::create_job,
        jobs::get_job,
        jobs::update_job,
        jobs::delete_job,
        applications::list_applications,
        applications::board,
        applications::get_application,
        applications::get_history,
        applications::list_notifications,
        applications::move_stage,
        applications::update_application,
        applications::rejection_preview,
        applications::confirm_rejection,
        reports::summary,
    ),
    tags(
        (name = "public", description = "Candidate-facing job board"),
        (name = "jobs", description = "Job management"),
        (name = "applications", description = "Pipeline and rejection flow"),
        (name = "reports", description = "Pipeline figures")
    )
)]
pub struct ApiDoc;

#[axum::debug_handler]
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
