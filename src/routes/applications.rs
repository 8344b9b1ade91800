use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::application_dto::{
        build_board, ApplicationListQuery, MoveStagePayload, RejectionPayload, RejectionResponse,
        UpdateApplicationPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/applications",
    params(
        ("stage" = Option<String>, Query, description = "Filter by pipeline stage"),
        ("job_id" = Option<Uuid>, Query, description = "Filter by job")
    ),
    responses(
        (status = 200, description = "Applications with candidate and job, latest stage change first", body = [ApplicationView])
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applications = state.application_service.list(query).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    get,
    path = "/api/applications/board",
    params(
        ("job_id" = Option<Uuid>, Query, description = "Restrict the board to one job")
    ),
    responses(
        (status = 200, description = "One column per stage in pipeline order", body = [BoardColumn])
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn board(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applications = state
        .application_service
        .list(ApplicationListQuery {
            stage: None,
            job_id: query.job_id,
        })
        .await?;
    Ok(Json(build_board(applications)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application found", body = ApplicationView),
        (status = 404, description = "Application not found")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get(id).await?;
    Ok(Json(application))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/history",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Stage transitions, oldest first", body = [StageHistory]),
        (status = 404, description = "Application not found")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let history = state.application_service.history(id).await?;
    Ok(Json(history))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/notifications",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Simulated notices sent for this application", body = [NotificationLog]),
        (status = 404, description = "Application not found")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.application_service.get(id).await?;
    let logs = state.notification_service.list_for_application(id).await?;
    Ok(Json(logs))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}/stage",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = MoveStagePayload,
    responses(
        (status = 200, description = "Stage changed and history recorded", body = Application),
        (status = 400, description = "Same stage, or REJECTED requested outside the rejection flow"),
        (status = 404, description = "Application not found")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn move_stage(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveStagePayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .application_service
        .move_stage(id, payload, claims.actor())
        .await?;
    Ok(Json(application))
}

#[utoipa::path(
    patch,
    path = "/api/applications/{id}",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = UpdateApplicationPayload,
    responses(
        (status = 200, description = "Application updated", body = Application),
        (status = 404, description = "Application or job not found"),
        (status = 409, description = "Candidate already applied to the target job")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationPayload>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.update(id, payload).await?;
    Ok(Json(application))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/rejection",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Personalized notice and the values it is checked against", body = RejectionPreview),
        (status = 404, description = "Application not found")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn rejection_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let company = &crate::config::get_config().company_name;
    let preview = state
        .application_service
        .rejection_preview(id, company)
        .await?;
    Ok(Json(preview))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/rejection",
    params(
        ("id" = Uuid, Path, description = "Application ID")
    ),
    request_body = RejectionPayload,
    responses(
        (status = 200, description = "Application rejected and notice logged", body = RejectionResponse),
        (status = 400, description = "Notice failed the checklist; body carries validations"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application already rejected")
    ),
    tag = "applications"
)]
#[axum::debug_handler]
pub async fn confirm_rejection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectionPayload>,
) -> Result<impl IntoResponse> {
    let company = &crate::config::get_config().company_name;
    let application = state
        .application_service
        .reject(id, payload, claims.actor(), company)
        .await?;
    Ok(Json(RejectionResponse {
        success: true,
        message: "Candidato reprovado e notificação registrada".to_string(),
        application,
    }))
}
