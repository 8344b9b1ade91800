use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::{
    dto::application_dto::ApplicationListQuery, error::Result,
    services::export_service::ExportService, AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn attachment(stem: &str, ext: &str) -> String {
    format!(
        "attachment; filename=\"{}_{}.{}\"",
        stem,
        chrono::Utc::now().format("%Y%m%d_%H%M"),
        ext
    )
}

/// Applications as CSV; honours the same filters as the list endpoint.
#[axum::debug_handler]
pub async fn export_applications_csv(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applications = state.application_service.list(query).await?;
    let buffer = ExportService::applications_csv(&applications)?;
    tracing::info!(rows = applications.len(), "applications exported as CSV");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, attachment("candidaturas", "csv")),
        ],
        buffer,
    ))
}

#[axum::debug_handler]
pub async fn export_applications_xlsx(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let applications = state.application_service.list(query).await?;
    let buffer = ExportService::applications_xlsx(&applications)?;
    tracing::info!(rows = applications.len(), "applications exported as XLSX");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, attachment("candidaturas", "xlsx")),
        ],
        buffer,
    ))
}
