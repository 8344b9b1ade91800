use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::{error::Result, AppState};

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    responses(
        (status = 200, description = "Pipeline totals, rates and per-stage counts", body = PipelineReport)
    ),
    tag = "reports"
)]
#[axum::debug_handler]
pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let report = state.report_service.summary().await?;
    Ok(Json(report))
}
