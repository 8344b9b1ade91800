pub mod applications;
pub mod candidates;
pub mod docs;
pub mod export;
pub mod geo;
pub mod health;
pub mod jobs;
pub mod reports;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    config::get_config,
    middleware::{auth, cors, rate_limit},
    AppState,
};

/// Multipart overhead allowed on top of the résumé itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn router(app_state: AppState) -> Router {
    let config = get_config();

    let public_api = Router::new()
        .route("/api/jobs/public", get(jobs::list_public_jobs))
        .route("/api/jobs/public/:id", get(jobs::get_public_job))
        .route("/api/candidates/check", get(candidates::check_cpf))
        .route("/api/candidates", post(candidates::submit_application))
        .route("/api/geo/cep/:cep", get(geo::lookup_cep))
        .route("/api/geo/states", get(geo::list_states))
        .route("/api/geo/states/:uf/cities", get(geo::list_cities))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.public_rps),
            rate_limit::rps_middleware,
        ));

    // GET /api/candidates lives here; its POST twin is the public intake.
    let recruiter_api = Router::new()
        .route("/api/candidates", get(candidates::list_candidates))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/api/jobs/:id",
            get(jobs::get_job)
                .patch(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route(
            "/api/candidates/:id",
            get(candidates::get_candidate).patch(candidates::update_candidate),
        )
        .route("/api/candidates/:id/resume", get(candidates::download_resume))
        .route("/api/resume/:id", get(candidates::view_resume))
        .route(
            "/api/candidates/:id/notes",
            get(candidates::list_notes).post(candidates::create_note),
        )
        .route("/api/applications", get(applications::list_applications))
        .route("/api/applications/board", get(applications::board))
        .route(
            "/api/applications/:id",
            get(applications::get_application).patch(applications::update_application),
        )
        .route("/api/applications/:id/history", get(applications::get_history))
        .route(
            "/api/applications/:id/notifications",
            get(applications::list_notifications),
        )
        .route("/api/applications/:id/stage", patch(applications::move_stage))
        .route(
            "/api/applications/:id/rejection",
            get(applications::rejection_preview).post(applications::confirm_rejection),
        )
        .route("/api/reports/summary", get(reports::summary))
        .route(
            "/api/exports/applications.csv",
            get(export::export_applications_csv),
        )
        .route(
            "/api/exports/applications.xlsx",
            get(export::export_applications_xlsx),
        )
        .route_layer(axum::middleware::from_fn(auth::require_recruiter))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(config.admin_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(docs::openapi_json))
        .merge(public_api)
        .merge(recruiter_api)
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(
            config.max_resume_bytes + FORM_OVERHEAD_BYTES,
        ))
        .layer(cors::api_cors())
        .layer(TraceLayer::new_for_http())
}
