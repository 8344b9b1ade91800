pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    application_service::ApplicationService, candidate_service::CandidateService,
    geo_service::GeoService, job_service::JobService, notification_service::NotificationService,
    report_service::ReportService,
};
use reqwest::Client;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub job_service: JobService,
    pub candidate_service: CandidateService,
    pub application_service: ApplicationService,
    pub notification_service: NotificationService,
    pub report_service: ReportService,
    pub geo_service: GeoService,
}

impl AppState {
    pub fn new(pool: PgPool) -> error::Result<Self> {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        let notification_service = NotificationService::new(pool.clone());
        let job_service = JobService::new(pool.clone());
        let candidate_service = CandidateService::new(pool.clone());
        let application_service =
            ApplicationService::new(pool.clone(), notification_service.clone());
        let report_service = ReportService::new(pool.clone());
        let geo_service = GeoService::new(
            http_client,
            config.viacep_base_url.clone(),
            config.ibge_base_url.clone(),
        );

        Ok(Self {
            pool,
            job_service,
            candidate_service,
            application_service,
            notification_service,
            report_service,
            geo_service,
        })
    }
}
