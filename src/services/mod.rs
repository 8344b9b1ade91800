pub mod application_service;
pub mod candidate_service;
pub mod export_service;
pub mod geo_service;
pub mod job_service;
pub mod notification_service;
pub mod rejection_service;
pub mod report_service;
