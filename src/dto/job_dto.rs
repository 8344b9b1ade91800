use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::job::{JobStatus, PublicJob, WorkMode};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub city: String,
    #[validate(length(max = 2))]
    #[serde(default)]
    pub state: String,
    pub work_mode: Option<WorkMode>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub salary_budget: Option<Decimal>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub department: Option<String>,
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 2))]
    pub state: Option<String>,
    pub work_mode: Option<WorkMode>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    #[validate(length(equal = 3))]
    pub currency: Option<String>,
    pub salary_budget: Option<Decimal>,
    pub status: Option<JobStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicJobListResponse {
    pub items: Vec<PublicJob>,
}

/// Public salary range must be ordered when both ends are present.
pub fn check_salary_range(min: Option<Decimal>, max: Option<Decimal>) -> bool {
    match (min, max) {
        (Some(min), Some(max)) => min <= max,
        _ => true,
    }
}
