use serde::Serialize;

use crate::models::application::Stage;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StageCount {
    pub stage: Stage,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PipelineReport {
    pub total_applications: usize,
    pub active_applications: usize,
    pub new_today: usize,
    pub in_interview: usize,
    pub hired: usize,
    pub rejected: usize,
    /// Mean age in days of active applications, one decimal.
    pub average_days_open: f64,
    /// Hired over total, as a percentage with one decimal.
    pub conversion_rate: f64,
    pub by_stage: Vec<StageCount>,
}
