use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub application_id: Option<Uuid>,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}
