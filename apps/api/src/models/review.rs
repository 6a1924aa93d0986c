use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::moderation::ModerationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
    pub submitted_at: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: ModerationStatus,
    pub moderation_comment: Option<String>,
    pub moderated_at: Option<DateTime<Utc>>,
}

/// Validated review submission. Always stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub professional_id: Uuid,
    pub author_name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewModeration {
    pub status: ModerationStatus,
    pub moderation_comment: Option<String>,
}
