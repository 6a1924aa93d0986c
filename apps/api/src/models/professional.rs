use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::moderation::ModerationStatus;

/// A listed practitioner. `score` and `reference_count` hold the last
/// persisted aggregate; read paths overwrite them with a fresh one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub specialization: Option<String>,
    pub education: Option<String>,
    pub courses: Option<String>,
    pub practice_areas: Option<String>,
    pub price: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ModerationStatus,
    pub verified: bool,
    pub score: f64,
    pub reference_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derived reputation of a professional over its approved reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reputation {
    pub score: f64,
    pub reference_count: i32,
}

impl Reputation {
    pub const EMPTY: Reputation = Reputation {
        score: 0.0,
        reference_count: 0,
    };
}

impl Professional {
    pub fn with_reputation(mut self, reputation: Reputation) -> Self {
        self.score = reputation.score;
        self.reference_count = reputation.reference_count;
        self
    }
}

/// Validated input for a new listing. Always stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewProfessional {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub specialization: Option<String>,
    pub education: Option<String>,
    pub courses: Option<String>,
    pub practice_areas: Option<String>,
    pub price: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

/// Owner-editable profile fields. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub specialization: Option<String>,
    pub education: Option<String>,
    pub courses: Option<String>,
    pub practice_areas: Option<String>,
    pub price: Option<f64>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.specialization.is_none()
            && self.education.is_none()
            && self.courses.is_none()
            && self.practice_areas.is_none()
            && self.price.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.city.is_none()
    }
}

/// Administrator-only fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfessionalModeration {
    pub status: Option<ModerationStatus>,
    pub verified: Option<bool>,
}

impl ProfessionalModeration {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.verified.is_none()
    }
}
