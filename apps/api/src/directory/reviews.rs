//! Patient reviews: submission, listing and moderation.
//!
//! Submissions land as `pending` and do not count towards reputation until
//! an administrator approves them. Every moderation decision triggers a
//! best-effort refresh of the professional's cached aggregate.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::directory::access::Caller;
use crate::directory::reputation::refresh_cached_reputation;
use crate::directory::store::{DirectoryStore, ProfessionalQuery, ReviewQuery, ReviewScope};
use crate::errors::AppError;
use crate::models::moderation::ModerationStatus;
use crate::models::review::{NewReview, Review, ReviewModeration};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    #[serde(alias = "profId")]
    pub professional_id: Option<Uuid>,
    #[serde(alias = "name")]
    pub author_name: Option<String>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

impl SubmitReviewRequest {
    pub fn validate(self) -> Result<NewReview, AppError> {
        let professional_id = self
            .professional_id
            .ok_or_else(|| AppError::Validation("professionalId is required".to_string()))?;
        let author_name = non_blank("authorName", self.author_name)?;
        let comment = non_blank("comment", self.comment)?;
        let rating = self
            .rating
            .ok_or_else(|| AppError::Validation("rating is required".to_string()))?;
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(AppError::Validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
            )));
        }

        Ok(NewReview {
            professional_id,
            author_name,
            rating,
            comment,
        })
    }
}

fn non_blank(field: &str, value: Option<String>) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Stores a `pending` review for an approved professional.
pub async fn submit_review(
    store: &dyn DirectoryStore,
    request: SubmitReviewRequest,
) -> Result<Review, AppError> {
    let new = request.validate()?;

    let listed = store
        .select_professionals(&ProfessionalQuery::by_id(new.professional_id, false))
        .await?;
    if listed.is_empty() {
        return Err(AppError::NotFound(format!(
            "Professional {} not found",
            new.professional_id
        )));
    }

    let review = store.insert_review(&new).await?;
    info!(
        "Review {} submitted for professional {}, awaiting moderation",
        review.id, review.professional_id
    );
    Ok(review)
}

/// Reviews of one professional, newest first.
///
/// Non-admin callers only see approved reviews of approved professionals.
/// Admins see every status, or the one they ask for.
pub async fn list_reviews(
    store: &dyn DirectoryStore,
    caller: &Caller,
    professional_id: Uuid,
    status: Option<ModerationStatus>,
) -> Result<Vec<Review>, AppError> {
    if !caller.admin && status.is_some_and(|s| !s.is_approved()) {
        return Err(AppError::Forbidden(
            "Only administrators may list unmoderated reviews".to_string(),
        ));
    }

    let exists = !store
        .select_professionals(&ProfessionalQuery::by_id(professional_id, caller.admin))
        .await?
        .is_empty();
    if !exists {
        return Err(AppError::NotFound(format!(
            "Professional {professional_id} not found"
        )));
    }

    let query = if caller.admin {
        ReviewQuery {
            scope: ReviewScope::Professional(professional_id),
            status,
        }
    } else {
        ReviewQuery::approved_for(professional_id)
    };
    Ok(store.select_reviews(&query).await?)
}

/// Records an administrator's decision, then refreshes the cached aggregate.
/// A failed refresh does not undo the decision.
pub async fn moderate_review(
    store: &dyn DirectoryStore,
    caller: &Caller,
    id: Uuid,
    moderation: ReviewModeration,
) -> Result<Review, AppError> {
    caller.require_admin()?;

    let review = store
        .update_review_status(id, &moderation)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Review {id} not found")))?;
    info!(
        "Review {id} moderated to {} for professional {}",
        review.status, review.professional_id
    );

    refresh_cached_reputation(store, review.professional_id).await;
    Ok(review)
}
