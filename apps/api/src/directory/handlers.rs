use std::collections::HashMap;

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::directory::access::Caller;
use crate::directory::filters::parse_filters;
use crate::directory::profiles::{
    create_professional, current_profile, moderate_professional, update_profile,
    CreateProfessionalRequest,
};
use crate::directory::query::{get_professional, list_professionals, ProfessionalDetail};
use crate::directory::reviews::{list_reviews, moderate_review, submit_review, SubmitReviewRequest};
use crate::directory::search::{smart_search, SearchRequest, SearchResponse};
use crate::errors::AppError;
use crate::extract::{Json, Path, Query};
use crate::models::moderation::ModerationStatus;
use crate::models::professional::{Professional, ProfessionalModeration, ProfileUpdate};
use crate::models::review::{Review, ReviewModeration};
use crate::state::AppState;

/// Reserved list parameter; every other key is a field filter.
const INCLUDE_UNAPPROVED_PARAM: &str = "includeUnapproved";

#[derive(Deserialize)]
pub struct ReviewListParams {
    pub status: Option<ModerationStatus>,
}

fn parse_include_unapproved(params: &mut HashMap<String, String>) -> Result<bool, AppError> {
    match params.remove(INCLUDE_UNAPPROVED_PARAM).as_deref() {
        None | Some("") | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(AppError::Validation(format!(
            "{INCLUDE_UNAPPROVED_PARAM} must be 'true' or 'false', got '{other}'"
        ))),
    }
}

/// GET /api/v1/professionals
pub async fn handle_list_professionals(
    State(state): State<AppState>,
    caller: Caller,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Professional>>, AppError> {
    let include_unapproved = parse_include_unapproved(&mut params)?;
    if include_unapproved {
        caller.require_admin()?;
    }
    let filters = parse_filters(&params)?;
    let professionals =
        list_professionals(state.store.as_ref(), filters, include_unapproved).await?;
    Ok(Json(professionals))
}

/// POST /api/v1/professionals
pub async fn handle_create_professional(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateProfessionalRequest>,
) -> Result<(StatusCode, Json<Professional>), AppError> {
    let created = create_professional(state.store.as_ref(), &caller, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/professionals/:id
pub async fn handle_get_professional(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfessionalDetail>, AppError> {
    let detail = get_professional(state.store.as_ref(), id, caller.admin).await?;
    Ok(Json(detail))
}

/// PATCH /api/v1/professionals/:id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Professional>, AppError> {
    let updated = update_profile(state.store.as_ref(), &caller, id, update).await?;
    Ok(Json(updated))
}

/// PATCH /api/v1/professionals/:id/moderation
pub async fn handle_moderate_professional(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(moderation): Json<ProfessionalModeration>,
) -> Result<Json<Professional>, AppError> {
    let updated = moderate_professional(state.store.as_ref(), &caller, id, moderation).await?;
    Ok(Json(updated))
}

/// GET /api/v1/professionals/:id/reviews
pub async fn handle_list_reviews(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(params): Query<ReviewListParams>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = list_reviews(state.store.as_ref(), &caller, id, params.status).await?;
    Ok(Json(reviews))
}

/// GET /api/v1/me
pub async fn handle_current_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Professional>, AppError> {
    let profile = current_profile(state.store.as_ref(), &caller).await?;
    Ok(Json(profile))
}

/// POST /api/v1/reviews
pub async fn handle_submit_review(
    State(state): State<AppState>,
    Json(req): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = submit_review(state.store.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// PATCH /api/v1/reviews/:id/moderation
pub async fn handle_moderate_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(moderation): Json<ReviewModeration>,
) -> Result<Json<Review>, AppError> {
    let review = moderate_review(state.store.as_ref(), &caller, id, moderation).await?;
    Ok(Json(review))
}

/// POST /api/v1/search
pub async fn handle_smart_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = smart_search(
        state.store.as_ref(),
        state.matcher.as_ref(),
        req.prompt.as_deref().unwrap_or_default(),
        state.config.match_timeout,
    )
    .await?;
    Ok(Json(response))
}
