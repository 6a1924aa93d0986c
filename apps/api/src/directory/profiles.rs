//! Professional profile lifecycle: sign-up listing, owner edits,
//! administrator moderation, and the caller's own profile.

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::directory::access::Caller;
use crate::directory::filters::FieldFilter;
use crate::directory::query::list_professionals;
use crate::directory::reputation::aggregate;
use crate::directory::store::{DirectoryStore, ProfessionalQuery};
use crate::errors::AppError;
use crate::models::professional::{
    NewProfessional, Professional, ProfessionalModeration, ProfileUpdate,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfessionalRequest {
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

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

fn check_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        )),
        _ => Ok(()),
    }
}

impl CreateProfessionalRequest {
    pub fn validate(self, user_id: Option<Uuid>) -> Result<NewProfessional, AppError> {
        check_price(self.price)?;
        Ok(NewProfessional {
            user_id,
            name: required("name", self.name)?,
            category: required("category", self.category)?,
            specialization: self.specialization,
            education: self.education,
            courses: self.courses,
            practice_areas: self.practice_areas,
            price: self.price,
            phone: self.phone,
            email: self.email,
            city: self.city,
        })
    }
}

/// Lists a new professional as `pending`, tied to the caller's account.
pub async fn create_professional(
    store: &dyn DirectoryStore,
    caller: &Caller,
    request: CreateProfessionalRequest,
) -> Result<Professional, AppError> {
    let new = request.validate(caller.user_id)?;
    let created = store.insert_professional(&new).await?;
    info!(
        "Created professional {} ({}) awaiting moderation",
        created.id, created.category
    );
    Ok(created)
}

/// Owner or administrator edit of profile fields.
pub async fn update_profile(
    store: &dyn DirectoryStore,
    caller: &Caller,
    id: Uuid,
    update: ProfileUpdate,
) -> Result<Professional, AppError> {
    if update.is_empty() {
        return Err(AppError::Validation(
            "at least one profile field must be provided".to_string(),
        ));
    }
    for (field, value) in [("name", &update.name), ("category", &update.category)] {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(AppError::Validation(format!("{field} cannot be empty")));
        }
    }
    check_price(update.price)?;

    let existing = store
        .select_professionals(&ProfessionalQuery::by_id(id, true))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Professional {id} not found")))?;
    if !caller.can_edit(existing.user_id) {
        return Err(AppError::Forbidden(
            "Only the owner of this profile may edit it".to_string(),
        ));
    }

    let updated = store
        .update_profile(id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Professional {id} not found")))?;
    let reputation = aggregate(store, id).await?;
    Ok(updated.with_reputation(reputation))
}

/// Administrator change of listing status and/or verified flag.
pub async fn moderate_professional(
    store: &dyn DirectoryStore,
    caller: &Caller,
    id: Uuid,
    moderation: ProfessionalModeration,
) -> Result<Professional, AppError> {
    caller.require_admin()?;
    if moderation.is_empty() {
        return Err(AppError::Validation(
            "status or verified must be provided".to_string(),
        ));
    }

    let updated = store
        .update_moderation(id, &moderation)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Professional {id} not found")))?;
    info!(
        "Moderated professional {id}: status={} verified={}",
        updated.status, updated.verified
    );

    let reputation = aggregate(store, id).await?;
    Ok(updated.with_reputation(reputation))
}

/// The professional owned by the caller's account, whatever its status.
pub async fn current_profile(
    store: &dyn DirectoryStore,
    caller: &Caller,
) -> Result<Professional, AppError> {
    let user_id = caller.require_user()?;
    list_professionals(store, vec![FieldFilter::UserId(user_id)], true)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("No professional profile for this account".to_string()))
}
