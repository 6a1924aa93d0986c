//! Caller identity, as asserted by the upstream authentication layer.
//!
//! * `x-admin-token`: must equal `ADMIN_TOKEN`; a wrong token is rejected
//!   outright rather than downgraded to anonymous.
//! * `x-user-id`: account id of the signed-in user, if any.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller {
    pub admin: bool,
    pub user_id: Option<Uuid>,
}

impl Caller {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator access required".to_string()))
        }
    }

    pub fn require_user(&self) -> Result<Uuid, AppError> {
        self.user_id.ok_or(AppError::Unauthorized)
    }

    /// Admins may act on any record; users only on records tied to their account.
    pub fn can_edit(&self, owner: Option<Uuid>) -> bool {
        self.admin || (self.user_id.is_some() && self.user_id == owner)
    }
}

/// Constant-time comparison of the shared admin secret.
fn token_matches(expected: &str, given: &str) -> bool {
    expected.as_bytes().ct_eq(given.as_bytes()).into()
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<Option<&'a str>, AppError> {
    match parts.headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()))
            .map_err(|_| AppError::Unauthorized),
    }
}

#[cfg(test)]
impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn admin() -> Self {
        Self {
            admin: true,
            user_id: None,
        }
    }

    pub fn user(user_id: Uuid) -> Self {
        Self {
            admin: false,
            user_id: Some(user_id),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let admin = match header(parts, ADMIN_TOKEN_HEADER)? {
            None => false,
            Some(token) => match state.config.admin_token.as_deref() {
                Some(expected) if token_matches(expected, token) => true,
                _ => {
                    tracing::warn!("Rejected request with invalid admin token");
                    return Err(AppError::Unauthorized);
                }
            },
        };

        let user_id = match header(parts, USER_ID_HEADER)? {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<Uuid>().map_err(|_| AppError::Unauthorized)?),
        };

        Ok(Caller { admin, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_edit_own_record_only() {
        let owner = Uuid::new_v4();
        let caller = Caller::user(owner);
        assert!(caller.can_edit(Some(owner)));
        assert!(!caller.can_edit(Some(Uuid::new_v4())));
        assert!(!caller.can_edit(None));
    }

    #[test]
    fn test_anonymous_cannot_edit_unowned_record() {
        assert!(!Caller::anonymous().can_edit(None));
        assert!(Caller::admin().can_edit(None));
    }

    #[test]
    fn test_admin_token_comparison() {
        assert!(token_matches("s3cret-token", "s3cret-token"));
        assert!(!token_matches("s3cret-token", "s3cret-tokeN"));
        assert!(!token_matches("s3cret-token", "s3cret"));
        assert!(!token_matches("s3cret-token", ""));
    }

    #[test]
    fn test_require_admin() {
        assert!(Caller::admin().require_admin().is_ok());
        let err = Caller::user(Uuid::new_v4()).require_admin().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
