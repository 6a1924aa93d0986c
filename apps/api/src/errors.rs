use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::directory::filters::FilterError;
use crate::directory::search::MatchError;
use crate::directory::store::StoreError;
use crate::state::AppState;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] StoreError),

    #[error("Upstream match error: {0}")]
    UpstreamMatch(#[from] MatchError),
}

impl From<FilterError> for AppError {
    fn from(e: FilterError) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Wire shape of an error. `detail` is only ever filled in by
/// [`expose_error_detail`] in development deployments.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Verbose error text carried as a response extension.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BackendUnavailable(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamMatch(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            AppError::UpstreamMatch(_) => "UPSTREAM_MATCH_ERROR",
        }
    }

    /// Message safe to show in any deployment.
    pub fn safe_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Forbidden(msg) => {
                msg.clone()
            }
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::BackendUnavailable(_) => {
                "The directory is temporarily unavailable".to_string()
            }
            AppError::UpstreamMatch(_) => "Smart search is temporarily unavailable".to_string(),
        }
    }

    /// Full error text, for failures whose safe message hides the cause.
    pub fn detail(&self) -> Option<String> {
        match self {
            AppError::BackendUnavailable(_) | AppError::UpstreamMatch(_) => Some(self.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::BackendUnavailable(e) => tracing::error!("Store error: {e}"),
            AppError::UpstreamMatch(e) => tracing::error!("Text matcher error: {e}"),
            _ => {}
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.safe_message(),
            detail: None,
        };

        let mut response = (self.status(), Json(json!({ "error": &body }))).into_response();
        if let Some(detail) = self.detail() {
            response.extensions_mut().insert(ErrorDetail(detail));
        }
        response.extensions_mut().insert(body);
        response
    }
}

/// Response middleware: in development, re-renders error responses with the
/// verbose detail attached. Production responses pass through untouched.
pub async fn expose_error_detail(State(state): State<AppState>, response: Response) -> Response {
    if !state.config.app_env.exposes_error_detail() {
        return response;
    }
    let Some(ErrorDetail(detail)) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };
    let Some(mut body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };

    body.detail = Some(detail);
    (response.status(), Json(json!({ "error": body }))).into_response()
}
