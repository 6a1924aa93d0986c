pub mod health;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::directory::handlers;
use crate::errors::expose_error_detail;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Directory
        .route(
            "/api/v1/professionals",
            get(handlers::handle_list_professionals).post(handlers::handle_create_professional),
        )
        .route(
            "/api/v1/professionals/:id",
            get(handlers::handle_get_professional).patch(handlers::handle_update_profile),
        )
        .route(
            "/api/v1/professionals/:id/moderation",
            patch(handlers::handle_moderate_professional),
        )
        .route(
            "/api/v1/professionals/:id/reviews",
            get(handlers::handle_list_reviews),
        )
        .route("/api/v1/me", get(handlers::handle_current_profile))
        // Reviews
        .route("/api/v1/reviews", post(handlers::handle_submit_review))
        .route(
            "/api/v1/reviews/:id/moderation",
            patch(handlers::handle_moderate_review),
        )
        // Smart search
        .route("/api/v1/search", post(handlers::handle_smart_search))
        .layer(middleware::map_response_with_state(
            state.clone(),
            expose_error_detail,
        ))
        .with_state(state)
}
