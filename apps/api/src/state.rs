use std::sync::Arc;

use crate::config::Config;
use crate::directory::search::TextMatcher;
use crate::directory::store::DirectoryStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, wrapped in a `TimeoutStore`.
    pub store: Arc<dyn DirectoryStore>,
    /// Pluggable text matcher for smart search. Default: `LlmTextMatcher`.
    pub matcher: Arc<dyn TextMatcher>,
    pub config: Config,
}
