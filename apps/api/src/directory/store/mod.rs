//! Data-access seam for the directory.
//!
//! Core operations only talk to `dyn DirectoryStore`. `main` wires the
//! Postgres implementation behind a [`TimeoutStore`]; tests use the
//! in-memory store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::directory::filters::FieldFilter;
use crate::models::moderation::ModerationStatus;
use crate::models::professional::{
    NewProfessional, Professional, ProfessionalModeration, ProfileUpdate, Reputation,
};
use crate::models::review::{NewReview, Review, ReviewModeration};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Conjunction of equality constraints plus the status gate.
#[derive(Debug, Clone, Default)]
pub struct ProfessionalQuery {
    pub id: Option<Uuid>,
    /// Administrative bypass of the `approved`-only gate.
    pub include_unapproved: bool,
    pub filters: Vec<FieldFilter>,
}

impl ProfessionalQuery {
    pub fn by_id(id: Uuid, include_unapproved: bool) -> Self {
        Self {
            id: Some(id),
            include_unapproved,
            filters: Vec::new(),
        }
    }

    /// In-memory evaluation, identical in meaning to the SQL the Postgres
    /// store builds.
    #[cfg(test)]
    pub fn matches(&self, professional: &Professional) -> bool {
        (self.include_unapproved || professional.status.is_approved())
            && self.id.map_or(true, |id| professional.id == id)
            && self.filters.iter().all(|f| f.matches(professional))
    }
}

#[derive(Debug, Clone)]
pub enum ReviewScope {
    Professional(Uuid),
    Professionals(Vec<Uuid>),
}

#[derive(Debug, Clone)]
pub struct ReviewQuery {
    pub scope: ReviewScope,
    /// `None` selects every status.
    pub status: Option<ModerationStatus>,
}

impl ReviewQuery {
    pub fn approved_for(professional_id: Uuid) -> Self {
        Self {
            scope: ReviewScope::Professional(professional_id),
            status: Some(ModerationStatus::Approved),
        }
    }

    #[cfg(test)]
    pub fn matches(&self, review: &Review) -> bool {
        let in_scope = match &self.scope {
            ReviewScope::Professional(id) => review.professional_id == *id,
            ReviewScope::Professionals(ids) => ids.contains(&review.professional_id),
        };
        in_scope && self.status.map_or(true, |s| review.status == s)
    }
}

/// Logical read/write operations over professionals and reviews.
/// Each call is a single statement; no cross-call transaction is assumed.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    /// Rows matching the query, ordered by name then id.
    async fn select_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<Professional>, StoreError>;

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, StoreError>;

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<Professional>, StoreError>;

    async fn update_moderation(
        &self,
        id: Uuid,
        moderation: &ProfessionalModeration,
    ) -> Result<Option<Professional>, StoreError>;

    async fn update_professional_aggregate(
        &self,
        id: Uuid,
        reputation: Reputation,
    ) -> Result<(), StoreError>;

    /// Reviews matching the query, newest first.
    async fn select_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>, StoreError>;

    async fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError>;

    async fn update_review_status(
        &self,
        id: Uuid,
        moderation: &ReviewModeration,
    ) -> Result<Option<Review>, StoreError>;

    /// Releases pooled connections. Called once on shutdown.
    async fn close(&self);
}

/// Bounds every call of the wrapped store; an elapsed deadline becomes
/// [`StoreError::Timeout`].
pub struct TimeoutStore {
    inner: Arc<dyn DirectoryStore>,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn DirectoryStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.limit, call)
            .await
            .map_err(|_| StoreError::Timeout(self.limit))?
    }
}

#[async_trait]
impl DirectoryStore for TimeoutStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(self.inner.ping()).await
    }

    async fn select_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<Professional>, StoreError> {
        self.bounded(self.inner.select_professionals(query)).await
    }

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, StoreError> {
        self.bounded(self.inner.insert_professional(new)).await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<Professional>, StoreError> {
        self.bounded(self.inner.update_profile(id, update)).await
    }

    async fn update_moderation(
        &self,
        id: Uuid,
        moderation: &ProfessionalModeration,
    ) -> Result<Option<Professional>, StoreError> {
        self.bounded(self.inner.update_moderation(id, moderation)).await
    }

    async fn update_professional_aggregate(
        &self,
        id: Uuid,
        reputation: Reputation,
    ) -> Result<(), StoreError> {
        self.bounded(self.inner.update_professional_aggregate(id, reputation)).await
    }

    async fn select_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>, StoreError> {
        self.bounded(self.inner.select_reviews(query)).await
    }

    async fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError> {
        self.bounded(self.inner.insert_review(new)).await
    }

    async fn update_review_status(
        &self,
        id: Uuid,
        moderation: &ReviewModeration,
    ) -> Result<Option<Review>, StoreError> {
        self.bounded(self.inner.update_review_status(id, moderation)).await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{professional, InMemoryStore};
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_store_reports_elapsed_deadline() {
        let slow = InMemoryStore::new().with_delay(Duration::from_secs(10));
        let store = TimeoutStore::new(Arc::new(slow), Duration::from_secs(2));

        let err = store
            .select_professionals(&ProfessionalQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn test_timeout_store_passes_results_through() {
        let inner = InMemoryStore::new();
        inner.seed_professional(professional("Ana", "psicologo", ModerationStatus::Approved));
        let store = TimeoutStore::new(Arc::new(inner), Duration::from_secs(2));

        let rows = store
            .select_professionals(&ProfessionalQuery::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_query_gate_hides_unapproved_rows() {
        let pending = professional("Bia", "medico", ModerationStatus::Pending);
        assert!(!ProfessionalQuery::default().matches(&pending));
        assert!(ProfessionalQuery::by_id(pending.id, true).matches(&pending));
    }
}
