//! In-memory `DirectoryStore` for tests, with failure and latency injection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use super::{DirectoryStore, ProfessionalQuery, ReviewQuery, StoreError};
use crate::models::moderation::ModerationStatus;
use crate::models::professional::{
    NewProfessional, Professional, ProfessionalModeration, ProfileUpdate, Reputation,
};
use crate::models::review::{NewReview, Review, ReviewModeration};

#[derive(Default)]
struct Tables {
    professionals: Vec<Professional>,
    reviews: Vec<Review>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    failing_aggregate_writes: AtomicBool,
    delay: Option<Duration>,
    review_selects: AtomicUsize,
}

/// An approved-or-not professional with empty aggregate and no contact data.
pub fn professional(name: &str, category: &str, status: ModerationStatus) -> Professional {
    let now = Utc::now();
    Professional {
        id: Uuid::new_v4(),
        user_id: None,
        name: name.to_string(),
        category: category.to_string(),
        specialization: None,
        education: None,
        courses: None,
        practice_areas: None,
        price: None,
        phone: None,
        email: None,
        city: None,
        status,
        verified: false,
        score: 0.0,
        reference_count: 0,
        created_at: now,
        updated_at: now,
    }
}

/// A review submitted just now; `seed_review` back-dates it.
pub fn review(professional_id: Uuid, rating: i32, status: ModerationStatus) -> Review {
    Review {
        id: Uuid::new_v4(),
        professional_id,
        author_name: "Paciente".to_string(),
        rating,
        comment: "Atendimento".to_string(),
        submitted_at: Utc::now(),
        status,
        moderation_comment: None,
        moderated_at: None,
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every subsequent call fails with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Only `update_professional_aggregate` fails.
    pub fn set_failing_aggregate_writes(&self, failing: bool) {
        self.failing_aggregate_writes.store(failing, Ordering::SeqCst);
    }

    pub fn review_selects(&self) -> usize {
        self.review_selects.load(Ordering::SeqCst)
    }

    pub fn seed_professional(&self, professional: Professional) -> Uuid {
        let id = professional.id;
        self.lock().professionals.push(professional);
        id
    }

    /// Seeds a review dated `age_days` before now.
    pub fn seed_review(&self, mut review: Review, age_days: i64) -> Uuid {
        review.submitted_at = Utc::now() - ChronoDuration::days(age_days);
        let id = review.id;
        self.lock().reviews.push(review);
        id
    }

    pub fn stored_professional(&self, id: Uuid) -> Option<Professional> {
        self.lock()
            .professionals
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn enter(&self) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await
    }

    async fn select_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<Professional>, StoreError> {
        self.enter().await?;
        let mut rows: Vec<Professional> = self
            .lock()
            .professionals
            .iter()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, StoreError> {
        self.enter().await?;
        let mut row = professional(&new.name, &new.category, ModerationStatus::Pending);
        row.user_id = new.user_id;
        row.specialization = new.specialization.clone();
        row.education = new.education.clone();
        row.courses = new.courses.clone();
        row.practice_areas = new.practice_areas.clone();
        row.price = new.price;
        row.phone = new.phone.clone();
        row.email = new.email.clone();
        row.city = new.city.clone();
        self.lock().professionals.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<Professional>, StoreError> {
        self.enter().await?;
        let mut tables = self.lock();
        let Some(row) = tables.professionals.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = &update.name {
            row.name = v.clone();
        }
        if let Some(v) = &update.category {
            row.category = v.clone();
        }
        if update.specialization.is_some() {
            row.specialization = update.specialization.clone();
        }
        if update.education.is_some() {
            row.education = update.education.clone();
        }
        if update.courses.is_some() {
            row.courses = update.courses.clone();
        }
        if update.practice_areas.is_some() {
            row.practice_areas = update.practice_areas.clone();
        }
        if update.price.is_some() {
            row.price = update.price;
        }
        if update.phone.is_some() {
            row.phone = update.phone.clone();
        }
        if update.email.is_some() {
            row.email = update.email.clone();
        }
        if update.city.is_some() {
            row.city = update.city.clone();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn update_moderation(
        &self,
        id: Uuid,
        moderation: &ProfessionalModeration,
    ) -> Result<Option<Professional>, StoreError> {
        self.enter().await?;
        let mut tables = self.lock();
        let Some(row) = tables.professionals.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(status) = moderation.status {
            row.status = status;
        }
        if let Some(verified) = moderation.verified {
            row.verified = verified;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn update_professional_aggregate(
        &self,
        id: Uuid,
        reputation: Reputation,
    ) -> Result<(), StoreError> {
        self.enter().await?;
        if self.failing_aggregate_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("aggregate write rejected".to_string()));
        }
        if let Some(row) = self.lock().professionals.iter_mut().find(|p| p.id == id) {
            row.score = reputation.score;
            row.reference_count = reputation.reference_count;
        }
        Ok(())
    }

    async fn select_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>, StoreError> {
        self.enter().await?;
        self.review_selects.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<Review> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError> {
        self.enter().await?;
        let mut row = review(new.professional_id, new.rating, ModerationStatus::Pending);
        row.author_name = new.author_name.clone();
        row.comment = new.comment.clone();
        self.lock().reviews.push(row.clone());
        Ok(row)
    }

    async fn update_review_status(
        &self,
        id: Uuid,
        moderation: &ReviewModeration,
    ) -> Result<Option<Review>, StoreError> {
        self.enter().await?;
        let mut tables = self.lock();
        let Some(row) = tables.reviews.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        row.status = moderation.status;
        row.moderation_comment = moderation.moderation_comment.clone();
        row.moderated_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn close(&self) {}
}
