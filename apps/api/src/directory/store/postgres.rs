use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::{DirectoryStore, ProfessionalQuery, ReviewQuery, ReviewScope, StoreError};
use crate::directory::filters::FieldFilter;
use crate::models::moderation::ModerationStatus;
use crate::models::professional::{
    NewProfessional, Professional, ProfessionalModeration, ProfileUpdate, Reputation,
};
use crate::models::review::{NewReview, Review, ReviewModeration};

/// `DirectoryStore` over the `professionals` and `reviews` tables.
/// Owns the pool for the lifetime of the process.
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &FieldFilter) {
    // Column names come from the allow-list, never from the request.
    builder.push(" AND ").push(filter.column()).push(" = ");
    match filter {
        FieldFilter::Name(v)
        | FieldFilter::Category(v)
        | FieldFilter::Specialization(v)
        | FieldFilter::City(v)
        | FieldFilter::Phone(v)
        | FieldFilter::Email(v) => {
            builder.push_bind(v.clone());
        }
        FieldFilter::Verified(v) => {
            builder.push_bind(*v);
        }
        FieldFilter::Status(v) => {
            builder.push_bind(v.as_str());
        }
        FieldFilter::UserId(v) => {
            builder.push_bind(*v);
        }
    }
}

fn professionals_select(query: &ProfessionalQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM professionals WHERE TRUE");
    if !query.include_unapproved {
        builder
            .push(" AND status = ")
            .push_bind(ModerationStatus::Approved.as_str());
    }
    if let Some(id) = query.id {
        builder.push(" AND id = ").push_bind(id);
    }
    for filter in &query.filters {
        push_filter(&mut builder, filter);
    }
    builder.push(" ORDER BY name, id");
    builder
}

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Unavailable("connection pool is closed".to_string()));
        }
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn select_professionals(
        &self,
        query: &ProfessionalQuery,
    ) -> Result<Vec<Professional>, StoreError> {
        let mut builder = professionals_select(query);
        debug!("select professionals: {}", builder.sql());
        Ok(builder
            .build_query_as::<Professional>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_professional(&self, new: &NewProfessional) -> Result<Professional, StoreError> {
        let row = sqlx::query_as::<_, Professional>(
            r#"
            INSERT INTO professionals
                (id, user_id, name, category, specialization, education, courses,
                 practice_areas, price, phone, email, city, status, verified,
                 score, reference_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, FALSE, 0, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.specialization)
        .bind(&new.education)
        .bind(&new.courses)
        .bind(&new.practice_areas)
        .bind(new.price)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.city)
        .bind(ModerationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!("Inserted professional {} ({})", row.id, row.category);
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: &ProfileUpdate,
    ) -> Result<Option<Professional>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("UPDATE professionals SET updated_at = now()");
        let text_columns = [
            ("name", &update.name),
            ("category", &update.category),
            ("specialization", &update.specialization),
            ("education", &update.education),
            ("courses", &update.courses),
            ("practice_areas", &update.practice_areas),
            ("phone", &update.phone),
            ("email", &update.email),
            ("city", &update.city),
        ];
        for (column, value) in text_columns {
            if let Some(value) = value {
                builder
                    .push(", ")
                    .push(column)
                    .push(" = ")
                    .push_bind(value.clone());
            }
        }
        if let Some(price) = update.price {
            builder.push(", price = ").push_bind(price);
        }
        builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        Ok(builder
            .build_query_as::<Professional>()
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_moderation(
        &self,
        id: Uuid,
        moderation: &ProfessionalModeration,
    ) -> Result<Option<Professional>, StoreError> {
        Ok(sqlx::query_as::<_, Professional>(
            r#"
            UPDATE professionals
            SET status = COALESCE($1, status),
                verified = COALESCE($2, verified),
                updated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(moderation.status.map(ModerationStatus::as_str))
        .bind(moderation.verified)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_professional_aggregate(
        &self,
        id: Uuid,
        reputation: Reputation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE professionals
            SET score = $1, reference_count = $2, updated_at = now()
            WHERE id = $3
            "#,
        )
        .bind(reputation.score)
        .bind(reputation.reference_count)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn select_reviews(&self, query: &ReviewQuery) -> Result<Vec<Review>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM reviews WHERE ");
        match &query.scope {
            ReviewScope::Professional(id) => {
                builder.push("professional_id = ").push_bind(*id);
            }
            ReviewScope::Professionals(ids) => {
                builder
                    .push("professional_id = ANY(")
                    .push_bind(ids.clone())
                    .push(")");
            }
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY submitted_at DESC, id");

        Ok(builder
            .build_query_as::<Review>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_review(&self, new: &NewReview) -> Result<Review, StoreError> {
        let row = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews
                (id, professional_id, author_name, rating, comment, submitted_at, status)
            VALUES ($1, $2, $3, $4, $5, now(), $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.professional_id)
        .bind(&new.author_name)
        .bind(new.rating)
        .bind(&new.comment)
        .bind(ModerationStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Inserted review {} for professional {}",
            row.id, row.professional_id
        );
        Ok(row)
    }

    async fn update_review_status(
        &self,
        id: Uuid,
        moderation: &ReviewModeration,
    ) -> Result<Option<Review>, StoreError> {
        Ok(sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
            SET status = $1, moderation_comment = $2, moderated_at = now()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(moderation.status.as_str())
        .bind(&moderation.moderation_comment)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }
}
