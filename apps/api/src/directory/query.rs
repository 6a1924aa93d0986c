//! Professional read model: status gate, typed filters, reputation merge.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::directory::filters::FieldFilter;
use crate::directory::reputation::{aggregate_all, compute_reputation};
use crate::directory::store::{DirectoryStore, ProfessionalQuery, ReviewQuery};
use crate::errors::AppError;
use crate::models::professional::{Professional, Reputation};
use crate::models::review::Review;

/// A single professional with its approved reviews embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalDetail {
    #[serde(flatten)]
    pub professional: Professional,
    pub reviews: Vec<Review>,
}

/// Lists professionals matching every filter, with fresh reputation merged in.
///
/// Without `include_unapproved` only `approved` rows are candidates. Order is
/// the store's: name, then id. Cached aggregate columns are never written here.
pub async fn list_professionals(
    store: &dyn DirectoryStore,
    filters: Vec<FieldFilter>,
    include_unapproved: bool,
) -> Result<Vec<Professional>, AppError> {
    let query = ProfessionalQuery {
        id: None,
        include_unapproved,
        filters,
    };
    let professionals = store.select_professionals(&query).await?;
    debug!(
        "Selected {} professionals (include_unapproved={include_unapproved})",
        professionals.len()
    );

    with_reputations(store, professionals).await
}

/// Merges batch-computed reputation onto each professional.
pub async fn with_reputations(
    store: &dyn DirectoryStore,
    professionals: Vec<Professional>,
) -> Result<Vec<Professional>, AppError> {
    let ids: Vec<Uuid> = professionals.iter().map(|p| p.id).collect();
    let mut reputations = aggregate_all(store, &ids).await?;

    Ok(professionals
        .into_iter()
        .map(|p| {
            let reputation = reputations.remove(&p.id).unwrap_or(Reputation::EMPTY);
            p.with_reputation(reputation)
        })
        .collect())
}

/// Fetches one professional with its approved reviews, newest first.
///
/// A row that is absent, or hidden by the status gate, is `NotFound`; a
/// failing store call is `BackendUnavailable`.
pub async fn get_professional(
    store: &dyn DirectoryStore,
    id: Uuid,
    include_unapproved: bool,
) -> Result<ProfessionalDetail, AppError> {
    let professional = store
        .select_professionals(&ProfessionalQuery::by_id(id, include_unapproved))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Professional {id} not found")))?;

    let reviews: Vec<Review> = store
        .select_reviews(&ReviewQuery::approved_for(id))
        .await?
        .into_iter()
        .filter(|r| r.status.is_approved())
        .collect();
    let reputation = compute_reputation(reviews.iter().map(|r| r.rating));

    Ok(ProfessionalDetail {
        professional: professional.with_reputation(reputation),
        reviews,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::store::memory::{professional, review, InMemoryStore};
    use crate::models::moderation::ModerationStatus;

    struct Fixture {
        store: InMemoryStore,
        ana: Uuid,
        bruno: Uuid,
        carla: Uuid,
    }

    fn fixture() -> Fixture {
        let store = InMemoryStore::new();

        let ana = store.seed_professional(professional(
            "Ana Souza",
            "psicologo",
            ModerationStatus::Approved,
        ));
        let bruno = store.seed_professional(professional(
            "Bruno Lima",
            "Psicologo",
            ModerationStatus::Approved,
        ));
        let carla = store.seed_professional(professional(
            "Carla Dias",
            "psicologo",
            ModerationStatus::Pending,
        ));
        store.seed_professional(professional(
            "Davi Reis",
            "nutricionista",
            ModerationStatus::Rejected,
        ));

        for rating in [4, 5, 5] {
            store.seed_review(review(ana, rating, ModerationStatus::Approved), 2);
        }
        store.seed_review(review(ana, 1, ModerationStatus::Pending), 0);
        store.seed_review(review(bruno, 3, ModerationStatus::Approved), 5);

        Fixture {
            store,
            ana,
            bruno,
            carla,
        }
    }

    #[tokio::test]
    async fn test_default_listing_is_approved_only() {
        let f = fixture();
        let rows = list_professionals(&f.store, vec![], false).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|p| p.status == ModerationStatus::Approved));
    }

    #[tokio::test]
    async fn test_admin_listing_includes_every_status() {
        let f = fixture();
        let rows = list_professionals(&f.store, vec![], true).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().any(|p| p.id == f.carla));
    }

    #[tokio::test]
    async fn test_category_filter_is_exact_and_case_sensitive() {
        let f = fixture();
        let rows = list_professionals(
            &f.store,
            vec![FieldFilter::Category("psicologo".to_string())],
            false,
        )
        .await
        .unwrap();

        let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![f.ana]);
    }

    #[tokio::test]
    async fn test_partial_value_does_not_match() {
        let f = fixture();
        let rows = list_professionals(
            &f.store,
            vec![FieldFilter::Category("psico".to_string())],
            false,
        )
        .await
        .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_listing_merges_fresh_reputation() {
        let f = fixture();
        let rows = list_professionals(&f.store, vec![], false).await.unwrap();

        let ana = rows.iter().find(|p| p.id == f.ana).unwrap();
        assert_eq!(ana.score, 4.7);
        assert_eq!(ana.reference_count, 3);
        let bruno = rows.iter().find(|p| p.id == f.bruno).unwrap();
        assert_eq!(bruno.score, 3.0);
        assert_eq!(bruno.reference_count, 1);

        // read path leaves the cached columns alone
        assert_eq!(f.store.stored_professional(f.ana).unwrap().reference_count, 0);
    }

    #[tokio::test]
    async fn test_listing_is_ordered_by_name() {
        let f = fixture();
        let rows = list_professionals(&f.store, vec![], true).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ana Souza", "Bruno Lima", "Carla Dias", "Davi Reis"]);
    }

    #[tokio::test]
    async fn test_get_one_embeds_approved_reviews_only() {
        let f = fixture();
        let detail = get_professional(&f.store, f.ana, false).await.unwrap();
        assert_eq!(detail.reviews.len(), 3);
        assert!(detail.reviews.iter().all(|r| r.status.is_approved()));
        assert_eq!(detail.professional.score, 4.7);
        assert_eq!(detail.professional.reference_count, 3);
    }

    #[tokio::test]
    async fn test_get_one_unknown_is_not_found() {
        let f = fixture();
        let err = get_professional(&f.store, Uuid::new_v4(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_one_respects_status_gate() {
        let f = fixture();
        let err = get_professional(&f.store, f.carla, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let detail = get_professional(&f.store, f.carla, true).await.unwrap();
        assert_eq!(detail.professional.reference_count, 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_backend_unavailable() {
        let f = fixture();
        f.store.set_failing(true);

        let err = get_professional(&f.store, f.ana, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));

        let err = list_professionals(&f.store, vec![], false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendUnavailable(_)));
    }

    #[test]
    fn test_detail_serializes_flat() {
        let p = professional("Ana Souza", "psicologo", ModerationStatus::Approved);
        let value = serde_json::to_value(ProfessionalDetail {
            professional: p,
            reviews: vec![],
        })
        .unwrap();
        assert_eq!(value["name"], "Ana Souza");
        assert_eq!(value["referenceCount"], 0);
        assert!(value["reviews"].as_array().unwrap().is_empty());
    }
}
