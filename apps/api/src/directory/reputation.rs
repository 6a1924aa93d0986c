//! Review aggregation: derived `score` / `referenceCount` per professional.
//!
//! Only `approved` reviews count. The score is the mean rating rounded half
//! away from zero to one decimal, computed in integer arithmetic so ties do
//! not depend on float representation. An empty set yields `0.0 / 0`.

use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::store::{DirectoryStore, ReviewQuery, ReviewScope, StoreError};
use crate::models::moderation::ModerationStatus;
use crate::models::professional::Reputation;
use crate::models::review::Review;

/// Folds a set of ratings into a reputation. Callers pass approved ratings only.
pub fn compute_reputation(ratings: impl IntoIterator<Item = i32>) -> Reputation {
    let (sum, count) = ratings
        .into_iter()
        .fold((0_i64, 0_i64), |(sum, count), r| (sum + i64::from(r), count + 1));

    if count == 0 {
        return Reputation::EMPTY;
    }

    Reputation {
        score: rounded_tenths(sum, count) as f64 / 10.0,
        reference_count: i32::try_from(count).unwrap_or(i32::MAX),
    }
}

/// `round(sum / count, 1)` expressed in tenths, half away from zero.
fn rounded_tenths(sum: i64, count: i64) -> i64 {
    let numerator = sum * 20;
    let denominator = count * 2;
    if numerator >= 0 {
        (numerator + count) / denominator
    } else {
        -((-numerator + count) / denominator)
    }
}

/// Groups approved reviews by professional in one pass. Every id in `ids`
/// gets an entry; reviews for other ids, or not approved, are ignored.
pub fn group_reputations(ids: &[Uuid], reviews: &[Review]) -> HashMap<Uuid, Reputation> {
    let mut ratings: HashMap<Uuid, Vec<i32>> = ids.iter().map(|id| (*id, Vec::new())).collect();

    for review in reviews.iter().filter(|r| r.status.is_approved()) {
        if let Some(bucket) = ratings.get_mut(&review.professional_id) {
            bucket.push(review.rating);
        }
    }

    ratings
        .into_iter()
        .map(|(id, ratings)| (id, compute_reputation(ratings)))
        .collect()
}

/// Reputation of one professional. Unknown ids yield the empty reputation.
pub async fn aggregate(
    store: &dyn DirectoryStore,
    professional_id: Uuid,
) -> Result<Reputation, StoreError> {
    let reviews = store
        .select_reviews(&ReviewQuery::approved_for(professional_id))
        .await?;
    Ok(compute_reputation(
        reviews
            .iter()
            .filter(|r| r.status.is_approved())
            .map(|r| r.rating),
    ))
}

/// Reputation of many professionals from a single review query.
pub async fn aggregate_all(
    store: &dyn DirectoryStore,
    professional_ids: &[Uuid],
) -> Result<HashMap<Uuid, Reputation>, StoreError> {
    if professional_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let reviews = store
        .select_reviews(&ReviewQuery {
            scope: ReviewScope::Professionals(professional_ids.to_vec()),
            status: Some(ModerationStatus::Approved),
        })
        .await?;

    Ok(group_reputations(professional_ids, &reviews))
}

/// Recomputes and persists the cached aggregate after a moderation change.
///
/// Not atomic with the review write that triggered it: a failure here is
/// logged and swallowed, leaving the cached columns stale until the next
/// moderation of the same professional. Read paths never use the cache.
pub async fn refresh_cached_reputation(
    store: &dyn DirectoryStore,
    professional_id: Uuid,
) -> Option<Reputation> {
    let result = async {
        let reputation = aggregate(store, professional_id).await?;
        store
            .update_professional_aggregate(professional_id, reputation)
            .await?;
        Ok::<_, StoreError>(reputation)
    }
    .await;

    match result {
        Ok(reputation) => {
            info!(
                "Refreshed reputation for professional {professional_id}: score={} count={}",
                reputation.score, reputation.reference_count
            );
            Some(reputation)
        }
        Err(e) => {
            warn!("Failed to refresh reputation for professional {professional_id}: {e}");
            None
        }
    }
}
