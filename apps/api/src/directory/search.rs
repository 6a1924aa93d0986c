//! Smart search: natural-language matching over approved professionals.
//!
//! Matching is delegated to a pluggable [`TextMatcher`]. Its answer is
//! untrusted: only ids that were in the candidate set survive, each once,
//! in the matcher's order.
//!
//! `AppState` holds an `Arc<dyn TextMatcher>`; the default is
//! [`LlmTextMatcher`].

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::directory::prompts::{MATCH_PROMPT, MATCH_SYSTEM};
use crate::directory::query::list_professionals;
use crate::directory::store::DirectoryStore;
use crate::errors::AppError;
use crate::llm_client::prompts::{CLOSED_WORLD_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::models::professional::Professional;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("text matcher call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("text matcher timed out after {0:?}")]
    Timeout(Duration),
}

/// What the matcher sees of a professional. Contact fields stay out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub specialization: Option<String>,
    pub practice_areas: Option<String>,
    pub education: Option<String>,
    pub courses: Option<String>,
    pub city: Option<String>,
    pub price: Option<f64>,
    pub score: f64,
    pub reference_count: i32,
}

impl From<&Professional> for CandidateSummary {
    fn from(p: &Professional) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            category: p.category.clone(),
            specialization: p.specialization.clone(),
            practice_areas: p.practice_areas.clone(),
            education: p.education.clone(),
            courses: p.courses.clone(),
            city: p.city.clone(),
            price: p.price,
            score: p.score,
            reference_count: p.reference_count,
        }
    }
}

/// Text + candidates → identifiers of the matching candidates.
/// Implementations may be non-deterministic and may return garbage ids.
#[async_trait]
pub trait TextMatcher: Send + Sync {
    async fn match_candidates(
        &self,
        query: &str,
        candidates: &[CandidateSummary],
    ) -> Result<Vec<String>, MatchError>;
}

/// Default matcher: asks the LLM for a JSON list of ids.
pub struct LlmTextMatcher(pub LlmClient);

/// Accepted answer shapes: a bare array, or `{"ids": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MatchAnswer {
    Ids(Vec<serde_json::Value>),
    Wrapped { ids: Vec<serde_json::Value> },
}

impl MatchAnswer {
    fn into_ids(self) -> Vec<String> {
        let (MatchAnswer::Ids(values) | MatchAnswer::Wrapped { ids: values }) = self;
        values
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// Fills the match template in a single pass, so placeholder text inside
/// the user's query or the candidate data is never substituted.
fn render_match_prompt(query: &str, candidates_json: &str) -> String {
    let mut out = String::with_capacity(MATCH_PROMPT.len() + query.len() + candidates_json.len());
    let mut rest = MATCH_PROMPT;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{query}") {
            out.push_str(query);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{candidates}") {
            out.push_str(candidates_json);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[async_trait]
impl TextMatcher for LlmTextMatcher {
    async fn match_candidates(
        &self,
        query: &str,
        candidates: &[CandidateSummary],
    ) -> Result<Vec<String>, MatchError> {
        let candidates_json = serde_json::to_string(candidates).map_err(LlmError::Parse)?;
        let prompt = render_match_prompt(query, &candidates_json);
        let system = format!("{MATCH_SYSTEM}\n\n{JSON_ONLY_SYSTEM}\n\n{CLOSED_WORLD_INSTRUCTION}");

        let answer: MatchAnswer = self.0.call_json(&prompt, &system).await?;
        Ok(answer.into_ids())
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub professionals: Vec<Professional>,
    pub total: usize,
}

/// Keeps the candidates the matcher named, in the matcher's order.
/// Unknown and repeated ids are dropped.
pub fn intersect_matches(candidates: Vec<Professional>, matched: &[String]) -> Vec<Professional> {
    let mut by_id: Vec<Option<Professional>> = candidates.into_iter().map(Some).collect();
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for raw in matched {
        let Ok(id) = raw.trim().parse::<Uuid>() else {
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        if let Some(slot) = by_id
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|p| p.id == id))
        {
            result.extend(slot.take());
        }
    }
    result
}

/// Runs a smart search over the approved professionals.
pub async fn smart_search(
    store: &dyn DirectoryStore,
    matcher: &dyn TextMatcher,
    prompt: &str,
    match_timeout: Duration,
) -> Result<SearchResponse, AppError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let candidates = list_professionals(store, Vec::new(), false).await?;
    if candidates.is_empty() {
        return Ok(SearchResponse {
            professionals: Vec::new(),
            total: 0,
        });
    }

    let summaries: Vec<CandidateSummary> = candidates.iter().map(CandidateSummary::from).collect();
    let matched = tokio::time::timeout(match_timeout, matcher.match_candidates(prompt, &summaries))
        .await
        .map_err(|_| MatchError::Timeout(match_timeout))??;

    let returned = matched.len();
    let professionals = intersect_matches(candidates, &matched);
    if professionals.len() < returned {
        warn!(
            "Text matcher returned {} ids, {} matched the candidate set",
            returned,
            professionals.len()
        );
    }
    info!(
        "Smart search matched {} of {} candidates",
        professionals.len(),
        summaries.len()
    );

    Ok(SearchResponse {
        total: professionals.len(),
        professionals,
    })
}
