//! Best-effort web grounding for advisor replies.
//!
//! A [`SearchProvider`] talks to one search backend and may fail.
//! [`GroundingSearch`] wraps it and never fails: any provider error is logged
//! and replaced with a placeholder so the conversation turn always proceeds.

mod duckduckgo;
mod google;

pub use duckduckgo::DuckDuckGoProvider;
pub use google::GoogleSearchProvider;

use serde::{Deserialize, Serialize};

use crate::constants::{limits, texts};
use crate::error::AdvisorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    #[serde(default)]
    pub url: String,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, AdvisorError>;
}

pub struct GroundingSearch {
    provider: Option<Box<dyn SearchProvider>>,
    max_results: usize,
}

impl GroundingSearch {
    pub fn new(provider: Box<dyn SearchProvider>) -> Self {
        Self {
            provider: Some(provider),
            max_results: limits::MAX_SEARCH_RESULTS,
        }
    }

    /// Grounding switched off; every lookup yields the placeholder.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            max_results: limits::MAX_SEARCH_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max.max(1);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// One search attempt. Returns `"title\nsnippet"` per hit separated by a
    /// blank line, or [`texts::SEARCH_FALLBACK`] on any failure.
    pub async fn lookup(&self, query: &str) -> String {
        let Some(provider) = &self.provider else {
            return texts::SEARCH_FALLBACK.to_string();
        };

        match provider.search(query, self.max_results).await {
            Ok(hits) => {
                tracing::debug!(provider = provider.name(), hits = hits.len(), "Grounding search done");
                format_hits(&hits)
            }
            Err(e) => {
                tracing::warn!(provider = provider.name(), "Search failed, using placeholder: {e}");
                texts::SEARCH_FALLBACK.to_string()
            }
        }
    }
}

pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| format!("{}\n{}", h.title, h.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}
