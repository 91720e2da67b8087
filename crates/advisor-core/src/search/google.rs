use serde::Deserialize;

use super::{SearchHit, SearchProvider};
use crate::constants::endpoints;
use crate::error::AdvisorError;

/// Google Custom Search JSON API.
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    base_url: String,
}

impl GoogleSearchProvider {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            base_url: endpoints::GOOGLE_SEARCH_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

pub(crate) fn parse_results(body: &str, max_results: usize) -> Result<Vec<SearchHit>, AdvisorError> {
    let parsed: CustomSearchResponse = serde_json::from_str(body)
        .map_err(|e| AdvisorError::Search(format!("Failed to parse search response: {e}")))?;

    Ok(parsed
        .items
        .into_iter()
        .take(max_results)
        .map(|item| SearchHit {
            title: item.title,
            snippet: item.snippet.replace('\n', " "),
            url: item.link,
        })
        .collect())
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, AdvisorError> {
        // The API caps `num` at 10
        let num = max_results.clamp(1, 10).to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AdvisorError::Search(format!("Search request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdvisorError::Search(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(AdvisorError::Search(format!("Google search error ({status})")));
        }

        parse_results(&body, max_results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results() {
        let body = r#"{
            "kind": "customsearch#search",
            "items": [
                {"title": "Loss aversion - Wikipedia", "snippet": "Loss aversion is the\ntendency...", "link": "https://en.wikipedia.org/wiki/Loss_aversion"},
                {"title": "Second", "snippet": "More", "link": "https://example.com"}
            ]
        }"#;
        let hits = parse_results(body, 5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Loss aversion - Wikipedia");
        assert_eq!(hits[0].snippet, "Loss aversion is the tendency...");
        assert_eq!(hits[1].url, "https://example.com");
    }

    #[test]
    fn test_missing_items_means_no_hits() {
        let hits = parse_results(r#"{"kind": "customsearch#search"}"#, 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_garbage_body_is_an_error() {
        assert!(parse_results("<html>quota exceeded</html>", 5).is_err());
    }
}
