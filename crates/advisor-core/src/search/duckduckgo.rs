use super::{SearchHit, SearchProvider};
use crate::constants::endpoints;
use crate::error::AdvisorError;

/// Scrapes the DuckDuckGo HTML lite endpoint. Needs no API key.
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl DuckDuckGoProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: endpoints::DUCKDUCKGO_HTML_URL.to_string(),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoProvider {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, AdvisorError> {
        let url = format!("{}?q={}", self.base_url, urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .header("User-Agent", "AdvisorChat/1.0")
            .send()
            .await
            .map_err(|e| AdvisorError::Search(format!("Search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AdvisorError::Search(format!(
                "DuckDuckGo error ({})",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| AdvisorError::Search(format!("Failed to read response: {e}")))?;

        Ok(parse_ddg_results(&html, max_results))
    }
}

fn parse_ddg_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let mut results = Vec::new();

    // Links carry class="result__a", snippets class="result__snippet"
    for segment in html.split("class=\"result__a\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let url = extract_between(segment, "href=\"", "\"").unwrap_or_default();
        let title = extract_between(segment, ">", "</a>").unwrap_or_default();
        let snippet = match segment.find("class=\"result__snippet\"") {
            Some(start) => extract_between(&segment[start..], ">", "</a>")
                .or_else(|| extract_between(&segment[start..], ">", "</"))
                .unwrap_or_default(),
            None => String::new(),
        };

        // Internal DDG links
        if url.is_empty() || (url.starts_with('/') && !url.contains("uddg=")) {
            continue;
        }

        // Results are wrapped in a redirect carrying the target in `uddg`
        let clean_url = match url.split("uddg=").nth(1) {
            Some(rest) => {
                let encoded = rest.split('&').next().unwrap_or(rest);
                urlencoding::decode(encoded)
                    .map(|u| u.into_owned())
                    .unwrap_or_else(|_| url.clone())
            }
            None => url.clone(),
        };

        results.push(SearchHit {
            title: decode_entities(&strip_html_tags(&title)),
            snippet: decode_entities(&strip_html_tags(&snippet)),
            url: clean_url,
        });
    }

    results
}

fn extract_between(text: &str, start: &str, end: &str) -> Option<String> {
    let start_idx = text.find(start)? + start.len();
    let remaining = &text[start_idx..];
    let end_idx = remaining.find(end)?;
    Some(remaining[..end_idx].to_string())
}

fn strip_html_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }
    result.trim().to_string()
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}
