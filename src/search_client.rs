// ============================================================================
// File: src/search_client.rs
// Tavily web search client
// ============================================================================

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{BotError, Result};
use crate::expander::SearchBackend;
use crate::models::{SearchResult, TavilyRequest, TavilyResponse};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

pub struct SearchClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_results: Option<usize>,
}

impl SearchClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            max_results: None,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);
        let request = TavilyRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            max_results: self.max_results,
        };

        debug!(query, "Searching");
        let http_response = self.client.post(&url).json(&request).send().await?;

        // Check HTTP status
        if !http_response.status().is_success() {
            let status = http_response.status();
            let error_text = http_response.text().await.unwrap_or_default();
            warn!(status = %status, "Search API error");
            return Err(BotError::Api(format!(
                "Search API error: HTTP {}\nURL: {}\nResponse: {}",
                status, url, error_text
            )));
        }

        let response_text = http_response.text().await?;
        let response: TavilyResponse = serde_json::from_str(&response_text).map_err(|e| {
            BotError::Parse(format!(
                "Failed to parse search response as JSON: {}\nURL: {}\nRaw response (first 500 chars): {}",
                e,
                url,
                response_text.chars().take(500).collect::<String>()
            ))
        })?;

        debug!(query, results = response.results.len(), "Search finished");
        Ok(response.results)
    }
}
