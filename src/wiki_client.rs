// ============================================================================
// File: src/wiki_client.rs
// MediaWiki action API client
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{BotError, Result};
use crate::models::{
    CategoryMembersResponse, EditResponse, LoginResponse, RevisionsResponse, TokenResponse,
    WikiApiError,
};
use crate::orchestrator::Wiki;

pub struct WikiClient {
    client: Client,
    api_url: String,
}

impl WikiClient {
    /// Client for `https://<site>/api.php`.
    pub fn new(site: &str) -> Result<Self> {
        Self::with_api_url(format!("https://{}/api.php", site))
    }

    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .user_agent(concat!("wikibot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Log in with the bot account; the session cookie is kept by the client.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = self.token("login").await?;

        let response: LoginResponse = self
            .post(&[
                ("action", "login"),
                ("lgname", username),
                ("lgpassword", password),
                ("lgtoken", token.as_str()),
            ])
            .await?;

        if response.login.result != "Success" {
            return Err(BotError::Authentication(format!(
                "{}{}",
                response.login.result,
                response
                    .login
                    .reason
                    .map(|reason| format!(": {}", reason))
                    .unwrap_or_default()
            )));
        }

        debug!(username, "Logged in");
        Ok(())
    }

    async fn token(&self, kind: &str) -> Result<String> {
        let response: TokenResponse = self
            .get(&[("action", "query"), ("meta", "tokens"), ("type", kind)])
            .await?;

        let tokens = response.query.tokens;
        let token = match kind {
            "login" => tokens.logintoken,
            _ => tokens.csrftoken,
        };
        token.ok_or_else(|| BotError::Api(format!("Wiki returned no {} token", kind)))
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .query(&[("format", "json"), ("formatversion", "2")])
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("format", "json"));
        form.push(("formatversion", "2"));

        let response = self.client.post(&self.api_url).form(&form).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, "Wiki API error");
            return Err(BotError::Api(format!(
                "Wiki API error: HTTP {}\nResponse: {}",
                status, response_text
            )));
        }

        let value: serde_json::Value = serde_json::from_str(&response_text)
            .map_err(|e| BotError::Parse(format!("Failed to parse wiki response: {}", e)))?;

        if let Some(error) = value.get("error") {
            let error: WikiApiError = serde_json::from_value(error.clone())
                .map_err(|e| BotError::Parse(format!("Failed to parse wiki error: {}", e)))?;
            return Err(BotError::Api(format!("{}: {}", error.code, error.info)));
        }

        serde_json::from_value(value)
            .map_err(|e| BotError::Parse(format!("Unexpected wiki response: {}", e)))
    }
}

#[async_trait]
impl Wiki for WikiClient {
    async fn category_members(&self, category: &str) -> Result<Vec<String>> {
        let title = format!("Category:{}", category);
        let mut titles = Vec::new();
        let mut continuation: Vec<(String, String)> = Vec::new();

        loop {
            let mut params = vec![
                ("action", "query"),
                ("list", "categorymembers"),
                ("cmtitle", title.as_str()),
                ("cmlimit", "max"),
            ];
            params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.as_str())));

            let response: CategoryMembersResponse = self.get(&params).await?;
            if let Some(query) = response.query {
                titles.extend(query.categorymembers.into_iter().map(|m| m.title));
            }

            match response.continuation {
                Some(next) => continuation = next.into_iter().collect(),
                None => break,
            }
        }

        debug!(category, pages = titles.len(), "Listed category");
        Ok(titles)
    }

    async fn page_text(&self, title: &str) -> Result<String> {
        let response: RevisionsResponse = self
            .get(&[
                ("action", "query"),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("titles", title),
            ])
            .await?;

        let text = response
            .query
            .pages
            .into_iter()
            .find(|page| !page.missing)
            .and_then(|page| page.revisions.into_iter().next())
            .map(|revision| revision.slots.main.content)
            .unwrap_or_default();
        Ok(text)
    }

    async fn save_page(&self, title: &str, text: &str, summary: &str) -> Result<()> {
        let token = self.token("csrf").await?;

        let response: EditResponse = self
            .post(&[
                ("action", "edit"),
                ("title", title),
                ("text", text),
                ("summary", summary),
                ("bot", "1"),
                ("token", token.as_str()),
            ])
            .await?;

        if response.edit.result != "Success" {
            return Err(BotError::Api(format!(
                "Edit of '{}' returned {}",
                title, response.edit.result
            )));
        }
        Ok(())
    }
}
