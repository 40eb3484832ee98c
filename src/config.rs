// ============================================================================
// File: src/config.rs
// Configuration structures and validation
// ============================================================================

use clap::ValueEnum;

use crate::error::{BotError, Result};

pub const OPENAI_API_KEY_VAR: &str = "WIKIBOT_OPENAI_API_KEY";
pub const TAVILY_API_KEY_VAR: &str = "WIKIBOT_TAVILY_API_KEY";
pub const USERNAME_VAR: &str = "WIKIBOT_USERNAME";
pub const PASSWORD_VAR: &str = "WIKIBOT_PASSWORD";
pub const ASSISTANT_ID_VAR: &str = "WIKIBOT_ASSISTANT_ID";
pub const SITE_VAR: &str = "WIKIBOT_SITE";

/// Wiki host used when `WIKIBOT_SITE` is not set
pub const DEFAULT_SITE: &str = "humanoids.wiki";

/// How page text gets expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpansionMode {
    /// Multi-turn assistant run that can call web search
    Assistant,
    /// Single chat completion call
    Completion,
}

/// Credentials and endpoints, read once from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the generation service
    pub openai_api_key: String,

    /// API key for the Tavily search service
    pub tavily_api_key: String,

    /// Wiki bot account
    pub username: String,
    pub password: String,

    /// Assistant used for tool-augmented runs (assistant mode only)
    pub assistant_id: Option<String>,

    /// Wiki host, e.g. "humanoids.wiki"
    pub site: String,
}

impl Config {
    /// Load the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env(mode: ExpansionMode) -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(mode, |name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Every missing or empty required variable is collected so they can be
    /// reported in a single error.
    pub fn from_lookup<F>(mode: ExpansionMode, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |name: &str| match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let openai_api_key = required(OPENAI_API_KEY_VAR);
        let tavily_api_key = required(TAVILY_API_KEY_VAR);
        let username = required(USERNAME_VAR);
        let password = required(PASSWORD_VAR);
        let assistant_id = match mode {
            ExpansionMode::Assistant => Some(required(ASSISTANT_ID_VAR)),
            ExpansionMode::Completion => None,
        };

        if !missing.is_empty() {
            return Err(BotError::MissingCredential(missing));
        }

        let site = lookup(SITE_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_SITE.to_string());

        Ok(Self {
            openai_api_key,
            tavily_api_key,
            username,
            password,
            assistant_id,
            site,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (OPENAI_API_KEY_VAR, "sk-test"),
            (TAVILY_API_KEY_VAR, "tvly-test"),
            (USERNAME_VAR, "Stompy"),
            (PASSWORD_VAR, "hunter2"),
            (ASSISTANT_ID_VAR, "asst_123"),
        ]
    }

    #[test]
    fn test_loads_complete_environment() {
        let config = Config::from_lookup(ExpansionMode::Assistant, env(&full_env())).unwrap();
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.username, "Stompy");
        assert_eq!(config.assistant_id.as_deref(), Some("asst_123"));
        assert_eq!(config.site, DEFAULT_SITE);
    }

    #[test]
    fn test_reports_all_missing_variables_together() {
        let vars = [(USERNAME_VAR, "Stompy"), (TAVILY_API_KEY_VAR, "")];
        let err = Config::from_lookup(ExpansionMode::Assistant, env(&vars)).unwrap_err();
        match err {
            BotError::MissingCredential(missing) => assert_eq!(
                missing,
                vec![
                    OPENAI_API_KEY_VAR.to_string(),
                    TAVILY_API_KEY_VAR.to_string(),
                    PASSWORD_VAR.to_string(),
                    ASSISTANT_ID_VAR.to_string(),
                ]
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_completion_mode_does_not_need_assistant() {
        let vars: Vec<_> = full_env()
            .into_iter()
            .filter(|(k, _)| *k != ASSISTANT_ID_VAR)
            .collect();
        let config = Config::from_lookup(ExpansionMode::Completion, env(&vars)).unwrap();
        assert!(config.assistant_id.is_none());
    }

    #[test]
    fn test_site_override() {
        let mut vars = full_env();
        vars.push((SITE_VAR, "wiki.example.org"));
        let config = Config::from_lookup(ExpansionMode::Assistant, env(&vars)).unwrap();
        assert_eq!(config.site, "wiki.example.org");
    }
}
