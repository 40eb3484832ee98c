// ============================================================================
// File: src/error.rs
// Error types shared by the clients, the expander and the page loop
// ============================================================================

use thiserror::Error;

/// Result type for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

/// Bot errors. Every variant is fatal for the whole run.
#[derive(Debug, Error)]
pub enum BotError {
    /// One or more required environment variables are absent
    #[error("Missing environment variables: {}", .0.join(", "))]
    MissingCredential(Vec<String>),

    /// The generation service failed or returned no usable content
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A search requested by the assistant came back empty
    #[error("No search results found for query '{query}'")]
    EmptySearchResult { query: String },

    /// The wiki rejected the bot's login
    #[error("Wiki authentication failed: {0}")]
    Authentication(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response, error payload)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// The BPE tables used for token accounting could not be loaded
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BotError::Parse(err.to_string())
        } else {
            BotError::Network(err.to_string())
        }
    }
}
