// ============================================================================
// File: src/models.rs
// API request and response models
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// -----------------------------------------------------------------------------
// Chat completions
// -----------------------------------------------------------------------------

/// Message structure for a chat completion request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: String, // "system", "user", or "assistant"
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the chat completion endpoint
#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

/// Response from the chat completion endpoint
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

/// Individual response choice
#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// Message in API response
#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize, Clone)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// -----------------------------------------------------------------------------
// Assistant threads and runs
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Thread {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

/// Server-side status of a run
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

/// A run as returned by create/retrieve/submit_tool_outputs
#[derive(Debug, Deserialize, Clone)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RequiredAction {
    pub submit_tool_outputs: SubmitToolOutputsAction,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SubmitToolOutputsAction {
    pub tool_calls: Vec<ToolCall>,
}

/// One tool invocation the run is waiting on
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FunctionCall {
    /// JSON-encoded arguments, e.g. `{"query": "..."}`
    pub arguments: String,
}

/// Arguments of the search tool
#[derive(Debug, Deserialize)]
pub struct SearchArguments {
    pub query: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitToolOutputsRequest {
    pub tool_outputs: Vec<ToolOutput>,
}

#[derive(Debug, Deserialize)]
pub struct MessageList {
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextContent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TextContent {
    pub value: String,
}

// -----------------------------------------------------------------------------
// Tavily search
// -----------------------------------------------------------------------------

/// Request body for the Tavily search API
#[derive(Debug, Serialize)]
pub struct TavilyRequest {
    pub api_key: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

/// Response from the Tavily search API
#[derive(Debug, Deserialize)]
pub struct TavilyResponse {
    pub results: Vec<SearchResult>,
}

/// Individual search result
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

// -----------------------------------------------------------------------------
// MediaWiki action API
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WikiApiError {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub query: TokenQuery,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub tokens: Tokens,
}

#[derive(Debug, Deserialize)]
pub struct Tokens {
    pub logintoken: Option<String>,
    pub csrftoken: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub login: LoginResult,
}

#[derive(Debug, Deserialize)]
pub struct LoginResult {
    pub result: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMembersResponse {
    #[serde(rename = "continue", default)]
    pub continuation: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub query: Option<CategoryMembersQuery>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMembersQuery {
    pub categorymembers: Vec<CategoryMember>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryMember {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct RevisionsResponse {
    pub query: RevisionsQuery,
}

#[derive(Debug, Deserialize)]
pub struct RevisionsQuery {
    pub pages: Vec<WikiPage>,
}

#[derive(Debug, Deserialize)]
pub struct WikiPage {
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub revisions: Vec<Revision>,
}

#[derive(Debug, Deserialize)]
pub struct Revision {
    pub slots: RevisionSlots,
}

#[derive(Debug, Deserialize)]
pub struct RevisionSlots {
    pub main: SlotContent,
}

#[derive(Debug, Deserialize)]
pub struct SlotContent {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditResponse {
    pub edit: EditResult,
}

#[derive(Debug, Deserialize)]
pub struct EditResult {
    pub result: String,
}
