// ============================================================================
// File: src/llm_client.rs
// OpenAI API client for chat completions and assistant runs
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{BotError, Result};
use crate::expander::{AssistantBackend, CompletionBackend};
use crate::models::{
    ChatRequest, ChatResponse, CreateMessageRequest, CreateRunRequest, Message, MessageContent,
    MessageList, Run, SubmitToolOutputsRequest, Thread, ToolOutput,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct LLMClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl LLMClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (proxies, tests).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .authorized(self.client.get(&url))
            .query(query)
            .send()
            .await?;
        Self::parse(&url, response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        Self::parse(&url, response).await
    }

    async fn parse<T: DeserializeOwned>(url: &str, response: Response) -> Result<T> {
        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(status = %status, url, "OpenAI API error");
            return Err(BotError::Api(format!(
                "HTTP {} from {}\nResponse: {}",
                status, url, response_text
            )));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            BotError::Parse(format!(
                "Failed to parse response from {}: {}\nRaw response: {}",
                url, e, response_text
            ))
        })
    }
}

#[async_trait]
impl CompletionBackend for LLMClient {
    async fn complete(&self, model: &str, messages: Vec<Message>) -> Result<Option<String>> {
        let request = ChatRequest {
            model: model.to_string(),
            messages,
        };

        debug!(model, "Calling chat completion");
        let response: ChatResponse = self.post("/chat/completions", &request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl AssistantBackend for LLMClient {
    async fn create_thread(&self) -> Result<String> {
        let thread: Thread = self.post("/threads", &serde_json::json!({})).await?;
        debug!(thread_id = %thread.id, "Created thread");
        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<()> {
        let request = CreateMessageRequest {
            role: "user".to_string(),
            content: text.to_string(),
        };
        let _: serde_json::Value = self
            .post(&format!("/threads/{}/messages", thread_id), &request)
            .await?;
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let request = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };
        let run: Run = self
            .post(&format!("/threads/{}/runs", thread_id), &request)
            .await?;
        debug!(run_id = %run.id, status = ?run.status, "Created run");
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        self.get(&format!("/threads/{}/runs/{}", thread_id, run_id), &[])
            .await
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run> {
        let request = SubmitToolOutputsRequest { tool_outputs };
        self.post(
            &format!("/threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
            &request,
        )
        .await
    }

    async fn latest_assistant_text(&self, thread_id: &str) -> Result<Option<String>> {
        let messages: MessageList = self
            .get(
                &format!("/threads/{}/messages", thread_id),
                &[("order", "desc"), ("limit", "1")],
            )
            .await?;

        Ok(messages
            .data
            .into_iter()
            .filter(|m| m.assistant_id.is_some() || m.role == "assistant")
            .flat_map(|m| m.content)
            .find_map(|content| match content {
                MessageContent::Text { text } => Some(text.value),
                MessageContent::Other => None,
            }))
    }
}
