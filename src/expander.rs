// ============================================================================
// File: src/expander.rs
// Content expansion: single completion call or tool-augmented assistant run
// ============================================================================

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::models::{
    Message, RequiredAction, Run, RunStatus, SearchArguments, SearchResult, ToolCall, ToolOutput,
};
use crate::wikitext;

/// Chat completion endpoint
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Returns the first choice's text, if any.
    async fn complete(&self, model: &str, messages: Vec<Message>) -> Result<Option<String>>;
}

/// Thread/run/message primitives of the assistant endpoint
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn create_thread(&self) -> Result<String>;
    async fn add_user_message(&self, thread_id: &str, text: &str) -> Result<()>;
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run>;
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run>;
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        tool_outputs: Vec<ToolOutput>,
    ) -> Result<Run>;
    /// Text of the most recent assistant-authored message.
    async fn latest_assistant_text(&self, thread_id: &str) -> Result<Option<String>>;
}

/// Web search endpoint
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Turns page text into expanded page text
#[async_trait]
pub trait Expander: Send + Sync {
    async fn expand(&self, text: &str) -> Result<String>;
}

// -----------------------------------------------------------------------------
// Completion
// -----------------------------------------------------------------------------

pub struct CompletionExpander<C> {
    backend: C,
    model: String,
}

impl<C: CompletionBackend> CompletionExpander<C> {
    pub fn new(backend: C, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }
}

#[async_trait]
impl<C: CompletionBackend> Expander for CompletionExpander<C> {
    async fn expand(&self, text: &str) -> Result<String> {
        let messages = vec![
            Message::system(wikitext::system_instruction()),
            Message::user(wikitext::user_prompt(text)),
        ];

        match self.backend.complete(&self.model, messages).await? {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(BotError::Generation(format!(
                "model '{}' returned no content",
                self.model
            ))),
        }
    }
}

// -----------------------------------------------------------------------------
// Assistant run
// -----------------------------------------------------------------------------

/// Local view of a run's progress.
///
/// Pending moves to any state on poll; RequiresAction moves back to Pending
/// only once every tool output has been submitted. Completed and Failed are
/// terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    Pending,
    RequiresAction(Option<Vec<ToolCall>>),
    Completed,
    Failed(RunStatus),
}

impl RunState {
    /// Classify a polled run.
    pub fn observe(run: &Run) -> Self {
        match run.status {
            RunStatus::Queued | RunStatus::InProgress | RunStatus::Cancelling => RunState::Pending,
            RunStatus::RequiresAction => RunState::RequiresAction(
                run.required_action
                    .as_ref()
                    .map(|RequiredAction { submit_tool_outputs }| {
                        submit_tool_outputs.tool_calls.clone()
                    }),
            ),
            RunStatus::Completed => RunState::Completed,
            RunStatus::Failed
            | RunStatus::Cancelled
            | RunStatus::Expired
            | RunStatus::Incomplete => RunState::Failed(run.status),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_))
    }
}

pub struct AssistantExpander<A, S> {
    assistant: A,
    search: S,
    assistant_id: String,
    poll_interval: Duration,
}

impl<A: AssistantBackend, S: SearchBackend> AssistantExpander<A, S> {
    pub fn new(assistant: A, search: S, assistant_id: impl Into<String>) -> Self {
        Self {
            assistant,
            search,
            assistant_id: assistant_id.into(),
            poll_interval: Duration::from_millis(1000),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll until the run leaves the pending state.
    async fn settle(&self, thread_id: &str, mut run: Run) -> Result<Run> {
        while RunState::observe(&run) == RunState::Pending {
            tokio::time::sleep(self.poll_interval).await;
            run = self.assistant.retrieve_run(thread_id, &run.id).await?;
            debug!(run_id = %run.id, status = ?run.status, "Polled run");
        }
        Ok(run)
    }

    /// Answer every tool call of one pause, one after another.
    ///
    /// Nothing is returned (and so nothing gets submitted) unless every call
    /// produced results.
    async fn resolve_tool_calls(&self, tool_calls: &[ToolCall]) -> Result<Vec<ToolOutput>> {
        let mut tool_outputs = Vec::with_capacity(tool_calls.len());

        for tool_call in tool_calls {
            let arguments: SearchArguments = serde_json::from_str(&tool_call.function.arguments)
                .map_err(|e| {
                    BotError::Generation(format!(
                        "invalid arguments for tool call {}: {}",
                        tool_call.id, e
                    ))
                })?;

            info!(query = %arguments.query, "Searching");
            let results = self.search.search(&arguments.query).await?;
            if results.is_empty() {
                return Err(BotError::EmptySearchResult {
                    query: arguments.query,
                });
            }

            let output = serde_json::to_string(&results)
                .map_err(|e| BotError::Parse(format!("Failed to serialize search results: {}", e)))?;
            tool_outputs.push(ToolOutput {
                tool_call_id: tool_call.id.clone(),
                output,
            });
        }

        Ok(tool_outputs)
    }
}

#[async_trait]
impl<A: AssistantBackend, S: SearchBackend> Expander for AssistantExpander<A, S> {
    async fn expand(&self, text: &str) -> Result<String> {
        let thread_id = self.assistant.create_thread().await?;
        self.assistant.add_user_message(&thread_id, text).await?;

        let run = self
            .assistant
            .create_run(&thread_id, &self.assistant_id)
            .await?;
        let mut run = self.settle(&thread_id, run).await?;
        let mut state = RunState::observe(&run);

        while !state.is_terminal() {
            match state {
                RunState::RequiresAction(None) => {
                    return Err(BotError::Generation(format!(
                        "run {} requires action but carries none",
                        run.id
                    )));
                }
                RunState::RequiresAction(Some(tool_calls)) => {
                    info!(tool_calls = tool_calls.len(), "Handling action");
                    if tool_calls.is_empty() {
                        return Err(BotError::Generation(format!(
                            "run {} requires action without any tool calls",
                            run.id
                        )));
                    }

                    let tool_outputs = self.resolve_tool_calls(&tool_calls).await?;
                    run = self
                        .assistant
                        .submit_tool_outputs(&thread_id, &run.id, tool_outputs)
                        .await?;
                }
                _ => {}
            }
            run = self.settle(&thread_id, run).await?;
            state = RunState::observe(&run);
        }

        if let RunState::Failed(status) = state {
            return Err(BotError::Generation(format!(
                "run {} ended with status {:?}",
                run.id, status
            )));
        }

        match self.assistant.latest_assistant_text(&thread_id).await? {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(BotError::Generation(format!(
                "thread {} has no assistant text",
                thread_id
            ))),
        }
    }
}
