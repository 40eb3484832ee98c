// ============================================================================
// File: src/main.rs
// Entry point and CLI handling
// ============================================================================

mod config;
mod error;
mod expander;
mod llm_client;
mod logging;
mod models;
mod orchestrator;
mod search_client;
mod wiki_client;
mod wikitext;

use anyhow::Result;
use clap::Parser;
use colored::*;
use indicatif::MultiProgress;
use std::time::Duration;
use tracing::info;

use crate::config::{Config, ExpansionMode, ASSISTANT_ID_VAR};
use crate::error::BotError;
use crate::expander::{AssistantExpander, CompletionExpander, Expander};
use crate::llm_client::LLMClient;
use crate::orchestrator::{ExpansionOrchestrator, RunOptions, RunSummary, StdinPrompter};
use crate::search_client::SearchClient;
use crate::wiki_client::WikiClient;

/// Results requested per search tool call
const SEARCH_MAX_RESULTS: usize = 5;

/// Command-line arguments for the wiki bot
#[derive(Parser, Debug)]
#[command(name = "wikibot")]
#[command(about = "Expand wiki articles in a category with an LLM", long_about = None)]
struct Args {
    /// The category to update
    #[arg(short, long, default_value = wikitext::DEFAULT_CATEGORY)]
    category: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Only update one article
    #[arg(short, long)]
    one: bool,

    /// Prompt to accept the changes before saving each article
    #[arg(short, long)]
    accept: bool,

    /// Expansion strategy
    #[arg(long, value_enum, default_value_t = ExpansionMode::Assistant)]
    mode: ExpansionMode,

    /// Model used in completion mode
    #[arg(short, long, default_value = "gpt-4o")]
    model: String,

    /// Delay between polls of an assistant run, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let progress = MultiProgress::new();
    logging::initialize_logging(args.debug, progress.clone())?;

    // Credentials are checked before any network activity
    let config = Config::from_env(args.mode)?;

    let wiki = WikiClient::new(&config.site)?;
    wiki.login(&config.username, &config.password).await?;
    info!(site = %config.site, username = %config.username, "Logged in");

    let expander = build_expander(&args, &config)?;
    let options = RunOptions {
        category: args.category.clone(),
        one: args.one,
        accept: args.accept,
    };

    let orchestrator =
        ExpansionOrchestrator::new(&wiki, expander.as_ref(), options)?.with_progress(progress);
    let summary = orchestrator.run(&mut StdinPrompter).await?;

    print_summary(&summary);
    Ok(())
}

fn build_expander(args: &Args, config: &Config) -> Result<Box<dyn Expander>> {
    let llm_client = LLMClient::new(config.openai_api_key.clone());

    let expander: Box<dyn Expander> = match args.mode {
        ExpansionMode::Completion => Box::new(CompletionExpander::new(llm_client, &args.model)),
        ExpansionMode::Assistant => {
            let assistant_id = config
                .assistant_id
                .clone()
                .ok_or_else(|| BotError::MissingCredential(vec![ASSISTANT_ID_VAR.to_string()]))?;
            let search_client = SearchClient::new(config.tavily_api_key.clone())
                .with_max_results(SEARCH_MAX_RESULTS);

            Box::new(
                AssistantExpander::new(llm_client, search_client, assistant_id)
                    .with_poll_interval(Duration::from_millis(args.poll_interval_ms)),
            )
        }
    };
    Ok(expander)
}

fn print_summary(summary: &RunSummary) {
    println!(
        "\n{} Pages saved: {} (expanded: {}, skipped: {})",
        "✓".green().bold(),
        summary.pages_saved.to_string().bright_cyan(),
        summary.pages_expanded,
        summary.pages_skipped
    );
    println!(
        "{} Tokens submitted: {}, generated: {}",
        "ℹ".blue().bold(),
        summary.source_tokens.to_string().bright_yellow(),
        summary.generated_tokens.to_string().bright_yellow()
    );
}
