// ============================================================================
// File: src/orchestrator.rs
// Page loop: fetch, strip, expand, confirm, save
// ============================================================================

use async_trait::async_trait;
use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;
use tiktoken_rs::{p50k_base, CoreBPE};
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::expander::Expander;
use crate::wikitext::{self, EDIT_SUMMARY};

/// Page operations the loop needs from the wiki
#[async_trait]
pub trait Wiki: Send + Sync {
    /// Titles of every page in the category, in API order.
    async fn category_members(&self, category: &str) -> Result<Vec<String>>;
    async fn page_text(&self, title: &str) -> Result<String>;
    async fn save_page(&self, title: &str, text: &str, summary: &str) -> Result<()>;
}

/// Asks the operator to accept or reject an expansion
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Reads y/n answers from standard input
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{}", question.bright_yellow().bold());
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_accepted(&answer))
    }
}

fn is_accepted(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

/// Flags controlling one pass over the category
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub category: String,
    /// Stop after the first saved page
    pub one: bool,
    /// Ask before saving each page
    pub accept: bool,
}

/// What a pass over the category did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_expanded: usize,
    pub pages_saved: usize,
    pub pages_skipped: usize,
    pub source_tokens: usize,
    pub generated_tokens: usize,
}

pub struct ExpansionOrchestrator<'a> {
    wiki: &'a dyn Wiki,
    expander: &'a dyn Expander,
    options: RunOptions,
    bpe: CoreBPE,
    progress: MultiProgress,
}

impl<'a> ExpansionOrchestrator<'a> {
    pub fn new(wiki: &'a dyn Wiki, expander: &'a dyn Expander, options: RunOptions) -> Result<Self> {
        let bpe = p50k_base().map_err(|e| BotError::Tokenizer(e.to_string()))?;
        Ok(Self {
            wiki,
            expander,
            options,
            bpe,
            progress: MultiProgress::new(),
        })
    }

    /// Draw the spinner through `progress`, the display the logger suspends.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Expand every page in the category, one at a time.
    ///
    /// The first error stops the pass; pages after it are left untouched.
    pub async fn run(&self, prompter: &mut dyn Prompter) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let titles = self.wiki.category_members(&self.options.category).await?;
        info!(category = %self.options.category, pages = titles.len(), "Found pages to expand");

        for title in titles {
            info!("Expanding page {}", title);

            let content = self.wiki.page_text(&title).await?;
            debug!("Original content:\n{}", content);

            let content = wikitext::strip_category_tag(&content, &self.options.category);
            summary.source_tokens += self.count_tokens(&content);

            let spinner = self.create_spinner(&title);
            let expanded = self.expander.expand(&content).await;
            spinner.finish_and_clear();
            self.progress.remove(&spinner);
            let expanded = expanded?;

            summary.pages_expanded += 1;
            summary.generated_tokens += self.count_tokens(&expanded);

            if self.options.accept {
                info!("Expanded content:\n{}", expanded);
                if !prompter.confirm("Accept changes? (y/n): ")? {
                    info!("Changes not accepted, skipping page");
                    summary.pages_skipped += 1;
                    continue;
                }
            } else {
                debug!("Expanded content:\n{}", expanded);
            }

            self.wiki.save_page(&title, &expanded, EDIT_SUMMARY).await?;
            summary.pages_saved += 1;
            info!("Updated page {}", title);

            if self.options.one {
                break;
            }
        }

        Ok(summary)
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn create_spinner(&self, title: &str) -> ProgressBar {
        let spinner = self.progress.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Expanding {}...", title.cyan()));
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    struct FakeWiki {
        titles: Vec<String>,
        pages: Mutex<HashMap<String, String>>,
        fetched: Mutex<Vec<String>>,
        saved: Mutex<Vec<(String, String, String)>>,
    }

    impl FakeWiki {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                titles: pages.iter().map(|(t, _)| t.to_string()).collect(),
                pages: Mutex::new(
                    pages
                        .iter()
                        .map(|(t, c)| (t.to_string(), c.to_string()))
                        .collect(),
                ),
                fetched: Mutex::new(Vec::new()),
                saved: Mutex::new(Vec::new()),
            }
        }

        fn text(&self, title: &str) -> String {
            self.pages.lock().unwrap()[title].clone()
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }

        fn saved_titles(&self) -> Vec<String> {
            self.saved
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _, _)| t.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Wiki for FakeWiki {
        async fn category_members(&self, _category: &str) -> Result<Vec<String>> {
            Ok(self.titles.clone())
        }

        async fn page_text(&self, title: &str) -> Result<String> {
            self.fetched.lock().unwrap().push(title.to_string());
            Ok(self.text(title))
        }

        async fn save_page(&self, title: &str, text: &str, summary: &str) -> Result<()> {
            self.pages
                .lock()
                .unwrap()
                .insert(title.to_string(), text.to_string());
            self.saved
                .lock()
                .unwrap()
                .push((title.to_string(), text.to_string(), summary.to_string()));
            Ok(())
        }
    }

    /// Prefixes the text it receives; fails on text containing "boom".
    #[derive(Default)]
    struct FakeExpander {
        inputs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Expander for FakeExpander {
        async fn expand(&self, text: &str) -> Result<String> {
            self.inputs.lock().unwrap().push(text.to_string());
            if text.contains("boom") {
                return Err(BotError::Generation("run failed".into()));
            }
            Ok(format!("Expanded: {}", text))
        }
    }

    struct ScriptedPrompter {
        answers: VecDeque<bool>,
        asked: usize,
    }

    impl ScriptedPrompter {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: 0,
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, _question: &str) -> Result<bool> {
            self.asked += 1;
            Ok(self.answers.pop_front().unwrap_or(false))
        }
    }

    fn options(one: bool, accept: bool) -> RunOptions {
        RunOptions {
            category: wikitext::DEFAULT_CATEGORY.to_string(),
            one,
            accept,
        }
    }

    fn two_pages() -> FakeWiki {
        FakeWiki::new(&[
            ("Stompy", "Stompy is a robot.\n[[Category:Stompy, Expand!]]"),
            ("K-Scale", "K-Scale builds robots. Stompy, Expand!"),
        ])
    }

    #[tokio::test]
    async fn test_expands_and_saves_every_page() {
        let wiki = two_pages();
        let expander = FakeExpander::default();
        let orchestrator = ExpansionOrchestrator::new(&wiki, &expander, options(false, false)).unwrap();

        let summary = orchestrator.run(&mut ScriptedPrompter::new(&[])).await.unwrap();

        assert_eq!(summary.pages_saved, 2);
        assert_eq!(
            *expander.inputs.lock().unwrap(),
            vec![
                "Stompy is a robot.\n[[Category:]]".to_string(),
                "K-Scale builds robots.".to_string(),
            ]
        );
        assert_eq!(wiki.text("K-Scale"), "Expanded: K-Scale builds robots.");
        assert!(wiki
            .saved
            .lock()
            .unwrap()
            .iter()
            .all(|(_, _, summary)| summary == "Bot expanded article"));
        assert!(summary.source_tokens > 0);
        assert!(summary.generated_tokens > summary.source_tokens);
    }

    #[tokio::test]
    async fn test_one_flag_processes_single_page() {
        let wiki = two_pages();
        let expander = FakeExpander::default();
        let orchestrator = ExpansionOrchestrator::new(&wiki, &expander, options(true, false))
            .unwrap()
            .with_progress(MultiProgress::with_draw_target(ProgressDrawTarget::hidden()));

        let summary = orchestrator.run(&mut ScriptedPrompter::new(&[])).await.unwrap();

        assert_eq!(summary.pages_expanded, 1);
        assert_eq!(wiki.fetched(), vec!["Stompy".to_string()]);
        assert_eq!(expander.inputs.lock().unwrap().len(), 1);
        assert_eq!(wiki.saved_titles(), vec!["Stompy".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_page_is_left_unchanged() {
        let wiki = two_pages();
        let expander = FakeExpander::default();
        let orchestrator = ExpansionOrchestrator::new(&wiki, &expander, options(false, true)).unwrap();
        let mut prompter = ScriptedPrompter::new(&[false, true]);

        let summary = orchestrator.run(&mut prompter).await.unwrap();

        assert_eq!(prompter.asked, 2);
        assert_eq!(summary.pages_skipped, 1);
        assert_eq!(wiki.text("Stompy"), "Stompy is a robot.\n[[Category:Stompy, Expand!]]");
        assert_eq!(wiki.saved_titles(), vec!["K-Scale".to_string()]);
    }

    #[tokio::test]
    async fn test_rejection_does_not_count_toward_one() {
        let wiki = FakeWiki::new(&[("A", "a"), ("B", "b"), ("C", "c")]);
        let expander = FakeExpander::default();
        let orchestrator = ExpansionOrchestrator::new(&wiki, &expander, options(true, true)).unwrap();

        let summary = orchestrator
            .run(&mut ScriptedPrompter::new(&[false, true, true]))
            .await
            .unwrap();

        assert_eq!(summary.pages_saved, 1);
        assert_eq!(wiki.saved_titles(), vec!["B".to_string()]);
        assert_eq!(wiki.fetched(), vec!["A".to_string(), "B".to_string()]);
    }

    #[tokio::test]
    async fn test_expansion_failure_stops_remaining_pages() {
        let wiki = FakeWiki::new(&[("A", "boom"), ("B", "b")]);
        let expander = FakeExpander::default();
        let orchestrator = ExpansionOrchestrator::new(&wiki, &expander, options(false, false)).unwrap();

        let err = orchestrator
            .run(&mut ScriptedPrompter::new(&[]))
            .await
            .unwrap_err();

        assert!(matches!(err, BotError::Generation(_)));
        assert_eq!(wiki.fetched(), vec!["A".to_string()]);
        assert!(wiki.saved_titles().is_empty());
    }

    #[test]
    fn test_only_y_accepts() {
        assert!(is_accepted("y\n"));
        assert!(is_accepted("  Y "));
        assert!(!is_accepted("yes"));
        assert!(!is_accepted("n"));
        assert!(!is_accepted(""));
    }
}
