use std::collections::HashSet;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// The parts of a todo a summarizer gets to see.
#[derive(Debug, Clone)]
pub struct TodoDigest {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, todos: &[TodoDigest]) -> anyhow::Result<String>;
}

lazy_static! {
    static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
        "did",
    ]
    .into_iter()
    .collect();
}

/// Local summarizer built from keyword extraction over pending titles.
#[derive(Debug, Default, Clone)]
pub struct KeywordSummarizer;

fn keywords(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        .map(String::from)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn push_phrase(phrases: &mut Vec<String>, words: Vec<String>) {
    if words.is_empty() {
        return;
    }
    let phrase = words.join(" ");
    if !phrases.contains(&phrase) {
        phrases.push(phrase);
    }
}

/// Key phrases from titles, topped up from descriptions when fewer than three.
pub(crate) fn key_phrases(todos: &[&TodoDigest]) -> Vec<String> {
    let mut phrases = Vec::new();
    for todo in todos {
        let title = todo.title.trim();
        if title.chars().count() < 3 {
            continue;
        }
        push_phrase(&mut phrases, keywords(title));
    }

    if phrases.len() < 3 {
        for todo in todos.iter().filter(|t| !t.description.is_empty()) {
            push_phrase(&mut phrases, keywords(&todo.description));
        }
    }

    phrases
        .iter()
        .map(|p| p.split(' ').map(capitalize).collect::<Vec<_>>().join(" "))
        .collect()
}

impl KeywordSummarizer {
    pub fn render(todos: &[TodoDigest]) -> String {
        let (completed, pending): (Vec<&TodoDigest>, Vec<&TodoDigest>) =
            todos.iter().partition(|t| t.completed);

        let mut out = String::from("Progress Summary\n");
        out.push_str("----------------------------------------\n\n");
        out.push_str(&format!(
            "You have completed {} out of {} tasks.\n",
            completed.len(),
            todos.len()
        ));
        out.push_str(&format!("{} tasks remaining.\n\n", pending.len()));

        if pending.is_empty() {
            return out;
        }

        let phrases = key_phrases(&pending);
        out.push_str("Main Focus Areas:\n");
        if phrases.is_empty() {
            for todo in &pending {
                out.push_str(&format!("• {}\n", todo.title));
            }
        } else {
            for phrase in &phrases {
                out.push_str(&format!("• {phrase}\n"));
            }
        }
        out.push('\n');

        out.push_str("Pending Tasks:\n");
        for todo in &pending {
            out.push_str(&format!("• {}\n", todo.title));
        }
        out
    }
}

#[async_trait]
impl Summarizer for KeywordSummarizer {
    async fn summarize(&self, todos: &[TodoDigest]) -> anyhow::Result<String> {
        debug!(count = todos.len(), "keyword summary");
        Ok(Self::render(todos))
    }
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    max_length: u32,
    min_length: u32,
}

#[derive(Deserialize)]
struct SummaryText {
    summary_text: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SummarizeResponse {
    One(SummaryText),
    Many(Vec<SummaryText>),
}

/// Delegates the free-text part of the summary to an external service.
#[derive(Clone)]
pub struct HttpSummarizer {
    client: reqwest::Client,
    url: String,
}

impl HttpSummarizer {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build summarizer http client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn combined_text(todos: &[TodoDigest]) -> String {
        todos
            .iter()
            .map(|t| format!("{}: {}", t.title, t.description))
            .collect::<Vec<_>>()
            .join(". ")
    }

    fn report(todos: &[TodoDigest], summary_text: &str) -> String {
        let line = |t: &&TodoDigest| format!("• {}: {}", t.title, t.description);
        let (completed, pending): (Vec<&TodoDigest>, Vec<&TodoDigest>) =
            todos.iter().partition(|t| t.completed);

        format!(
            "Todo Summary\n\
             ----------------------------------------\n\n\
             Pending Tasks:\n{}\n\n\
             Completed Tasks:\n{}\n\n\
             Key Focus Areas:\n{}\n\n\
             ----------------------------------------\n\
             Total Tasks: {} ({} pending, {} completed)\n",
            pending.iter().map(line).collect::<Vec<_>>().join("\n"),
            completed.iter().map(line).collect::<Vec<_>>().join("\n"),
            summary_text.trim(),
            todos.len(),
            pending.len(),
            completed.len(),
        )
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, todos: &[TodoDigest]) -> anyhow::Result<String> {
        let text = Self::combined_text(todos);
        if text.trim().is_empty() {
            return Ok("No content to summarize.".into());
        }

        info!(url = %self.url, count = todos.len(), "requesting external summary");
        let response: SummarizeResponse = self
            .client
            .post(&self.url)
            .json(&SummarizeRequest {
                text: &text,
                max_length: 200,
                min_length: 50,
            })
            .send()
            .await
            .context("summarizer request")?
            .error_for_status()
            .context("summarizer status")?
            .json()
            .await
            .context("summarizer response body")?;

        let summary_text = match response {
            SummarizeResponse::One(s) => s.summary_text,
            SummarizeResponse::Many(v) => v
                .into_iter()
                .next()
                .map(|s| s.summary_text)
                .context("summarizer returned no results")?,
        };
        anyhow::ensure!(!summary_text.trim().is_empty(), "summarizer returned empty text");

        Ok(Self::report(todos, &summary_text))
    }
}
