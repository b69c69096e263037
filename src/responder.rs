use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use crate::jokes::JokeSource;
use crate::platform::InboundMessage;

/// Longest topic term forwarded to the joke search.
pub const MAX_TERM_CHARS: usize = 80;

const RANDOM_JOKE_PHRASE_PATTERN: &str = r"\btell me a joke\b|\bjoke please\b";
const LEADING_JOKE_PATTERN: &str = r"^joke\b";
const TOPIC_JOKE_PATTERN: &str =
    r"(?:joke(?:\s+please)?\s+about|do you have a joke about)\s+(.+)";

/// What the sender asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    RandomJoke,
    TopicJoke(String),
}

/// Decides whether a message deserves a reply and composes it.
pub struct Responder {
    random_phrase: Regex,
    leading_joke: Regex,
    topic_joke: Regex,
    jokes: Arc<dyn JokeSource>,
}

impl Responder {
    pub fn new(jokes: Arc<dyn JokeSource>) -> Result<Self> {
        Ok(Self {
            random_phrase: Regex::new(RANDOM_JOKE_PHRASE_PATTERN)
                .context("Failed to compile random joke pattern")?,
            leading_joke: Regex::new(LEADING_JOKE_PATTERN)
                .context("Failed to compile leading joke pattern")?,
            topic_joke: Regex::new(TOPIC_JOKE_PATTERN)
                .context("Failed to compile topic joke pattern")?,
            jokes,
        })
    }

    /// Classify a message text. "tell me a joke" and "joke please" always
    /// mean a random joke; a topic request is tested before the bare leading
    /// "joke", so "joke about cats" searches for cats.
    pub fn detect_intent(&self, text: &str) -> Option<Intent> {
        let lower = text.trim().to_lowercase();

        if self.random_phrase.is_match(&lower) {
            return Some(Intent::RandomJoke);
        }

        if let Some(term) = self
            .topic_joke
            .captures(&lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| clean_term(m.as_str()))
        {
            return Some(Intent::TopicJoke(term));
        }

        if self.leading_joke.is_match(&lower) {
            return Some(Intent::RandomJoke);
        }

        None
    }

    /// Produce the reply for `message`, or `None` when the bot should stay quiet.
    pub async fn resolve_reply(&self, message: &InboundMessage) -> Option<String> {
        if !message.is_from_user() {
            debug!("Ignoring message from sender_type '{}'", message.sender_type);
            return None;
        }

        let intent = self.detect_intent(&message.text)?;
        info!("Intent from {}: {:?}", message.sender_name, intent);

        let joke = match intent {
            Intent::RandomJoke => self.jokes.random_joke().await,
            Intent::TopicJoke(term) => self.jokes.search_joke(&term).await,
        };

        Some(compose_reply(&message.sender_name, &joke))
    }
}

/// Strip trailing `?.!` and cap the length. Empty terms are dropped.
fn clean_term(raw: &str) -> Option<String> {
    let stripped = raw.trim_end_matches(['?', '.', '!']).trim();
    let term: String = stripped.chars().take(MAX_TERM_CHARS).collect();
    if term.is_empty() {
        None
    } else {
        Some(term)
    }
}

pub fn compose_reply(sender_name: &str, joke: &str) -> String {
    format!("Hey {} — {}", sender_name, joke)
}
