use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::JokeApiConfig;

/// Where jokes come from. Implementations never fail: any lookup problem
/// collapses into a fallback string.
#[async_trait]
pub trait JokeSource: Send + Sync {
    /// A single random joke.
    async fn random_joke(&self) -> String;

    /// A random joke matching `term`, or a "no match" message carrying a
    /// random joke instead.
    async fn search_joke(&self, term: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct RandomJokeResponse {
    #[serde(default)]
    joke: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    joke: Option<String>,
}

/// Message used when a topic search comes back empty.
pub fn no_match_message(term: &str, joke: &str) -> String {
    format!("I don’t have one about “{term}”… but here’s one: {joke}")
}

/// Client for the icanhazdadjoke.com API.
pub struct DadJokeClient {
    client: reqwest::Client,
    config: JokeApiConfig,
}

impl DadJokeClient {
    pub fn new(config: JokeApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build joke API client")?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn fetch_random(&self) -> Result<String> {
        let url = format!("{}/", self.base_url());
        debug!("Fetching random joke: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to reach joke API")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Joke API error ({})", status);
        }

        let body: RandomJokeResponse = response
            .json()
            .await
            .context("Failed to parse random joke response")?;

        body.joke
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty())
            .context("Joke API returned no joke")
    }

    async fn fetch_search(&self, term: &str) -> Result<Vec<String>> {
        let url = format!("{}/search", self.base_url());
        debug!("Searching jokes for '{}'", term);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("limit", self.config.search_limit.to_string()),
                ("term", term.to_string()),
            ])
            .send()
            .await
            .context("Failed to reach joke search API")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Joke search API error ({})", status);
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse joke search response")?;

        Ok(body
            .results
            .into_iter()
            .filter_map(|r| r.joke)
            .map(|j| j.trim().to_string())
            .filter(|j| !j.is_empty())
            .collect())
    }
}

#[async_trait]
impl JokeSource for DadJokeClient {
    async fn random_joke(&self) -> String {
        match self.fetch_random().await {
            Ok(joke) => joke,
            Err(e) => {
                warn!("Random joke lookup failed: {:#}", e);
                self.config.fallback.clone()
            }
        }
    }

    async fn search_joke(&self, term: &str) -> String {
        let jokes = match self.fetch_search(term).await {
            Ok(jokes) => jokes,
            Err(e) => {
                warn!("Joke search for '{}' failed: {:#}", term, e);
                Vec::new()
            }
        };

        if let Some(joke) = jokes.choose(&mut rand::rng()) {
            return joke.clone();
        }

        debug!("No jokes found for '{}', falling back to a random one", term);
        let fallback = self.random_joke().await;
        no_match_message(term, &fallback)
    }
}
