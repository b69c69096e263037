use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides `[groupme] bot_id`.
pub const BOT_ID_ENV: &str = "BOT_ID";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub groupme: GroupMeConfig,
    #[serde(default)]
    pub jokes: JokeApiConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GroupMeConfig {
    /// Bot identifier used to authorize outbound posts. Empty means posting is disabled.
    #[serde(default)]
    pub bot_id: String,
    #[serde(default = "default_groupme_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JokeApiConfig {
    #[serde(default = "default_jokes_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Returned whenever the provider cannot produce a joke.
    #[serde(default = "default_fallback")]
    pub fallback: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default = "default_schedule_enabled")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first), as tokio-cron-scheduler expects.
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8787
}

fn default_groupme_base_url() -> String {
    "https://api.groupme.com/v3".to_string()
}

fn default_jokes_base_url() -> String {
    "https://icanhazdadjoke.com".to_string()
}

fn default_user_agent() -> String {
    "groupme-jokebot/0.1".to_string()
}

fn default_search_limit() -> u32 {
    30
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_fallback() -> String {
    "Hmm… no joke right now 😅".to_string()
}

fn default_schedule_enabled() -> bool {
    true
}

fn default_cron() -> String {
    "0 0 * * * *".to_string()
}

fn default_prefix() -> String {
    "Hourly joke time!".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for GroupMeConfig {
    fn default() -> Self {
        Self {
            bot_id: String::new(),
            api_base_url: default_groupme_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for JokeApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_jokes_base_url(),
            user_agent: default_user_agent(),
            search_limit: default_search_limit(),
            timeout_secs: default_timeout_secs(),
            fallback: default_fallback(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_schedule_enabled(),
            cron: default_cron(),
            prefix: default_prefix(),
        }
    }
}

impl Config {
    /// Address the webhook server listens on, e.g. "0.0.0.0:8787".
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Load from a TOML file. A missing file yields the defaults.
    /// `BOT_ID` from the environment wins over the file value.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Config::default()
        };

        config.apply_bot_id_override(std::env::var(BOT_ID_ENV).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML")
    }

    fn apply_bot_id_override(&mut self, value: Option<String>) {
        if let Some(bot_id) = value.map(|v| v.trim().to_string()) {
            if !bot_id.is_empty() {
                self.groupme.bot_id = bot_id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.groupme.bot_id, "");
        assert_eq!(config.groupme.api_base_url, "https://api.groupme.com/v3");
        assert_eq!(config.groupme.timeout_secs, 10);
        assert_eq!(config.jokes.base_url, "https://icanhazdadjoke.com");
        assert_eq!(config.jokes.search_limit, 30);
        assert!(config.schedule.enabled);
        assert_eq!(config.schedule.cron, "0 0 * * * *");
        assert_eq!(config.schedule.prefix, "Hourly joke time!");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
[groupme]
bot_id = "abc123"

[schedule]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.groupme.bot_id, "abc123");
        assert_eq!(config.groupme.api_base_url, "https://api.groupme.com/v3");
        assert!(!config.schedule.enabled);
        assert_eq!(config.schedule.cron, "0 0 * * * *");
    }

    #[test]
    fn test_listen_addr() {
        let config = Config::parse("[server]\nbind = \"127.0.0.1\"\nport = 9000\n").unwrap();
        assert_eq!(config.listen_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::parse("[server\nport = ").is_err());
    }

    #[test]
    fn test_bot_id_override() {
        let mut config = Config::parse("[groupme]\nbot_id = \"from-file\"\n").unwrap();
        config.apply_bot_id_override(Some("  from-env ".to_string()));
        assert_eq!(config.groupme.bot_id, "from-env");
    }

    #[test]
    fn test_blank_override_keeps_file_value() {
        let mut config = Config::parse("[groupme]\nbot_id = \"from-file\"\n").unwrap();
        config.apply_bot_id_override(Some("   ".to_string()));
        assert_eq!(config.groupme.bot_id, "from-file");
        config.apply_bot_id_override(None);
        assert_eq!(config.groupme.bot_id, "from-file");
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/jokebot/config.toml")).unwrap();
        assert_eq!(config.server.port, 8787);
    }
}
