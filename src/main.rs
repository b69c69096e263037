mod config;
mod jokes;
mod platform;
mod responder;
mod scheduler;
mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::jokes::{DadJokeClient, JokeSource};
use crate::platform::groupme::GroupMeClient;
use crate::responder::Responder;
use crate::scheduler::Scheduler;
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jokebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    if !config_path.exists() {
        warn!("{} not found, using defaults", config_path.display());
    }
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Listen: {}", config.listen_addr());
    info!("  Joke API: {}", config.jokes.base_url);
    info!("  GroupMe API: {}", config.groupme.api_base_url);
    info!(
        "  Timed post: {}",
        if config.schedule.enabled {
            config.schedule.cron.as_str()
        } else {
            "disabled"
        }
    );

    let jokes: Arc<dyn JokeSource> = Arc::new(DadJokeClient::new(config.jokes.clone())?);
    let groupme = Arc::new(GroupMeClient::new(config.groupme.clone())?);
    if !groupme.has_bot_id() {
        warn!("No bot_id configured (set [groupme] bot_id or BOT_ID); replies will not be posted");
    }
    let responder = Arc::new(Responder::new(Arc::clone(&jokes))?);

    // Timed posts
    let mut scheduler = Scheduler::new().await?;
    scheduler::tasks::register_builtin_tasks(
        &scheduler,
        &config.schedule,
        Arc::clone(&jokes),
        Arc::clone(&groupme),
    )
    .await?;
    scheduler.start().await?;

    // Webhook server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    server::serve(listener, AppState::new(responder, groupme)).await?;

    scheduler.shutdown().await?;
    Ok(())
}
