use std::sync::Arc;

use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::jokes::JokeSource;
use crate::platform::groupme::GroupMeClient;
use crate::scheduler::Scheduler;

/// Text of the unprompted post.
pub fn timed_post_text(prefix: &str, joke: &str) -> String {
    if prefix.is_empty() {
        joke.to_string()
    } else {
        format!("{} {}", prefix, joke)
    }
}

/// Fetch a random joke and post it. Skips the responder entirely.
pub async fn post_timed_joke(jokes: &dyn JokeSource, groupme: &GroupMeClient, prefix: &str) {
    let joke = jokes.random_joke().await;
    let text = timed_post_text(prefix, &joke);
    if let Err(e) = groupme.post(&text, None).await {
        error!("Timed joke post failed: {:#}", e);
    }
}

/// Register built-in timed posts
pub async fn register_builtin_tasks(
    scheduler: &Scheduler,
    config: &ScheduleConfig,
    jokes: Arc<dyn JokeSource>,
    groupme: Arc<GroupMeClient>,
) -> anyhow::Result<()> {
    if !config.enabled {
        info!("Timed joke post disabled");
        return Ok(());
    }

    let prefix = config.prefix.clone();
    scheduler
        .add_cron_job(&config.cron, "timed-joke", move || {
            let jokes = Arc::clone(&jokes);
            let groupme = Arc::clone(&groupme);
            let prefix = prefix.clone();
            async move {
                post_timed_joke(jokes.as_ref(), &groupme, &prefix).await;
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockito::Matcher;
    use serde_json::json;

    use crate::config::GroupMeConfig;

    struct OneJoke;

    #[async_trait]
    impl JokeSource for OneJoke {
        async fn random_joke(&self) -> String {
            "I'm reading a book about anti-gravity. It's impossible to put down.".to_string()
        }

        async fn search_joke(&self, _term: &str) -> String {
            unreachable!("timed posts never search")
        }
    }

    #[test]
    fn test_timed_post_text() {
        assert_eq!(
            timed_post_text("Hourly joke time!", "Knock knock."),
            "Hourly joke time! Knock knock."
        );
        assert_eq!(timed_post_text("", "Knock knock."), "Knock knock.");
    }

    #[tokio::test]
    async fn test_post_timed_joke() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bots/post")
            .match_body(Matcher::Json(json!({
                "bot_id": "b-1",
                "text": "Hourly joke time! I'm reading a book about anti-gravity. It's impossible to put down."
            })))
            .with_status(202)
            .create_async()
            .await;

        let groupme = GroupMeClient::new(GroupMeConfig {
            bot_id: "b-1".to_string(),
            api_base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap();
        post_timed_joke(&OneJoke, &groupme, "Hourly joke time!").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bots/post")
            .with_status(500)
            .create_async()
            .await;

        let groupme = GroupMeClient::new(GroupMeConfig {
            bot_id: "b-1".to_string(),
            api_base_url: server.url(),
            timeout_secs: 5,
        })
        .unwrap();
        post_timed_joke(&OneJoke, &groupme, "Hourly joke time!").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_disabled_schedule_registers_nothing() {
        let scheduler = Scheduler::new().await.unwrap();
        let config = ScheduleConfig {
            enabled: false,
            cron: "not a cron".to_string(),
            prefix: String::new(),
        };
        let groupme = Arc::new(GroupMeClient::new(GroupMeConfig::default()).unwrap());
        register_builtin_tasks(&scheduler, &config, Arc::new(OneJoke), groupme)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_register_hourly_job() {
        let scheduler = Scheduler::new().await.unwrap();
        let groupme = Arc::new(GroupMeClient::new(GroupMeConfig::default()).unwrap());
        register_builtin_tasks(
            &scheduler,
            &ScheduleConfig::default(),
            Arc::new(OneJoke),
            groupme,
        )
        .await
        .unwrap();
    }
}
