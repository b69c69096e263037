pub mod tasks;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

/// Runs the timed posts on tokio-cron-scheduler.
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Register `task` to run on every tick of `cron_expr` (six fields, seconds first).
    pub async fn add_cron_job<F, Fut>(&self, cron_expr: &str, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = build_job(cron_expr, name, task)?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled '{}' with cron: {}", name, cron_expr);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

fn build_job<F, Fut>(cron_expr: &str, name: &str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = Arc::new(task);
    let job_name = name.to_string();
    Job::new_async(cron_expr, move |_uuid, _lock| {
        let task = Arc::clone(&task);
        let name = job_name.clone();
        Box::pin(async move {
            info!("Running scheduled task: {}", name);
            task().await;
        })
    })
    .with_context(|| format!("Invalid cron expression for '{}': {}", name, cron_expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hourly_expression_is_valid() {
        assert!(build_job("0 0 * * * *", "hourly", || async {}).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_expression_is_rejected() {
        let Err(err) = build_job("99 99 99 * * *", "broken", || async {}) else {
            panic!("expected invalid cron expression");
        };
        assert!(err.to_string().contains("broken"));
    }
}
