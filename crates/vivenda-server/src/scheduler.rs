//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring follow-up batch on the configured cron expression.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use vivenda_ai::ProviderClient;
use vivenda_core::AppConfig;
use vivenda_followup::run_followups;
use vivenda_whatsapp::WhatsappClient;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
    ai: Arc<ProviderClient>,
    whatsapp: Arc<WhatsappClient>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_followup_job(&scheduler, pool, &config.followup_cron, ai, whatsapp).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring follow-up batch (default: every 30 minutes).
async fn register_followup_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    cron: &str,
    ai: Arc<ProviderClient>,
    whatsapp: Arc<WhatsappClient>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let ai = Arc::clone(&ai);
        let whatsapp = Arc::clone(&whatsapp);

        Box::pin(async move {
            tracing::info!("scheduler: starting follow-up batch");
            match run_followups(pool.as_ref(), &ai, &whatsapp, Utc::now()).await {
                Ok(summary) => {
                    for error in &summary.errors {
                        tracing::warn!(%error, "scheduler: follow-up lead error");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: follow-up batch failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
