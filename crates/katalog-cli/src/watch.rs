//! Cron-driven processing and rescrape loop.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tokio_util::sync::CancellationToken;

use crate::worker::Worker;

/// Runs the scheduled jobs until `cancel` fires. Returns only after any
/// running batch or rescrape pass has finished its in-flight item and
/// stopped, then shuts the scheduler down.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built, started, or stopped.
pub(crate) async fn run(worker: Arc<Worker>, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut scheduler = build_scheduler(Arc::clone(&worker), cancel.clone()).await?;
    tracing::info!("watching; press ctrl-c to stop");

    cancel.cancelled().await;
    tracing::info!("shutdown requested; waiting for running jobs");
    worker.drain().await;
    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn build_scheduler(
    worker: Arc<Worker>,
    cancel: CancellationToken,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_process_job(&scheduler, Arc::clone(&worker), cancel.clone()).await?;
    register_rescrape_job(&scheduler, worker, cancel).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_process_job(
    scheduler: &JobScheduler,
    worker: Arc<Worker>,
    cancel: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let cron = worker.config().process_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let worker = Arc::clone(&worker);
        let cancel = cancel.clone();

        Box::pin(async move {
            if cancel.is_cancelled() {
                return;
            }
            if let Err(e) = worker.process(None, &cancel).await {
                tracing::error!(error = %e, "scheduler: processing batch failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered process job");
    Ok(())
}

async fn register_rescrape_job(
    scheduler: &JobScheduler,
    worker: Arc<Worker>,
    cancel: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let cron = worker.config().rescrape_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let worker = Arc::clone(&worker);
        let cancel = cancel.clone();

        Box::pin(async move {
            if cancel.is_cancelled() {
                return;
            }
            if let Err(e) = worker.rescrape(&cancel).await {
                tracing::error!(error = %e, "scheduler: rescrape failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered rescrape job");
    Ok(())
}
