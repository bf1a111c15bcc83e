//! # Scheduled Runs
//!
//! Keeps the process alive and triggers a run for "yesterday" on every tick of
//! a cron expression (six fields, seconds first), evaluated in the configured
//! time zone. Stops on Ctrl-C.

use std::sync::Arc;

use chrono_tz::Tz;
use thiserror::Error;
use tokio_cron_scheduler::{JobBuilder, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use crate::pipeline::Pipeline;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

/// Runs `pipeline` on `cron` until Ctrl-C.
pub async fn run_on_schedule(pipeline: Arc<Pipeline>, cron: &str, tz: Tz) -> Result<(), ScheduleError> {
    let mut scheduler = JobScheduler::new().await?;

    let job = JobBuilder::new()
        .with_timezone(tz)
        .with_cron_job_type()
        .with_schedule(cron)?
        .with_run_async(Box::new(move |uuid, mut l| {
            let pipeline = pipeline.clone();
            Box::pin(async move {
                match pipeline.run_yesterday(&tz).await {
                    Ok(summary) => info!(
                        date = %summary.target,
                        performances = summary.performances,
                        written = summary.report.written,
                        "Scheduled run done"
                    ),
                    Err(e) => error!(error = %e, "Scheduled run failed"),
                }
                match l.next_tick_for_job(uuid).await {
                    Ok(Some(ts)) => info!("Next run at {:?}", ts),
                    _ => warn!("Could not get next tick for results job"),
                }
            })
        }))
        .build()?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(cron, tz = %tz, "Scheduler started, waiting for Ctrl-C");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    scheduler.shutdown().await?;
    Ok(())
}
