//! # trot_results
//!
//! Stores yesterday's trotting performances. Runs once and exits unless a
//! cron schedule is configured.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use lib_common::connections::mask_url_password;
use lib_common::loggers::init_tracing;
use tracing::{error, info};

use trot_results::schedule::run_on_schedule;
use trot_results::{AppConfig, Pipeline};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let config = AppConfig::load().context("invalid configuration")?;
    let _guard = init_tracing(&config.log_options()).context("failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        upstream = %config.veikkaus_url,
        store = %mask_url_password(&config.store_uri),
        store_target = %config.store_target,
        country = %config.country_code,
        tz = %config.time_zone,
        policy = %config.write_policy,
        "Starting trot_results"
    );

    let pipeline = Pipeline::from_config(&config)
        .await
        .context("startup failed")?;

    if let Some(cron) = &config.schedule {
        run_on_schedule(Arc::new(pipeline), cron, config.time_zone)
            .await
            .context("scheduler failed")?;
        return Ok(ExitCode::SUCCESS);
    }

    let target = config.target_date(Utc::now());
    match pipeline.run(target).await {
        Ok(summary) => {
            info!(
                performances = summary.performances,
                winners = summary.winners,
                written = summary.report.written,
                "Done"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
