//! # Pipeline
//!
//! One run = fetch the day's cards, races and runners, turn them into
//! performances and hand those to the sink. Nothing is kept between runs.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use lib_common::retrieve::ApiError;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;
use crate::sink::{open_store, PerformanceStore, Sink, SinkError, StoreError, WriteReport};
use crate::target_date::TargetDate;
use crate::veikkaus::{Fetcher, VeikkausApi};

/// Failures while wiring the pipeline up. All of them are fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid upstream client settings: {0}")]
    Api(#[from] ApiError),
    #[error("could not open performance store: {0}")]
    Store(#[from] StoreError),
}

/// What one run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub target: TargetDate,
    pub performances: usize,
    pub winners: usize,
    pub report: WriteReport,
}

pub struct Pipeline {
    fetcher: Fetcher,
    sink: Sink,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, sink: Sink) -> Self {
        Self { fetcher, sink }
    }

    /// Builds the upstream client and opens the configured store.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let api = VeikkausApi::new(&config.veikkaus_url, config.api_options())?;
        let fetcher = Fetcher::new(api, config.country_code.clone());
        let store = open_store(&config.store_uri, &config.store_target, config.pg_max_connections).await?;
        Ok(Self::new(fetcher, Sink::new(store, config.write_policy)))
    }

    /// Same as [`Pipeline::from_config`] but with a caller supplied store.
    pub fn with_store(
        config: &AppConfig,
        store: Arc<dyn PerformanceStore>,
    ) -> Result<Self, StartupError> {
        let api = VeikkausApi::new(&config.veikkaus_url, config.api_options())?;
        let fetcher = Fetcher::new(api, config.country_code.clone());
        Ok(Self::new(fetcher, Sink::new(store, config.write_policy)))
    }

    /// Processes one race day.
    ///
    /// Upstream failures only shrink the result. The error case is a strict
    /// sink refusing a partially failed batch.
    pub async fn run(&self, target: TargetDate) -> Result<RunSummary, SinkError> {
        info!(date = %target, country = self.fetcher.country_code(), backend = self.sink.backend_type(), "Run started");

        let performances = self.fetcher.build_results_for_date(&target).await;
        let total = performances.len();
        let winners = performances.iter().filter(|p| p.winner).count();

        let report = self.sink.store_performances(performances).await?;

        info!(
            date = %target,
            performances = total,
            winners,
            written = report.written,
            failed = report.failed,
            "Run finished"
        );
        Ok(RunSummary {
            target,
            performances: total,
            winners,
            report,
        })
    }

    /// Processes the day before the current instant in `tz`.
    pub async fn run_yesterday(&self, tz: &Tz) -> Result<RunSummary, SinkError> {
        self.run(TargetDate::yesterday(Utc::now().with_timezone(tz))).await
    }
}
