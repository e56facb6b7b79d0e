//! Data loading for a Pulse run
//!
//! This module ties the live fetcher and the snapshot fallback together:
//! live data is preferred, and a snapshot is used (with the live error kept
//! for a user-visible warning) when live data cannot be had.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::actions::ActionPlan;
use crate::cli::{CliError, Command, RunConfig};
use crate::data::{DataFetcher, Dataset, FetchError};
use crate::scenario::ScenarioReport;
use crate::snapshot::{load_snapshot, SnapshotError};
use crate::summary::{DashboardSummary, DataSource};
use crate::talent::RegretRanking;

/// Errors that leave a run with no data to show
#[derive(Debug, Error)]
pub enum AppError {
    /// Live fetch failed and no snapshot was configured
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Nothing to load from
    #[error(transparent)]
    Config(#[from] CliError),

    /// The snapshot could not be loaded
    #[error("{source} ({})", .path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    /// Live fetch failed and so did the snapshot
    #[error("Live data unavailable ({live}); snapshot also failed: {snapshot}")]
    NoData {
        live: FetchError,
        snapshot: SnapshotError,
    },
}

/// A dataset together with where it came from
#[derive(Debug)]
pub struct LoadedData {
    pub dataset: Arc<Dataset>,
    pub source: DataSource,
    /// The live failure that caused a snapshot to be used, if any
    pub live_error: Option<FetchError>,
}

/// The report a run prints
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Summary(DashboardSummary),
    Scenario(ScenarioReport),
    Regret(RegretRanking),
    Actions(ActionPlan),
}

impl Report {
    /// Builds the report `command` asks for
    pub fn build(
        command: &Command,
        dataset: &Dataset,
        source: DataSource,
        high_risk_threshold: i64,
    ) -> Self {
        match command {
            Command::Summary => Report::Summary(DashboardSummary::from_dataset(
                dataset,
                source,
                high_risk_threshold,
            )),
            Command::Scenario { select } => {
                Report::Scenario(ScenarioReport::build(dataset, select))
            }
            Command::Regret => Report::Regret(RegretRanking::from_dataset(dataset)),
            Command::Actions => Report::Actions(ActionPlan::from_dataset(dataset)),
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Summary(summary) => fmt::Display::fmt(summary, f),
            Report::Scenario(scenario) => fmt::Display::fmt(scenario, f),
            Report::Regret(ranking) => fmt::Display::fmt(ranking, f),
            Report::Actions(plan) => fmt::Display::fmt(plan, f),
        }
    }
}

/// One run of the dashboard data layer
pub struct App {
    config: RunConfig,
    fetcher: Option<DataFetcher>,
}

impl App {
    /// Creates an App, building a reqwest-backed fetcher when an endpoint is configured
    pub fn new(config: RunConfig) -> Result<Self, AppError> {
        let fetcher = config.fetch.as_ref().map(DataFetcher::new).transpose()?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Creates an App with a custom fetcher (for testing)
    pub fn with_fetcher(config: RunConfig, fetcher: Option<DataFetcher>) -> Self {
        Self { config, fetcher }
    }

    pub fn fetcher(&self) -> Option<&DataFetcher> {
        self.fetcher.as_ref()
    }

    /// Loads live data, falling back to the configured snapshot
    pub async fn load(&self) -> Result<LoadedData, AppError> {
        let live_error = match &self.fetcher {
            Some(fetcher) => {
                let result = if self.config.force_refresh {
                    fetcher.refresh().await
                } else {
                    fetcher.fetch_all().await
                };
                match result {
                    Ok(dataset) => {
                        return Ok(LoadedData {
                            dataset,
                            source: DataSource::Live,
                            live_error: None,
                        })
                    }
                    Err(err) => Some(err),
                }
            }
            None => None,
        };

        let Some(path) = &self.config.fallback else {
            return Err(match live_error {
                Some(err) => AppError::Fetch(err),
                None => AppError::Config(CliError::NoDataSource),
            });
        };

        match &live_error {
            Some(err) => warn!(
                error = %err,
                path = %path.display(),
                "Live data unavailable, loading snapshot"
            ),
            None => info!(path = %path.display(), "Loading snapshot"),
        }

        match load_snapshot(path).await {
            Ok(dataset) => Ok(LoadedData {
                dataset: Arc::new(dataset),
                source: DataSource::Snapshot,
                live_error,
            }),
            Err(snapshot) => Err(match live_error {
                Some(live) => AppError::NoData { live, snapshot },
                None => AppError::Snapshot {
                    path: path.clone(),
                    source: snapshot,
                },
            }),
        }
    }

    /// Loads data and summarizes it with the configured threshold
    pub async fn summarize(&self) -> Result<(DashboardSummary, Option<FetchError>), AppError> {
        let loaded = self.load().await?;
        let summary = DashboardSummary::from_dataset(
            &loaded.dataset,
            loaded.source,
            self.config.high_risk_threshold,
        );
        Ok((summary, loaded.live_error))
    }

    /// Loads data and builds the configured report
    pub async fn report(&self) -> Result<(Report, Option<FetchError>), AppError> {
        let loaded = self.load().await?;
        let report = Report::build(
            &self.config.command,
            &loaded.dataset,
            loaded.source,
            self.config.high_risk_threshold,
        );
        Ok((report, loaded.live_error))
    }
}
