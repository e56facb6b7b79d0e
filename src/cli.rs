//! Command-line interface parsing for Integration Pulse
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`RunConfig`]: where to fetch from, which snapshot to
//! fall back to, and how to print the result.

use std::path::PathBuf;
use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::FetchConfig;
use crate::summary::DEFAULT_HIGH_RISK_THRESHOLD;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The endpoint is not an http(s) URL
    #[error("Invalid endpoint URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidUrl(String),

    /// Neither an endpoint nor a snapshot was given
    #[error("No data source: pass --url (or set PULSE_URL) and/or --fallback")]
    NoDataSource,
}

/// Integration Pulse - workforce attrition risk and revenue exposure
#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Fetch and summarize Integration Pulse workforce-risk data")]
#[command(version)]
pub struct Cli {
    /// Published sheet endpoint returning the integration payload
    #[arg(long, global = true, env = "PULSE_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Snapshot file in the endpoint's JSON format, used when live data is unavailable
    #[arg(long, global = true, value_name = "FILE")]
    pub fallback: Option<PathBuf>,

    /// Ignore any cached data and fetch fresh
    #[arg(long, global = true)]
    pub refresh: bool,

    /// How long fetched data is reused, in seconds
    #[arg(long, global = true, value_name = "SECS", default_value_t = 300)]
    pub ttl_secs: u32,

    /// Overall request timeout, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Risk score above which an employee counts as high risk
    #[arg(
        long,
        global = true,
        value_name = "SCORE",
        default_value_t = DEFAULT_HIGH_RISK_THRESHOLD
    )]
    pub high_risk_threshold: i64,

    /// Report to print; defaults to the dashboard summary
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Reports derived from the dataset
#[derive(Subcommand, Debug, Clone, Default, PartialEq, Eq)]
pub enum Command {
    /// Dashboard headline figures
    #[default]
    Summary,
    /// Model the cost of selected employees leaving
    Scenario {
        /// Employee id to model as departing; repeat for several
        #[arg(long = "select", value_name = "ID")]
        select: Vec<String>,
    },
    /// Rank critical employees by regrettable loss
    Regret,
    /// Generate the prioritized intervention list
    Actions,
}

/// Configuration derived from CLI arguments for a run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Live endpoint settings, if an endpoint was given
    pub fetch: Option<FetchConfig>,
    /// Snapshot to use when the live fetch fails or is not configured
    pub fallback: Option<PathBuf>,
    /// Whether to bypass the cache
    pub force_refresh: bool,
    /// Whether to print JSON instead of text
    pub json: bool,
    pub high_risk_threshold: i64,
    pub command: Command,
}

/// Checks that an endpoint looks like an http(s) URL
pub fn parse_endpoint(url: &str) -> Result<String, CliError> {
    let trimmed = url.trim();
    let has_host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if has_host {
        Ok(trimmed.to_string())
    } else {
        Err(CliError::InvalidUrl(url.to_string()))
    }
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` with the validated settings
    /// * `Err(CliError)` if the URL is malformed or no source was given
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let fetch = match &cli.url {
            Some(url) => Some(
                FetchConfig::new(parse_endpoint(url)?)
                    .with_ttl(Duration::seconds(i64::from(cli.ttl_secs)))
                    .with_timeout(cli.timeout_secs.map(StdDuration::from_secs)),
            ),
            None => None,
        };

        if fetch.is_none() && cli.fallback.is_none() {
            return Err(CliError::NoDataSource);
        }

        Ok(RunConfig {
            fetch,
            fallback: cli.fallback.clone(),
            force_refresh: cli.refresh,
            json: cli.json,
            high_risk_threshold: cli.high_risk_threshold,
            command: cli.command.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["pulse"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_parse_endpoint_accepts_http_and_https() {
        assert_eq!(
            parse_endpoint("https://script.google.com/macros/s/abc/exec").unwrap(),
            "https://script.google.com/macros/s/abc/exec"
        );
        assert_eq!(
            parse_endpoint(" http://localhost:8080/data ").unwrap(),
            "http://localhost:8080/data"
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_other_schemes() {
        for bad in ["ftp://host/data", "script.google.com", "https://", ""] {
            let err = parse_endpoint(bad).unwrap_err();
            assert!(err.to_string().contains("Invalid endpoint URL"), "{}", bad);
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["--url", "https://sheets.test/exec"]);

        assert_eq!(cli.url.as_deref(), Some("https://sheets.test/exec"));
        assert!(cli.fallback.is_none());
        assert!(!cli.refresh);
        assert_eq!(cli.ttl_secs, 300);
        assert!(cli.timeout_secs.is_none());
        assert!(!cli.json);
        assert_eq!(cli.high_risk_threshold, 80);
    }

    #[test]
    fn test_run_config_from_full_cli() {
        let cli = parse(&[
            "--url",
            "https://sheets.test/exec",
            "--fallback",
            "snapshot.json",
            "--refresh",
            "--ttl-secs",
            "60",
            "--timeout-secs",
            "15",
            "--json",
            "--high-risk-threshold",
            "70",
        ]);
        let config = RunConfig::from_cli(&cli).unwrap();

        let fetch = config.fetch.expect("Endpoint should be configured");
        assert_eq!(fetch.endpoint, "https://sheets.test/exec");
        assert_eq!(fetch.ttl, Duration::seconds(60));
        assert_eq!(fetch.timeout, Some(StdDuration::from_secs(15)));
        assert_eq!(config.fallback, Some(PathBuf::from("snapshot.json")));
        assert!(config.force_refresh);
        assert!(config.json);
        assert_eq!(config.high_risk_threshold, 70);
    }

    #[test]
    fn test_run_config_snapshot_only() {
        let cli = Cli {
            url: None,
            fallback: Some(PathBuf::from("snapshot.json")),
            refresh: false,
            ttl_secs: 300,
            timeout_secs: None,
            json: false,
            high_risk_threshold: 80,
            command: None,
        };
        let config = RunConfig::from_cli(&cli).unwrap();

        assert!(config.fetch.is_none());
        assert!(config.fallback.is_some());
    }

    #[test]
    fn test_run_config_requires_a_source() {
        let cli = Cli {
            url: None,
            fallback: None,
            refresh: false,
            ttl_secs: 300,
            timeout_secs: None,
            json: false,
            high_risk_threshold: 80,
            command: None,
        };

        assert!(matches!(RunConfig::from_cli(&cli), Err(CliError::NoDataSource)));
    }

    #[test]
    fn test_subcommands_and_global_flags() {
        let cli = parse(&[
            "scenario",
            "--select",
            "e1",
            "--select",
            "e2",
            "--fallback",
            "snapshot.json",
            "--json",
        ]);
        let config = RunConfig::from_cli(&cli).unwrap();

        assert_eq!(
            config.command,
            Command::Scenario {
                select: vec!["e1".to_string(), "e2".to_string()]
            }
        );
        assert!(config.json);

        let config = RunConfig::from_cli(&parse(&["--fallback", "s.json", "regret"])).unwrap();
        assert_eq!(config.command, Command::Regret);

        let config = RunConfig::from_cli(&parse(&["--fallback", "s.json"])).unwrap();
        assert_eq!(config.command, Command::Summary);
    }

    #[test]
    fn test_run_config_rejects_bad_url() {
        let cli = parse(&["--url", "sheets.test/exec"]);
        let result = RunConfig::from_cli(&cli);

        assert!(matches!(result, Err(CliError::InvalidUrl(_))));
    }
}
