//! # Configuration
//!
//! Settings come from four layers, later ones winning:
//! 1. built-in defaults,
//! 2. an optional JSON file (`--config-path` / `RESULTS_CONFIG_PATH`, default `trot_results.json`),
//! 3. environment variables (a `.env` file is loaded by the binary beforehand),
//! 4. command line flags.
//!
//! Layers 3 and 4 are both handled by `clap`. The merged [`Args`] are validated
//! once into an immutable [`AppConfig`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use lib_common::loggers::LogOptions;
use lib_common::retrieve::ApiClientOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sink::{is_valid_target, StoreKind, WritePolicy, DEFAULT_STORE_TARGET};
use crate::target_date::TargetDate;
use crate::veikkaus::fetcher::DEFAULT_COUNTRY_CODE;

/// Config file read when no path is given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "trot_results.json";
pub const DEFAULT_TIME_ZONE: &str = "Europe/Helsinki";
pub const DEFAULT_PG_MAX_CONNECTIONS: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting '{0}'")]
    Missing(&'static str),
    #[error("invalid value '{value}' for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw, unvalidated settings as given on the command line, in the
/// environment or in the config file.
#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Stores yesterday's trotting results as win/loss performances", version)]
#[serde(rename_all = "camelCase")]
pub struct Args {
    #[clap(long, env = "VEIKKAUS_URL", help = "Base URL of the Veikkaus trotting API.")]
    pub veikkaus_url: Option<String>,

    #[clap(long, env = "STORE_URI", help = "Store connection URI: postgres://, redis:// or stdout.")]
    pub store_uri: Option<String>,

    #[clap(long, env = "STORE_TARGET", help = "Table name or key prefix for stored performances.")]
    pub store_target: Option<String>,

    #[clap(long, env = "COUNTRY_CODE", help = "Only cards from this country are processed.")]
    pub country_code: Option<String>,

    #[clap(long, env = "TIME_ZONE", help = "IANA time zone deciding what 'yesterday' is.")]
    pub time_zone: Option<String>,

    #[clap(long, env = "LOG_LEVEL", help = "Log filter used when RUST_LOG is unset (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "LOG_DIR", help = "Directory for daily rotated JSON log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "HTTP_TIMEOUT_SECS", help = "Per-request timeout in seconds, 0 for none.")]
    pub http_timeout_secs: Option<u64>,

    #[clap(long, env = "HTTP_MAX_RETRIES", help = "Retries for transient upstream failures.")]
    pub http_max_retries: Option<u32>,

    #[clap(long, env = "WRITE_POLICY", help = "best-effort (ignore failed writes) or strict.")]
    pub write_policy: Option<String>,

    #[clap(long, env = "PG_MAX_CONNECTIONS", help = "Size of the PostgreSQL connection pool.")]
    pub pg_max_connections: Option<usize>,

    #[clap(long, env = "RESULTS_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, help = "Process this race day (YYYY-MM-DD) instead of yesterday.")]
    #[serde(skip)]
    pub date: Option<NaiveDate>,

    #[clap(long, env = "RESULTS_SCHEDULE", help = "Cron expression; keeps running and processes yesterday on every tick.")]
    pub schedule: Option<String>,
}

impl Args {
    /// Field-wise merge where `other` wins wherever it has a value.
    pub fn merge(self, other: Args) -> Args {
        Args {
            veikkaus_url: other.veikkaus_url.or(self.veikkaus_url),
            store_uri: other.store_uri.or(self.store_uri),
            store_target: other.store_target.or(self.store_target),
            country_code: other.country_code.or(self.country_code),
            time_zone: other.time_zone.or(self.time_zone),
            log_level: other.log_level.or(self.log_level),
            log_dir: other.log_dir.or(self.log_dir),
            http_timeout_secs: other.http_timeout_secs.or(self.http_timeout_secs),
            http_max_retries: other.http_max_retries.or(self.http_max_retries),
            write_policy: other.write_policy.or(self.write_policy),
            pg_max_connections: other.pg_max_connections.or(self.pg_max_connections),
            config_path: other.config_path.or(self.config_path),
            date: other.date.or(self.date),
            schedule: other.schedule.or(self.schedule),
        }
    }

    /// Built-in defaults. Upstream URL and store URI have none.
    pub fn defaults() -> Args {
        Args {
            store_target: Some(DEFAULT_STORE_TARGET.to_string()),
            country_code: Some(DEFAULT_COUNTRY_CODE.to_string()),
            time_zone: Some(DEFAULT_TIME_ZONE.to_string()),
            log_level: Some("info".to_string()),
            http_timeout_secs: Some(0),
            http_max_retries: Some(0),
            write_policy: Some(WritePolicy::default().to_string()),
            pg_max_connections: Some(DEFAULT_PG_MAX_CONNECTIONS),
            ..Default::default()
        }
    }
}

/// Reads a JSON config file. A missing file is only an error when the path
/// was given explicitly.
fn read_config_file(path: &Path, explicit: bool) -> Result<Option<Args>, ConfigError> {
    if !explicit && !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let args = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(args))
}

/// Validated settings for one process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub veikkaus_url: String,
    pub store_uri: String,
    pub store_target: String,
    pub country_code: String,
    pub time_zone: Tz,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub http_timeout: Option<Duration>,
    pub http_max_retries: u32,
    pub write_policy: WritePolicy,
    pub pg_max_connections: usize,
    pub date: Option<NaiveDate>,
    pub schedule: Option<String>,
}

impl AppConfig {
    /// Parses the command line (and environment) and builds the config.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_args(Args::parse())
    }

    /// Layers defaults, the config file and `cli` (CLI + env), then validates.
    pub fn from_args(cli: Args) -> Result<Self, ConfigError> {
        let (path, explicit) = match &cli.config_path {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let mut merged = Args::defaults();
        if let Some(file_args) = read_config_file(&path, explicit)? {
            merged = merged.merge(file_args);
        }
        Self::validate(merged.merge(cli))
    }

    /// Checks and converts merged settings.
    pub fn validate(args: Args) -> Result<Self, ConfigError> {
        let veikkaus_url = required(args.veikkaus_url, "veikkaus_url")?;
        if !(veikkaus_url.starts_with("http://") || veikkaus_url.starts_with("https://")) {
            return Err(invalid("veikkaus_url", &veikkaus_url, "must be an http(s) URL"));
        }

        let store_uri = required(args.store_uri, "store_uri")?;
        if StoreKind::from_uri(&store_uri).is_none() {
            return Err(invalid(
                "store_uri",
                &lib_common::connections::mask_url_password(&store_uri),
                "unsupported scheme",
            ));
        }

        let store_target = required(args.store_target, "store_target")?;
        if !is_valid_target(&store_target) {
            return Err(invalid("store_target", &store_target, "must match [A-Za-z_][A-Za-z0-9_]*"));
        }

        let country_code = required(args.country_code, "country_code")?.trim().to_ascii_uppercase();
        if country_code.is_empty() {
            return Err(invalid("country_code", "", "must not be empty"));
        }

        let zone_name = required(args.time_zone, "time_zone")?;
        let time_zone = zone_name
            .parse::<Tz>()
            .map_err(|e| invalid("time_zone", &zone_name, &e.to_string()))?;

        let policy_name = required(args.write_policy, "write_policy")?;
        let write_policy = policy_name
            .parse::<WritePolicy>()
            .map_err(|reason| invalid("write_policy", &policy_name, &reason))?;

        let pg_max_connections = args.pg_max_connections.unwrap_or(DEFAULT_PG_MAX_CONNECTIONS);
        if pg_max_connections == 0 {
            return Err(invalid("pg_max_connections", "0", "must be at least 1"));
        }

        if args.date.is_some() && args.schedule.is_some() {
            return Err(invalid(
                "schedule",
                args.schedule.as_deref().unwrap_or_default(),
                "cannot be combined with an explicit date",
            ));
        }
        if let Some(cron) = &args.schedule {
            if cron.trim().is_empty() {
                return Err(invalid("schedule", cron, "must not be empty"));
            }
        }

        Ok(Self {
            veikkaus_url,
            store_uri,
            store_target,
            country_code,
            time_zone,
            log_level: args.log_level.unwrap_or_else(|| "info".to_string()),
            log_dir: args.log_dir,
            http_timeout: args.http_timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs),
            http_max_retries: args.http_max_retries.unwrap_or(0),
            write_policy,
            pg_max_connections,
            date: args.date,
            schedule: args.schedule,
        })
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
        }
    }

    pub fn api_options(&self) -> ApiClientOptions {
        ApiClientOptions {
            max_retries: self.http_max_retries,
            timeout: self.http_timeout,
            user_agent: None,
        }
    }

    /// The race day to process when invoked at `now`.
    pub fn target_date(&self, now: DateTime<Utc>) -> TargetDate {
        match self.date {
            Some(date) => TargetDate::for_date(date, &self.time_zone),
            None => TargetDate::yesterday(now.with_timezone(&self.time_zone)),
        }
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(field)),
    }
}

fn invalid(field: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn minimal() -> Args {
        Args {
            veikkaus_url: Some("https://www.veikkaus.fi/api/toto-info/v1".to_string()),
            store_uri: Some("stdout".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_in_everything_optional() {
        let config = AppConfig::validate(Args::defaults().merge(minimal())).unwrap();
        assert_eq!(config.store_target, "horse_performances");
        assert_eq!(config.country_code, "SE");
        assert_eq!(config.time_zone, chrono_tz::Europe::Helsinki);
        assert_eq!(config.write_policy, WritePolicy::BestEffort);
        assert_eq!(config.http_max_retries, 0);
        assert_eq!(config.http_timeout, None);
        assert!(config.schedule.is_none() && config.date.is_none());
    }

    #[test]
    fn later_layers_win() {
        let file = Args {
            country_code: Some("FI".to_string()),
            http_max_retries: Some(2),
            ..Default::default()
        };
        let cli = Args {
            country_code: Some("no".to_string()),
            ..minimal()
        };
        let config = AppConfig::validate(Args::defaults().merge(file).merge(cli)).unwrap();
        assert_eq!(config.country_code, "NO");
        assert_eq!(config.http_max_retries, 2);
    }

    #[test]
    fn missing_url_and_store_are_fatal() {
        let err = AppConfig::validate(Args::defaults()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("veikkaus_url")));

        let args = Args {
            store_uri: None,
            ..minimal()
        };
        let err = AppConfig::validate(Args::defaults().merge(args)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("store_uri")));
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            Args { store_uri: Some("mongodb://db".into()), ..minimal() },
            Args { store_uri: Some("memory".into()), ..minimal() },
            Args { store_target: Some("bad-name".into()), ..minimal() },
            Args { time_zone: Some("Mars/Olympus".into()), ..minimal() },
            Args { write_policy: Some("sometimes".into()), ..minimal() },
            Args { pg_max_connections: Some(0), ..minimal() },
            Args { veikkaus_url: Some("ftp://example.com".into()), ..minimal() },
            Args {
                date: NaiveDate::from_ymd_opt(2024, 3, 4),
                schedule: Some("0 0 6 * * *".into()),
                ..minimal()
            },
        ];
        for args in cases {
            let err = AppConfig::validate(Args::defaults().merge(args.clone())).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{args:?} gave {err:?}");
        }
    }

    #[test]
    fn parses_command_line_flags() {
        let args = Args::try_parse_from([
            "trot_results",
            "--veikkaus-url",
            "http://localhost:8080/v1",
            "--store-uri",
            "stdout",
            "--date",
            "2024-03-04",
            "--write-policy",
            "strict",
        ])
        .unwrap();
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 3, 4));
        let config = AppConfig::validate(Args::defaults().merge(args)).unwrap();
        assert_eq!(config.write_policy, WritePolicy::Strict);
        assert_eq!(config.store_uri, "stdout");
    }

    #[test]
    fn reads_explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"veikkausUrl": "http://upstream/v1", "storeUri": "stdout", "storeTarget": "from_file", "httpTimeoutSecs": 5}}"#
        )
        .unwrap();

        let cli = Args {
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::from_args(cli).unwrap();
        assert_eq!(config.veikkaus_url, "http://upstream/v1");
        assert_eq!(config.store_target, "from_file");
        assert_eq!(config.http_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn explicit_missing_or_broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Args {
            config_path: Some(dir.path().join("absent.json")),
            ..minimal()
        };
        assert!(matches!(AppConfig::from_args(cli), Err(ConfigError::Read { .. })));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        let cli = Args {
            config_path: Some(broken),
            ..minimal()
        };
        assert!(matches!(AppConfig::from_args(cli), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn target_date_is_yesterday_in_the_configured_zone() {
        let config = AppConfig::validate(Args::defaults().merge(minimal())).unwrap();
        // 22:30 UTC on March 4th is already March 5th in Helsinki.
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 22, 30, 0).unwrap();
        let target = config.target_date(now);
        assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(target.timestamp_ms, now.timestamp_millis() - 86_400_000);
    }

    #[test]
    fn explicit_date_overrides_yesterday() {
        let args = Args {
            date: NaiveDate::from_ymd_opt(2024, 1, 15),
            ..minimal()
        };
        let config = AppConfig::validate(Args::defaults().merge(args)).unwrap();
        let target = config.target_date(Utc::now());
        assert_eq!(target.api_segment(), "2024-1-15");
        // Helsinki is UTC+2 in January.
        let expected = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        assert_eq!(target.timestamp_ms, expected.timestamp_millis());
    }
}
