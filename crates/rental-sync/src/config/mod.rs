use crate::workflows::delivery::{RetryPolicy, SyncTarget, TargetKind};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SHEET_PATH: &str = "data/Rooms Status - Master.xlsx";
const DEFAULT_SHEET_NAME: &str = "List";
const DEFAULT_LIVE_BASE_URL: &str = "https://splitspot.com/_functions/";
const DEFAULT_SANDBOX_BASE_URL: &str = "https://splitspot.com/_functions-dev/";

/// Distinguishes runtime behavior for different stages of the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the sync job.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub sheet: SheetConfig,
    pub delivery: DeliveryConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let sheet = SheetConfig {
            path: PathBuf::from(
                env::var("SYNC_SHEET_PATH").unwrap_or_else(|_| DEFAULT_SHEET_PATH.to_string()),
            ),
            name: env::var("SYNC_SHEET_NAME").unwrap_or_else(|_| DEFAULT_SHEET_NAME.to_string()),
        };

        let max_attempts = env::var("SYNC_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|attempts| *attempts >= 1)
            .ok_or(ConfigError::InvalidMaxAttempts)?;
        let retry_delay_secs = env::var("SYNC_RETRY_DELAY_SECS")
            .unwrap_or_else(|_| "1".to_string())
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidRetryDelay)?;

        let delivery = DeliveryConfig {
            live_base_url: base_url_var("SYNC_LIVE_BASE_URL", DEFAULT_LIVE_BASE_URL)?,
            sandbox_base_url: base_url_var("SYNC_SANDBOX_BASE_URL", DEFAULT_SANDBOX_BASE_URL)?,
            max_attempts,
            retry_delay: Duration::from_secs(retry_delay_secs),
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let metrics_path = env::var("SYNC_METRICS_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            sheet,
            delivery,
            telemetry: TelemetryConfig {
                log_level,
                metrics_path,
            },
        })
    }
}

fn base_url_var(name: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    let trimmed = value.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidBaseUrl {
            name,
            value: trimmed.to_string(),
        })
    }
}

/// Where the rooms status sheet is read from.
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub path: PathBuf,
    pub name: String,
}

/// Backend locations and the 503 retry policy.
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    pub live_base_url: String,
    pub sandbox_base_url: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl DeliveryConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_delay)
    }

    pub fn target(&self, kind: TargetKind) -> SyncTarget {
        let base_url = match kind {
            TargetKind::Live => &self.live_base_url,
            TargetKind::Sandbox => &self.sandbox_base_url,
        };
        SyncTarget::new(kind, base_url.as_str())
    }

    /// Targets in push order: live first, then sandbox.
    pub fn targets(&self) -> Vec<SyncTarget> {
        TargetKind::ordered()
            .into_iter()
            .map(|kind| self.target(kind))
            .collect()
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub metrics_path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMaxAttempts,
    InvalidRetryDelay,
    InvalidBaseUrl { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxAttempts => {
                write!(f, "SYNC_MAX_ATTEMPTS must be a whole number of at least 1")
            }
            ConfigError::InvalidRetryDelay => {
                write!(f, "SYNC_RETRY_DELAY_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidBaseUrl { name, value } => {
                write!(f, "{name} must be an http(s) URL, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
