use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
    Metrics(BuildError),
    MetricsFile { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
            TelemetryError::Metrics(err) => write!(f, "metrics recorder error: {err}"),
            TelemetryError::MetricsFile { path, .. } => {
                write!(f, "unable to write metrics to {}", path.display())
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
            TelemetryError::Metrics(err) => Some(err),
            TelemetryError::MetricsFile { source, .. } => Some(source),
        }
    }
}

/// Installs the tracing subscriber. Logs go to stderr so stdout stays free for
/// the run summary and previews.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Prometheus text rendering of the run's counters, flushed to a file once
/// the run is over.
#[derive(Debug)]
pub struct MetricsSink {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl MetricsSink {
    /// Installs the global recorder when a metrics path is configured.
    pub fn install(config: &TelemetryConfig) -> Result<Option<Self>, TelemetryError> {
        let Some(path) = config.metrics_path.clone() else {
            return Ok(None);
        };
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(TelemetryError::Metrics)?;
        Ok(Some(Self::new(handle, path)))
    }

    pub fn new(handle: PrometheusHandle, path: PathBuf) -> Self {
        Self { handle, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    pub fn flush(&self) -> Result<(), TelemetryError> {
        fs::write(&self.path, self.render()).map_err(|source| TelemetryError::MetricsFile {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "metrics written");
        Ok(())
    }
}
