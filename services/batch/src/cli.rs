use crate::runner::{self, RunSettings};
use chrono::Month;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rental_sync::config::AppConfig;
use rental_sync::error::AppError;
use rental_sync::telemetry::{self, MetricsSink};
use rental_sync::workflows::availability::parse_month;
use rental_sync::workflows::delivery::{HttpListingGateway, SyncDispatcher, TargetKind};
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "rental-sync-batch",
    about = "Push room availability and pricing from the rooms status sheet to the listing backend",
    version
)]
struct Cli {
    #[command(flatten)]
    options: RunOptions,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Import the sheet and push every unit to the backend (default command)
    Sync,
    /// Print the unit payloads as JSON without contacting the backend
    Preview {
        /// Only print the payload for this unit id
        #[arg(long)]
        unit: Option<String>,
    },
    /// Send the single-field updates for one room
    Room {
        /// Unit id (the sheet's "Wix ID" column)
        #[arg(long)]
        unit: String,
        /// Room label as written in the sheet
        #[arg(long)]
        room: String,
    },
}

#[derive(Args, Debug, Default)]
struct RunOptions {
    /// Override the configured rooms status workbook or CSV export
    #[arg(long, global = true)]
    sheet: Option<PathBuf>,
    /// Override the configured worksheet name
    #[arg(long, global = true)]
    sheet_name: Option<String>,
    /// Backend environments to update
    #[arg(long, value_enum, default_value_t = TargetSelection::All, global = true)]
    target: TargetSelection,
    /// Reference month for availability dates (defaults to the current month)
    #[arg(long, value_parser = parse_month_arg, global = true)]
    current_month: Option<Month>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum TargetSelection {
    #[default]
    All,
    Live,
    Sandbox,
}

impl TargetSelection {
    pub(crate) fn includes(self, kind: TargetKind) -> bool {
        match self {
            Self::All => true,
            Self::Live => kind == TargetKind::Live,
            Self::Sandbox => kind == TargetKind::Sandbox,
        }
    }
}

fn parse_month_arg(raw: &str) -> Result<Month, String> {
    parse_month(raw).map_err(|err| err.to_string())
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Sync);

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let metrics = MetricsSink::install(&config.telemetry)?;

    let RunOptions {
        sheet,
        sheet_name,
        target,
        current_month,
    } = cli.options;
    let current_month = match current_month {
        Some(month) => month,
        None => runner::current_month()?,
    };
    let settings = RunSettings {
        sheet_path: sheet.unwrap_or_else(|| config.sheet.path.clone()),
        sheet_name: sheet_name.unwrap_or_else(|| config.sheet.name.clone()),
        current_month,
        targets: config
            .delivery
            .targets()
            .into_iter()
            .filter(|sync_target| target.includes(sync_target.kind))
            .collect(),
    };

    info!(
        ?config.environment,
        sheet = %settings.sheet_path.display(),
        targets = settings.targets.len(),
        "rental sync starting"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Sync => {
            let dispatcher = http_dispatcher(&config)?;
            runner::run_sync(&settings, &dispatcher, &mut out)?;
        }
        Command::Preview { unit } => runner::run_preview(&settings, unit.as_deref(), &mut out)?,
        Command::Room { unit, room } => {
            let dispatcher = http_dispatcher(&config)?;
            runner::run_room(&settings, &dispatcher, &unit, &room, &mut out)?;
        }
    }

    if let Some(sink) = metrics {
        sink.flush()?;
    }
    Ok(())
}

fn http_dispatcher(config: &AppConfig) -> Result<SyncDispatcher, AppError> {
    let gateway = HttpListingGateway::with_runtime()?;
    Ok(SyncDispatcher::new(
        Box::new(gateway),
        config.delivery.retry_policy(),
    ))
}
