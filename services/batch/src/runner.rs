use crate::summary::{render_run_header, render_runtime, render_target_report, render_target_start};
use chrono::{DateTime, Local, Month};
use metrics::gauge;
use rental_sync::error::AppError;
use rental_sync::workflows::availability::{
    parse_month, room_field_updates, summarize_units, AvailabilityError, UnitPayload, UnitSummary,
};
use rental_sync::workflows::delivery::{SyncDispatcher, SyncRunReport, SyncTarget, TargetReport};
use rental_sync::workflows::sheet::RoomSheetImporter;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Resolved inputs for one invocation: config defaults with CLI overrides
/// applied.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) sheet_path: PathBuf,
    pub(crate) sheet_name: String,
    pub(crate) current_month: Month,
    pub(crate) targets: Vec<SyncTarget>,
}

pub(crate) fn current_month() -> Result<Month, AppError> {
    Ok(parse_month(&Local::now().format("%B").to_string())?)
}

/// Imports the sheet and rolls rooms up into units. Any bad row aborts here,
/// before a single request is sent.
pub(crate) fn load_units(
    settings: &RunSettings,
) -> Result<BTreeMap<String, UnitSummary>, AppError> {
    let records = RoomSheetImporter::from_path(&settings.sheet_path, &settings.sheet_name)?;
    let units = summarize_units(records, settings.current_month);

    let active = units.values().filter(|unit| unit.is_active()).count();
    gauge!("rental_sync_units", "state" => "active").set(active as f64);
    gauge!("rental_sync_units", "state" => "inactive").set((units.len() - active) as f64);
    info!(
        units = units.len(),
        active,
        current_month = settings.current_month.name(),
        "units summarized"
    );

    Ok(units)
}

pub(crate) fn run_sync<W: Write>(
    settings: &RunSettings,
    dispatcher: &SyncDispatcher,
    out: &mut W,
) -> Result<SyncRunReport, AppError> {
    let started_at = Local::now();
    let clock = Instant::now();

    let units = load_units(settings)?;
    let payloads: Vec<UnitPayload> = units.values().map(UnitPayload::from_summary).collect();

    run_targets(settings, started_at, clock, "Wix Id", out, |target| {
        info!(
            backend = target.kind.key(),
            url = %target.batch_update_url(),
            units = payloads.len(),
            "updating target"
        );
        dispatcher.push_units(target, &payloads)
    })
}

/// Writes the payloads that `sync` would send as pretty JSON.
pub(crate) fn run_preview<W: Write>(
    settings: &RunSettings,
    unit_id: Option<&str>,
    out: &mut W,
) -> Result<(), AppError> {
    let units = load_units(settings)?;
    let payloads: Vec<UnitPayload> = match unit_id {
        Some(unit_id) => {
            let summary = find_unit(&units, unit_id)?;
            vec![UnitPayload::from_summary(summary)]
        }
        None => units.values().map(UnitPayload::from_summary).collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &payloads).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

pub(crate) fn run_room<W: Write>(
    settings: &RunSettings,
    dispatcher: &SyncDispatcher,
    unit_id: &str,
    room: &str,
    out: &mut W,
) -> Result<SyncRunReport, AppError> {
    let started_at = Local::now();
    let clock = Instant::now();

    let units = load_units(settings)?;
    let updates = room_field_updates(find_unit(&units, unit_id)?, room)?;

    run_targets(settings, started_at, clock, "Field", out, |target| {
        dispatcher.push_room_updates(target, &updates)
    })
}

/// Pushes to each selected target in turn, writing the console report as it
/// goes so the "Updating on" line shows before that target's requests.
fn run_targets<W, F>(
    settings: &RunSettings,
    started_at: DateTime<Local>,
    clock: Instant,
    subject: &str,
    out: &mut W,
    mut push: F,
) -> Result<SyncRunReport, AppError>
where
    W: Write,
    F: FnMut(&SyncTarget) -> TargetReport,
{
    let mut report = SyncRunReport {
        started_at,
        targets: Vec::with_capacity(settings.targets.len()),
        elapsed: Duration::ZERO,
    };
    render_run_header(&report, out)?;

    for target in &settings.targets {
        render_target_start(target.kind, out)?;
        let target_report = push(target);
        render_target_report(&target_report, subject, out)?;
        report.targets.push(target_report);
    }

    report.elapsed = clock.elapsed();
    render_runtime(&report, out)?;
    Ok(report)
}

fn find_unit<'a>(
    units: &'a BTreeMap<String, UnitSummary>,
    unit_id: &str,
) -> Result<&'a UnitSummary, AvailabilityError> {
    let wanted = unit_id.trim();
    units
        .get(wanted)
        .ok_or_else(|| AvailabilityError::UnitNotFound(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_sync::workflows::delivery::{
        GatewayError, HttpReply, ListingGateway, RetryPolicy, TargetKind,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const SHEET: &str = "\
Apartment,Wix ID,Room,Price,Status,Date
12 Main St,wix-1,A,600,Vacant,
12 Main St,wix-1,B,700,Occupied,
40 Oak Ave,wix-2,A,$1200,Upcoming Vacancy,March
40 Oak Ave,wix-2,B,1100,Upcoming Vacancy,January
";

    #[derive(Debug, Default, Clone)]
    struct RecordingGateway {
        calls: Arc<Mutex<Vec<(String, Value)>>>,
        failing_unit: Option<String>,
    }

    impl ListingGateway for RecordingGateway {
        fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, GatewayError> {
            self.calls
                .lock()
                .expect("calls mutex")
                .push((url.to_string(), body.clone()));
            let failing = self
                .failing_unit
                .as_deref()
                .is_some_and(|unit| body["unitId"] == unit);
            if failing {
                Ok(HttpReply::new(400, r#"{"status_msg":"rejected"}"#))
            } else {
                Ok(HttpReply::new(200, "{}"))
            }
        }
    }

    fn settings(dir: &TempDir, targets: Vec<SyncTarget>) -> RunSettings {
        let sheet_path = dir.path().join("rooms.csv");
        std::fs::write(&sheet_path, SHEET).expect("sheet written");
        RunSettings {
            sheet_path,
            sheet_name: "List".to_string(),
            current_month: Month::December,
            targets,
        }
    }

    fn both_targets() -> Vec<SyncTarget> {
        vec![
            SyncTarget::new(TargetKind::Live, "http://live/_functions/"),
            SyncTarget::new(TargetKind::Sandbox, "http://sandbox/_functions-dev/"),
        ]
    }

    fn dispatcher(gateway: RecordingGateway) -> SyncDispatcher {
        SyncDispatcher::new(Box::new(gateway), RetryPolicy::new(3, Duration::ZERO))
    }

    #[test]
    fn sync_pushes_every_unit_to_each_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = RecordingGateway {
            failing_unit: Some("wix-2".to_string()),
            ..RecordingGateway::default()
        };
        let calls = gateway.calls.clone();
        let mut out = Vec::new();

        let report = run_sync(
            &settings(&dir, both_targets()),
            &dispatcher(gateway),
            &mut out,
        )
        .expect("sync runs");

        assert_eq!(report.targets.len(), 2);
        assert_eq!(report.targets[0].succeeded, vec!["wix-1"]);
        assert_eq!(report.targets[0].failed, vec!["wix-2"]);
        assert_eq!(report.failed_total(), 2);

        let calls = calls.lock().expect("calls mutex");
        let urls: Vec<&str> = calls.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://live/_functions/batchUpdate",
                "http://live/_functions/batchUpdate",
                "http://sandbox/_functions-dev/batchUpdate",
                "http://sandbox/_functions-dev/batchUpdate",
            ]
        );
        assert_eq!(
            calls[0].1,
            json!({
                "unitId": "wix-1",
                "unitPrice": 600,
                "unitAvailability": [true, "Available Now!", "1/2 Rooms Available"],
                "rooms": ["A", "B"],
                "roomsPrice": [600, null],
                "roomsAvailability": ["Available Now!", "Not Available"]
            })
        );
        assert_eq!(
            calls[1].1["unitAvailability"],
            json!([true, "Available January 1st", "2/2 Rooms Available"])
        );
        assert_eq!(calls[1].1["unitPrice"], json!(1100));

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Wix Id with an error during update to Live:\nwix-2\n"));
        assert!(text.contains("Batch Update Runtime: 0 min, "));
    }

    #[test]
    fn preview_prints_payloads_without_sending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut out = Vec::new();

        run_preview(&settings(&dir, both_targets()), Some("wix-2"), &mut out)
            .expect("preview runs");

        let printed: Value = serde_json::from_slice(&out).expect("json output");
        assert_eq!(printed.as_array().map(Vec::len), Some(1));
        assert_eq!(printed[0]["unitId"], "wix-2");
        assert_eq!(
            printed[0]["roomsAvailability"],
            json!(["Available March 1st", "Available January 1st"])
        );
    }

    #[test]
    fn preview_rejects_unknown_unit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_preview(&settings(&dir, both_targets()), Some("wix-9"), &mut Vec::new())
            .expect_err("unknown unit");
        assert!(matches!(
            err,
            AppError::Availability(AvailabilityError::UnitNotFound(ref unit)) if unit == "wix-9"
        ));
    }

    #[test]
    fn room_sends_field_updates_to_selected_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = RecordingGateway::default();
        let calls = gateway.calls.clone();
        let targets = vec![SyncTarget::new(TargetKind::Sandbox, "http://sandbox/fn/")];
        let mut out = Vec::new();

        let report = run_room(
            &settings(&dir, targets),
            &dispatcher(gateway),
            "wix-1",
            "B",
            &mut out,
        )
        .expect("room update runs");

        assert_eq!(
            report.targets[0].succeeded,
            vec!["unitAvailable", "roomAvailable", "roomPrice", "unitPrice"]
        );
        let calls = calls.lock().expect("calls mutex");
        assert!(calls
            .iter()
            .all(|(url, _)| url == "http://sandbox/fn/updateRoom"));
        assert_eq!(
            calls[2].1,
            json!({ "unitId": "wix-1", "field": "roomPrice", "value": ["B", null] })
        );
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("Field successfully updated to Sandbox:\nunitAvailable\n"));
    }

    /// Console buffer the gateway can read back while the run is in flight.
    #[derive(Debug, Default, Clone)]
    struct SharedConsole(Arc<Mutex<Vec<u8>>>);

    impl SharedConsole {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().expect("console mutex").clone()).expect("utf8")
        }
    }

    impl Write for SharedConsole {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .expect("console mutex")
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Accepts every request and remembers what the console showed at the time.
    #[derive(Debug)]
    struct ConsoleWatchingGateway {
        console: SharedConsole,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl ListingGateway for ConsoleWatchingGateway {
        fn post_json(&self, _url: &str, _body: &Value) -> Result<HttpReply, GatewayError> {
            self.seen
                .lock()
                .expect("seen mutex")
                .push(self.console.text());
            Ok(HttpReply::new(200, "{}"))
        }
    }

    #[test]
    fn progress_is_printed_before_each_target_is_updated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let console = SharedConsole::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let gateway = ConsoleWatchingGateway {
            console: console.clone(),
            seen: seen.clone(),
        };
        let dispatcher =
            SyncDispatcher::new(Box::new(gateway), RetryPolicy::new(3, Duration::ZERO));
        let mut out = console.clone();

        run_sync(&settings(&dir, both_targets()), &dispatcher, &mut out).expect("sync runs");

        let seen = seen.lock().expect("seen mutex");
        assert_eq!(seen.len(), 4);
        assert!(seen[0].ends_with("\nUpdating on Live...\n"));
        assert!(!seen[0].contains("successfully updated"));
        assert!(seen[2].contains("Wix Id successfully updated to Live:\nwix-1\nwix-2\n"));
        assert!(seen[2].ends_with("\nUpdating on Sandbox...\n"));
        assert!(!seen[3].contains("Batch Update Runtime"));
        assert!(console.text().ends_with(" sec\n"));
    }

    #[test]
    fn room_rejects_unknown_room_before_sending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let gateway = RecordingGateway::default();
        let calls = gateway.calls.clone();

        let err = run_room(
            &settings(&dir, both_targets()),
            &dispatcher(gateway),
            "wix-1",
            "Z",
            &mut Vec::new(),
        )
        .expect_err("unknown room");

        assert!(matches!(
            err,
            AppError::Availability(AvailabilityError::RoomNotFound { .. })
        ));
        assert!(calls.lock().expect("calls mutex").is_empty());
    }
}
