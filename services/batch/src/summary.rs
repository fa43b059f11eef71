use rental_sync::workflows::delivery::{SyncRunReport, TargetKind, TargetReport};
use std::io::{self, Write};

// Console output is written as the run progresses: the start time, then for
// each target an "Updating on" line before any request goes out and the
// success and failure lists once it is done, then the runtime. `subject`
// names what the keys are ("Wix Id" for units, "Field" for room updates).

pub(crate) fn render_run_header<W: Write>(report: &SyncRunReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", report.started_label())
}

pub(crate) fn render_target_start<W: Write>(kind: TargetKind, out: &mut W) -> io::Result<()> {
    writeln!(out, "\nUpdating on {}...", kind.label())?;
    out.flush()
}

pub(crate) fn render_target_report<W: Write>(
    report: &TargetReport,
    subject: &str,
    out: &mut W,
) -> io::Result<()> {
    let label = report.target.label();
    writeln!(out, "\n{subject} successfully updated to {label}:")?;
    for key in &report.succeeded {
        writeln!(out, "{key}")?;
    }
    writeln!(out, "\n{subject} with an error during update to {label}:")?;
    for key in &report.failed {
        writeln!(out, "{key}")?;
    }
    Ok(())
}

pub(crate) fn render_runtime<W: Write>(report: &SyncRunReport, out: &mut W) -> io::Result<()> {
    writeln!(out, "\nBatch Update Runtime: {}", report.runtime_label())
}
