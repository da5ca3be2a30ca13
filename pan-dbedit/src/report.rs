use colored::Colorize;

use crate::changeset::ParseReport;
use crate::coordinator::FinishOutcome;
use crate::ledger::LedgerEntry;
use crate::run::RunSummary;

/// Render row counts and every skipped row.
pub fn render_parse_report(report: &ParseReport) -> String {
    let mut out = Vec::new();
    out.push(
        format!(
            "rows={} admitted={} skipped={}",
            report.rows,
            report.admitted,
            report.skipped.len()
        )
        .cyan()
        .to_string(),
    );
    for skipped in &report.skipped {
        out.push(
            format!(
                "SKIP line={} name={} reason={}",
                skipped.line, skipped.name, skipped.reason
            )
            .yellow()
            .to_string(),
        );
    }
    out.join("\n")
}

fn render_entry(entry: &LedgerEntry) -> String {
    let line = format!(
        "{:<8} {} {} {} '{}'",
        entry.outcome.to_uppercase(),
        entry.scope,
        entry.action,
        entry.kind,
        entry.name
    );
    let line = match &entry.reason {
        Some(reason) => format!("{line}: {reason}"),
        None => line,
    };
    match entry.outcome {
        "applied" => line.green().to_string(),
        "dry-run" => line.cyan().to_string(),
        "skipped" => line.yellow().to_string(),
        _ => line.red().to_string(),
    }
}

fn outcome_line(outcome: FinishOutcome) -> String {
    match outcome {
        FinishOutcome::TestMode => "test mode: no changes were made".cyan().to_string(),
        FinishOutcome::Reverted => "failures: candidate reverted, nothing committed"
            .red()
            .to_string(),
        FinishOutcome::HeldForInspection => {
            "failures: candidate and locks kept for inspection".red().to_string()
        }
        FinishOutcome::Committed => "committed".green().to_string(),
        FinishOutcome::CommitFailed => "commit failed: locks kept".red().to_string(),
        FinishOutcome::AwaitingCommit => "changes await commit".yellow().to_string(),
    }
}

/// Render the end-of-run summary for terminal output.
pub fn render_run_summary(summary: &RunSummary) -> String {
    let mut out = Vec::new();
    out.push(format!("host={} platform={}", summary.hostname, summary.platform));
    out.push(render_parse_report(&summary.parse));
    for entry in &summary.operations {
        out.push(render_entry(entry));
    }
    out.push(
        format!(
            "applied={} dry_run={} skipped={} failed={}",
            summary.tally.applied, summary.tally.dry_run, summary.tally.skipped, summary.tally.failed
        )
        .cyan()
        .to_string(),
    );
    if !summary.failures.is_empty() {
        out.push(
            format!("failed objects: {}", summary.failures.join(", "))
                .red()
                .to_string(),
        );
    }
    out.push(outcome_line(summary.outcome));
    out.join("\n")
}
