//! One reconciliation run against one device.

use std::path::Path;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::applier::{ApplyOptions, ScopePass};
use crate::builder::BuildOptions;
use crate::changeset::{read_changeset, Changeset, ParseReport};
use crate::coordinator::{FinishOutcome, LockCoordinator, LockPolicy};
use crate::device::DeviceClient;
use crate::error::InfrastructureError;
use crate::ledger::{LedgerEntry, RunLedger, RunState, Tally};
use crate::scope::{Platform, Scope};
use crate::tree::ConfigTree;

/// `--location` value selecting every scope.
pub const ALL_LOCATIONS: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub location: Option<String>,
    /// Syntax and reference checks.
    pub checks: bool,
    pub locks: LockPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            location: None,
            checks: true,
            locks: LockPolicy::default(),
        }
    }
}

/// Scopes to process, in processing order.
///
/// Firewall routes come first so that later passes see them; shared objects
/// precede the vsys that reference them.
pub fn select_scopes<D: DeviceClient>(
    device: &D,
    location: Option<&str>,
) -> Result<Vec<Scope>, InfrastructureError> {
    let platform = device.info().platform;
    let available = device.scopes();
    let of = |wanted: fn(&Scope) -> bool| available.iter().filter(move |s| wanted(s)).cloned();

    let scopes = match (platform, location) {
        (Platform::Panorama, None) => vec![Scope::Shared],
        (Platform::Panorama, Some(ALL_LOCATIONS)) => {
            of(|s| matches!(s, Scope::DeviceGroup(_))).collect()
        }
        (Platform::Firewall, None | Some(ALL_LOCATIONS)) => {
            of(|s| matches!(s, Scope::VirtualRouter(_)))
                .chain([Scope::Shared])
                .chain(of(|s| matches!(s, Scope::Vsys(_))))
                .collect()
        }
        (_, Some(name)) => {
            let Some(scope) = available.iter().find(|s| s.matches_location(name)) else {
                return Err(InfrastructureError::UnknownLocation {
                    platform,
                    location: name.to_string(),
                });
            };
            vec![scope.clone()]
        }
    };
    Ok(scopes)
}

/// Apply an already-parsed changeset: lock, run every selected scope, finish.
pub fn apply_changeset<D: DeviceClient>(
    device: &mut D,
    changeset: &Changeset,
    options: &RunOptions,
) -> Result<(RunLedger, FinishOutcome), InfrastructureError> {
    let platform = device.info().platform;
    let scopes = select_scopes(device, options.location.as_deref())?;
    for location in changeset.locations() {
        if !scopes.iter().any(|scope| scope.matches_location(location)) {
            warn!(location, "location not selected for this run, its rows are ignored");
        }
    }

    let mut locks = LockCoordinator::new(options.locks);
    locks.acquire(device)?;

    let mut ledger = RunLedger::default();
    let mut tree = ConfigTree::new(device, options.locks.test_mode);
    let apply = ApplyOptions {
        checks: options.checks,
    };
    for scope in scopes {
        let pass = ScopePass::new(changeset, scope.clone(), platform, apply);
        if let Err(err) = pass.run(&mut tree, &mut ledger) {
            ledger.record_pass_failure(&scope, &err.to_string());
        }
    }
    drop(tree);

    let outcome = locks.finish(device, ledger.failures())?;
    RunState::Done.enter();
    Ok((ledger, outcome))
}

/// Read the changeset at `changes` and apply it to `device`.
pub fn execute<D: DeviceClient>(
    device: &mut D,
    changes: &Path,
    options: &RunOptions,
) -> Result<RunSummary, InfrastructureError> {
    RunState::Idle.enter();
    RunState::ParsingInput.enter();
    let build = BuildOptions {
        checks: options.checks,
    };
    let (changeset, report) = read_changeset(changes, build, Local::now().date_naive())?;
    let (ledger, outcome) = apply_changeset(device, &changeset, options)?;
    let summary = RunSummary::new(device, report, &ledger, outcome, options.locks.test_mode);
    summary.log();
    Ok(summary)
}

/// End-of-run report, rendered to stdout and optionally saved as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub hostname: String,
    pub platform: Platform,
    pub test_mode: bool,
    pub parse: ParseReport,
    pub operations: Vec<LedgerEntry>,
    pub tally: Tally,
    pub failures: Vec<String>,
    pub outcome: FinishOutcome,
}

impl RunSummary {
    pub fn new<D: DeviceClient>(
        device: &D,
        parse: ParseReport,
        ledger: &RunLedger,
        outcome: FinishOutcome,
        test_mode: bool,
    ) -> Self {
        let info = device.info();
        Self {
            hostname: info.hostname.clone(),
            platform: info.platform,
            test_mode,
            parse,
            operations: ledger.entries().to_vec(),
            tally: ledger.tally(),
            failures: ledger.failures().iter().cloned().collect(),
            outcome,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
            && !matches!(self.outcome, FinishOutcome::CommitFailed | FinishOutcome::Reverted)
    }

    fn log(&self) {
        info!(
            hostname = %self.hostname,
            applied = self.tally.applied,
            dry_run = self.tally.dry_run,
            skipped = self.tally.skipped,
            failed = self.tally.failed,
            rows_skipped = self.parse.skipped.len(),
            outcome = ?self.outcome,
            "run summary"
        );
        if !self.failures.is_empty() {
            error!(
                hostname = %self.hostname,
                failures = %self.failures.join(", "),
                "the following objects failed to update"
            );
        }
    }
}
