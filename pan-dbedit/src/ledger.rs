//! Run state and the per-operation outcome record.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::ReferenceError;
use crate::kind::{Action, ObjectKind};
use crate::scope::Scope;
use crate::tree::Push;

/// Where a run currently is. Logged on every transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ParsingInput,
    Validating(Scope),
    Applying(Scope, ObjectKind),
    Committing,
    Reverting,
    Done,
}

impl RunState {
    pub fn enter(self) -> Self {
        info!(state = %self, "run state");
        self
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::ParsingInput => f.write_str("parsing input"),
            RunState::Validating(scope) => write!(f, "validating {scope}"),
            RunState::Applying(scope, kind) => write!(f, "applying {kind} in {scope}"),
            RunState::Committing => f.write_str("committing"),
            RunState::Reverting => f.write_str("reverting"),
            RunState::Done => f.write_str("done"),
        }
    }
}

/// Why an operation was not attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Reference(ReferenceError),
    /// The operation does not apply to this scope or rulebase.
    NotApplicable(String),
    /// Nothing to change, e.g. every member was already present.
    Unchanged,
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Reference(err) => err.fmt(f),
            Rejection::NotApplicable(reason) => f.write_str(reason),
            Rejection::Unchanged => f.write_str("nothing to change"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    DryRun,
    Skipped(Rejection),
    /// The device error, rendered.
    Failed(String),
}

impl From<Push> for Outcome {
    fn from(push: Push) -> Self {
        match push {
            Push::Live => Outcome::Applied,
            Push::DryRun => Outcome::DryRun,
        }
    }
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Applied => "applied",
            Outcome::DryRun => "dry-run",
            Outcome::Skipped(_) => "skipped",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Skipped(rejection) => Some(rejection.to_string()),
            Outcome::Failed(reason) => Some(reason.clone()),
            Outcome::Applied | Outcome::DryRun => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub scope: String,
    pub action: Action,
    pub kind: ObjectKind,
    pub name: String,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Everything that happened to every operation, plus the names that failed.
#[derive(Debug, Default)]
pub struct RunLedger {
    entries: Vec<LedgerEntry>,
    failures: BTreeSet<String>,
}

impl RunLedger {
    pub fn record(
        &mut self,
        scope: &Scope,
        action: Action,
        kind: ObjectKind,
        name: &str,
        outcome: Outcome,
    ) {
        let reason = outcome.reason();
        match &outcome {
            Outcome::Applied | Outcome::DryRun => info!(
                %scope,
                %action,
                %kind,
                name,
                outcome = outcome.label(),
                "operation complete"
            ),
            Outcome::Skipped(_) => warn!(
                %scope,
                %action,
                %kind,
                name,
                reason = reason.as_deref().unwrap_or_default(),
                "operation skipped"
            ),
            Outcome::Failed(_) => {
                error!(
                    %scope,
                    %action,
                    %kind,
                    name,
                    reason = reason.as_deref().unwrap_or_default(),
                    "operation FAILED"
                );
                self.failures.insert(name.to_string());
            }
        }
        self.entries.push(LedgerEntry {
            scope: scope.to_string(),
            action,
            kind,
            name: name.to_string(),
            outcome: outcome.label(),
            reason,
        });
    }

    /// A scope pass that could not start; every operation in it is lost.
    pub fn record_pass_failure(&mut self, scope: &Scope, reason: &str) {
        error!(%scope, reason, "scope pass FAILED");
        self.failures.insert(scope.to_string());
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn failures(&self) -> &BTreeSet<String> {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Entry counts keyed by outcome label.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for entry in &self.entries {
            match entry.outcome {
                "applied" => tally.applied += 1,
                "dry-run" => tally.dry_run += 1,
                "skipped" => tally.skipped += 1,
                _ => tally.failed += 1,
            }
        }
        tally
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub applied: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn only_failures_enter_the_failure_set() {
        let scope = Scope::DeviceGroup("DG1".into());
        let mut ledger = RunLedger::default();
        ledger.record(&scope, Action::Create, ObjectKind::Tag, "TagC", Outcome::Applied);
        ledger.record(
            &scope,
            Action::Create,
            ObjectKind::Address,
            "web1",
            Outcome::Skipped(Rejection::Reference(ReferenceError::AlreadyExists {
                kind: ObjectKind::Address,
                name: "web1".into(),
            })),
        );
        ledger.record(
            &scope,
            Action::Delete,
            ObjectKind::Address,
            "ghost",
            Outcome::Failed("not found".into()),
        );

        assert_eq!(ledger.failures().iter().collect::<Vec<_>>(), vec!["ghost"]);
        assert_eq!(
            ledger.tally(),
            Tally {
                applied: 1,
                dry_run: 0,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(
            ledger.entries()[1].reason.as_deref(),
            Some("AddressObject 'web1' already exists")
        );
    }

    #[test]
    fn entries_serialize_with_kebab_case_kinds() {
        let mut ledger = RunLedger::default();
        ledger.record(
            &Scope::Vsys("vsys1".into()),
            Action::AddToGroup,
            ObjectKind::AddressGroup,
            "grp-hosts",
            Outcome::DryRun,
        );
        let json = serde_json::to_value(&ledger.entries()[0]).expect("json");
        assert_eq!(json["kind"], "address-group");
        assert_eq!(json["action"], "addtogroup");
        assert_eq!(json["outcome"], "dry-run");
        assert!(json.get("reason").is_none());
    }
}
