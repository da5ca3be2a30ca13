//! Device locks and the end-of-run commit decision.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::device::DeviceClient;
use crate::error::{DeviceError, InfrastructureError, LockType};
use crate::ledger::RunState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    /// Mutations are only logged; no locks, no commit.
    pub test_mode: bool,
    pub use_locks: bool,
    pub commit: bool,
    pub release_attempts: u32,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            test_mode: false,
            use_locks: true,
            commit: false,
            release_attempts: 10,
        }
    }
}

/// How the run ended for the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishOutcome {
    TestMode,
    /// Failures and `--commit`: candidate reverted, locks released.
    Reverted,
    /// Failures without `--commit`: candidate and locks left for inspection.
    HeldForInspection,
    Committed,
    /// The commit itself failed; locks are kept.
    CommitFailed,
    /// Clean run without `--commit`.
    AwaitingCommit,
}

#[derive(Debug)]
pub struct LockCoordinator {
    policy: LockPolicy,
    held: bool,
}

impl LockCoordinator {
    pub fn new(policy: LockPolicy) -> Self {
        Self {
            policy,
            held: false,
        }
    }

    /// Whether this coordinator currently holds the device locks.
    pub fn holds_locks(&self) -> bool {
        self.held
    }

    fn locking(&self) -> bool {
        self.policy.use_locks && !self.policy.test_mode
    }

    /// Take the commit lock, then the config lock.
    pub fn acquire<D: DeviceClient>(&mut self, device: &mut D) -> Result<(), InfrastructureError> {
        if !self.locking() {
            return Ok(());
        }
        let hostname = device.info().hostname.clone();
        device
            .acquire_commit_lock()
            .map_err(|source| InfrastructureError::LockAcquire {
                lock: LockType::Commit,
                source,
            })?;
        info!(%hostname, "commit lock obtained");
        if let Err(source) = device.acquire_config_lock() {
            if let Err(err) = device.release_commit_lock() {
                warn!(%hostname, error = %err, "could not hand back commit lock");
            }
            return Err(InfrastructureError::LockAcquire {
                lock: LockType::Config,
                source,
            });
        }
        info!(%hostname, "config lock obtained");
        self.held = true;
        Ok(())
    }

    pub fn finish<D: DeviceClient>(
        &mut self,
        device: &mut D,
        failures: &BTreeSet<String>,
    ) -> Result<FinishOutcome, InfrastructureError> {
        let hostname = device.info().hostname.clone();
        if self.policy.test_mode {
            return Ok(FinishOutcome::TestMode);
        }

        if !failures.is_empty() {
            if self.policy.commit {
                error!(%hostname, "update failures exist, not committing configuration; reverting");
                RunState::Reverting.enter();
                match device.revert_candidate() {
                    Ok(()) => info!(%hostname, "candidate configuration cleared"),
                    Err(err) => error!(%hostname, error = %err, "cannot revert to running configuration"),
                }
                self.release(device)?;
                return Ok(FinishOutcome::Reverted);
            }
            if self.held {
                error!(%hostname, "update failures exist, not releasing locks; please investigate");
            } else {
                error!(%hostname, "update failures exist; please investigate");
            }
            return Ok(FinishOutcome::HeldForInspection);
        }

        if !self.policy.commit {
            info!(%hostname, "changes are in the candidate configuration awaiting commit");
            return Ok(FinishOutcome::AwaitingCommit);
        }

        RunState::Committing.enter();
        match device.commit(true) {
            Ok(()) => {
                info!(%hostname, "configuration committed");
                self.release(device)?;
                Ok(FinishOutcome::Committed)
            }
            Err(err) => {
                warn!(%hostname, error = %err, "commit failed, not releasing locks; please investigate");
                Ok(FinishOutcome::CommitFailed)
            }
        }
    }

    /// Release both locks, retrying each up to the configured attempt count.
    pub fn release<D: DeviceClient>(&mut self, device: &mut D) -> Result<(), InfrastructureError> {
        if !self.held {
            return Ok(());
        }
        let attempts = self.policy.release_attempts.max(1);
        let commit = retry(attempts, LockType::Commit, || device.release_commit_lock());
        let config = retry(attempts, LockType::Config, || device.release_config_lock());
        self.held = false;
        commit?;
        config?;
        Ok(())
    }
}

fn retry(
    attempts: u32,
    lock: LockType,
    mut release: impl FnMut() -> Result<(), DeviceError>,
) -> Result<(), InfrastructureError> {
    for attempt in 1..=attempts {
        info!(%lock, attempt, attempts, "relinquishing lock");
        match release() {
            Ok(()) => {
                info!(%lock, "lock released");
                return Ok(());
            }
            Err(err) => error!(%lock, attempt, error = %err, "cannot release lock"),
        }
    }
    error!(
        %lock,
        attempts,
        "failed to release lock; log in and run 'request {lock}-lock remove'"
    );
    Err(InfrastructureError::LockRelease { lock, attempts })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::DeviceInfo;
    use crate::kind::{Namespace, ObjectKind};
    use crate::objects::{ConfigObject, DynamicIp};
    use crate::scope::{Location, Platform, Scope};

    /// Records lock traffic; can be told to fail releases or the commit.
    struct Recorder {
        info: DeviceInfo,
        calls: Vec<&'static str>,
        failing_releases: u32,
        fail_commit: bool,
        fail_config_lock: bool,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                info: DeviceInfo {
                    hostname: "fw".into(),
                    platform: Platform::Firewall,
                    device: "localhost.localdomain".into(),
                },
                calls: Vec::new(),
                failing_releases: 0,
                fail_commit: false,
                fail_config_lock: false,
            }
        }

        fn release(&mut self, call: &'static str) -> Result<(), DeviceError> {
            self.calls.push(call);
            if self.failing_releases > 0 {
                self.failing_releases -= 1;
                return Err(DeviceError::Rejected {
                    name: call.into(),
                    reason: "busy".into(),
                });
            }
            Ok(())
        }
    }

    impl DeviceClient for Recorder {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }
        fn scopes(&self) -> Vec<Scope> {
            vec![Scope::Shared]
        }
        fn names(&self, _: &Scope, _: Namespace) -> Result<BTreeSet<String>, DeviceError> {
            Ok(BTreeSet::new())
        }
        fn predefined(&self, _: Namespace) -> BTreeSet<String> {
            BTreeSet::new()
        }
        fn fetch(&self, location: &Location, kind: ObjectKind, name: &str) -> Result<ConfigObject, DeviceError> {
            Err(DeviceError::NotFound {
                location: location.to_string(),
                kind,
                name: name.into(),
            })
        }
        fn fetch_all(&self, _: &Location, _: ObjectKind) -> Result<Vec<ConfigObject>, DeviceError> {
            Ok(Vec::new())
        }
        fn create(&mut self, _: &Location, _: &ConfigObject) -> Result<(), DeviceError> {
            Ok(())
        }
        fn apply(&mut self, _: &Location, _: &ConfigObject) -> Result<(), DeviceError> {
            Ok(())
        }
        fn delete(&mut self, _: &Location, _: ObjectKind, _: &str) -> Result<(), DeviceError> {
            Ok(())
        }
        fn register_ip(&mut self, _: &Scope, _: &DynamicIp) -> Result<(), DeviceError> {
            Ok(())
        }
        fn unregister_ip(&mut self, _: &Scope, _: &DynamicIp) -> Result<(), DeviceError> {
            Ok(())
        }
        fn batch_start(&mut self) {}
        fn batch_end(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }
        fn acquire_config_lock(&mut self) -> Result<(), DeviceError> {
            self.calls.push("take config");
            if self.fail_config_lock {
                return Err(DeviceError::Locked("config".into()));
            }
            Ok(())
        }
        fn acquire_commit_lock(&mut self) -> Result<(), DeviceError> {
            self.calls.push("take commit");
            Ok(())
        }
        fn release_config_lock(&mut self) -> Result<(), DeviceError> {
            self.release("release config")
        }
        fn release_commit_lock(&mut self) -> Result<(), DeviceError> {
            self.release("release commit")
        }
        fn commit(&mut self, _: bool) -> Result<(), DeviceError> {
            self.calls.push("commit");
            if self.fail_commit {
                return Err(DeviceError::Rejected {
                    name: "commit".into(),
                    reason: "validation error".into(),
                });
            }
            Ok(())
        }
        fn revert_candidate(&mut self) -> Result<(), DeviceError> {
            self.calls.push("revert");
            Ok(())
        }
    }

    fn committing() -> LockPolicy {
        LockPolicy {
            commit: true,
            ..LockPolicy::default()
        }
    }

    fn failed() -> BTreeSet<String> {
        BTreeSet::from(["web1".to_string()])
    }

    #[test]
    fn clean_commit_releases_both_locks() {
        let mut device = Recorder::new();
        let mut locks = LockCoordinator::new(committing());
        locks.acquire(&mut device).expect("acquire");
        let outcome = locks.finish(&mut device, &BTreeSet::new()).expect("finish");

        assert_eq!(outcome, FinishOutcome::Committed);
        assert_eq!(
            device.calls,
            vec!["take commit", "take config", "commit", "release commit", "release config"]
        );
        assert!(!locks.holds_locks());
    }

    #[test]
    fn failures_with_commit_revert_instead() {
        let mut device = Recorder::new();
        let mut locks = LockCoordinator::new(committing());
        locks.acquire(&mut device).expect("acquire");
        let outcome = locks.finish(&mut device, &failed()).expect("finish");

        assert_eq!(outcome, FinishOutcome::Reverted);
        assert!(!device.calls.contains(&"commit"));
        assert!(device.calls.contains(&"revert"));
        assert!(device.calls.contains(&"release config"));
    }

    #[test]
    fn failures_without_commit_keep_the_locks() {
        let mut device = Recorder::new();
        let mut locks = LockCoordinator::new(LockPolicy::default());
        locks.acquire(&mut device).expect("acquire");
        let outcome = locks.finish(&mut device, &failed()).expect("finish");

        assert_eq!(outcome, FinishOutcome::HeldForInspection);
        assert!(locks.holds_locks());
        assert_eq!(device.calls, vec!["take commit", "take config"]);
    }

    #[test]
    fn failed_commit_keeps_the_locks() {
        let mut device = Recorder::new();
        device.fail_commit = true;
        let mut locks = LockCoordinator::new(committing());
        locks.acquire(&mut device).expect("acquire");

        assert_eq!(
            locks.finish(&mut device, &BTreeSet::new()).expect("finish"),
            FinishOutcome::CommitFailed
        );
        assert!(locks.holds_locks());
    }

    #[test]
    fn test_mode_never_touches_locks() {
        let mut device = Recorder::new();
        let mut locks = LockCoordinator::new(LockPolicy {
            test_mode: true,
            ..committing()
        });
        locks.acquire(&mut device).expect("acquire");
        assert_eq!(
            locks.finish(&mut device, &failed()).expect("finish"),
            FinishOutcome::TestMode
        );
        assert!(device.calls.is_empty());
    }

    #[test]
    fn release_retries_then_gives_up() {
        let mut device = Recorder::new();
        device.failing_releases = 3;
        let mut locks = LockCoordinator::new(LockPolicy {
            release_attempts: 2,
            ..committing()
        });
        locks.acquire(&mut device).expect("acquire");

        let err = locks
            .finish(&mut device, &BTreeSet::new())
            .expect_err("commit lock never released");
        assert!(matches!(
            err,
            InfrastructureError::LockRelease {
                lock: LockType::Commit,
                attempts: 2
            }
        ));
    }

    #[test]
    fn config_lock_failure_hands_back_the_commit_lock() {
        let mut device = Recorder::new();
        device.fail_config_lock = true;
        let mut locks = LockCoordinator::new(LockPolicy::default());

        let err = locks.acquire(&mut device).expect_err("config lock held");
        assert!(matches!(
            err,
            InfrastructureError::LockAcquire {
                lock: LockType::Config,
                ..
            }
        ));
        assert_eq!(device.calls, vec!["take commit", "take config", "release commit"]);
        assert!(!locks.holds_locks());
    }
}
