//! Ordered application of one scope's operations.
//!
//! Each scope runs the actions in [`Action::ORDER`]. Within an action the
//! kinds run in dependency order: creates go tags first and rules last,
//! deletes the other way round.

use tracing::{debug, info, warn};

use crate::builder::VENDOR;
use crate::change::{ChangeOperation, GroupAction};
use crate::changeset::Changeset;
use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::groups::{self, GroupEdit};
use crate::kind::{Action, ChangeKey, Namespace, ObjectKind, Rulebase};
use crate::ledger::{Outcome, Rejection, RunLedger, RunState};
use crate::resolver::{ReferenceResolver, ReferenceSnapshot};
use crate::scope::{Location, Platform, Scope};
use crate::tree::{ConfigTree, Push};
use crate::validator::validate_create;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Validate creates against the reference snapshot.
    pub checks: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self { checks: true }
    }
}

const CREATE_ORDER: [ObjectKind; 11] = [
    ObjectKind::Tag,
    ObjectKind::DynamicIp,
    ObjectKind::Address,
    ObjectKind::AddressGroup,
    ObjectKind::Service,
    ObjectKind::ServiceGroup,
    ObjectKind::Application,
    ObjectKind::ApplicationGroup,
    ObjectKind::StaticRoute,
    ObjectKind::SecurityRule,
    ObjectKind::NatRule,
];

/// One `(changeset key, destination)` step of a pass. `target` is `Err` with
/// the reason when the key's operations cannot apply to this scope.
#[derive(Debug, Clone)]
struct Step {
    key: ChangeKey,
    target: Result<Location, String>,
}

fn steps(scope: &Scope, platform: Platform, action: Action) -> Vec<Step> {
    let mut steps = Vec::new();
    for kind in CREATE_ORDER {
        if kind.is_rule() {
            // Pre before Local: both land in the pre-rulebase of a device group.
            for rulebase in [Rulebase::Pre, Rulebase::Local, Rulebase::Post] {
                steps.push(Step {
                    key: ChangeKey::rule(kind, rulebase),
                    target: rule_target(scope, platform, rulebase),
                });
            }
        } else {
            steps.push(Step {
                key: ChangeKey::plain(kind),
                target: object_target(scope, kind),
            });
        }
    }
    if action == Action::Delete {
        steps.reverse();
    }
    steps
}

fn object_target(scope: &Scope, kind: ObjectKind) -> Result<Location, String> {
    let fits = match (scope, kind) {
        (Scope::VirtualRouter(_), ObjectKind::StaticRoute) => true,
        (Scope::VirtualRouter(_), _) | (_, ObjectKind::StaticRoute) => false,
        (Scope::Vsys(_), ObjectKind::DynamicIp) => true,
        (_, ObjectKind::DynamicIp) => false,
        _ => true,
    };
    if fits {
        Ok(Location::new(scope.clone()))
    } else {
        Err(format!("{kind} operations do not apply to {scope}"))
    }
}

fn rule_target(scope: &Scope, platform: Platform, rulebase: Rulebase) -> Result<Location, String> {
    let available = scope.rulebases(platform);
    if available.is_empty() {
        return Err(format!("{scope} has no rulebase"));
    }
    let mapped = match rulebase {
        Rulebase::Local if !available.contains(&Rulebase::Local) => Rulebase::Pre,
        other => other,
    };
    if available.contains(&mapped) {
        Ok(Location::rules(scope.clone(), mapped))
    } else {
        Err(format!("{}rulebase rules do not apply to {scope}", rulebase.prefix()))
    }
}

/// Applies the changeset operations addressed to one scope.
pub struct ScopePass<'c> {
    changeset: &'c Changeset,
    scope: Scope,
    platform: Platform,
    options: ApplyOptions,
    labels: Vec<&'c str>,
}

impl<'c> ScopePass<'c> {
    pub fn new(changeset: &'c Changeset, scope: Scope, platform: Platform, options: ApplyOptions) -> Self {
        let labels = changeset
            .locations()
            .into_iter()
            .filter(|location| scope.matches_location(location))
            .collect();
        Self {
            changeset,
            scope,
            platform,
            options,
            labels,
        }
    }

    /// Whether the changeset addresses this scope at all.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn operations(&self, action: Action, key: ChangeKey) -> Vec<&'c ChangeOperation> {
        let mut operations = Vec::new();
        for label in &self.labels {
            for operation in self.changeset.operations(VENDOR, label, action, key) {
                if !operations.contains(&operation) {
                    operations.push(operation);
                }
            }
        }
        operations
    }

    pub fn run<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
    ) -> Result<(), DeviceError> {
        if self.is_empty() {
            debug!(scope = %self.scope, "no operations for scope");
            return Ok(());
        }
        info!(scope = %self.scope, "processing scope");
        for action in Action::ORDER {
            for step in steps(&self.scope, self.platform, action) {
                let operations = self.operations(action, step.key);
                if operations.is_empty() {
                    continue;
                }
                let location = match &step.target {
                    Ok(location) => location,
                    Err(reason) => {
                        warn!(scope = %self.scope, key = %step.key, "{reason}, skipping");
                        for operation in operations {
                            self.skip(ledger, operation, Rejection::NotApplicable(reason.clone()));
                        }
                        continue;
                    }
                };
                match action {
                    Action::Create => {}
                    Action::Delete => self.delete(tree, ledger, location, step.key.kind, &operations),
                    Action::Edit => self.edit(tree, ledger, location, &operations),
                    Action::AddToGroup | Action::RemoveFromGroup => {
                        self.modify(tree, ledger, location, &operations)
                    }
                }
            }
            if action == Action::Create {
                self.create(tree, ledger)?;
            }
        }
        Ok(())
    }

    fn skip(&self, ledger: &mut RunLedger, operation: &ChangeOperation, rejection: Rejection) {
        ledger.record(
            &self.scope,
            operation.action(),
            operation.kind(),
            &operation.name(),
            Outcome::Skipped(rejection),
        );
    }

    fn settle(
        &self,
        ledger: &mut RunLedger,
        action: Action,
        kind: ObjectKind,
        name: &str,
        result: Result<Push, DeviceError>,
    ) -> bool {
        let applied = result.is_ok();
        let outcome = match result {
            Ok(push) => push.into(),
            Err(err) => Outcome::Failed(err.to_string()),
        };
        ledger.record(&self.scope, action, kind, name, outcome);
        applied
    }

    fn create<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
    ) -> Result<(), DeviceError> {
        let steps = steps(&self.scope, self.platform, Action::Create);
        if steps
            .iter()
            .all(|step| step.target.is_err() || self.operations(Action::Create, step.key).is_empty())
        {
            return Ok(());
        }
        RunState::Validating(self.scope.clone()).enter();
        let mut resolver = ReferenceResolver::for_pass(tree.device(), &self.scope)?;
        if !self.options.checks {
            info!(scope = %self.scope, "checks disabled, creates are not validated");
        }

        for step in steps {
            let Ok(location) = step.target else {
                continue;
            };
            let operations = self.operations(Action::Create, step.key);
            if operations.is_empty() {
                continue;
            }
            let kind = step.key.kind;
            RunState::Applying(self.scope.clone(), kind).enter();
            let namespace = kind.namespace(location.rulebase);
            let snapshot = resolver.snapshot_for(namespace);

            let admitted = if kind == ObjectKind::DynamicIp {
                self.register(tree, ledger, &snapshot, &operations)
            } else {
                self.create_objects(tree, ledger, &location, &snapshot, &operations)
            };
            for operation in admitted {
                match operation {
                    ChangeOperation::RegisterIp(dip) => {
                        for pair in dip.pairs() {
                            resolver.admit(Namespace::DynamicIp, pair);
                        }
                    }
                    other => resolver.admit(namespace, other.name()),
                }
            }
        }
        Ok(())
    }

    fn create_objects<'o, D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        location: &Location,
        snapshot: &ReferenceSnapshot,
        operations: &[&'o ChangeOperation],
    ) -> Vec<&'o ChangeOperation> {
        let mut admitted = Vec::new();
        for operation in operations {
            let ChangeOperation::Create(object) = operation else {
                continue;
            };
            if self.options.checks {
                if let Err(err) = validate_create(operation, snapshot) {
                    self.skip(ledger, operation, Rejection::Reference(err));
                    continue;
                }
            }
            let result = tree.create(location, object.clone());
            if self.settle(ledger, Action::Create, object.kind(), object.name(), result) {
                admitted.push(*operation);
            }
        }
        admitted
    }

    /// Registrations go through one batch; a rejected batch fails them all.
    fn register<'o, D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        snapshot: &ReferenceSnapshot,
        operations: &[&'o ChangeOperation],
    ) -> Vec<&'o ChangeOperation> {
        let mut registered = Vec::new();
        let mut batch = tree.ip_batch(&self.scope);
        for operation in operations {
            let ChangeOperation::RegisterIp(dip) = operation else {
                continue;
            };
            if self.options.checks {
                if let Err(err) = validate_create(operation, snapshot) {
                    self.skip(ledger, operation, Rejection::Reference(err));
                    continue;
                }
            }
            let result = batch.register(dip);
            if self.settle(ledger, Action::Create, ObjectKind::DynamicIp, &dip.identity(), result) {
                registered.push(*operation);
            }
        }
        match batch.finish() {
            Ok(()) => registered,
            Err(err) => {
                for operation in registered {
                    ledger.record(
                        &self.scope,
                        Action::Create,
                        ObjectKind::DynamicIp,
                        &operation.name(),
                        Outcome::Failed(err.to_string()),
                    );
                }
                Vec::new()
            }
        }
    }

    fn delete<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        location: &Location,
        kind: ObjectKind,
        operations: &[&ChangeOperation],
    ) {
        RunState::Applying(self.scope.clone(), kind).enter();
        if kind == ObjectKind::DynamicIp {
            let mut unregistered = Vec::new();
            let mut batch = tree.ip_batch(&self.scope);
            for operation in operations {
                if let ChangeOperation::UnregisterIp(dip) = operation {
                    let result = batch.unregister(dip);
                    if self.settle(ledger, Action::Delete, kind, &dip.identity(), result) {
                        unregistered.push(dip.identity());
                    }
                }
            }
            if let Err(err) = batch.finish() {
                for name in unregistered {
                    ledger.record(&self.scope, Action::Delete, kind, &name, Outcome::Failed(err.to_string()));
                }
            }
            return;
        }

        for operation in operations {
            let ChangeOperation::Delete { name, .. } = operation else {
                continue;
            };
            if let Some(group_kind) = kind.containing_group() {
                self.detach(tree, ledger, location, group_kind, name);
            }
            let located = if kind.is_group() {
                groups::clear_members(tree, location, kind, name).map(|_| ())
            } else {
                tree.locate(location, kind, name).map(|_| ())
            };
            let result = located.and_then(|()| tree.delete(location, kind, name));
            self.settle(ledger, Action::Delete, kind, name, result);
        }
    }

    /// Remove `member` from every live group at `location` that holds it.
    fn detach<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        location: &Location,
        group_kind: ObjectKind,
        member: &str,
    ) {
        let groups = match tree.device().names(&location.scope, group_kind.namespace(None)) {
            Ok(groups) => groups,
            Err(err) => {
                warn!(%location, kind = %group_kind, error = %err, "cannot list groups");
                return;
            }
        };
        for group in groups {
            let holds = match tree.locate(location, group_kind, &group) {
                Ok(object) => object
                    .members()
                    .is_some_and(|members| members.iter().any(|m| m == member)),
                Err(err) => {
                    ledger.record(
                        &self.scope,
                        Action::RemoveFromGroup,
                        group_kind,
                        &group,
                        Outcome::Failed(err.to_string()),
                    );
                    continue;
                }
            };
            if !holds {
                continue;
            }
            info!(%location, group = %group, member, "removing member before delete");
            let result = groups::remove_members(tree, location, group_kind, &group, &[member.to_string()], None);
            self.settle_group(ledger, Action::RemoveFromGroup, group_kind, &group, result);
        }
    }

    fn edit<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        location: &Location,
        operations: &[&ChangeOperation],
    ) {
        for operation in operations {
            let ChangeOperation::Edit {
                name, kind, patch, ..
            } = operation
            else {
                continue;
            };
            RunState::Applying(self.scope.clone(), *kind).enter();
            let result = tree
                .locate(location, *kind, name)
                .and_then(|live| live.patched(patch).map_err(DeviceError::from))
                .and_then(|updated| tree.create(location, updated));
            self.settle(ledger, Action::Edit, *kind, name, result);
        }
    }

    fn modify<D: DeviceClient>(
        &self,
        tree: &mut ConfigTree<'_, D>,
        ledger: &mut RunLedger,
        location: &Location,
        operations: &[&ChangeOperation],
    ) {
        for operation in operations {
            let ChangeOperation::ModifyGroup {
                name,
                kind,
                members,
                action,
                description,
            } = operation
            else {
                continue;
            };
            RunState::Applying(self.scope.clone(), *kind).enter();
            let description = description.as_deref();
            let result = match action {
                GroupAction::Add => groups::add_members(tree, location, *kind, name, members, description),
                GroupAction::Remove => {
                    groups::remove_members(tree, location, *kind, name, members, description)
                }
            };
            self.settle_group(ledger, operation.action(), *kind, name, result);
        }
    }

    fn settle_group(
        &self,
        ledger: &mut RunLedger,
        action: Action,
        kind: ObjectKind,
        name: &str,
        result: Result<GroupEdit, DeviceError>,
    ) {
        let outcome = match result {
            Ok(GroupEdit { push: Some(push), .. }) => push.into(),
            Ok(GroupEdit { push: None, .. }) => Outcome::Skipped(Rejection::Unchanged),
            Err(err) => Outcome::Failed(err.to_string()),
        };
        ledger.record(&self.scope, action, kind, name, outcome);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::device::XmlDevice;
    use crate::objects::ConfigObject;
    use crate::row::Column;
    use crate::testing;

    fn run(device: &mut XmlDevice, scope: Scope, changeset: &Changeset, test_mode: bool) -> RunLedger {
        let platform = device.info().platform;
        let mut ledger = RunLedger::default();
        let mut tree = ConfigTree::new(device, test_mode);
        ScopePass::new(changeset, scope, platform, ApplyOptions::default())
            .run(&mut tree, &mut ledger)
            .expect("pass");
        ledger
    }

    fn dg1() -> Scope {
        Scope::DeviceGroup("DG1".into())
    }

    fn outcomes(ledger: &RunLedger) -> Vec<(String, &'static str)> {
        ledger
            .entries()
            .iter()
            .map(|entry| (entry.name.clone(), entry.outcome))
            .collect()
    }

    fn pair(name: &str, outcome: &'static str) -> (String, &'static str) {
        (name.to_string(), outcome)
    }

    #[test]
    fn host_is_created_in_the_device_group() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "address"),
            (Column::Location, "DG1"),
            (Column::Name, "host1"),
            (Column::Subtype, "ip-netmask"),
            (Column::Ip, "10.1.1.1"),
            (Column::Cidr, "32"),
        ]]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);

        assert_eq!(outcomes(&ledger), vec![pair("host1", "applied")]);
        let Ok(ConfigObject::Address(host)) =
            device.fetch(&Location::new(dg1()), ObjectKind::Address, "host1")
        else {
            panic!("host1 missing");
        };
        assert_eq!(host.value, "10.1.1.1/32");
        assert_eq!(host.description.as_deref(), Some("CREATED by API: 2024-03-01"));
    }

    #[test]
    fn existing_names_are_skipped_not_failed() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "address"),
            (Column::Location, "DG1"),
            (Column::Name, "web1"),
            (Column::Subtype, "ip-netmask"),
            (Column::Ip, "10.1.1.1"),
        ]]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);
        assert_eq!(outcomes(&ledger), vec![pair("web1", "skipped")]);
        assert!(!ledger.has_failures());
    }

    #[test]
    fn tags_created_earlier_in_the_pass_resolve() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "address"),
                (Column::Location, "DG1"),
                (Column::Name, "host2"),
                (Column::Subtype, "ip-netmask"),
                (Column::Ip, "10.1.1.2"),
                (Column::Tag, "TagNew"),
            ],
            &[
                (Column::Type, "tag"),
                (Column::Location, "DG1"),
                (Column::Name, "TagNew"),
            ],
        ]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);
        assert_eq!(
            outcomes(&ledger),
            vec![pair("TagNew", "applied"), pair("host2", "applied")]
        );
    }

    #[test]
    fn deleting_the_only_member_leaves_a_placeholder() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "address"),
            (Column::OpAction, "delete"),
            (Column::Location, "DG1"),
            (Column::Name, "web1"),
        ]]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);

        let here = Location::new(dg1());
        let grp_a = device
            .fetch(&here, ObjectKind::AddressGroup, "grpA")
            .expect("grpA");
        assert_eq!(grp_a.members(), Some(&["placeholder".to_string()][..]));
        let servers = device
            .fetch(&here, ObjectKind::AddressGroup, "web-servers")
            .expect("web-servers");
        assert_eq!(servers.members(), Some(&["web2".to_string()][..]));
        assert!(device.fetch(&here, ObjectKind::Address, "web1").is_err());
        assert_eq!(
            outcomes(&ledger),
            vec![
                pair("grpA", "applied"),
                pair("web-servers", "applied"),
                pair("web1", "applied"),
            ]
        );
    }

    #[test]
    fn groups_are_emptied_then_deleted() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "service-group"),
                (Column::OpAction, "delete"),
                (Column::Location, "DG1"),
                (Column::Name, "web-svcs"),
            ],
            &[
                (Column::Type, "service-group"),
                (Column::OpAction, "delete"),
                (Column::Location, "DG1"),
                (Column::Name, "no-such-group"),
            ],
        ]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);

        let here = Location::new(dg1());
        assert!(device.fetch(&here, ObjectKind::ServiceGroup, "web-svcs").is_err());
        assert!(device.fetch(&here, ObjectKind::Service, "tcp-8080").is_ok());
        assert!(device
            .fetch(&here, ObjectKind::Service, groups::SERVICE_PLACEHOLDER)
            .is_err());
        assert_eq!(
            outcomes(&ledger),
            vec![pair("web-svcs", "applied"), pair("no-such-group", "failed")]
        );
    }

    #[test]
    fn deleting_a_missing_object_is_a_failure() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "service"),
            (Column::OpAction, "delete"),
            (Column::Location, "DG1"),
            (Column::Name, "ghost"),
        ]]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);
        assert_eq!(ledger.failures().iter().collect::<Vec<_>>(), vec!["ghost"]);
    }

    #[test]
    fn rules_with_unknown_zones_are_rejected() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "security-rule"),
                (Column::Location, "DG1"),
                (Column::Name, "to-dmz"),
                (Column::RuleAction, "allow"),
                (Column::ToZone, "dmz"),
            ],
            &[
                (Column::Type, "security-rule"),
                (Column::Location, "DG1"),
                (Column::Name, "to-trust"),
                (Column::RuleAction, "allow"),
                (Column::FromZone, "any"),
                (Column::ToZone, "trust"),
                (Column::Destination, "web-servers"),
            ],
        ]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);
        assert_eq!(
            outcomes(&ledger),
            vec![pair("to-dmz", "skipped"), pair("to-trust", "applied")]
        );
        assert!(device
            .fetch(&Location::rules(dg1(), Rulebase::Pre), ObjectKind::SecurityRule, "to-trust")
            .is_ok());
    }

    #[test]
    fn vsys_skips_pre_and_post_rules() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "pre-security-rule"),
            (Column::Location, "vsys1"),
            (Column::Name, "early"),
            (Column::RuleAction, "deny"),
        ]]);
        let mut device = testing::firewall();
        let ledger = run(&mut device, Scope::Vsys("vsys1".into()), &changeset, false);
        assert_eq!(outcomes(&ledger), vec![pair("early", "skipped")]);
    }

    #[test]
    fn group_modifications_are_not_checked_against_known_names() {
        // Creates are validated against the pass snapshot; group edits only
        // re-read the live group, so an unknown member goes straight through.
        let changeset = testing::changeset(&[&[
            (Column::Type, "address-group"),
            (Column::OpAction, "addtogroup"),
            (Column::Location, "DG1"),
            (Column::Name, "grpA"),
            (Column::Members, "not-an-object"),
        ]]);
        let mut device = testing::panorama();
        let ledger = run(&mut device, dg1(), &changeset, false);
        assert_eq!(outcomes(&ledger), vec![pair("grpA", "applied")]);
    }

    #[test]
    fn edit_reads_objects_created_in_the_same_run() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "service"),
                (Column::Location, "DG1"),
                (Column::Name, "tcp-9000"),
                (Column::Protocol, "tcp"),
                (Column::DestinationPort, "9000"),
            ],
            &[
                (Column::Type, "service"),
                (Column::OpAction, "edit"),
                (Column::Location, "DG1"),
                (Column::Name, "tcp-9000"),
                (Column::DestinationPort, "9001"),
            ],
        ]);
        let mut device = testing::panorama();
        run(&mut device, dg1(), &changeset, false);
        let Ok(ConfigObject::Service(service)) =
            device.fetch(&Location::new(dg1()), ObjectKind::Service, "tcp-9000")
        else {
            panic!("service missing");
        };
        assert_eq!(service.destination_port, "9001");
    }

    #[test]
    fn test_mode_only_reads() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "tag"),
                (Column::Location, "DG1"),
                (Column::Name, "TagDry"),
            ],
            &[
                (Column::Type, "address"),
                (Column::OpAction, "delete"),
                (Column::Location, "DG1"),
                (Column::Name, "web2"),
            ],
        ]);
        let mut device = testing::panorama();
        let before = device.candidate().clone();
        let ledger = run(&mut device, dg1(), &changeset, true);
        assert_eq!(device.candidate(), &before);
        assert!(ledger.entries().iter().all(|entry| entry.outcome == "dry-run"));
    }

    #[test]
    fn dynamic_ips_register_in_vsys_only() {
        let changeset = testing::changeset(&[
            &[
                (Column::Type, "dip"),
                (Column::Location, "vsys1"),
                (Column::Members, "10.9.9.9"),
                (Column::Tag, "Prod"),
            ],
            &[
                (Column::Type, "dip"),
                (Column::Location, "shared"),
                (Column::Members, "10.9.9.8"),
                (Column::Tag, "Prod"),
            ],
        ]);
        let mut device = testing::firewall();
        let vsys = Scope::Vsys("vsys1".into());
        run(&mut device, vsys.clone(), &changeset, false);
        let shared = run(&mut device, Scope::Shared, &changeset, false);

        assert!(device
            .names(&vsys, Namespace::DynamicIp)
            .expect("names")
            .contains("10.9.9.9-Prod"));
        assert_eq!(outcomes(&shared), vec![pair("10.9.9.8-Prod", "skipped")]);
    }

    #[test]
    fn virtual_routers_take_routes_only() {
        let changeset = testing::changeset(&[&[
            (Column::Type, "route"),
            (Column::Location, "default"),
            (Column::Name, "to-lab"),
            (Column::Cidr, "10.30.0.0/16"),
            (Column::Subtype, "ip-address"),
            (Column::Nexthop, "10.0.0.254"),
        ]]);
        let mut device = testing::firewall();
        let router = Scope::VirtualRouter("default".into());
        let ledger = run(&mut device, router.clone(), &changeset, false);
        assert_eq!(outcomes(&ledger), vec![pair("to-lab", "applied")]);
        assert!(device
            .fetch(&Location::new(router), ObjectKind::StaticRoute, "to-lab")
            .is_ok());
    }
}
