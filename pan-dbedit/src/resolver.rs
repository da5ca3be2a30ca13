//! Name availability for one scope pass.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::kind::Namespace;
use crate::scope::Scope;

/// Names that references can resolve against, frozen for one check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    names: BTreeMap<Namespace, BTreeSet<String>>,
    target: Option<Namespace>,
}

impl ReferenceSnapshot {
    /// Namespace the snapshot was taken for, when it was taken for a create.
    pub fn target(&self) -> Option<Namespace> {
        self.target
    }

    pub fn contains(&self, namespace: Namespace, name: &str) -> bool {
        self.names
            .get(&namespace)
            .is_some_and(|names| names.contains(name))
    }

    /// True when `name` resolves in any of `namespaces`.
    pub fn contains_any(&self, namespaces: &[Namespace], name: &str) -> bool {
        namespaces.iter().any(|ns| self.contains(*ns, name))
    }

    pub fn names(&self, namespace: Namespace) -> impl Iterator<Item = &str> {
        self.names
            .get(&namespace)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Build a snapshot directly from name lists.
    pub fn from_names<I, S>(entries: impl IntoIterator<Item = (Namespace, I)>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: BTreeMap<Namespace, BTreeSet<String>> = BTreeMap::new();
        for (namespace, values) in entries {
            names
                .entry(namespace)
                .or_default()
                .extend(values.into_iter().map(Into::into));
        }
        Self {
            names,
            target: None,
        }
    }
}

/// Live plus predefined plus higher-scope names for a scope, with the names
/// admitted so far in the current create pass layered on top.
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    base: ReferenceSnapshot,
    admitted: BTreeMap<Namespace, BTreeSet<String>>,
}

impl ReferenceResolver {
    pub fn for_pass<D: DeviceClient>(device: &D, scope: &Scope) -> Result<Self, DeviceError> {
        let platform = device.info().platform;
        let mut namespaces: Vec<Namespace> = Namespace::SHARED_OBJECTS.to_vec();
        namespaces.push(Namespace::StaticRoute);
        for rulebase in scope.rulebases(platform) {
            namespaces.push(Namespace::SecurityRule(*rulebase));
            namespaces.push(Namespace::NatRule(*rulebase));
        }
        namespaces.extend([Namespace::DynamicIp, Namespace::Zone, Namespace::Interface]);

        let mut names: BTreeMap<Namespace, BTreeSet<String>> = BTreeMap::new();
        for namespace in namespaces {
            let mut found = device.names(scope, namespace)?;
            found.extend(device.predefined(namespace));
            names.insert(namespace, found);
        }
        if let Some(parent) = scope.parent() {
            for namespace in Namespace::SHARED_OBJECTS {
                let inherited = device.names(&parent, namespace)?;
                names.entry(namespace).or_default().extend(inherited);
            }
        }
        debug!(
            %scope,
            namespaces = names.len(),
            total = names.values().map(BTreeSet::len).sum::<usize>(),
            "reference names loaded"
        );
        Ok(Self::from_snapshot(ReferenceSnapshot {
            names,
            target: None,
        }))
    }

    pub fn from_snapshot(base: ReferenceSnapshot) -> Self {
        Self {
            base,
            admitted: BTreeMap::new(),
        }
    }

    /// Record a name the current pass has just created.
    pub fn admit(&mut self, namespace: Namespace, name: impl Into<String>) {
        self.admitted.entry(namespace).or_default().insert(name.into());
    }

    /// Names visible to a create of `target`: everything live, plus names
    /// admitted in this pass for every other namespace.
    pub fn snapshot_for(&self, target: Namespace) -> ReferenceSnapshot {
        let mut snapshot = self.base.clone();
        snapshot.target = Some(target);
        for (namespace, admitted) in &self.admitted {
            if *namespace == target {
                continue;
            }
            snapshot
                .names
                .entry(*namespace)
                .or_default()
                .extend(admitted.iter().cloned());
        }
        snapshot
    }

    pub fn base(&self) -> &ReferenceSnapshot {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Rulebase;
    use crate::testing;

    #[test]
    fn device_group_sees_shared_and_predefined_names() {
        let device = testing::panorama();
        let resolver =
            ReferenceResolver::for_pass(&device, &Scope::DeviceGroup("DG1".into())).expect("names");
        let base = resolver.base();
        assert!(base.contains(Namespace::Address, "web1"));
        assert!(base.contains(Namespace::Address, "shared-dns"));
        assert!(base.contains(Namespace::Application, "ping"));
        assert!(base.contains(Namespace::Application, "office365-consumer-access"));
        assert!(base.contains(Namespace::Service, "service-https"));
        assert!(base.contains(Namespace::SecurityRule(Rulebase::Pre), "allow-web"));
        assert!(base.contains(Namespace::Zone, "trust"));
        assert!(base.contains(Namespace::Interface, "ethernet1/2"));
        assert!(!base.contains(Namespace::Address, "db1"));
    }

    #[test]
    fn admitted_names_skip_their_own_namespace() {
        let mut resolver = ReferenceResolver::from_snapshot(ReferenceSnapshot::default());
        resolver.admit(Namespace::Tag, "TagC");
        resolver.admit(Namespace::Address, "host1");

        let for_addresses = resolver.snapshot_for(Namespace::Address);
        assert!(for_addresses.contains(Namespace::Tag, "TagC"));
        assert!(!for_addresses.contains(Namespace::Address, "host1"));

        let for_groups = resolver.snapshot_for(Namespace::AddressGroup);
        assert!(for_groups.contains(Namespace::Address, "host1"));
    }

    #[test]
    fn vsys_zones_are_its_own() {
        let device = testing::firewall();
        let resolver =
            ReferenceResolver::for_pass(&device, &Scope::Vsys("vsys1".into())).expect("names");
        let zones: Vec<&str> = resolver.base().names(Namespace::Zone).collect();
        assert_eq!(zones, vec!["trust", "untrust"]);
        assert!(resolver.base().contains(Namespace::Address, "shared-ntp"));
    }
}
