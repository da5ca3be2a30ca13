//! Offline device backed by a PAN-OS configuration file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use panos_xml::{parse_file, write_file, XmlNode, ENTRY_TAG};
use tracing::{debug, info};

use super::codec;
use super::layout::Layout;
use super::{DeviceClient, DeviceInfo};
use crate::error::{DeviceError, InfrastructureError};
use crate::kind::{Namespace, ObjectKind};
use crate::objects::{ConfigObject, DynamicIp};
use crate::predefined::Predefined;
use crate::scope::{Location, Platform, Scope};

/// Subtrees under `network/interface` whose entries are not interfaces.
const NON_INTERFACE_TAGS: &[&str] = &["ip", "ipv6", "arp", "ndp-proxy", "neighbor"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpChange {
    Register,
    Unregister,
}

/// A firewall or Panorama whose running configuration is an XML file.
///
/// Mutations go to an in-memory candidate. `commit` copies the candidate over
/// the running tree and persists it when an output path is set.
#[derive(Debug)]
pub struct XmlDevice {
    info: DeviceInfo,
    layout: Layout,
    running: XmlNode,
    candidate: XmlNode,
    output: Option<PathBuf>,
    predefined: Predefined,
    registered: BTreeMap<Scope, BTreeSet<String>>,
    pending: Option<Vec<(Scope, DynamicIp, IpChange)>>,
    config_lock: bool,
    commit_lock: bool,
}

impl XmlDevice {
    pub fn open(path: &Path, predefined: Predefined) -> Result<Self, InfrastructureError> {
        let root = parse_file(path).map_err(|source| InfrastructureError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
        let device = Self::from_tree(root, predefined);
        info!(
            path = %path.display(),
            hostname = %device.info.hostname,
            platform = %device.info.platform,
            "opened device configuration"
        );
        Ok(device)
    }

    pub fn from_tree(root: XmlNode, predefined: Predefined) -> Self {
        let device_entry = root
            .descend(&["devices"])
            .and_then(|devices| devices.entries().next());
        let device = device_entry
            .and_then(XmlNode::name)
            .unwrap_or("localhost.localdomain")
            .to_string();
        let platform = match device_entry.and_then(|entry| entry.get_child("device-group")) {
            Some(_) => Platform::Panorama,
            None => Platform::Firewall,
        };
        let hostname = device_entry
            .and_then(|entry| entry.get_text(&["deviceconfig", "system", "hostname"]))
            .unwrap_or(&device)
            .to_string();

        Self {
            info: DeviceInfo {
                hostname,
                platform,
                device: device.clone(),
            },
            layout: Layout::new(platform, device),
            candidate: root.clone(),
            running: root,
            output: None,
            predefined,
            registered: BTreeMap::new(),
            pending: None,
            config_lock: false,
            commit_lock: false,
        }
    }

    /// Persist the running configuration to `path` on every commit.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Write the uncommitted candidate configuration to `path`.
    pub fn save_candidate(&self, path: &Path) -> Result<(), DeviceError> {
        write_file(&self.candidate, path)?;
        info!(path = %path.display(), "candidate configuration saved");
        Ok(())
    }

    pub fn candidate(&self) -> &XmlNode {
        &self.candidate
    }

    pub fn running(&self) -> &XmlNode {
        &self.running
    }

    fn device_node(&self) -> Option<&XmlNode> {
        self.layout.device_root().select(&self.candidate)
    }

    fn entry_names_at(&self, location: &Location, kind: ObjectKind) -> BTreeSet<String> {
        match self.layout.container(location, kind) {
            Ok(path) => path
                .select(&self.candidate)
                .map(|node| node.entry_names().into_iter().collect())
                .unwrap_or_default(),
            Err(_) => BTreeSet::new(),
        }
    }

    fn zones(&self, scope: &Scope) -> BTreeSet<String> {
        match scope {
            Scope::Vsys(vsys) => self
                .device_node()
                .and_then(|device| device.descend(&["vsys"]))
                .and_then(|list| list.find_entry(vsys))
                .and_then(|entry| entry.get_child("zone"))
                .map(|zones| zones.entry_names().into_iter().collect())
                .unwrap_or_default(),
            _ => self
                .template_devices()
                .flat_map(|device| device.descend(&["vsys"]).into_iter())
                .flat_map(|vsys| vsys.entries())
                .filter_map(|entry| entry.get_child("zone"))
                .flat_map(|zones| zones.entry_names())
                .collect(),
        }
    }

    fn interfaces(&self, scope: &Scope) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        match scope {
            Scope::Vsys(vsys) => {
                if let Some(device) = self.device_node() {
                    if let Some(imported) = device
                        .descend(&["vsys"])
                        .and_then(|list| list.find_entry(vsys))
                        .and_then(|entry| entry.descend(&["import", "network", "interface"]))
                    {
                        names.extend(imported.members());
                    }
                    if let Some(interfaces) = device.descend(&["network", "interface"]) {
                        collect_interfaces(interfaces, &mut names);
                    }
                }
            }
            _ => {
                for device in self.template_devices() {
                    if let Some(interfaces) = device.descend(&["network", "interface"]) {
                        collect_interfaces(interfaces, &mut names);
                    }
                }
            }
        }
        names
    }

    /// Device entries inside every Panorama template.
    fn template_devices(&self) -> impl Iterator<Item = &XmlNode> {
        self.device_node()
            .and_then(|device| device.get_child("template"))
            .into_iter()
            .flat_map(|templates| templates.entries())
            .filter_map(|template| template.descend(&["config", "devices"]))
            .flat_map(|devices| devices.entries())
    }

    fn apply_ip_change(&mut self, scope: &Scope, dip: &DynamicIp, change: IpChange) {
        let registered = self.registered.entry(scope.clone()).or_default();
        for pair in dip.pairs() {
            match change {
                IpChange::Register => {
                    registered.insert(pair);
                }
                IpChange::Unregister => {
                    registered.remove(&pair);
                }
            }
        }
    }

    fn queue_ip_change(&mut self, scope: &Scope, dip: &DynamicIp, change: IpChange) {
        if let Some(queue) = self.pending.as_mut() {
            queue.push((scope.clone(), dip.clone(), change));
            return;
        }
        self.apply_ip_change(scope, dip, change);
    }
}

fn collect_interfaces(node: &XmlNode, names: &mut BTreeSet<String>) {
    for child in &node.children {
        if NON_INTERFACE_TAGS.contains(&child.tag.as_str()) {
            continue;
        }
        if child.tag == ENTRY_TAG {
            if let Some(name) = child.name() {
                names.insert(name.to_string());
            }
        }
        collect_interfaces(child, names);
    }
}

impl DeviceClient for XmlDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn scopes(&self) -> Vec<Scope> {
        let mut scopes = vec![Scope::Shared];
        let Some(device) = self.device_node() else {
            return scopes;
        };
        match self.info.platform {
            Platform::Panorama => scopes.extend(
                device
                    .descend(&["device-group"])
                    .map(XmlNode::entry_names)
                    .unwrap_or_default()
                    .into_iter()
                    .map(Scope::DeviceGroup),
            ),
            Platform::Firewall => {
                scopes.extend(
                    device
                        .descend(&["vsys"])
                        .map(XmlNode::entry_names)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Scope::Vsys),
                );
                scopes.extend(
                    device
                        .descend(&["network", "virtual-router"])
                        .map(XmlNode::entry_names)
                        .unwrap_or_default()
                        .into_iter()
                        .map(Scope::VirtualRouter),
                );
            }
        }
        scopes
    }

    fn names(&self, scope: &Scope, namespace: Namespace) -> Result<BTreeSet<String>, DeviceError> {
        let location = Location::new(scope.clone());
        let names = match namespace {
            Namespace::Zone => self.zones(scope),
            Namespace::Interface => self.interfaces(scope),
            Namespace::DynamicIp => self.registered.get(scope).cloned().unwrap_or_default(),
            Namespace::SecurityRule(rulebase) => self.entry_names_at(
                &Location::rules(scope.clone(), rulebase),
                ObjectKind::SecurityRule,
            ),
            Namespace::NatRule(rulebase) => self.entry_names_at(
                &Location::rules(scope.clone(), rulebase),
                ObjectKind::NatRule,
            ),
            Namespace::StaticRoute => self.entry_names_at(&location, ObjectKind::StaticRoute),
            Namespace::Tag => self.entry_names_at(&location, ObjectKind::Tag),
            Namespace::Address => self.entry_names_at(&location, ObjectKind::Address),
            Namespace::AddressGroup => self.entry_names_at(&location, ObjectKind::AddressGroup),
            Namespace::Service => self.entry_names_at(&location, ObjectKind::Service),
            Namespace::ServiceGroup => self.entry_names_at(&location, ObjectKind::ServiceGroup),
            Namespace::Application => self.entry_names_at(&location, ObjectKind::Application),
            Namespace::ApplicationGroup => {
                self.entry_names_at(&location, ObjectKind::ApplicationGroup)
            }
        };
        Ok(names)
    }

    fn predefined(&self, namespace: Namespace) -> BTreeSet<String> {
        self.predefined.names(namespace)
    }

    fn fetch(
        &self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<ConfigObject, DeviceError> {
        let entry = self
            .layout
            .container(location, kind)?
            .select(&self.candidate)
            .and_then(|container| container.find_entry(name))
            .ok_or_else(|| DeviceError::NotFound {
                location: location.to_string(),
                kind,
                name: name.to_string(),
            })?;
        Ok(codec::decode(kind, entry)?)
    }

    fn fetch_all(
        &self,
        location: &Location,
        kind: ObjectKind,
    ) -> Result<Vec<ConfigObject>, DeviceError> {
        let path = self.layout.container(location, kind)?;
        let Some(container) = path.select(&self.candidate) else {
            return Ok(Vec::new());
        };
        container
            .entries()
            .map(|entry| codec::decode(kind, entry).map_err(DeviceError::from))
            .collect()
    }

    fn create(&mut self, location: &Location, object: &ConfigObject) -> Result<(), DeviceError> {
        let container = self
            .layout
            .container(location, object.kind())?
            .ensure(&mut self.candidate)?;
        let entry = match container.find_entry(object.name()) {
            Some(existing) => codec::merge(existing, object),
            None => codec::encode(object),
        };
        container.upsert_entry(entry);
        debug!(%location, kind = %object.kind(), name = object.name(), "candidate merged");
        Ok(())
    }

    fn apply(&mut self, location: &Location, object: &ConfigObject) -> Result<(), DeviceError> {
        let container = self
            .layout
            .container(location, object.kind())?
            .ensure(&mut self.candidate)?;
        container.upsert_entry(codec::encode(object));
        debug!(%location, kind = %object.kind(), name = object.name(), "candidate replaced");
        Ok(())
    }

    fn delete(
        &mut self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<(), DeviceError> {
        let path = self.layout.container(location, kind)?;
        path.select_mut(&mut self.candidate)
            .and_then(|container| container.remove_entry(name))
            .map(|_| ())
            .ok_or_else(|| DeviceError::NotFound {
                location: location.to_string(),
                kind,
                name: name.to_string(),
            })
    }

    fn register_ip(&mut self, scope: &Scope, dip: &DynamicIp) -> Result<(), DeviceError> {
        self.queue_ip_change(scope, dip, IpChange::Register);
        Ok(())
    }

    fn unregister_ip(&mut self, scope: &Scope, dip: &DynamicIp) -> Result<(), DeviceError> {
        self.queue_ip_change(scope, dip, IpChange::Unregister);
        Ok(())
    }

    fn batch_start(&mut self) {
        self.pending.get_or_insert_with(Vec::new);
    }

    fn batch_end(&mut self) -> Result<(), DeviceError> {
        for (scope, dip, change) in self.pending.take().unwrap_or_default() {
            self.apply_ip_change(&scope, &dip, change);
        }
        Ok(())
    }

    fn acquire_config_lock(&mut self) -> Result<(), DeviceError> {
        if self.config_lock {
            return Err(DeviceError::Locked("config".to_string()));
        }
        self.config_lock = true;
        Ok(())
    }

    fn acquire_commit_lock(&mut self) -> Result<(), DeviceError> {
        if self.commit_lock {
            return Err(DeviceError::Locked("commit".to_string()));
        }
        self.commit_lock = true;
        Ok(())
    }

    fn release_config_lock(&mut self) -> Result<(), DeviceError> {
        self.config_lock = false;
        Ok(())
    }

    fn release_commit_lock(&mut self) -> Result<(), DeviceError> {
        self.commit_lock = false;
        Ok(())
    }

    fn commit(&mut self, sync: bool) -> Result<(), DeviceError> {
        debug!(sync, "committing candidate");
        self.running = self.candidate.clone();
        if let Some(path) = &self.output {
            write_file(&self.running, path)?;
            info!(path = %path.display(), "running configuration saved");
        }
        Ok(())
    }

    fn revert_candidate(&mut self) -> Result<(), DeviceError> {
        self.candidate = self.running.clone();
        self.pending = None;
        Ok(())
    }
}
