//! The device seam: everything the engine needs from a firewall or Panorama.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::DeviceError;
use crate::kind::{Namespace, ObjectKind};
use crate::objects::{ConfigObject, DynamicIp};
use crate::scope::{Location, Platform, Scope};

pub mod codec;
pub mod layout;
mod xml_device;

pub use xml_device::XmlDevice;

/// Identity of the connected device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub hostname: String,
    pub platform: Platform,
    /// Name of the `devices/entry` the configuration lives under.
    pub device: String,
}

/// Operations the reconciliation engine performs against a device.
///
/// Object mutations target the candidate configuration. `create` merges the
/// given fields into any existing entry; `apply` replaces the entry whole.
pub trait DeviceClient {
    fn info(&self) -> &DeviceInfo;

    /// Every scope present on the device.
    fn scopes(&self) -> Vec<Scope>;

    /// Names currently configured in `namespace` at `scope`.
    fn names(&self, scope: &Scope, namespace: Namespace) -> Result<BTreeSet<String>, DeviceError>;

    /// Built-in names the device knows without configuration.
    fn predefined(&self, namespace: Namespace) -> BTreeSet<String>;

    fn fetch(
        &self,
        location: &Location,
        kind: ObjectKind,
        name: &str,
    ) -> Result<ConfigObject, DeviceError>;

    /// Every object of `kind` at `location`, in configuration order.
    fn fetch_all(&self, location: &Location, kind: ObjectKind)
        -> Result<Vec<ConfigObject>, DeviceError>;

    fn create(&mut self, location: &Location, object: &ConfigObject) -> Result<(), DeviceError>;

    fn apply(&mut self, location: &Location, object: &ConfigObject) -> Result<(), DeviceError>;

    fn delete(&mut self, location: &Location, kind: ObjectKind, name: &str)
        -> Result<(), DeviceError>;

    fn register_ip(&mut self, scope: &Scope, dip: &DynamicIp) -> Result<(), DeviceError>;

    fn unregister_ip(&mut self, scope: &Scope, dip: &DynamicIp) -> Result<(), DeviceError>;

    /// Queue registrations until [`DeviceClient::batch_end`].
    fn batch_start(&mut self);

    fn batch_end(&mut self) -> Result<(), DeviceError>;

    fn acquire_config_lock(&mut self) -> Result<(), DeviceError>;

    fn acquire_commit_lock(&mut self) -> Result<(), DeviceError>;

    fn release_config_lock(&mut self) -> Result<(), DeviceError>;

    fn release_commit_lock(&mut self) -> Result<(), DeviceError>;

    fn commit(&mut self, sync: bool) -> Result<(), DeviceError>;

    /// Discard candidate changes back to the running configuration.
    fn revert_candidate(&mut self) -> Result<(), DeviceError>;
}
