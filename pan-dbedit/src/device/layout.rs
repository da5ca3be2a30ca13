//! Where each scope and object kind lives in a PAN-OS configuration document.

use panos_xml::ConfigPath;

use crate::error::DeviceError;
use crate::kind::{ObjectKind, Rulebase};
use crate::scope::{Location, Platform, Scope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    platform: Platform,
    device: String,
}

impl Layout {
    pub fn new(platform: Platform, device: impl Into<String>) -> Self {
        Self {
            platform,
            device: device.into(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// `/config/devices/entry[@name=<device>]`
    pub fn device_root(&self) -> ConfigPath {
        ConfigPath::root("config")
            .child("devices")
            .entry(self.device.clone())
    }

    pub fn shared_root(&self) -> ConfigPath {
        ConfigPath::root("config").child("shared")
    }

    /// Element that holds the objects of `scope`.
    pub fn scope_root(&self, scope: &Scope) -> Result<ConfigPath, DeviceError> {
        match (self.platform, scope) {
            (_, Scope::Shared) => Ok(self.shared_root()),
            (Platform::Panorama, Scope::DeviceGroup(name)) => Ok(self
                .device_root()
                .child("device-group")
                .entry(name.clone())),
            (Platform::Firewall, Scope::Vsys(name)) => {
                Ok(self.device_root().child("vsys").entry(name.clone()))
            }
            (Platform::Firewall, Scope::VirtualRouter(name)) => Ok(self
                .device_root()
                .join("network/virtual-router")
                .entry(name.clone())),
            (platform, scope) => Err(DeviceError::Unsupported(format!(
                "{scope} does not exist on a {platform}"
            ))),
        }
    }

    /// Element whose `<entry>` children are the objects of `kind` at `location`.
    pub fn container(&self, location: &Location, kind: ObjectKind) -> Result<ConfigPath, DeviceError> {
        let root = self.scope_root(&location.scope)?;
        let is_router = matches!(location.scope, Scope::VirtualRouter(_));
        match kind {
            ObjectKind::StaticRoute if is_router => Ok(root.join("routing-table/ip/static-route")),
            ObjectKind::SecurityRule | ObjectKind::NatRule if !is_router => {
                let rulebase = self.rulebase_element(location)?;
                let kind_tag = if kind == ObjectKind::SecurityRule {
                    "security"
                } else {
                    "nat"
                };
                Ok(root.child(rulebase).child(kind_tag).child("rules"))
            }
            ObjectKind::DynamicIp => Err(DeviceError::Unsupported(
                "registered IPs are not part of the configuration".to_string(),
            )),
            _ if !is_router => match object_tag(kind) {
                Some(tag) => Ok(root.child(tag)),
                None => Err(unsupported(kind, location)),
            },
            _ => Err(unsupported(kind, location)),
        }
    }

    fn rulebase_element(&self, location: &Location) -> Result<&'static str, DeviceError> {
        let rulebase = location.rulebase.unwrap_or(Rulebase::Local);
        match (self.platform, &location.scope) {
            (Platform::Firewall, Scope::Vsys(_)) if rulebase == Rulebase::Local => Ok("rulebase"),
            (Platform::Panorama, Scope::Shared | Scope::DeviceGroup(_)) => match rulebase {
                Rulebase::Pre | Rulebase::Local => Ok("pre-rulebase"),
                Rulebase::Post => Ok("post-rulebase"),
            },
            _ => Err(DeviceError::Unsupported(format!("no rulebase at {location}"))),
        }
    }
}

/// Element tag of a plain object container.
pub fn object_tag(kind: ObjectKind) -> Option<&'static str> {
    match kind {
        ObjectKind::Tag => Some("tag"),
        ObjectKind::Address => Some("address"),
        ObjectKind::AddressGroup => Some("address-group"),
        ObjectKind::Service => Some("service"),
        ObjectKind::ServiceGroup => Some("service-group"),
        ObjectKind::Application => Some("application"),
        ObjectKind::ApplicationGroup => Some("application-group"),
        _ => None,
    }
}

fn unsupported(kind: ObjectKind, location: &Location) -> DeviceError {
    DeviceError::Unsupported(format!("{kind} objects cannot live in {location}"))
}
