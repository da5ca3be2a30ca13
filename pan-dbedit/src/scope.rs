//! Configuration scopes and the locations inside them.

use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::kind::Rulebase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Firewall,
    Panorama,
}

impl Platform {
    /// Changeset location naming the shared scope on this platform.
    pub fn shared_label(self) -> &'static str {
        match self {
            Platform::Firewall => "shared",
            Platform::Panorama => "global",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Firewall => "firewall",
            Platform::Panorama => "panorama",
        })
    }
}

/// A container of configuration objects on the device.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "type", content = "name", rename_all = "kebab-case")]
pub enum Scope {
    Shared,
    DeviceGroup(String),
    Vsys(String),
    VirtualRouter(String),
}

impl Scope {
    /// Changeset location values that address this scope.
    pub fn matches_location(&self, location: &str) -> bool {
        match self {
            Scope::Shared => location == "global" || location == "shared",
            Scope::DeviceGroup(name) | Scope::Vsys(name) | Scope::VirtualRouter(name) => {
                location == name
            }
        }
    }

    /// Location value written for this scope on export.
    pub fn label(&self, platform: Platform) -> &str {
        match self {
            Scope::Shared => platform.shared_label(),
            Scope::DeviceGroup(name) | Scope::Vsys(name) | Scope::VirtualRouter(name) => name,
        }
    }

    /// Rulebases that hold rules in this scope.
    pub fn rulebases(&self, platform: Platform) -> &'static [Rulebase] {
        match (self, platform) {
            (Scope::DeviceGroup(_), _) | (Scope::Shared, Platform::Panorama) => {
                &[Rulebase::Pre, Rulebase::Post]
            }
            (Scope::Vsys(_), _) => &[Rulebase::Local],
            _ => &[],
        }
    }

    /// Scope whose shared objects are visible from here.
    pub fn parent(&self) -> Option<Scope> {
        match self {
            Scope::DeviceGroup(_) | Scope::Vsys(_) => Some(Scope::Shared),
            Scope::Shared | Scope::VirtualRouter(_) => None,
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Shared => f.write_str("shared"),
            Scope::DeviceGroup(name) => write!(f, "device-group {name}"),
            Scope::Vsys(name) => write!(f, "vsys {name}"),
            Scope::VirtualRouter(name) => write!(f, "virtual-router {name}"),
        }
    }
}

/// A scope plus, for rules, the rulebase inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub scope: Scope,
    pub rulebase: Option<Rulebase>,
}

impl Location {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            rulebase: None,
        }
    }

    pub fn rules(scope: Scope, rulebase: Rulebase) -> Self {
        Self {
            scope,
            rulebase: Some(rulebase),
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.rulebase {
            Some(Rulebase::Local) | None => write!(f, "{}", self.scope),
            Some(Rulebase::Pre) => write!(f, "{} (pre-rulebase)", self.scope),
            Some(Rulebase::Post) => write!(f, "{} (post-rulebase)", self.scope),
        }
    }
}
