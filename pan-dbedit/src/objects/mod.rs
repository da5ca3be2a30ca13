//! Typed configuration records, one per object kind.

/// Defines a closed set of PAN-OS keyword values with `FromStr`/`Display`.
macro_rules! keyword_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const TOKENS: &'static [&'static str] = &[$($token,)+];

            pub fn token(self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($token => Ok($name::$variant),)+
                    other => Err(format!(
                        "'{other}' is not one of {}",
                        Self::TOKENS.join(", ")
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.token())
            }
        }
    };
}
pub(crate) use keyword_enum;

mod address;
mod application;
mod dynamic_ip;
mod network;
mod policy;
mod service;

pub use address::{AddressGroup, AddressObject, AddressType, GroupMembers, Tag};
pub use application::{AppFlags, AppTimeouts, ApplicationGroup, ApplicationObject, DefaultIdent};
pub use dynamic_ip::DynamicIp;
pub use network::{NexthopType, StaticRoute, DEFAULT_ADMIN_DIST, DEFAULT_METRIC};
pub use policy::{
    DestinationTranslation, Fallback, NatRule, PortTranslation, ProfileSetting, RuleAction,
    RuleOptions, RuleType, SecurityRule, SourceTranslation,
};
pub use service::{Protocol, ServiceGroup, ServiceObject};

use crate::field::{FieldError, FieldMap, FieldReader};
use crate::kind::ObjectKind;

/// Conversion between a typed record and its [`FieldMap`] form.
pub trait Record: Sized {
    const KIND: ObjectKind;

    fn name(&self) -> &str;
    fn to_fields(&self) -> FieldMap;
    fn from_fields(name: &str, fields: &FieldReader<'_>) -> Result<Self, FieldError>;
}

/// Any configuration record the engine can push to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigObject {
    Tag(Tag),
    Address(AddressObject),
    AddressGroup(AddressGroup),
    Service(ServiceObject),
    ServiceGroup(ServiceGroup),
    Application(ApplicationObject),
    ApplicationGroup(ApplicationGroup),
    StaticRoute(StaticRoute),
    SecurityRule(SecurityRule),
    NatRule(NatRule),
}

macro_rules! each_record {
    ($value:expr, $record:ident => $body:expr) => {
        match $value {
            ConfigObject::Tag($record) => $body,
            ConfigObject::Address($record) => $body,
            ConfigObject::AddressGroup($record) => $body,
            ConfigObject::Service($record) => $body,
            ConfigObject::ServiceGroup($record) => $body,
            ConfigObject::Application($record) => $body,
            ConfigObject::ApplicationGroup($record) => $body,
            ConfigObject::StaticRoute($record) => $body,
            ConfigObject::SecurityRule($record) => $body,
            ConfigObject::NatRule($record) => $body,
        }
    };
}

impl ConfigObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ConfigObject::Tag(_) => ObjectKind::Tag,
            ConfigObject::Address(_) => ObjectKind::Address,
            ConfigObject::AddressGroup(_) => ObjectKind::AddressGroup,
            ConfigObject::Service(_) => ObjectKind::Service,
            ConfigObject::ServiceGroup(_) => ObjectKind::ServiceGroup,
            ConfigObject::Application(_) => ObjectKind::Application,
            ConfigObject::ApplicationGroup(_) => ObjectKind::ApplicationGroup,
            ConfigObject::StaticRoute(_) => ObjectKind::StaticRoute,
            ConfigObject::SecurityRule(_) => ObjectKind::SecurityRule,
            ConfigObject::NatRule(_) => ObjectKind::NatRule,
        }
    }

    pub fn name(&self) -> &str {
        each_record!(self, record => record.name())
    }

    pub fn to_fields(&self) -> FieldMap {
        each_record!(self, record => record.to_fields())
    }

    pub fn from_fields(kind: ObjectKind, name: &str, fields: &FieldMap) -> Result<Self, FieldError> {
        let reader = FieldReader::new(kind, fields);
        let object = match kind {
            ObjectKind::Tag => ConfigObject::Tag(Tag::from_fields(name, &reader)?),
            ObjectKind::Address => ConfigObject::Address(AddressObject::from_fields(name, &reader)?),
            ObjectKind::AddressGroup => {
                ConfigObject::AddressGroup(AddressGroup::from_fields(name, &reader)?)
            }
            ObjectKind::Service => ConfigObject::Service(ServiceObject::from_fields(name, &reader)?),
            ObjectKind::ServiceGroup => {
                ConfigObject::ServiceGroup(ServiceGroup::from_fields(name, &reader)?)
            }
            ObjectKind::Application => {
                ConfigObject::Application(ApplicationObject::from_fields(name, &reader)?)
            }
            ObjectKind::ApplicationGroup => {
                ConfigObject::ApplicationGroup(ApplicationGroup::from_fields(name, &reader)?)
            }
            ObjectKind::StaticRoute => {
                ConfigObject::StaticRoute(StaticRoute::from_fields(name, &reader)?)
            }
            ObjectKind::SecurityRule => {
                ConfigObject::SecurityRule(SecurityRule::from_fields(name, &reader)?)
            }
            ObjectKind::NatRule => ConfigObject::NatRule(NatRule::from_fields(name, &reader)?),
            ObjectKind::DynamicIp => {
                return Err(FieldError::BadValue {
                    kind,
                    field: "kind".to_string(),
                    value: "dynamic IPs are not configuration records".to_string(),
                })
            }
        };
        Ok(object)
    }

    /// Overlay a sparse patch onto this record.
    pub fn patched(&self, patch: &FieldMap) -> Result<Self, FieldError> {
        let mut fields = self.to_fields();
        fields.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self::from_fields(self.kind(), self.name(), &fields)
    }

    /// Current members of a static group; `None` for anything else.
    pub fn members(&self) -> Option<&[String]> {
        match self {
            ConfigObject::AddressGroup(group) => match &group.members {
                GroupMembers::Static(members) => Some(members),
                GroupMembers::Dynamic(_) => None,
            },
            ConfigObject::ServiceGroup(group) => Some(&group.members),
            ConfigObject::ApplicationGroup(group) => Some(&group.members),
            _ => None,
        }
    }

    pub fn members_mut(&mut self) -> Option<&mut Vec<String>> {
        match self {
            ConfigObject::AddressGroup(group) => match &mut group.members {
                GroupMembers::Static(members) => Some(members),
                GroupMembers::Dynamic(_) => None,
            },
            ConfigObject::ServiceGroup(group) => Some(&mut group.members),
            ConfigObject::ApplicationGroup(group) => Some(&mut group.members),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    #[test]
    fn patch_overrides_only_named_fields() {
        let address = ConfigObject::Address(AddressObject {
            name: "web1".into(),
            address_type: AddressType::IpNetmask,
            value: "10.0.0.1/32".into(),
            description: Some("old".into()),
            tag: vec!["TagA".into()],
        });
        let mut patch = FieldMap::new();
        patch.insert("description".into(), FieldValue::text("new"));

        let patched = address.patched(&patch).expect("patch");
        let ConfigObject::Address(patched) = patched else {
            panic!("kind changed");
        };
        assert_eq!(patched.description.as_deref(), Some("new"));
        assert_eq!(patched.value, "10.0.0.1/32");
        assert_eq!(patched.tag, vec!["TagA"]);
    }

    #[test]
    fn dynamic_groups_expose_no_members() {
        let group = ConfigObject::AddressGroup(AddressGroup {
            name: "dyn".into(),
            members: GroupMembers::Dynamic("'TagA'".into()),
            description: None,
            tag: Vec::new(),
        });
        assert!(group.members().is_none());
    }
}
