//! Object kinds, rulebases, actions and reference namespaces.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Tag,
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Application,
    ApplicationGroup,
    StaticRoute,
    SecurityRule,
    NatRule,
    DynamicIp,
}

impl ObjectKind {
    /// Record name used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            ObjectKind::Tag => "Tag",
            ObjectKind::Address => "AddressObject",
            ObjectKind::AddressGroup => "AddressGroup",
            ObjectKind::Service => "ServiceObject",
            ObjectKind::ServiceGroup => "ServiceGroup",
            ObjectKind::Application => "ApplicationObject",
            ObjectKind::ApplicationGroup => "ApplicationGroup",
            ObjectKind::StaticRoute => "StaticRoute",
            ObjectKind::SecurityRule => "SecurityRule",
            ObjectKind::NatRule => "NatRule",
            ObjectKind::DynamicIp => "Dip",
        }
    }

    /// Changeset `type` token for the kind in its plain rulebase.
    pub fn token(self) -> &'static str {
        match self {
            ObjectKind::Tag => "tag",
            ObjectKind::Address => "address",
            ObjectKind::AddressGroup => "address-group",
            ObjectKind::Service => "service",
            ObjectKind::ServiceGroup => "service-group",
            ObjectKind::Application => "application",
            ObjectKind::ApplicationGroup => "application-group",
            ObjectKind::StaticRoute => "route",
            ObjectKind::SecurityRule => "security-rule",
            ObjectKind::NatRule => "nat-rule",
            ObjectKind::DynamicIp => "dip",
        }
    }

    pub fn is_rule(self) -> bool {
        matches!(self, ObjectKind::SecurityRule | ObjectKind::NatRule)
    }

    pub fn is_group(self) -> bool {
        matches!(
            self,
            ObjectKind::AddressGroup | ObjectKind::ServiceGroup | ObjectKind::ApplicationGroup
        )
    }

    /// Group kind whose members are objects of this kind.
    pub fn containing_group(self) -> Option<ObjectKind> {
        match self {
            ObjectKind::Address => Some(ObjectKind::AddressGroup),
            ObjectKind::Service => Some(ObjectKind::ServiceGroup),
            ObjectKind::Application => Some(ObjectKind::ApplicationGroup),
            _ => None,
        }
    }

    /// Longest name the device accepts for this kind.
    pub fn max_name_len(self) -> usize {
        match self {
            ObjectKind::Tag
            | ObjectKind::Application
            | ObjectKind::ApplicationGroup
            | ObjectKind::StaticRoute
            | ObjectKind::SecurityRule
            | ObjectKind::NatRule => 31,
            _ => 63,
        }
    }

    /// Longest description the device accepts for this kind.
    pub fn max_description_len(self) -> usize {
        if self.is_rule() {
            1024
        } else {
            255
        }
    }

    /// Namespace that holds names of this kind.
    pub fn namespace(self, rulebase: Option<Rulebase>) -> Namespace {
        let rulebase = rulebase.unwrap_or(Rulebase::Local);
        match self {
            ObjectKind::Tag => Namespace::Tag,
            ObjectKind::Address => Namespace::Address,
            ObjectKind::AddressGroup => Namespace::AddressGroup,
            ObjectKind::Service => Namespace::Service,
            ObjectKind::ServiceGroup => Namespace::ServiceGroup,
            ObjectKind::Application => Namespace::Application,
            ObjectKind::ApplicationGroup => Namespace::ApplicationGroup,
            ObjectKind::StaticRoute => Namespace::StaticRoute,
            ObjectKind::SecurityRule => Namespace::SecurityRule(rulebase),
            ObjectKind::NatRule => Namespace::NatRule(rulebase),
            ObjectKind::DynamicIp => Namespace::DynamicIp,
        }
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which rule list inside a scope a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rulebase {
    /// The single rulebase of a virtual system.
    Local,
    Pre,
    Post,
}

impl Rulebase {
    pub const ALL: [Rulebase; 3] = [Rulebase::Local, Rulebase::Pre, Rulebase::Post];

    pub fn prefix(self) -> &'static str {
        match self {
            Rulebase::Local => "",
            Rulebase::Pre => "pre-",
            Rulebase::Post => "post-",
        }
    }
}

/// The `(kind, rulebase)` pair a changeset `type` token denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ChangeKey {
    pub kind: ObjectKind,
    pub rulebase: Option<Rulebase>,
}

impl ChangeKey {
    pub fn plain(kind: ObjectKind) -> Self {
        Self {
            kind,
            rulebase: None,
        }
    }

    pub fn rule(kind: ObjectKind, rulebase: Rulebase) -> Self {
        Self {
            kind,
            rulebase: Some(rulebase),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownToken(pub String);

impl Display for UnknownToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported token '{}'", self.0)
    }
}

impl std::error::Error for UnknownToken {}

impl FromStr for ChangeKey {
    type Err = UnknownToken;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let key = match token {
            "tag" => ChangeKey::plain(ObjectKind::Tag),
            "address" => ChangeKey::plain(ObjectKind::Address),
            "address-group" => ChangeKey::plain(ObjectKind::AddressGroup),
            "service" => ChangeKey::plain(ObjectKind::Service),
            "service-group" => ChangeKey::plain(ObjectKind::ServiceGroup),
            "application" => ChangeKey::plain(ObjectKind::Application),
            "application-group" => ChangeKey::plain(ObjectKind::ApplicationGroup),
            "route" => ChangeKey::plain(ObjectKind::StaticRoute),
            "dip" => ChangeKey::plain(ObjectKind::DynamicIp),
            "security-rule" => ChangeKey::rule(ObjectKind::SecurityRule, Rulebase::Local),
            "pre-security-rule" => ChangeKey::rule(ObjectKind::SecurityRule, Rulebase::Pre),
            "post-security-rule" => ChangeKey::rule(ObjectKind::SecurityRule, Rulebase::Post),
            "nat-rule" => ChangeKey::rule(ObjectKind::NatRule, Rulebase::Local),
            "pre-nat-rule" => ChangeKey::rule(ObjectKind::NatRule, Rulebase::Pre),
            "post-nat-rule" => ChangeKey::rule(ObjectKind::NatRule, Rulebase::Post),
            other => return Err(UnknownToken(other.to_string())),
        };
        Ok(key)
    }
}

impl Display for ChangeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.rulebase {
            Some(rulebase) => write!(f, "{}{}", rulebase.prefix(), self.kind.token()),
            None => f.write_str(self.kind.token()),
        }
    }
}

/// Changeset row action, in the order the applier runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Delete,
    Create,
    Edit,
    AddToGroup,
    RemoveFromGroup,
}

impl Action {
    /// Fixed cross-scope processing order.
    pub const ORDER: [Action; 5] = [
        Action::Delete,
        Action::Create,
        Action::Edit,
        Action::AddToGroup,
        Action::RemoveFromGroup,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Action::Delete => "delete",
            Action::Create => "create",
            Action::Edit => "edit",
            Action::AddToGroup => "addtogroup",
            Action::RemoveFromGroup => "removefromgroup",
        }
    }

    /// Verb written into the audit description of rows with this action.
    pub fn audit_verb(self) -> &'static str {
        match self {
            Action::Edit => "EDITED",
            Action::AddToGroup | Action::RemoveFromGroup => "MODIFIED",
            Action::Create | Action::Delete => "CREATED",
        }
    }
}

impl FromStr for Action {
    type Err = UnknownToken;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "" | "create" => Ok(Action::Create),
            "delete" => Ok(Action::Delete),
            "edit" => Ok(Action::Edit),
            "addtogroup" => Ok(Action::AddToGroup),
            "removefromgroup" => Ok(Action::RemoveFromGroup),
            other => Err(UnknownToken(other.to_string())),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A set of names that references can resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Namespace {
    Tag,
    Address,
    AddressGroup,
    Service,
    ServiceGroup,
    Application,
    ApplicationGroup,
    StaticRoute,
    SecurityRule(Rulebase),
    NatRule(Rulebase),
    DynamicIp,
    Zone,
    Interface,
}

impl Namespace {
    /// Namespaces that a higher scope contributes to the scopes below it.
    pub const SHARED_OBJECTS: [Namespace; 7] = [
        Namespace::Tag,
        Namespace::Address,
        Namespace::AddressGroup,
        Namespace::Service,
        Namespace::ServiceGroup,
        Namespace::Application,
        Namespace::ApplicationGroup,
    ];
}
