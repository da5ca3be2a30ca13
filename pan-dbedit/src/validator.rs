//! Reference checks for creates against a [`ReferenceSnapshot`].

use crate::change::ChangeOperation;
use crate::error::ReferenceError;
use crate::kind::{Namespace, ObjectKind};
use crate::objects::{AddressGroup, ConfigObject, DynamicIp, GroupMembers};
use crate::resolver::ReferenceSnapshot;

const ANY: &str = "any";
const APPLICATION_DEFAULT: &str = "application-default";

const ADDRESSES: &[Namespace] = &[Namespace::Address, Namespace::AddressGroup];
const SERVICES: &[Namespace] = &[Namespace::Service, Namespace::ServiceGroup];
const APPLICATIONS: &[Namespace] = &[Namespace::Application, Namespace::ApplicationGroup];

/// Check that a create's name is free and everything it references exists.
///
/// Edits, deletes and group modifications pass through unchecked; they are
/// resolved against live state when they are applied.
pub fn validate_create(
    operation: &ChangeOperation,
    snapshot: &ReferenceSnapshot,
) -> Result<(), ReferenceError> {
    match operation {
        ChangeOperation::Create(object) => validate_object(object, snapshot),
        ChangeOperation::RegisterIp(dip) => validate_registration(dip, snapshot),
        _ => Ok(()),
    }
}

fn validate_object(object: &ConfigObject, snapshot: &ReferenceSnapshot) -> Result<(), ReferenceError> {
    let own = snapshot
        .target()
        .unwrap_or_else(|| object.kind().namespace(None));
    if snapshot.contains(own, object.name()) {
        return Err(ReferenceError::AlreadyExists {
            kind: object.kind(),
            name: object.name().to_string(),
        });
    }

    let refs = Refs { snapshot };
    match object {
        ConfigObject::Tag(_) | ConfigObject::Application(_) | ConfigObject::StaticRoute(_) => Ok(()),
        ConfigObject::Address(address) => refs.tags(&address.tag),
        ConfigObject::Service(service) => refs.tags(&service.tag),
        ConfigObject::AddressGroup(group) => {
            refs.tags(&group.tag)?;
            match &group.members {
                GroupMembers::Static(members) => {
                    refs.all_of("static_value", members, ADDRESSES, &[])
                }
                GroupMembers::Dynamic(filter) => {
                    let clauses = AddressGroup::filter_clauses(filter);
                    refs.all_of("dynamic_value", &clauses, &[Namespace::Tag], &[])
                }
            }
        }
        ConfigObject::ServiceGroup(group) => {
            refs.tags(&group.tag)?;
            refs.non_empty("value", &group.members)?;
            refs.all_of("value", &group.members, &[Namespace::Service], &[])
        }
        ConfigObject::ApplicationGroup(group) => {
            refs.non_empty("value", &group.members)?;
            refs.all_of("value", &group.members, &[Namespace::Application], &[])
        }
        ConfigObject::SecurityRule(rule) => {
            refs.all_of("fromzone", &rule.fromzone, &[Namespace::Zone], &[ANY])?;
            refs.all_of("source", &rule.source, ADDRESSES, &[ANY])?;
            refs.all_of("tozone", &rule.tozone, &[Namespace::Zone], &[ANY])?;
            refs.all_of("destination", &rule.destination, ADDRESSES, &[ANY])?;
            refs.all_of("application", &rule.application, APPLICATIONS, &[ANY])?;
            refs.all_of("service", &rule.service, SERVICES, &[ANY, APPLICATION_DEFAULT])?;
            refs.tags(&rule.tag)
        }
        ConfigObject::NatRule(rule) => {
            refs.all_of("fromzone", &rule.fromzone, &[Namespace::Zone], &[ANY])?;
            refs.all_of("source", &rule.source, ADDRESSES, &[ANY])?;
            refs.all_of("tozone", &rule.tozone, &[Namespace::Zone], &[ANY])?;
            refs.all_of("destination", &rule.destination, ADDRESSES, &[ANY])?;
            refs.all_of("service", std::slice::from_ref(&rule.service), SERVICES, &[ANY])?;
            if let Some(interface) = &rule.to_interface {
                refs.all_of(
                    "to_interface",
                    std::slice::from_ref(interface),
                    &[Namespace::Interface],
                    &[ANY],
                )?;
            }
            refs.tags(&rule.tag)
        }
    }
}

/// A registration is a duplicate only when every ip-tag pair is already held.
fn validate_registration(dip: &DynamicIp, snapshot: &ReferenceSnapshot) -> Result<(), ReferenceError> {
    let mut pairs = dip.pairs().peekable();
    if pairs.peek().is_none() {
        return Ok(());
    }
    if pairs.all(|pair| snapshot.contains(Namespace::DynamicIp, &pair)) {
        return Err(ReferenceError::AlreadyExists {
            kind: ObjectKind::DynamicIp,
            name: dip.identity(),
        });
    }
    Ok(())
}

struct Refs<'s> {
    snapshot: &'s ReferenceSnapshot,
}

impl Refs<'_> {
    fn tags(&self, tags: &[String]) -> Result<(), ReferenceError> {
        self.all_of("tag", tags, &[Namespace::Tag], &[])
    }

    fn non_empty(&self, field: &'static str, values: &[String]) -> Result<(), ReferenceError> {
        if values.is_empty() {
            return Err(ReferenceError::Unresolved {
                field,
                value: "<empty>".to_string(),
            });
        }
        Ok(())
    }

    /// First value that is neither a keyword nor a name in `namespaces`.
    fn all_of(
        &self,
        field: &'static str,
        values: &[String],
        namespaces: &[Namespace],
        keywords: &[&str],
    ) -> Result<(), ReferenceError> {
        match values.iter().find(|value| {
            !keywords.contains(&value.as_str()) && !self.snapshot.contains_any(namespaces, value)
        }) {
            Some(missing) => Err(ReferenceError::Unresolved {
                field,
                value: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::kind::Rulebase;
    use crate::objects::{
        AddressObject, AddressType, ApplicationGroup, NatRule, ProfileSetting, RuleAction,
        RuleOptions, RuleType, SecurityRule, ServiceGroup, Tag,
    };
    use crate::resolver::ReferenceResolver;

    fn dg1() -> ReferenceSnapshot {
        ReferenceSnapshot::from_names([
            (Namespace::Tag, vec!["TagA", "TagB"]),
            (Namespace::Address, vec!["web1", "web2"]),
            (Namespace::AddressGroup, vec!["grpA"]),
            (Namespace::Service, vec!["tcp-8080", "service-https"]),
            (Namespace::ServiceGroup, vec!["web-svcs"]),
            (Namespace::Application, vec!["ping", "ssl", "web-browsing"]),
            (Namespace::ApplicationGroup, vec!["apps-basic"]),
            (Namespace::Zone, vec!["trust", "untrust"]),
            (Namespace::Interface, vec!["ethernet1/1"]),
        ])
    }

    fn host(name: &str, tags: &[&str]) -> ConfigObject {
        ConfigObject::Address(AddressObject {
            name: name.into(),
            address_type: AddressType::IpNetmask,
            value: "10.0.0.5/32".into(),
            description: None,
            tag: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    fn dynamic_group(filter: &str) -> ConfigObject {
        ConfigObject::AddressGroup(AddressGroup {
            name: "tagged".into(),
            members: GroupMembers::Dynamic(filter.into()),
            description: None,
            tag: Vec::new(),
        })
    }

    fn rule(fromzone: &str) -> ConfigObject {
        ConfigObject::SecurityRule(SecurityRule {
            name: "r1".into(),
            fromzone: vec![fromzone.into()],
            tozone: vec!["untrust".into()],
            source: vec!["any".into()],
            destination: vec!["grpA".into()],
            application: vec!["web-browsing".into()],
            service: vec!["application-default".into()],
            action: RuleAction::Allow,
            rule_type: RuleType::Universal,
            source_user: vec!["any".into()],
            category: vec!["any".into()],
            hip_profiles: vec!["any".into()],
            description: None,
            tag: Vec::new(),
            target: Vec::new(),
            negate_target: false,
            options: RuleOptions::default(),
            log_setting: None,
            schedule: None,
            profiles: ProfileSetting::default(),
        })
    }

    fn check(object: ConfigObject) -> Result<(), ReferenceError> {
        validate_create(&ChangeOperation::Create(object), &dg1())
    }

    #[test]
    fn new_host_with_known_tag_is_admitted() {
        assert_eq!(check(host("host1", &["TagA"])), Ok(()));
    }

    #[test]
    fn existing_name_is_rejected() {
        assert_eq!(
            check(host("web1", &[])),
            Err(ReferenceError::AlreadyExists {
                kind: ObjectKind::Address,
                name: "web1".into()
            })
        );
    }

    #[test]
    fn unknown_tag_is_reported_by_field() {
        assert_eq!(
            check(host("host1", &["TagZ"])),
            Err(ReferenceError::Unresolved {
                field: "tag",
                value: "TagZ".into()
            })
        );
    }

    #[test]
    fn dynamic_filter_needs_every_tag() {
        assert_eq!(check(dynamic_group("'TagA' and 'TagB'")), Ok(()));
        assert_eq!(
            check(dynamic_group("'TagA' and 'TagC'")),
            Err(ReferenceError::Unresolved {
                field: "dynamic_value",
                value: "TagC".into()
            })
        );
    }

    #[test]
    fn rule_zones_accept_any_but_not_unknown_names() {
        assert_eq!(check(rule("any")), Ok(()));
        assert_eq!(check(rule("trust")), Ok(()));
        assert_eq!(
            check(rule("dmz")),
            Err(ReferenceError::Unresolved {
                field: "fromzone",
                value: "dmz".into()
            })
        );
    }

    #[test]
    fn rule_name_is_checked_within_its_rulebase() {
        let mut resolver = ReferenceResolver::from_snapshot(ReferenceSnapshot::from_names([(
            Namespace::SecurityRule(Rulebase::Pre),
            vec!["r1"],
        )]));
        resolver.admit(Namespace::Zone, "trust");
        resolver.admit(Namespace::Zone, "untrust");
        resolver.admit(Namespace::AddressGroup, "grpA");
        resolver.admit(Namespace::Application, "web-browsing");

        let op = ChangeOperation::Create(rule("trust"));
        let post = resolver.snapshot_for(Namespace::SecurityRule(Rulebase::Post));
        assert_eq!(validate_create(&op, &post), Ok(()));
        let pre = resolver.snapshot_for(Namespace::SecurityRule(Rulebase::Pre));
        assert!(matches!(
            validate_create(&op, &pre),
            Err(ReferenceError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn nat_checks_service_before_interface() {
        let nat = ConfigObject::NatRule(NatRule {
            name: "snat".into(),
            fromzone: vec!["trust".into()],
            tozone: vec!["untrust".into()],
            source: vec!["any".into()],
            destination: vec!["any".into()],
            service: "svc-missing".into(),
            to_interface: Some("ethernet9/9".into()),
            nat_type: None,
            description: None,
            disabled: false,
            tag: Vec::new(),
            target: Vec::new(),
            negate_target: false,
            ha_binding: None,
            source_translation: None,
            destination_translation: None,
        });
        assert_eq!(
            check(nat),
            Err(ReferenceError::Unresolved {
                field: "service",
                value: "svc-missing".into()
            })
        );
    }

    #[test]
    fn empty_groups_are_rejected() {
        let group = ConfigObject::ServiceGroup(ServiceGroup {
            name: "empty".into(),
            members: Vec::new(),
            tag: Vec::new(),
        });
        assert_eq!(
            check(group),
            Err(ReferenceError::Unresolved {
                field: "value",
                value: "<empty>".into()
            })
        );
        let apps = ConfigObject::ApplicationGroup(ApplicationGroup {
            name: "apps".into(),
            members: vec!["ping".into(), "ssl".into()],
            tag: Vec::new(),
        });
        assert_eq!(check(apps), Ok(()));
    }

    #[test]
    fn group_members_must_be_plain_objects_of_the_group_kind() {
        let nested_services = ConfigObject::ServiceGroup(ServiceGroup {
            name: "all-svcs".into(),
            members: vec!["tcp-8080".into(), "web-svcs".into()],
            tag: Vec::new(),
        });
        assert_eq!(
            check(nested_services),
            Err(ReferenceError::Unresolved {
                field: "value",
                value: "web-svcs".into()
            })
        );
        let nested_apps = ConfigObject::ApplicationGroup(ApplicationGroup {
            name: "all-apps".into(),
            members: vec!["apps-basic".into()],
            tag: Vec::new(),
        });
        assert_eq!(
            check(nested_apps),
            Err(ReferenceError::Unresolved {
                field: "value",
                value: "apps-basic".into()
            })
        );
    }

    #[test]
    fn registration_is_a_duplicate_only_when_fully_held() {
        let snapshot = ReferenceSnapshot::from_names([(Namespace::DynamicIp, vec!["10.0.0.1-bad"])]);
        let held = DynamicIp {
            ips: vec!["10.0.0.1".into()],
            tags: vec!["bad".into()],
        };
        let partly = DynamicIp {
            ips: vec!["10.0.0.1".into(), "10.0.0.2".into()],
            tags: vec!["bad".into()],
        };
        assert!(validate_create(&ChangeOperation::RegisterIp(held), &snapshot).is_err());
        assert_eq!(validate_create(&ChangeOperation::RegisterIp(partly), &snapshot), Ok(()));
    }

    #[test]
    fn tags_pass_with_a_free_name() {
        let tag = ConfigObject::Tag(Tag {
            name: "TagC".into(),
            color: None,
            comments: None,
        });
        assert_eq!(check(tag), Ok(()));
    }
}
