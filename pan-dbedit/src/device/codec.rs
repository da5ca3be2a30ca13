//! Conversion between records and PAN-OS `<entry>` elements, driven by the
//! field schema.

use panos_xml::{XmlNode, ENTRY_TAG};

use crate::field::{FieldError, FieldMap, FieldValue};
use crate::kind::ObjectKind;
use crate::objects::ConfigObject;
use crate::schema::{self, FieldSpec, FieldType};

/// Render a record as a complete `<entry name=..>` element.
pub fn encode(object: &ConfigObject) -> XmlNode {
    encode_fields(object.kind(), object.name(), &object.to_fields())
}

pub fn encode_fields(kind: ObjectKind, name: &str, fields: &FieldMap) -> XmlNode {
    let mut entry = XmlNode::entry(name);
    let specs = schema::fields(kind);
    let (choices, others): (Vec<&FieldSpec>, Vec<&FieldSpec>) = specs
        .iter()
        .partition(|spec| matches!(spec.ty, FieldType::Choice(_)));

    for spec in choices.into_iter().chain(others) {
        let Some(value) = fields.get(spec.field) else {
            continue;
        };
        let Some(path) = resolve(kind, spec.xml, fields) else {
            continue;
        };
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        write_value(&mut entry, &segments, spec.ty, value);
    }
    entry
}

fn write_value(entry: &mut XmlNode, segments: &[&str], ty: FieldType, value: &FieldValue) {
    match ty {
        FieldType::Choice(choices) => {
            let chosen = cell_text(value);
            if choices.contains(&chosen.as_str()) {
                entry.ensure_path(segments).ensure_path(&[chosen.as_str()]);
            }
        }
        FieldType::List => {
            let values = cell_list(value);
            if !values.is_empty() {
                entry.ensure_path(segments).set_members(values);
            }
        }
        FieldType::Member => entry.ensure_path(segments).set_members([cell_text(value)]),
        FieldType::Entries => {
            let node = entry.ensure_path(segments);
            node.text = None;
            node.children = cell_list(value).into_iter().map(XmlNode::entry).collect();
        }
        FieldType::Bool => {
            let flag = match value {
                FieldValue::Bool(flag) => *flag,
                other => cell_text(other).eq_ignore_ascii_case("yes"),
            };
            set_text(entry.ensure_path(segments), if flag { "yes" } else { "no" });
        }
        FieldType::Text | FieldType::Int | FieldType::Filter => {
            set_text(entry.ensure_path(segments), cell_text(value));
        }
    }
}

fn set_text(node: &mut XmlNode, text: impl Into<String>) {
    node.children.clear();
    node.text = Some(text.into());
}

fn cell_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text.clone(),
        FieldValue::Int(number) => number.to_string(),
        FieldValue::Bool(true) => "yes".to_string(),
        FieldValue::Bool(false) => "no".to_string(),
        FieldValue::List(values) => values.first().cloned().unwrap_or_default(),
    }
}

fn cell_list(value: &FieldValue) -> Vec<String> {
    match value {
        FieldValue::List(values) => values.clone(),
        other => vec![cell_text(other)],
    }
}

/// Expand `{field}` placeholders. `None` when a referenced choice is unset or
/// names no element (e.g. a `none` next hop).
fn resolve(kind: ObjectKind, xml: &str, fields: &FieldMap) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    for segment in xml.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(referenced) => {
                let chosen = cell_text(fields.get(referenced)?);
                let FieldType::Choice(choices) = schema::field(kind, referenced)?.ty else {
                    return None;
                };
                if !choices.contains(&chosen.as_str()) {
                    return None;
                }
                segments.push(chosen);
            }
            None => segments.push(segment.to_string()),
        }
    }
    Some(segments)
}

/// Read every schema field present in `entry`.
pub fn decode_fields(kind: ObjectKind, entry: &XmlNode) -> FieldMap {
    let mut fields = FieldMap::new();
    let specs = schema::fields(kind);
    let (choices, others): (Vec<&FieldSpec>, Vec<&FieldSpec>) = specs
        .iter()
        .partition(|spec| matches!(spec.ty, FieldType::Choice(_)));

    for spec in choices.into_iter().chain(others) {
        let Some(path) = resolve(kind, spec.xml, &fields) else {
            continue;
        };
        let segments: Vec<&str> = path.iter().map(String::as_str).collect();
        let Some(node) = entry.descend(&segments) else {
            continue;
        };
        if let Some(value) = read_value(node, spec.ty) {
            fields.insert(spec.field.to_string(), value);
        }
    }
    fields
}

fn read_value(node: &XmlNode, ty: FieldType) -> Option<FieldValue> {
    let text = node.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
    match ty {
        FieldType::Choice(choices) => node
            .children
            .iter()
            .find(|child| choices.contains(&child.tag.as_str()))
            .map(|child| FieldValue::text(child.tag.clone())),
        FieldType::Text | FieldType::Filter => text.map(FieldValue::text),
        FieldType::Int => text.map(|t| match t.parse() {
            Ok(number) => FieldValue::Int(number),
            Err(_) => FieldValue::text(t),
        }),
        FieldType::Member => node
            .members()
            .into_iter()
            .next()
            .or_else(|| text.map(str::to_string))
            .map(FieldValue::Text),
        FieldType::List => {
            let members = node.members();
            if !members.is_empty() {
                Some(FieldValue::List(members))
            } else {
                text.map(|t| FieldValue::List(vec![t.to_string()]))
            }
        }
        FieldType::Bool => match text {
            Some("yes") => Some(FieldValue::Bool(true)),
            Some("no") => Some(FieldValue::Bool(false)),
            _ => None,
        },
        FieldType::Entries => {
            let names = node.entry_names();
            (!names.is_empty()).then_some(FieldValue::List(names))
        }
    }
}

pub fn decode(kind: ObjectKind, entry: &XmlNode) -> Result<ConfigObject, FieldError> {
    let name = entry.name().unwrap_or_default();
    ConfigObject::from_fields(kind, name, &decode_fields(kind, entry))
}

/// Merge `object` into an existing entry: fields the record carries win, the
/// live values of everything else are kept, and elements the schema does not
/// describe are carried over untouched.
pub fn merge(existing: &XmlNode, object: &ConfigObject) -> XmlNode {
    let kind = object.kind();
    let merged = decode(kind, existing)
        .and_then(|live| live.patched(&object.to_fields()))
        .unwrap_or_else(|_| object.clone());
    let mut entry = encode(&merged);

    let known = schema::top_level_tags(kind);
    entry.children.extend(
        existing
            .children
            .iter()
            .filter(|child| child.tag != ENTRY_TAG && !known.contains(&child.tag.as_str()))
            .cloned(),
    );
    entry
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::objects::{
        AddressGroup, AddressObject, AddressType, GroupMembers, NexthopType, Protocol,
        ServiceObject, StaticRoute,
    };

    fn web1() -> AddressObject {
        AddressObject {
            name: "web1".into(),
            address_type: AddressType::IpNetmask,
            value: "10.0.0.1/32".into(),
            description: Some("web".into()),
            tag: vec!["TagA".into()],
        }
    }

    #[test]
    fn address_value_lives_under_its_type_element() {
        let entry = encode(&ConfigObject::Address(web1()));
        assert_eq!(entry.name(), Some("web1"));
        assert_eq!(entry.get_text(&["ip-netmask"]), Some("10.0.0.1/32"));
        assert_eq!(entry.descend(&["tag"]).map(XmlNode::members), Some(vec!["TagA".to_string()]));
        assert_eq!(decode(ObjectKind::Address, &entry).expect("decode"), ConfigObject::Address(web1()));
    }

    #[test]
    fn service_ports_follow_the_protocol_choice() {
        let service = ConfigObject::Service(ServiceObject {
            name: "dns-udp".into(),
            protocol: Protocol::Udp,
            source_port: None,
            destination_port: "53".into(),
            description: None,
            tag: Vec::new(),
        });
        let entry = encode(&service);
        assert_eq!(entry.get_text(&["protocol", "udp", "port"]), Some("53"));
        assert!(entry.descend(&["protocol", "tcp"]).is_none());
        assert_eq!(decode(ObjectKind::Service, &entry).expect("decode"), service);
    }

    #[test]
    fn discard_route_writes_an_empty_nexthop_choice() {
        let route = ConfigObject::StaticRoute(StaticRoute {
            name: "blackhole".into(),
            destination: "192.0.2.0/24".into(),
            nexthop_type: NexthopType::Discard,
            nexthop: None,
            interface: None,
            admin_dist: 10,
            metric: 10,
        });
        let entry = encode(&route);
        assert!(entry.descend(&["nexthop", "discard"]).is_some());
        assert_eq!(entry.get_text(&["admin-dist"]), Some("10"));
        assert_eq!(decode(ObjectKind::StaticRoute, &entry).expect("decode"), route);
    }

    #[test]
    fn route_without_nexthop_omits_the_element() {
        let route = ConfigObject::StaticRoute(StaticRoute {
            name: "local".into(),
            destination: "10.9.0.0/16".into(),
            nexthop_type: NexthopType::None,
            nexthop: None,
            interface: Some("ethernet1/2".into()),
            admin_dist: 20,
            metric: 5,
        });
        let entry = encode(&route);
        assert!(entry.get_child("nexthop").is_none());
        assert_eq!(decode(ObjectKind::StaticRoute, &entry).expect("decode"), route);
    }

    #[test]
    fn merge_keeps_live_fields_the_record_does_not_set() {
        let mut live = encode(&ConfigObject::Address(web1()));
        live.children.push(XmlNode::leaf("disable-override", "no"));

        let mut update = web1();
        update.description = None;
        update.value = "10.0.0.9/32".into();
        let merged = merge(&live, &ConfigObject::Address(update));

        assert_eq!(merged.get_text(&["ip-netmask"]), Some("10.0.0.9/32"));
        assert_eq!(merged.get_text(&["description"]), Some("web"));
        assert_eq!(merged.get_text(&["disable-override"]), Some("no"));
    }

    #[test]
    fn dynamic_group_filter_round_trips() {
        let group = ConfigObject::AddressGroup(AddressGroup {
            name: "tagged".into(),
            members: GroupMembers::Dynamic("'TagA' and 'TagB'".into()),
            description: None,
            tag: Vec::new(),
        });
        let entry = encode(&group);
        assert_eq!(entry.get_text(&["dynamic", "filter"]), Some("'TagA' and 'TagB'"));
        assert_eq!(decode(ObjectKind::AddressGroup, &entry).expect("decode"), group);
    }
}
