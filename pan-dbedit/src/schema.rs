//! Per-kind field schema.
//!
//! Every record field is described once: the changeset column(s) that feed
//! it, where it lives inside a PAN-OS `<entry>`, and how its value is typed.
//! Edit patches, the XML codec and the CSV exporter all read this table.
//!
//! XML paths are relative to the entry and may contain `{field}`
//! placeholders. A placeholder is replaced by the value of another field
//! (always a [`FieldType::Choice`]), e.g. a service port lives under
//! `protocol/{protocol}/port`.

use crate::kind::ObjectKind;
use crate::row::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    /// Text stored as a single `<member>`.
    Member,
    List,
    /// `yes`/`no` element.
    Bool,
    Int,
    /// One of several child element tags under the path.
    Choice(&'static [&'static str]),
    /// Names of `<entry>` children under the path.
    Entries,
    /// Dynamic address-group filter built from a list of tags.
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: &'static str,
    /// Source columns in precedence order. The first one is used on export.
    pub columns: &'static [Column],
    pub xml: &'static str,
    pub ty: FieldType,
}

const fn spec(
    field: &'static str,
    columns: &'static [Column],
    xml: &'static str,
    ty: FieldType,
) -> FieldSpec {
    FieldSpec {
        field,
        columns,
        xml,
        ty,
    }
}

const ADDRESS_TYPES: &[&str] = &["ip-netmask", "ip-range", "fqdn"];
const PROTOCOLS: &[&str] = &["tcp", "udp"];
const DEFAULT_IDENTS: &[&str] = &[
    "port",
    "ident-by-ip-protocol",
    "ident-by-icmp-type",
    "ident-by-icmp6-type",
];
const NEXTHOP_TYPES: &[&str] = &["ip-address", "next-vr", "discard"];
const SOURCE_TRANSLATIONS: &[&str] = &["dynamic-ip-and-port", "dynamic-ip", "static-ip"];
const TRANSLATED_ADDRESS_TYPES: &[&str] = &["translated-address", "interface-address"];
const FALLBACK_IP_TYPES: &[&str] = &["ip", "floating-ip"];

const DESCRIPTION: FieldSpec = spec(
    "description",
    &[Column::Description],
    "description",
    FieldType::Text,
);
const TAG: FieldSpec = spec("tag", &[Column::Tag], "tag", FieldType::List);

static TAG_FIELDS: &[FieldSpec] = &[
    spec("color", &[Column::Color], "color", FieldType::Text),
    spec("comments", &[Column::Description], "comments", FieldType::Text),
];

static ADDRESS_FIELDS: &[FieldSpec] = &[
    spec("type", &[Column::Subtype], "", FieldType::Choice(ADDRESS_TYPES)),
    spec("value", &[Column::Cidr, Column::Value], "{type}", FieldType::Text),
    DESCRIPTION,
    TAG,
];

static ADDRESS_GROUP_FIELDS: &[FieldSpec] = &[
    spec("static_value", &[Column::Members], "static", FieldType::List),
    spec("dynamic_value", &[Column::Value], "dynamic/filter", FieldType::Filter),
    DESCRIPTION,
    TAG,
];

static SERVICE_FIELDS: &[FieldSpec] = &[
    spec("protocol", &[Column::Protocol], "protocol", FieldType::Choice(PROTOCOLS)),
    spec(
        "destination_port",
        &[Column::DestinationPort],
        "protocol/{protocol}/port",
        FieldType::Text,
    ),
    spec(
        "source_port",
        &[Column::SourcePort],
        "protocol/{protocol}/source-port",
        FieldType::Text,
    ),
    DESCRIPTION,
    TAG,
];

static SERVICE_GROUP_FIELDS: &[FieldSpec] = &[
    spec("value", &[Column::Members], "members", FieldType::List),
    TAG,
];

static APPLICATION_FIELDS: &[FieldSpec] = &[
    spec("category", &[Column::AppCategory], "category", FieldType::Text),
    spec("subcategory", &[Column::Subcategory], "subcategory", FieldType::Text),
    spec("technology", &[Column::Technology], "technology", FieldType::Text),
    spec("risk", &[Column::Risk], "risk", FieldType::Int),
    DESCRIPTION,
    spec("parent_app", &[Column::ParentApp], "parent-app", FieldType::Text),
    spec(
        "default_type",
        &[Column::DefaultType],
        "default",
        FieldType::Choice(DEFAULT_IDENTS),
    ),
    spec("default_port", &[Column::DefaultPort], "default/port", FieldType::List),
    spec(
        "default_ip_protocol",
        &[Column::DefaultIpProtocol],
        "default/ident-by-ip-protocol",
        FieldType::Text,
    ),
    spec(
        "default_icmp_type",
        &[Column::DefaultIcmpType],
        "default/{default_type}/type",
        FieldType::Int,
    ),
    spec(
        "default_icmp_code",
        &[Column::DefaultIcmpCode],
        "default/{default_type}/code",
        FieldType::Int,
    ),
    spec("timeout", &[Column::Timeout], "timeout", FieldType::Int),
    spec("tcp_timeout", &[Column::TcpTimeout], "tcp-timeout", FieldType::Int),
    spec("udp_timeout", &[Column::UdpTimeout], "udp-timeout", FieldType::Int),
    spec(
        "tcp_half_closed_timeout",
        &[Column::TcpHalfClosedTimeout],
        "tcp-half-closed-timeout",
        FieldType::Int,
    ),
    spec(
        "tcp_time_wait_timeout",
        &[Column::TcpTimeWaitTimeout],
        "tcp-time-wait-timeout",
        FieldType::Int,
    ),
    spec("evasive_behavior", &[Column::Evasive], "evasive-behavior", FieldType::Bool),
    spec(
        "consume_big_bandwidth",
        &[Column::ExcessiveBandwidthUse],
        "consume-big-bandwidth",
        FieldType::Bool,
    ),
    spec("prone_to_misuse", &[Column::ProneToMisuse], "prone-to-misuse", FieldType::Bool),
    spec(
        "able_to_transfer_file",
        &[Column::TransfersFiles],
        "able-to-transfer-file",
        FieldType::Bool,
    ),
    spec(
        "tunnel_other_application",
        &[Column::TunnelsOtherApps],
        "tunnel-other-application",
        FieldType::Bool,
    ),
    spec("used_by_malware", &[Column::UsedByMalware], "used-by-malware", FieldType::Bool),
    spec(
        "has_known_vulnerability",
        &[Column::HasKnownVulnerabilities],
        "has-known-vulnerability",
        FieldType::Bool,
    ),
    spec("pervasive_use", &[Column::Pervasive], "pervasive-use", FieldType::Bool),
    spec("file_type_ident", &[Column::FileTypeIdent], "file-type-ident", FieldType::Bool),
    spec("virus_ident", &[Column::VirusIdent], "virus-ident", FieldType::Bool),
    spec("data_ident", &[Column::DataIdent], "data-ident", FieldType::Bool),
    spec(
        "tunnel_applications",
        &[Column::TunnelApplications],
        "tunnel-applications",
        FieldType::List,
    ),
    TAG,
];

static APPLICATION_GROUP_FIELDS: &[FieldSpec] = &[
    spec("value", &[Column::Members], "members", FieldType::List),
    TAG,
];

static ROUTE_FIELDS: &[FieldSpec] = &[
    spec("destination", &[Column::Cidr], "destination", FieldType::Text),
    spec(
        "nexthop_type",
        &[Column::Subtype],
        "nexthop",
        FieldType::Choice(NEXTHOP_TYPES),
    ),
    spec("nexthop", &[Column::Nexthop], "nexthop/{nexthop_type}", FieldType::Text),
    spec("interface", &[Column::Interface], "interface", FieldType::Text),
    spec("admin_dist", &[Column::Value], "admin-dist", FieldType::Int),
    spec("metric", &[Column::Metric], "metric", FieldType::Int),
];

static SECURITY_RULE_FIELDS: &[FieldSpec] = &[
    spec("fromzone", &[Column::FromZone], "from", FieldType::List),
    spec("tozone", &[Column::ToZone], "to", FieldType::List),
    spec("source", &[Column::Source], "source", FieldType::List),
    spec("destination", &[Column::Destination], "destination", FieldType::List),
    spec("source_user", &[Column::SourceUser], "source-user", FieldType::List),
    spec("category", &[Column::Category], "category", FieldType::List),
    spec("application", &[Column::Application], "application", FieldType::List),
    spec("service", &[Column::Service], "service", FieldType::List),
    spec("hip_profiles", &[Column::HipProfiles], "hip-profiles", FieldType::List),
    spec("action", &[Column::RuleAction], "action", FieldType::Text),
    spec("type", &[Column::Subtype], "rule-type", FieldType::Text),
    DESCRIPTION,
    TAG,
    spec("target", &[Column::Target], "target/devices", FieldType::Entries),
    spec("negate_target", &[Column::NegateTarget], "target/negate", FieldType::Bool),
    spec("disabled", &[Column::Disabled], "disabled", FieldType::Bool),
    spec("negate_source", &[Column::NegateSource], "negate-source", FieldType::Bool),
    spec(
        "negate_destination",
        &[Column::NegateDestination],
        "negate-destination",
        FieldType::Bool,
    ),
    spec("log_start", &[Column::LogStart], "log-start", FieldType::Bool),
    spec("log_end", &[Column::LogEnd], "log-end", FieldType::Bool),
    spec(
        "icmp_unreachable",
        &[Column::IcmpUnreachable],
        "icmp-unreachable",
        FieldType::Bool,
    ),
    spec(
        "disable_server_response_inspection",
        &[Column::DisableServerResponseInspection],
        "option/disable-server-response-inspection",
        FieldType::Bool,
    ),
    spec("log_setting", &[Column::LogSetting], "log-setting", FieldType::Text),
    spec("schedule", &[Column::Schedule], "schedule", FieldType::Text),
    spec("group", &[Column::Group], "profile-setting/group", FieldType::Member),
    spec("virus", &[Column::Virus], "profile-setting/profiles/virus", FieldType::Member),
    spec(
        "spyware",
        &[Column::Spyware],
        "profile-setting/profiles/spyware",
        FieldType::Member,
    ),
    spec(
        "vulnerability",
        &[Column::Vulnerability],
        "profile-setting/profiles/vulnerability",
        FieldType::Member,
    ),
    spec(
        "url_filtering",
        &[Column::UrlFiltering],
        "profile-setting/profiles/url-filtering",
        FieldType::Member,
    ),
    spec(
        "file_blocking",
        &[Column::FileBlocking],
        "profile-setting/profiles/file-blocking",
        FieldType::Member,
    ),
    spec(
        "data_filtering",
        &[Column::DataFiltering],
        "profile-setting/profiles/data-filtering",
        FieldType::Member,
    ),
    spec(
        "wildfire_analysis",
        &[Column::WildfireAnalysis],
        "profile-setting/profiles/wildfire-analysis",
        FieldType::Member,
    ),
];

static NAT_RULE_FIELDS: &[FieldSpec] = &[
    spec("fromzone", &[Column::FromZone], "from", FieldType::List),
    spec("tozone", &[Column::ToZone], "to", FieldType::List),
    spec("source", &[Column::Source], "source", FieldType::List),
    spec("destination", &[Column::Destination], "destination", FieldType::List),
    spec("service", &[Column::Service], "service", FieldType::Text),
    spec(
        "to_interface",
        &[Column::ToInterface, Column::Interface],
        "to-interface",
        FieldType::Text,
    ),
    spec("nat_type", &[Column::NatType], "nat-type", FieldType::Text),
    DESCRIPTION,
    TAG,
    spec("target", &[Column::Target], "target/devices", FieldType::Entries),
    spec("negate_target", &[Column::NegateTarget], "target/negate", FieldType::Bool),
    spec("disabled", &[Column::Disabled], "disabled", FieldType::Bool),
    spec(
        "ha_binding",
        &[Column::HaBinding],
        "active-active-device-binding",
        FieldType::Text,
    ),
    spec(
        "source_translation_type",
        &[Column::SourceTranslationType],
        "source-translation",
        FieldType::Choice(SOURCE_TRANSLATIONS),
    ),
    spec(
        "source_translation_address_type",
        &[Column::SourceTranslationAddressType],
        "source-translation/dynamic-ip-and-port",
        FieldType::Choice(TRANSLATED_ADDRESS_TYPES),
    ),
    spec(
        "source_translation_translated_addresses",
        &[Column::SourceTranslationTranslatedAddresses],
        "source-translation/{source_translation_type}/translated-address",
        FieldType::List,
    ),
    spec(
        "source_translation_interface",
        &[Column::SourceTranslationInterface],
        "source-translation/dynamic-ip-and-port/interface-address/interface",
        FieldType::Text,
    ),
    spec(
        "source_translation_ip_address",
        &[Column::SourceTranslationIpAddress],
        "source-translation/dynamic-ip-and-port/interface-address/ip",
        FieldType::Text,
    ),
    spec(
        "source_translation_fallback_type",
        &[Column::SourceTranslationFallbackType],
        "source-translation/dynamic-ip/fallback",
        FieldType::Choice(TRANSLATED_ADDRESS_TYPES),
    ),
    spec(
        "source_translation_fallback_translated_addresses",
        &[Column::SourceTranslationFallbackTranslatedAddresses],
        "source-translation/dynamic-ip/fallback/translated-address",
        FieldType::List,
    ),
    spec(
        "source_translation_fallback_interface",
        &[Column::SourceTranslationFallbackInterface],
        "source-translation/dynamic-ip/fallback/interface-address/interface",
        FieldType::Text,
    ),
    spec(
        "source_translation_fallback_ip_type",
        &[Column::SourceTranslationFallbackIpType],
        "source-translation/dynamic-ip/fallback/interface-address",
        FieldType::Choice(FALLBACK_IP_TYPES),
    ),
    spec(
        "source_translation_fallback_ip_address",
        &[Column::SourceTranslationFallbackIpAddress],
        "source-translation/dynamic-ip/fallback/interface-address/{source_translation_fallback_ip_type}",
        FieldType::Text,
    ),
    spec(
        "source_translation_static_translated_address",
        &[Column::SourceTranslationStaticTranslatedAddress],
        "source-translation/static-ip/translated-address",
        FieldType::Text,
    ),
    spec(
        "source_translation_static_bi_directional",
        &[Column::SourceTranslationStaticBiDirectional],
        "source-translation/static-ip/bi-directional",
        FieldType::Bool,
    ),
    spec(
        "destination_translated_address",
        &[Column::DestinationTranslatedAddress],
        "destination-translation/translated-address",
        FieldType::Text,
    ),
    spec(
        "destination_translated_port",
        &[Column::DestinationTranslatedPort],
        "destination-translation/translated-port",
        FieldType::Int,
    ),
    spec(
        "destination_dynamic_translated_address",
        &[Column::DestinationDynamicTranslatedAddress],
        "dynamic-destination-translation/translated-address",
        FieldType::Text,
    ),
    spec(
        "destination_dynamic_translated_port",
        &[Column::DestinationDynamicTranslatedPort],
        "dynamic-destination-translation/translated-port",
        FieldType::Int,
    ),
    spec(
        "destination_dynamic_translated_distribution",
        &[Column::DestinationDynamicTranslatedDistribution],
        "dynamic-destination-translation/distribution",
        FieldType::Text,
    ),
];

/// Field table for `kind`. Dynamic IPs live outside the configuration tree
/// and have no fields here.
pub fn fields(kind: ObjectKind) -> &'static [FieldSpec] {
    match kind {
        ObjectKind::Tag => TAG_FIELDS,
        ObjectKind::Address => ADDRESS_FIELDS,
        ObjectKind::AddressGroup => ADDRESS_GROUP_FIELDS,
        ObjectKind::Service => SERVICE_FIELDS,
        ObjectKind::ServiceGroup => SERVICE_GROUP_FIELDS,
        ObjectKind::Application => APPLICATION_FIELDS,
        ObjectKind::ApplicationGroup => APPLICATION_GROUP_FIELDS,
        ObjectKind::StaticRoute => ROUTE_FIELDS,
        ObjectKind::SecurityRule => SECURITY_RULE_FIELDS,
        ObjectKind::NatRule => NAT_RULE_FIELDS,
        ObjectKind::DynamicIp => &[],
    }
}

pub fn field(kind: ObjectKind, name: &str) -> Option<&'static FieldSpec> {
    fields(kind).iter().find(|spec| spec.field == name)
}

/// Top-level element tags a kind's schema writes inside an entry.
pub fn top_level_tags(kind: ObjectKind) -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = Vec::new();
    for spec in fields(kind) {
        let candidates: Vec<&'static str> = if spec.xml.is_empty() {
            match spec.ty {
                FieldType::Choice(choices) => choices.to_vec(),
                _ => Vec::new(),
            }
        } else {
            let head = spec.xml.split('/').next().unwrap_or(spec.xml);
            if head.starts_with('{') {
                Vec::new()
            } else {
                vec![head]
            }
        };
        for tag in candidates {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [ObjectKind; 10] = [
        ObjectKind::Tag,
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

    #[test]
    fn placeholders_name_choice_fields_of_the_same_kind() {
        for kind in ALL_KINDS {
            for spec in fields(kind) {
                let mut rest = spec.xml;
                while let Some(start) = rest.find('{') {
                    let end = rest[start..].find('}').expect("closing brace") + start;
                    let referenced = &rest[start + 1..end];
                    let target = field(kind, referenced)
                        .unwrap_or_else(|| panic!("{kind}: unknown placeholder {referenced}"));
                    assert!(matches!(target.ty, FieldType::Choice(_)));
                    rest = &rest[end + 1..];
                }
            }
        }
    }

    #[test]
    fn every_field_has_a_source_column() {
        for kind in ALL_KINDS {
            assert!(fields(kind).iter().all(|spec| !spec.columns.is_empty()));
        }
    }

    #[test]
    fn address_top_level_tags_include_value_choices() {
        let tags = top_level_tags(ObjectKind::Address);
        assert!(tags.contains(&"fqdn"));
        assert!(tags.contains(&"description"));
        assert!(!tags.contains(&"{type}"));
    }
}
