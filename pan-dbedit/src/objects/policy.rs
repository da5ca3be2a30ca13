use crate::field::{FieldError, FieldMap, FieldReader, FieldWriter};
use crate::kind::ObjectKind;

use super::{keyword_enum, Record};

keyword_enum!(RuleAction {
    Allow => "allow",
    Deny => "deny",
    Drop => "drop",
    ResetClient => "reset-client",
    ResetServer => "reset-server",
    ResetBoth => "reset-both",
});

keyword_enum!(RuleType {
    Universal => "universal",
    Interzone => "interzone",
    Intrazone => "intrazone",
});

/// Boolean switches of a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RuleOptions {
    pub disabled: bool,
    pub negate_source: bool,
    pub negate_destination: bool,
    pub log_start: bool,
    pub log_end: bool,
    pub icmp_unreachable: bool,
    pub disable_server_response_inspection: bool,
}

/// Either a profile group or individual security profiles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSetting {
    pub group: Option<String>,
    pub virus: Option<String>,
    pub spyware: Option<String>,
    pub vulnerability: Option<String>,
    pub url_filtering: Option<String>,
    pub file_blocking: Option<String>,
    pub data_filtering: Option<String>,
    pub wildfire_analysis: Option<String>,
}

impl ProfileSetting {
    fn pairs(&self) -> [(&'static str, Option<&str>); 8] {
        [
            ("group", self.group.as_deref()),
            ("virus", self.virus.as_deref()),
            ("spyware", self.spyware.as_deref()),
            ("vulnerability", self.vulnerability.as_deref()),
            ("url_filtering", self.url_filtering.as_deref()),
            ("file_blocking", self.file_blocking.as_deref()),
            ("data_filtering", self.data_filtering.as_deref()),
            ("wildfire_analysis", self.wildfire_analysis.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRule {
    pub name: String,
    pub action: RuleAction,
    pub rule_type: RuleType,
    pub fromzone: Vec<String>,
    pub tozone: Vec<String>,
    pub source: Vec<String>,
    pub destination: Vec<String>,
    pub source_user: Vec<String>,
    pub category: Vec<String>,
    pub application: Vec<String>,
    pub service: Vec<String>,
    pub hip_profiles: Vec<String>,
    pub description: Option<String>,
    pub tag: Vec<String>,
    /// Firewalls a device-group rule is pushed to; empty means all.
    pub target: Vec<String>,
    pub negate_target: bool,
    pub options: RuleOptions,
    pub log_setting: Option<String>,
    pub schedule: Option<String>,
    pub profiles: ProfileSetting,
}

fn write_target(writer: FieldWriter, target: &[String], negate: bool) -> FieldWriter {
    let writer = writer.list("target", target);
    if target.is_empty() && !negate {
        writer
    } else {
        writer.flag("negate_target", negate)
    }
}

impl Record for SecurityRule {
    const KIND: ObjectKind = ObjectKind::SecurityRule;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        let mut writer = FieldWriter::new()
            .shown("action", self.action)
            .shown("type", self.rule_type)
            .list("fromzone", &self.fromzone)
            .list("tozone", &self.tozone)
            .list("source", &self.source)
            .list("destination", &self.destination)
            .list("source_user", &self.source_user)
            .list("category", &self.category)
            .list("application", &self.application)
            .list("service", &self.service)
            .list("hip_profiles", &self.hip_profiles)
            .opt_text("description", self.description.as_deref())
            .list("tag", &self.tag)
            .flag("disabled", self.options.disabled)
            .flag("negate_source", self.options.negate_source)
            .flag("negate_destination", self.options.negate_destination)
            .flag("log_start", self.options.log_start)
            .flag("log_end", self.options.log_end)
            .flag("icmp_unreachable", self.options.icmp_unreachable)
            .flag(
                "disable_server_response_inspection",
                self.options.disable_server_response_inspection,
            )
            .opt_text("log_setting", self.log_setting.as_deref())
            .opt_text("schedule", self.schedule.as_deref());
        writer = write_target(writer, &self.target, self.negate_target);
        for (field, value) in self.profiles.pairs() {
            writer = writer.opt_text(field, value);
        }
        writer.finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            action: r.parsed("action")?.unwrap_or(RuleAction::Allow),
            rule_type: r.parsed("type")?.unwrap_or(RuleType::Universal),
            fromzone: r.list("fromzone")?,
            tozone: r.list("tozone")?,
            source: r.list("source")?,
            destination: r.list("destination")?,
            source_user: r.list("source_user")?,
            category: r.list("category")?,
            application: r.list("application")?,
            service: r.list("service")?,
            hip_profiles: r.list("hip_profiles")?,
            description: r.opt_text("description")?,
            tag: r.list("tag")?,
            target: r.list("target")?,
            negate_target: r.flag("negate_target")?,
            options: RuleOptions {
                disabled: r.flag("disabled")?,
                negate_source: r.flag("negate_source")?,
                negate_destination: r.flag("negate_destination")?,
                log_start: r.flag("log_start")?,
                log_end: r.flag("log_end")?,
                icmp_unreachable: r.flag("icmp_unreachable")?,
                disable_server_response_inspection: r
                    .flag("disable_server_response_inspection")?,
            },
            log_setting: r.opt_text("log_setting")?,
            schedule: r.opt_text("schedule")?,
            profiles: ProfileSetting {
                group: r.opt_text("group")?,
                virus: r.opt_text("virus")?,
                spyware: r.opt_text("spyware")?,
                vulnerability: r.opt_text("vulnerability")?,
                url_filtering: r.opt_text("url_filtering")?,
                file_blocking: r.opt_text("file_blocking")?,
                data_filtering: r.opt_text("data_filtering")?,
                wildfire_analysis: r.opt_text("wildfire_analysis")?,
            },
        })
    }
}

/// Fallback used by dynamic-IP source translation once the pool is exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    TranslatedAddress(Vec<String>),
    InterfaceAddress {
        interface: Option<String>,
        ip_type: Option<String>,
        ip_address: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTranslation {
    DynamicIpAndPort(PortTranslation),
    DynamicIp {
        translated_addresses: Vec<String>,
        fallback: Option<Fallback>,
    },
    StaticIp {
        translated_address: String,
        bi_directional: Option<bool>,
    },
}

/// Dynamic IP-and-port translation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortTranslation {
    TranslatedAddress(Vec<String>),
    InterfaceAddress {
        interface: String,
        ip: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationTranslation {
    Static {
        address: String,
        port: Option<i64>,
    },
    Dynamic {
        address: String,
        port: Option<i64>,
        distribution: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatRule {
    pub name: String,
    pub fromzone: Vec<String>,
    pub tozone: Vec<String>,
    pub source: Vec<String>,
    pub destination: Vec<String>,
    pub service: String,
    pub to_interface: Option<String>,
    pub nat_type: Option<String>,
    pub description: Option<String>,
    pub disabled: bool,
    pub tag: Vec<String>,
    pub target: Vec<String>,
    pub negate_target: bool,
    pub ha_binding: Option<String>,
    pub source_translation: Option<SourceTranslation>,
    pub destination_translation: Option<DestinationTranslation>,
}

impl SourceTranslation {
    fn write(&self, writer: FieldWriter) -> FieldWriter {
        match self {
            SourceTranslation::DynamicIpAndPort(PortTranslation::TranslatedAddress(addresses)) => {
                writer
                    .text("source_translation_type", "dynamic-ip-and-port")
                    .text("source_translation_address_type", "translated-address")
                    .list("source_translation_translated_addresses", addresses)
            }
            SourceTranslation::DynamicIpAndPort(PortTranslation::InterfaceAddress {
                interface,
                ip,
            }) => writer
                .text("source_translation_type", "dynamic-ip-and-port")
                .text("source_translation_address_type", "interface-address")
                .text("source_translation_interface", interface)
                .opt_text("source_translation_ip_address", ip.as_deref()),
            SourceTranslation::DynamicIp {
                translated_addresses,
                fallback,
            } => {
                let writer = writer
                    .text("source_translation_type", "dynamic-ip")
                    .list("source_translation_translated_addresses", translated_addresses);
                match fallback {
                    None => writer,
                    Some(Fallback::TranslatedAddress(addresses)) => writer
                        .text("source_translation_fallback_type", "translated-address")
                        .list("source_translation_fallback_translated_addresses", addresses),
                    Some(Fallback::InterfaceAddress {
                        interface,
                        ip_type,
                        ip_address,
                    }) => writer
                        .text("source_translation_fallback_type", "interface-address")
                        .opt_text("source_translation_fallback_interface", interface.as_deref())
                        .opt_text("source_translation_fallback_ip_type", ip_type.as_deref())
                        .opt_text(
                            "source_translation_fallback_ip_address",
                            ip_address.as_deref(),
                        ),
                }
            }
            SourceTranslation::StaticIp {
                translated_address,
                bi_directional,
            } => writer
                .text("source_translation_type", "static-ip")
                .text(
                    "source_translation_static_translated_address",
                    translated_address,
                )
                .opt_flag("source_translation_static_bi_directional", *bi_directional),
        }
    }

    fn read(r: &FieldReader<'_>) -> Result<Option<Self>, FieldError> {
        let Some(kind) = r.opt_text("source_translation_type")? else {
            return Ok(None);
        };
        let translation = match kind.as_str() {
            "dynamic-ip-and-port" => {
                let interface = r.opt_text("source_translation_interface")?;
                let address_type = r.opt_text("source_translation_address_type")?;
                match (address_type.as_deref(), interface) {
                    (Some("interface-address"), Some(interface))
                    | (None, Some(interface)) => {
                        SourceTranslation::DynamicIpAndPort(PortTranslation::InterfaceAddress {
                            interface,
                            ip: r.opt_text("source_translation_ip_address")?,
                        })
                    }
                    _ => SourceTranslation::DynamicIpAndPort(PortTranslation::TranslatedAddress(
                        r.list("source_translation_translated_addresses")?,
                    )),
                }
            }
            "dynamic-ip" => {
                let fallback = match r.opt_text("source_translation_fallback_type")?.as_deref() {
                    None => None,
                    Some("interface-address") => Some(Fallback::InterfaceAddress {
                        interface: r.opt_text("source_translation_fallback_interface")?,
                        ip_type: r.opt_text("source_translation_fallback_ip_type")?,
                        ip_address: r.opt_text("source_translation_fallback_ip_address")?,
                    }),
                    Some(_) => Some(Fallback::TranslatedAddress(
                        r.list("source_translation_fallback_translated_addresses")?,
                    )),
                };
                SourceTranslation::DynamicIp {
                    translated_addresses: r.list("source_translation_translated_addresses")?,
                    fallback,
                }
            }
            "static-ip" => SourceTranslation::StaticIp {
                translated_address: r.text("source_translation_static_translated_address")?,
                bi_directional: r.opt_flag("source_translation_static_bi_directional")?,
            },
            other => {
                return Err(FieldError::BadValue {
                    kind: r.kind(),
                    field: "source_translation_type".to_string(),
                    value: other.to_string(),
                })
            }
        };
        Ok(Some(translation))
    }
}

impl DestinationTranslation {
    fn write(&self, writer: FieldWriter) -> FieldWriter {
        match self {
            DestinationTranslation::Static { address, port } => writer
                .text("destination_translated_address", address)
                .opt_int("destination_translated_port", *port),
            DestinationTranslation::Dynamic {
                address,
                port,
                distribution,
            } => writer
                .text("destination_dynamic_translated_address", address)
                .opt_int("destination_dynamic_translated_port", *port)
                .opt_text(
                    "destination_dynamic_translated_distribution",
                    distribution.as_deref(),
                ),
        }
    }

    fn read(r: &FieldReader<'_>) -> Result<Option<Self>, FieldError> {
        if let Some(address) = r.opt_text("destination_dynamic_translated_address")? {
            return Ok(Some(DestinationTranslation::Dynamic {
                address,
                port: r.opt_int("destination_dynamic_translated_port")?,
                distribution: r.opt_text("destination_dynamic_translated_distribution")?,
            }));
        }
        Ok(r
            .opt_text("destination_translated_address")?
            .map(|address| -> Result<_, FieldError> {
                Ok(DestinationTranslation::Static {
                    address,
                    port: r.opt_int("destination_translated_port")?,
                })
            })
            .transpose()?)
    }
}

impl Record for NatRule {
    const KIND: ObjectKind = ObjectKind::NatRule;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        let mut writer = FieldWriter::new()
            .list("fromzone", &self.fromzone)
            .list("tozone", &self.tozone)
            .list("source", &self.source)
            .list("destination", &self.destination)
            .text("service", &self.service)
            .opt_text("to_interface", self.to_interface.as_deref())
            .opt_text("nat_type", self.nat_type.as_deref())
            .opt_text("description", self.description.as_deref())
            .flag("disabled", self.disabled)
            .list("tag", &self.tag)
            .opt_text("ha_binding", self.ha_binding.as_deref());
        writer = write_target(writer, &self.target, self.negate_target);
        if let Some(source) = &self.source_translation {
            writer = source.write(writer);
        }
        if let Some(destination) = &self.destination_translation {
            writer = destination.write(writer);
        }
        writer.finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            fromzone: r.list("fromzone")?,
            tozone: r.list("tozone")?,
            source: r.list("source")?,
            destination: r.list("destination")?,
            service: r.opt_text("service")?.unwrap_or_else(|| "any".to_string()),
            to_interface: r.opt_text("to_interface")?,
            nat_type: r.opt_text("nat_type")?,
            description: r.opt_text("description")?,
            disabled: r.flag("disabled")?,
            tag: r.list("tag")?,
            target: r.list("target")?,
            negate_target: r.flag("negate_target")?,
            ha_binding: r.opt_text("ha_binding")?,
            source_translation: SourceTranslation::read(r)?,
            destination_translation: DestinationTranslation::read(r)?,
        })
    }
}
