use crate::field::{FieldError, FieldMap, FieldReader, FieldWriter};
use crate::kind::ObjectKind;

use super::Record;

/// How the device recognizes the application when no signature matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DefaultIdent {
    #[default]
    None,
    /// `proto/port` items such as `tcp/8443`.
    Port(Vec<String>),
    IpProtocol(String),
    Icmp {
        v6: bool,
        icmp_type: Option<i64>,
        code: Option<i64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppTimeouts {
    pub timeout: Option<i64>,
    pub tcp: Option<i64>,
    pub udp: Option<i64>,
    pub tcp_half_closed: Option<i64>,
    pub tcp_time_wait: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AppFlags {
    pub evasive_behavior: bool,
    pub consume_big_bandwidth: bool,
    pub prone_to_misuse: bool,
    pub able_to_transfer_file: bool,
    pub tunnel_other_application: bool,
    pub used_by_malware: bool,
    pub has_known_vulnerability: bool,
    pub pervasive_use: bool,
    pub file_type_ident: bool,
    pub virus_ident: bool,
    pub data_ident: bool,
}

impl AppFlags {
    fn pairs(&self) -> [(&'static str, bool); 11] {
        [
            ("evasive_behavior", self.evasive_behavior),
            ("consume_big_bandwidth", self.consume_big_bandwidth),
            ("prone_to_misuse", self.prone_to_misuse),
            ("able_to_transfer_file", self.able_to_transfer_file),
            ("tunnel_other_application", self.tunnel_other_application),
            ("used_by_malware", self.used_by_malware),
            ("has_known_vulnerability", self.has_known_vulnerability),
            ("pervasive_use", self.pervasive_use),
            ("file_type_ident", self.file_type_ident),
            ("virus_ident", self.virus_ident),
            ("data_ident", self.data_ident),
        ]
    }

    fn read(r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            evasive_behavior: r.flag("evasive_behavior")?,
            consume_big_bandwidth: r.flag("consume_big_bandwidth")?,
            prone_to_misuse: r.flag("prone_to_misuse")?,
            able_to_transfer_file: r.flag("able_to_transfer_file")?,
            tunnel_other_application: r.flag("tunnel_other_application")?,
            used_by_malware: r.flag("used_by_malware")?,
            has_known_vulnerability: r.flag("has_known_vulnerability")?,
            pervasive_use: r.flag("pervasive_use")?,
            file_type_ident: r.flag("file_type_ident")?,
            virus_ident: r.flag("virus_ident")?,
            data_ident: r.flag("data_ident")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationObject {
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub technology: String,
    pub risk: i64,
    pub description: Option<String>,
    pub parent_app: Option<String>,
    pub default: DefaultIdent,
    pub timeouts: AppTimeouts,
    pub flags: AppFlags,
    pub tunnel_applications: Vec<String>,
    pub tag: Vec<String>,
}

impl Record for ApplicationObject {
    const KIND: ObjectKind = ObjectKind::Application;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        let mut writer = FieldWriter::new()
            .text("category", &self.category)
            .text("subcategory", &self.subcategory)
            .text("technology", &self.technology)
            .opt_int("risk", Some(self.risk))
            .opt_text("description", self.description.as_deref())
            .opt_text("parent_app", self.parent_app.as_deref())
            .opt_int("timeout", self.timeouts.timeout)
            .opt_int("tcp_timeout", self.timeouts.tcp)
            .opt_int("udp_timeout", self.timeouts.udp)
            .opt_int("tcp_half_closed_timeout", self.timeouts.tcp_half_closed)
            .opt_int("tcp_time_wait_timeout", self.timeouts.tcp_time_wait)
            .list("tunnel_applications", &self.tunnel_applications)
            .list("tag", &self.tag);
        writer = match &self.default {
            DefaultIdent::None => writer,
            DefaultIdent::Port(ports) => writer.text("default_type", "port").list("default_port", ports),
            DefaultIdent::IpProtocol(protocol) => writer
                .text("default_type", "ident-by-ip-protocol")
                .text("default_ip_protocol", protocol),
            DefaultIdent::Icmp {
                v6,
                icmp_type,
                code,
            } => writer
                .text(
                    "default_type",
                    if *v6 {
                        "ident-by-icmp6-type"
                    } else {
                        "ident-by-icmp-type"
                    },
                )
                .opt_int("default_icmp_type", *icmp_type)
                .opt_int("default_icmp_code", *code),
        };
        for (field, value) in self.flags.pairs() {
            writer = writer.flag(field, value);
        }
        writer.finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        let default = match r.opt_text("default_type")?.as_deref() {
            None => DefaultIdent::None,
            Some("port") => DefaultIdent::Port(r.list("default_port")?),
            Some("ident-by-ip-protocol") => {
                DefaultIdent::IpProtocol(r.text("default_ip_protocol")?)
            }
            Some(icmp @ ("ident-by-icmp-type" | "ident-by-icmp6-type")) => DefaultIdent::Icmp {
                v6: icmp == "ident-by-icmp6-type",
                icmp_type: r.opt_int("default_icmp_type")?,
                code: r.opt_int("default_icmp_code")?,
            },
            Some(other) => {
                return Err(FieldError::BadValue {
                    kind: r.kind(),
                    field: "default_type".to_string(),
                    value: other.to_string(),
                })
            }
        };
        Ok(Self {
            name: name.to_string(),
            category: r.text("category")?,
            subcategory: r.text("subcategory")?,
            technology: r.text("technology")?,
            risk: r.opt_int("risk")?.unwrap_or(1),
            description: r.opt_text("description")?,
            parent_app: r.opt_text("parent_app")?,
            default,
            timeouts: AppTimeouts {
                timeout: r.opt_int("timeout")?,
                tcp: r.opt_int("tcp_timeout")?,
                udp: r.opt_int("udp_timeout")?,
                tcp_half_closed: r.opt_int("tcp_half_closed_timeout")?,
                tcp_time_wait: r.opt_int("tcp_time_wait_timeout")?,
            },
            flags: AppFlags::read(r)?,
            tunnel_applications: r.list("tunnel_applications")?,
            tag: r.list("tag")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationGroup {
    pub name: String,
    pub members: Vec<String>,
    pub tag: Vec<String>,
}

impl Record for ApplicationGroup {
    const KIND: ObjectKind = ObjectKind::ApplicationGroup;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        FieldWriter::new()
            .list("value", &self.members)
            .list("tag", &self.tag)
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            members: r.list("value")?,
            tag: r.list("tag")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icmp_default_ident_survives_field_form() {
        let app = ApplicationObject {
            name: "net-check".into(),
            category: "networking".into(),
            subcategory: "ip-protocol".into(),
            technology: "network-protocol".into(),
            risk: 2,
            description: None,
            parent_app: None,
            default: DefaultIdent::Icmp {
                v6: false,
                icmp_type: Some(8),
                code: Some(0),
            },
            timeouts: AppTimeouts::default(),
            flags: AppFlags {
                evasive_behavior: true,
                ..AppFlags::default()
            },
            tunnel_applications: Vec::new(),
            tag: Vec::new(),
        };
        let fields = app.to_fields();
        let back = ApplicationObject::from_fields(
            "net-check",
            &FieldReader::new(ObjectKind::Application, &fields),
        )
        .expect("rebuild");
        assert_eq!(back, app);
    }
}
