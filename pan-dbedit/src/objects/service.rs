use crate::field::{FieldError, FieldMap, FieldReader, FieldWriter};
use crate::kind::ObjectKind;

use super::{keyword_enum, Record};

keyword_enum!(Protocol {
    Tcp => "tcp",
    Udp => "udp",
});

/// A port-based service. Ports keep their device syntax: a single port,
/// a `low-high` range, or a comma-separated list of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceObject {
    pub name: String,
    pub protocol: Protocol,
    pub source_port: Option<String>,
    pub destination_port: String,
    pub description: Option<String>,
    pub tag: Vec<String>,
}

impl Record for ServiceObject {
    const KIND: ObjectKind = ObjectKind::Service;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        FieldWriter::new()
            .shown("protocol", self.protocol)
            .text("destination_port", &self.destination_port)
            .opt_text("source_port", self.source_port.as_deref())
            .opt_text("description", self.description.as_deref())
            .list("tag", &self.tag)
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            protocol: r.parsed("protocol")?.unwrap_or(Protocol::Tcp),
            source_port: r.opt_text("source_port")?,
            destination_port: r.text("destination_port")?,
            description: r.opt_text("description")?,
            tag: r.list("tag")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGroup {
    pub name: String,
    pub members: Vec<String>,
    pub tag: Vec<String>,
}

impl Record for ServiceGroup {
    const KIND: ObjectKind = ObjectKind::ServiceGroup;

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
    fn service_requires_destination_port() {
        let map = FieldWriter::new().text("protocol", "udp").finish();
        let err = ServiceObject::from_fields("dns", &FieldReader::new(ObjectKind::Service, &map))
            .expect_err("missing port");
        assert!(matches!(err, FieldError::Missing { .. }));
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let map = FieldWriter::new()
            .text("protocol", "sctp")
            .text("destination_port", "80")
            .finish();
        assert!(matches!(
            ServiceObject::from_fields("x", &FieldReader::new(ObjectKind::Service, &map)),
            Err(FieldError::BadValue { .. })
        ));
    }
}
