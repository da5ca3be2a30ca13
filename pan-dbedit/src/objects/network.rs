use crate::field::{FieldError, FieldMap, FieldReader, FieldWriter};
use crate::kind::ObjectKind;

use super::{keyword_enum, Record};

keyword_enum!(NexthopType {
    IpAddress => "ip-address",
    NextVr => "next-vr",
    Discard => "discard",
    None => "none",
});

pub const DEFAULT_ADMIN_DIST: i64 = 10;
pub const DEFAULT_METRIC: i64 = 10;

/// A static route inside one virtual router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub name: String,
    pub destination: String,
    pub nexthop_type: NexthopType,
    pub nexthop: Option<String>,
    pub interface: Option<String>,
    pub admin_dist: i64,
    pub metric: i64,
}

impl Record for StaticRoute {
    const KIND: ObjectKind = ObjectKind::StaticRoute;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        FieldWriter::new()
            .text("destination", &self.destination)
            .shown("nexthop_type", self.nexthop_type)
            .opt_text("nexthop", self.nexthop.as_deref())
            .opt_text("interface", self.interface.as_deref())
            .opt_int("admin_dist", Some(self.admin_dist))
            .opt_int("metric", Some(self.metric))
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            destination: r.text("destination")?,
            nexthop_type: r.parsed("nexthop_type")?.unwrap_or(NexthopType::None),
            nexthop: r.opt_text("nexthop")?,
            interface: r.opt_text("interface")?,
            admin_dist: r.opt_int("admin_dist")?.unwrap_or(DEFAULT_ADMIN_DIST),
            metric: r.opt_int("metric")?.unwrap_or(DEFAULT_METRIC),
        })
    }
}
