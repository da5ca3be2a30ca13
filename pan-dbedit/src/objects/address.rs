use crate::field::{FieldError, FieldMap, FieldReader, FieldWriter};
use crate::kind::ObjectKind;

use super::{keyword_enum, Record};

keyword_enum!(AddressType {
    IpNetmask => "ip-netmask",
    IpRange => "ip-range",
    Fqdn => "fqdn",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub color: Option<String>,
    pub comments: Option<String>,
}

impl Record for Tag {
    const KIND: ObjectKind = ObjectKind::Tag;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        FieldWriter::new()
            .opt_text("color", self.color.as_deref())
            .opt_text("comments", self.comments.as_deref())
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            color: r.opt_text("color")?,
            comments: r.opt_text("comments")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressObject {
    pub name: String,
    pub address_type: AddressType,
    pub value: String,
    pub description: Option<String>,
    pub tag: Vec<String>,
}

impl Record for AddressObject {
    const KIND: ObjectKind = ObjectKind::Address;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        FieldWriter::new()
            .shown("type", self.address_type)
            .text("value", &self.value)
            .opt_text("description", self.description.as_deref())
            .list("tag", &self.tag)
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        Ok(Self {
            name: name.to_string(),
            address_type: r.parsed("type")?.unwrap_or(AddressType::IpNetmask),
            value: r.text("value")?,
            description: r.opt_text("description")?,
            tag: r.list("tag")?,
        })
    }
}

/// Address-group membership: an explicit list or a tag filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupMembers {
    Static(Vec<String>),
    Dynamic(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressGroup {
    pub name: String,
    pub members: GroupMembers,
    pub description: Option<String>,
    pub tag: Vec<String>,
}

impl AddressGroup {
    /// Tag names referenced by a dynamic filter such as `'A' and 'B'`.
    pub fn filter_clauses(filter: &str) -> Vec<String> {
        let compact: String = filter
            .chars()
            .filter(|c| !matches!(c, '\'' | '"' | ' '))
            .collect();
        compact
            .split("and")
            .filter(|clause| !clause.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Record for AddressGroup {
    const KIND: ObjectKind = ObjectKind::AddressGroup;

    fn name(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        let writer = match &self.members {
            GroupMembers::Static(members) => FieldWriter::new().list("static_value", members),
            GroupMembers::Dynamic(filter) => FieldWriter::new().text("dynamic_value", filter),
        };
        writer
            .opt_text("description", self.description.as_deref())
            .list("tag", &self.tag)
            .finish()
    }

    fn from_fields(name: &str, r: &FieldReader<'_>) -> Result<Self, FieldError> {
        let members = match r.opt_text("dynamic_value")? {
            Some(filter) if r.opt_list("static_value")?.is_none() => GroupMembers::Dynamic(filter),
            _ => GroupMembers::Static(r.list("static_value")?),
        };
        Ok(Self {
            name: name.to_string(),
            members,
            description: r.opt_text("description")?,
            tag: r.list("tag")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_clauses_strip_quotes_and_split_on_and() {
        assert_eq!(
            AddressGroup::filter_clauses("'TagA' and 'TagB'"),
            vec!["TagA", "TagB"]
        );
        assert_eq!(AddressGroup::filter_clauses("'solo'"), vec!["solo"]);
    }

    #[test]
    fn address_defaults_to_ip_netmask() {
        let map = FieldWriter::new().text("value", "10.0.0.1/32").finish();
        let address =
            AddressObject::from_fields("h1", &FieldReader::new(ObjectKind::Address, &map))
                .expect("address");
        assert_eq!(address.address_type, AddressType::IpNetmask);
        assert_eq!(address.to_fields().get("type").and_then(|v| v.as_text()), Some("ip-netmask"));
    }

    #[test]
    fn group_prefers_static_members_when_both_present() {
        let map = FieldWriter::new()
            .list("static_value", &["web1".to_string()])
            .text("dynamic_value", "'TagA'")
            .finish();
        let group =
            AddressGroup::from_fields("g", &FieldReader::new(ObjectKind::AddressGroup, &map))
                .expect("group");
        assert_eq!(group.members, GroupMembers::Static(vec!["web1".to_string()]));
    }
}
