//! Turns a normalized row into exactly one [`ChangeOperation`].

use thiserror::Error;
use tracing::debug;

use crate::change::{ChangeOperation, Filed, GroupAction};
use crate::error::SyntaxError;
use crate::field::{FieldError, FieldMap, FieldValue};
use crate::kind::{Action, ChangeKey, ObjectKind, UnknownToken};
use crate::objects::{ConfigObject, DynamicIp, DEFAULT_ADMIN_DIST};
use crate::row::{netmask_prefix, parse_bool, parse_list, Column, Row, RowError};
use crate::schema::{self, FieldSpec, FieldType};
use crate::syntax;

pub const VENDOR: &str = "palo";

const RULE_ANY_DEFAULTS: [&str; 8] = [
    "fromzone",
    "tozone",
    "source",
    "destination",
    "application",
    "category",
    "source_user",
    "hip_profiles",
];
const NAT_ANY_DEFAULTS: [&str; 3] = ["fromzone", "source", "destination"];

/// Why a row produced no operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkip {
    #[error("unsupported vendor '{0}'")]
    Vendor(String),
    #[error("unsupported type: {0}")]
    Kind(UnknownToken),
    #[error("action '{action}' is not valid for type '{key}'")]
    Action { action: Action, key: ChangeKey },
    #[error(transparent)]
    Row(#[from] RowError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Run the per-kind syntax checks. Type coercions always apply.
    pub checks: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { checks: true }
    }
}

/// Build the operation a row describes, along with where it is filed.
pub fn build(row: &Row, options: BuildOptions) -> Result<Filed, RowSkip> {
    let vendor = row.cell(Column::Vendor);
    if vendor != VENDOR {
        return Err(RowSkip::Vendor(vendor.to_string()));
    }
    let key: ChangeKey = row.cell(Column::Type).parse().map_err(RowSkip::Kind)?;
    let action = row.action()?;

    let operation = match (action, key.kind) {
        (Action::Create | Action::Delete, ObjectKind::DynamicIp) => {
            dynamic_ip(row, action, options)?
        }
        (_, ObjectKind::DynamicIp) => return Err(RowSkip::Action { action, key }),
        (Action::Create, kind) => {
            if options.checks {
                let violations = syntax::check(kind, row);
                if !violations.is_empty() {
                    return Err(SyntaxError {
                        kind,
                        name: row.cell(Column::Name).to_string(),
                        violations,
                    }
                    .into());
                }
            }
            ChangeOperation::Create(create_object(row, kind)?)
        }
        (Action::Delete, kind) => ChangeOperation::Delete {
            name: row.require(Column::Name)?,
            kind,
            rulebase: key.rulebase,
        },
        (Action::Edit, kind) => ChangeOperation::Edit {
            name: row.require(Column::Name)?,
            kind,
            rulebase: key.rulebase,
            patch: edit_patch(row, kind)?,
        },
        (Action::AddToGroup | Action::RemoveFromGroup, kind) if kind.is_group() => {
            let mut members: Vec<String> = Vec::new();
            for member in row.list(Column::Members) {
                if !members.contains(&member) {
                    members.push(member);
                }
            }
            if members.is_empty() {
                return Err(RowError::Missing {
                    column: Column::Members,
                }
                .into());
            }
            ChangeOperation::ModifyGroup {
                name: row.require(Column::Name)?,
                kind,
                members,
                action: if action == Action::AddToGroup {
                    GroupAction::Add
                } else {
                    GroupAction::Remove
                },
                description: row.owned(Column::Description),
            }
        }
        _ => return Err(RowSkip::Action { action, key }),
    };

    Ok(Filed {
        vendor: vendor.to_string(),
        location: row.cell(Column::Location).to_string(),
        key,
        operation,
    })
}

fn dynamic_ip(row: &Row, action: Action, options: BuildOptions) -> Result<ChangeOperation, RowSkip> {
    if options.checks {
        let violations = syntax::check_dynamic_ip(row);
        if !violations.is_empty() {
            return Err(SyntaxError {
                kind: ObjectKind::DynamicIp,
                name: row.cell(Column::Members).to_string(),
                violations,
            }
            .into());
        }
    }
    let dip = DynamicIp {
        ips: row.list(Column::Members),
        tags: row.list(Column::Tag),
    };
    if dip.ips.is_empty() {
        return Err(RowError::Missing {
            column: Column::Members,
        }
        .into());
    }
    if dip.tags.is_empty() {
        return Err(RowError::Missing { column: Column::Tag }.into());
    }
    Ok(if action == Action::Delete {
        ChangeOperation::UnregisterIp(dip)
    } else {
        ChangeOperation::RegisterIp(dip)
    })
}

/// First non-empty source column of a field.
fn source_cell<'r>(row: &'r Row, spec: &FieldSpec) -> Option<(Column, &'r str)> {
    spec.columns
        .iter()
        .find_map(|column| row.text(*column).map(|text| (*column, text)))
}

/// Coerce one cell into the value type its schema field expects.
fn coerce(kind: ObjectKind, spec: &FieldSpec, column: Column, raw: &str) -> Result<FieldValue, RowError> {
    let value = match spec.ty {
        FieldType::Text | FieldType::Member => {
            if raw.starts_with('[') {
                match parse_list(raw).into_iter().next() {
                    Some(first) => FieldValue::Text(first),
                    None => {
                        return Err(RowError::Invalid {
                            column,
                            reason: "empty list where one value is expected".to_string(),
                        })
                    }
                }
            } else {
                FieldValue::text(raw)
            }
        }
        FieldType::List | FieldType::Entries => FieldValue::List(parse_list(raw)),
        FieldType::Bool => match parse_bool(raw) {
            Some(flag) => FieldValue::Bool(flag),
            None => {
                return Err(RowError::Boolean {
                    column,
                    value: raw.to_string(),
                })
            }
        },
        FieldType::Int => {
            if kind == ObjectKind::StaticRoute && spec.field == "admin_dist" && raw == "default" {
                FieldValue::Int(DEFAULT_ADMIN_DIST)
            } else {
                raw.parse().map(FieldValue::Int).map_err(|_| RowError::Integer {
                    column,
                    value: raw.to_string(),
                })?
            }
        }
        FieldType::Choice(choices) => {
            if choices.contains(&raw) || raw == "none" {
                FieldValue::text(raw)
            } else {
                return Err(RowError::Invalid {
                    column,
                    reason: format!("'{raw}' is not one of {}", choices.join(", ")),
                });
            }
        }
        FieldType::Filter => FieldValue::Text(dynamic_filter(raw)),
    };
    Ok(value)
}

/// A dynamic group filter. Bare tag lists become `'A' and 'B'`.
pub fn dynamic_filter(raw: &str) -> String {
    if raw.contains(" and ") || raw.contains(" or ") {
        return raw.to_string();
    }
    parse_list(raw)
        .iter()
        .map(|tag| format!("'{tag}'"))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// Every schema field the row supplies, coerced.
fn row_fields(row: &Row, kind: ObjectKind) -> Result<FieldMap, RowError> {
    let mut fields = FieldMap::new();
    for spec in schema::fields(kind) {
        if let Some((column, raw)) = source_cell(row, spec) {
            let value = coerce(kind, spec, column, raw)?;
            if !matches!(&value, FieldValue::List(items) if items.is_empty()) {
                fields.insert(spec.field.to_string(), value);
            }
        }
    }
    if kind == ObjectKind::Address {
        if let Some(value) = netmask_value(row)? {
            fields.insert("value".to_string(), FieldValue::Text(value));
        }
    }
    Ok(fields)
}

/// `ip/prefix` for an ip-netmask address, from the cidr, ip and netmask cells.
fn netmask_value(row: &Row) -> Result<Option<String>, RowError> {
    let subtype = row.cell(Column::Subtype);
    if !(subtype.is_empty() || subtype == "ip-netmask") {
        return Ok(None);
    }
    let cidr = row.cell(Column::Cidr);
    if cidr.contains('/') {
        return Ok(Some(cidr.to_string()));
    }
    let Some(ip) = row.ip(Column::Ip)? else {
        return Ok(None);
    };
    let prefix = if !cidr.is_empty() {
        cidr.parse::<u8>().map_err(|_| RowError::Address {
            column: Column::Cidr,
            value: cidr.to_string(),
        })?
    } else if let Some(mask) = row.text(Column::Netmask) {
        netmask_prefix(mask).ok_or_else(|| RowError::Address {
            column: Column::Netmask,
            value: mask.to_string(),
        })?
    } else if ip.is_ipv4() {
        32
    } else {
        128
    };
    Ok(Some(format!("{ip}/{prefix}")))
}

fn default_list(fields: &mut FieldMap, field: &str, value: &str) {
    fields
        .entry(field.to_string())
        .or_insert_with(|| FieldValue::List(vec![value.to_string()]));
}

fn create_object(row: &Row, kind: ObjectKind) -> Result<ConfigObject, RowSkip> {
    let name = row.require(Column::Name)?;
    let mut fields = row_fields(row, kind)?;

    match kind {
        ObjectKind::AddressGroup => match row.cell(Column::Subtype) {
            "dynamic" => {
                fields.remove("static_value");
            }
            _ => {
                fields.remove("dynamic_value");
            }
        },
        ObjectKind::SecurityRule => {
            for field in RULE_ANY_DEFAULTS {
                default_list(&mut fields, field, "any");
            }
            default_list(&mut fields, "service", "application-default");
        }
        ObjectKind::NatRule => {
            for field in NAT_ANY_DEFAULTS {
                default_list(&mut fields, field, "any");
            }
        }
        _ => {}
    }

    Ok(ConfigObject::from_fields(kind, &name, &fields)?)
}

/// Sparse patch from the non-empty cells that map to a field of `kind`.
fn edit_patch(row: &Row, kind: ObjectKind) -> Result<FieldMap, RowError> {
    let patch = row_fields(row, kind)?;
    for column in Column::ALL {
        let mapped = schema::fields(kind)
            .iter()
            .any(|spec| spec.columns.contains(column));
        let discriminator = matches!(
            column,
            Column::Vendor | Column::Type | Column::OpAction | Column::Location | Column::Name
        );
        if !mapped && !discriminator && row.text(*column).is_some() {
            debug!(
                kind = %kind,
                column = %column,
                "ignoring column with no field for this kind"
            );
        }
    }
    Ok(patch)
}
