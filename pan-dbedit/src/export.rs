//! Live configuration written back out in changeset form.
//!
//! Every exported row is a valid create row once `op_action` is filled in.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::builder::VENDOR;
use crate::device::DeviceClient;
use crate::error::DeviceError;
use crate::kind::{ChangeKey, ObjectKind};
use crate::objects::{AddressType, ConfigObject};
use crate::row::Column;
use crate::schema;
use crate::scope::{Location, Platform, Scope};

/// Marker cell closing every exported row.
const END: &str = "end";

const OBJECT_KINDS: [ObjectKind; 7] = [
    ObjectKind::Tag,
    ObjectKind::Address,
    ObjectKind::AddressGroup,
    ObjectKind::Service,
    ObjectKind::ServiceGroup,
    ObjectKind::Application,
    ObjectKind::ApplicationGroup,
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error("failed to write export {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

/// Changeset rows for every object in `scopes`, in dependency order per scope.
pub fn export_rows<D: DeviceClient>(
    device: &D,
    scopes: &[Scope],
) -> Result<Vec<Vec<String>>, DeviceError> {
    let platform = device.info().platform;
    let mut rows = Vec::new();
    for scope in scopes {
        let mut batches: Vec<(Location, ChangeKey)> = Vec::new();
        if let Scope::VirtualRouter(_) = scope {
            batches.push((
                Location::new(scope.clone()),
                ChangeKey::plain(ObjectKind::StaticRoute),
            ));
        } else {
            for kind in OBJECT_KINDS {
                batches.push((Location::new(scope.clone()), ChangeKey::plain(kind)));
            }
            for kind in [ObjectKind::SecurityRule, ObjectKind::NatRule] {
                for rulebase in scope.rulebases(platform) {
                    batches.push((
                        Location::rules(scope.clone(), *rulebase),
                        ChangeKey::rule(kind, *rulebase),
                    ));
                }
            }
        }

        let before = rows.len();
        for (location, key) in batches {
            for object in device.fetch_all(&location, key.kind)? {
                rows.push(object_row(platform, scope, key, &object));
            }
        }
        debug!(%scope, rows = rows.len() - before, "scope exported");
    }
    Ok(rows)
}

/// One row: identity columns, then each schema field in its first column.
fn object_row(platform: Platform, scope: &Scope, key: ChangeKey, object: &ConfigObject) -> Vec<String> {
    let mut cells = vec![String::new(); Column::COUNT];
    let mut set = |column: Column, value: String| cells[column.index()] = value;

    set(Column::Vendor, VENDOR.to_string());
    set(Column::Type, key.to_string());
    set(Column::Location, scope.label(platform).to_string());
    set(Column::Name, object.name().to_string());

    let fields = object.to_fields();
    for spec in schema::fields(key.kind) {
        let (Some(value), Some(column)) = (fields.get(spec.field), spec.columns.first()) else {
            continue;
        };
        if value.as_list().is_some_and(<[String]>::is_empty) {
            continue;
        }
        set(*column, value.to_string());
    }

    match object {
        ConfigObject::Address(address) if address.address_type != AddressType::IpNetmask => {
            set(Column::Cidr, String::new());
            set(Column::Value, address.value.clone());
        }
        ConfigObject::AddressGroup(_) => {
            let subtype = if fields.contains_key("dynamic_value") {
                "dynamic"
            } else {
                "static"
            };
            set(Column::Subtype, subtype.to_string());
        }
        _ => {}
    }

    cells.push(END.to_string());
    cells
}

/// `#vendor,type,...,end`. Starts with `#` so readers skip it as a comment.
pub fn header_line() -> String {
    let mut headers: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
    headers.push(END);
    format!("#{}", headers.join(","))
}

/// Header line, then every row with every cell quoted.
pub fn write_changeset<W: Write>(mut out: W, rows: &[Vec<String>]) -> Result<(), csv::Error> {
    writeln!(out, "{}", header_line())?;
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Export `scopes` from `device` to `path`. Returns the number of rows written.
pub fn export_to_path<D: DeviceClient>(
    device: &D,
    scopes: &[Scope],
    path: &Path,
) -> Result<usize, ExportError> {
    let rows = export_rows(device, scopes)?;
    let write_error = |source: csv::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|err| write_error(csv::Error::from(err)))?;
    write_changeset(BufWriter::new(file), &rows).map_err(write_error)?;
    info!(path = %path.display(), rows = rows.len(), "changeset exported");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::BuildOptions;
    use crate::change::ChangeOperation;
    use crate::changeset::parse_changeset;
    use crate::kind::Namespace;
    use crate::predefined::default_predefined;
    use crate::resolver::{ReferenceResolver, ReferenceSnapshot};
    use crate::testing;
    use crate::validator::validate_create;

    fn dg1() -> Vec<Scope> {
        vec![Scope::DeviceGroup("DG1".into())]
    }

    fn cell<'r>(row: &'r [String], column: Column) -> &'r str {
        &row[column.index()]
    }

    fn find<'r>(rows: &'r [Vec<String>], name: &str) -> &'r [String] {
        rows.iter()
            .find(|row| cell(row, Column::Name) == name)
            .unwrap_or_else(|| panic!("{name} not exported"))
    }

    #[test]
    fn device_group_rows_follow_the_changeset_layout() {
        let device = testing::panorama();
        let rows = export_rows(&device, &dg1()).expect("export");

        let names: Vec<&str> = rows.iter().map(|row| cell(row, Column::Name)).collect();
        assert_eq!(
            names,
            vec![
                "TagA", "TagB", "web1", "web2", "grpA", "web-servers", "tcp-8080", "web-svcs",
                "apps-basic", "allow-web", "deny-rest",
            ]
        );

        let web1 = find(&rows, "web1");
        assert_eq!(web1.len(), Column::COUNT + 1);
        assert_eq!(web1.last().map(String::as_str), Some("end"));
        assert_eq!(cell(web1, Column::Vendor), "palo");
        assert_eq!(cell(web1, Column::OpAction), "");
        assert_eq!(cell(web1, Column::Location), "DG1");
        assert_eq!(cell(web1, Column::Cidr), "10.1.0.11/32");
        assert_eq!(cell(web1, Column::Tag), "['TagA']");

        let group = find(&rows, "web-servers");
        assert_eq!(cell(group, Column::Subtype), "static");
        assert_eq!(cell(group, Column::Members), "['web1', 'web2']");

        let rule = find(&rows, "allow-web");
        assert_eq!(cell(rule, Column::Type), "pre-security-rule");
        assert_eq!(cell(rule, Column::LogEnd), "TRUE");
        assert_eq!(cell(find(&rows, "deny-rest"), Column::Type), "post-security-rule");
    }

    #[test]
    fn firewall_routes_export_under_their_router() {
        let device = testing::firewall();
        let rows = export_rows(&device, &[Scope::VirtualRouter("default".into())]).expect("export");
        let route = find(&rows, "to-core");
        assert_eq!(cell(route, Column::Type), "route");
        assert_eq!(cell(route, Column::Location), "default");
    }

    #[test]
    fn written_file_quotes_cells_and_starts_with_a_comment_header() {
        let device = testing::panorama();
        let rows = export_rows(&device, &dg1()).expect("export");
        let mut out = Vec::new();
        write_changeset(&mut out, &rows).expect("write");
        let text = String::from_utf8(out).expect("utf8");

        let mut lines = text.lines();
        let header = lines.next().expect("header");
        assert!(header.starts_with("#vendor,type,op_action,location,name,"));
        assert!(header.ends_with(",end"));
        let first = lines.next().expect("row");
        assert!(first.starts_with("\"palo\",\"tag\",\"\",\"DG1\",\"TagA\","));
        assert!(first.ends_with(",\"end\""));
    }

    #[test]
    fn exported_objects_validate_as_creates_against_an_empty_scope() {
        let device = testing::panorama();
        let rows = export_rows(&device, &dg1()).expect("export");
        let exported: Vec<String> = rows.iter().map(|row| cell(row, Column::Name).to_string()).collect();
        let mut out = Vec::new();
        write_changeset(&mut out, &rows).expect("write");

        let (changeset, report) =
            parse_changeset(out.as_slice(), BuildOptions::default(), testing::today()).expect("parse");
        assert!(report.skipped.is_empty(), "{:?}", report.skipped);
        assert_eq!(report.admitted, exported.len());

        // Nothing but the zones and built-in names the rules lean on.
        let predefined = default_predefined();
        let base = ReferenceSnapshot::from_names([
            (Namespace::Zone, vec!["trust".to_string(), "untrust".to_string()]),
            (Namespace::Application, predefined.applications.iter().cloned().collect()),
            (Namespace::Service, predefined.services.iter().cloned().collect()),
        ]);
        let mut resolver = ReferenceResolver::from_snapshot(base);
        let mut admitted = Vec::new();
        for (_, key, operation) in changeset.iter() {
            assert!(matches!(operation, ChangeOperation::Create(_)));
            let namespace = key.kind.namespace(key.rulebase);
            validate_create(operation, &resolver.snapshot_for(namespace))
                .unwrap_or_else(|err| panic!("{} rejected: {err}", operation.name()));
            resolver.admit(namespace, operation.name());
            admitted.push(operation.name());
        }
        assert_eq!(admitted, exported);
    }
}
