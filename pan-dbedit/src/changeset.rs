//! Changeset reading and the operation index.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builder::{build, BuildOptions, RowSkip};
use crate::change::{ChangeOperation, Filed};
use crate::error::InfrastructureError;
use crate::kind::{Action, ChangeKey};
use crate::row::{Column, Row};
use crate::syntax;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey {
    vendor: String,
    location: String,
    action: Action,
    key: ChangeKey,
}

/// Operations keyed by vendor, location, action and kind, in file order.
#[derive(Debug, Default)]
pub struct Changeset {
    index: BTreeMap<IndexKey, Vec<ChangeOperation>>,
}

impl Changeset {
    pub fn insert(&mut self, filed: Filed) {
        let key = IndexKey {
            vendor: filed.vendor,
            location: filed.location,
            action: filed.operation.action(),
            key: filed.key,
        };
        self.index.entry(key).or_default().push(filed.operation);
    }

    /// File-order operations with exact duplicates collapsed to the first one.
    pub fn operations(
        &self,
        vendor: &str,
        location: &str,
        action: Action,
        key: ChangeKey,
    ) -> Vec<&ChangeOperation> {
        let lookup = IndexKey {
            vendor: vendor.to_string(),
            location: location.to_string(),
            action,
            key,
        };
        let mut unique: Vec<&ChangeOperation> = Vec::new();
        for operation in self.index.get(&lookup).into_iter().flatten() {
            if !unique.contains(&operation) {
                unique.push(operation);
            }
        }
        unique
    }

    /// Every location named by at least one operation.
    pub fn locations(&self) -> BTreeSet<&str> {
        self.index.keys().map(|k| k.location.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All indexed operations, grouped by location, for reporting.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ChangeKey, &ChangeOperation)> {
        self.index.iter().flat_map(|(key, ops)| {
            ops.iter()
                .map(move |op| (key.location.as_str(), key.key, op))
        })
    }
}

/// A row that produced no operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    pub line: u64,
    pub name: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<syntax::Violation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub rows: usize,
    pub admitted: usize,
    pub skipped: Vec<SkippedRow>,
}

impl ParseReport {
    fn skip(&mut self, line: u64, name: &str, reason: &RowSkip) {
        let violations = match reason {
            RowSkip::Syntax(err) => err.violations.clone(),
            _ => Vec::new(),
        };
        match reason {
            RowSkip::Syntax(err) => warn!(
                line,
                name,
                fields = %syntax::fields_of(&err.violations),
                "junk syntax for {}, skipping row",
                err.kind
            ),
            RowSkip::Vendor(_) | RowSkip::Kind(_) | RowSkip::Action { .. } => {
                warn!(line, name, reason = %reason, "unsupported row, skipping")
            }
            _ => warn!(line, name, reason = %reason, "invalid row, skipping"),
        }
        self.skipped.push(SkippedRow {
            line,
            name: name.to_string(),
            reason: reason.to_string(),
            violations,
        });
    }
}

/// Parse changeset CSV text into an index plus a report of skipped rows.
pub fn parse_changeset<R: Read>(
    input: R,
    options: BuildOptions,
    today: NaiveDate,
) -> Result<(Changeset, ParseReport), csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(input);

    let mut changeset = Changeset::default();
    let mut report = ParseReport::default();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        report.rows += 1;
        let name = record
            .get(Column::Name.index())
            .unwrap_or("")
            .trim()
            .to_string();

        let row = match Row::normalize(line, record.iter(), today) {
            Ok(row) => row,
            Err(err) => {
                report.skip(line, &name, &RowSkip::Row(err));
                continue;
            }
        };
        match build(&row, options) {
            Ok(filed) => {
                debug!(
                    line,
                    location = %filed.location,
                    action = %filed.operation.action(),
                    key = %filed.key,
                    name = %filed.operation.name(),
                    "row admitted"
                );
                report.admitted += 1;
                changeset.insert(filed);
            }
            Err(reason) => report.skip(line, &name, &reason),
        }
    }
    info!(
        rows = report.rows,
        admitted = report.admitted,
        skipped = report.skipped.len(),
        "changeset parsed"
    );
    Ok((changeset, report))
}

pub fn read_changeset(
    path: &Path,
    options: BuildOptions,
    today: NaiveDate,
) -> Result<(Changeset, ParseReport), InfrastructureError> {
    let file = File::open(path).map_err(|err| InfrastructureError::ReadChangeset {
        path: path.to_path_buf(),
        source: csv::Error::from(err),
    })?;
    info!(path = %path.display(), "reading changeset");
    parse_changeset(file, options, today).map_err(|source| InfrastructureError::ReadChangeset {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::kind::ObjectKind;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
    }

    fn parse(text: &str) -> (Changeset, ParseReport) {
        parse_changeset(text.as_bytes(), BuildOptions::default(), today()).expect("parse")
    }

    const CSV: &str = "\
#vendor,type,op_action,location,name
palo,tag,create,DG1,TagC

palo,tag,create,DG1,TagC
palo,tag,create,DG1__lab,TagD
palo,address-group,addtogroup,DG1,grpA,,web2
cisco,tag,create,DG1,Ignored
palo,address,create,DG1,broken,ip-netmask,,10.0.0.300
";

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let (changeset, report) = parse(CSV);
        assert_eq!(report.rows, 6);
        assert_eq!(report.admitted, 4);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(changeset.len(), 4);
        assert_eq!(changeset.locations().into_iter().collect::<Vec<_>>(), vec!["DG1"]);
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let (changeset, _) = parse(CSV);
        let tags = changeset.operations("palo", "DG1", Action::Create, ChangeKey::plain(ObjectKind::Tag));
        let names: Vec<String> = tags.iter().map(|op| op.name()).collect();
        assert_eq!(names, vec!["TagC", "TagD"]);
    }

    #[test]
    fn skipped_rows_carry_name_and_reason() {
        let (_, report) = parse(CSV);
        assert_eq!(report.skipped[0].reason, "unsupported vendor 'cisco'");
        assert_eq!(report.skipped[1].name, "broken");
        assert_eq!(report.skipped[1].violations[0].field, "ip");
    }

    #[test]
    fn group_modifications_are_filed_under_their_action() {
        let (changeset, _) = parse(CSV);
        let ops = changeset.operations(
            "palo",
            "DG1",
            Action::AddToGroup,
            ChangeKey::plain(ObjectKind::AddressGroup),
        );
        assert_eq!(ops.len(), 1);
    }
}
