//! Shared fixtures for unit tests.

use chrono::NaiveDate;
use panos_xml::parse;

use crate::builder::{build, BuildOptions};
use crate::changeset::Changeset;
use crate::device::XmlDevice;
use crate::predefined::default_predefined;
use crate::row::{Column, Row};

const PANORAMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/panorama.xml"));
const FIREWALL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures/firewall.xml"));

pub fn panorama() -> XmlDevice {
    XmlDevice::from_tree(parse(PANORAMA.as_bytes()).expect("panorama fixture"), default_predefined())
}

pub fn firewall() -> XmlDevice {
    XmlDevice::from_tree(parse(FIREWALL.as_bytes()).expect("firewall fixture"), default_predefined())
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).expect("date")
}

/// A normalized `palo` row with the given cells set.
pub fn row(cells: &[(Column, &str)]) -> Row {
    let mut raw = vec![String::new(); Column::COUNT];
    raw[Column::Vendor.index()] = "palo".into();
    for (column, value) in cells {
        raw[column.index()] = (*value).to_string();
    }
    Row::normalize(1, raw, today()).expect("row")
}

/// Index the given rows, panicking on any that would be skipped.
pub fn changeset(rows: &[&[(Column, &str)]]) -> Changeset {
    let mut changeset = Changeset::default();
    for cells in rows {
        let filed = build(&row(cells), BuildOptions::default()).expect("row admitted");
        changeset.insert(filed);
    }
    changeset
}
