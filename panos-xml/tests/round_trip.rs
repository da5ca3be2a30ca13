use std::path::PathBuf;

use panos_xml::{parse, parse_file, write, write_file, ConfigPath};
use pretty_assertions::assert_eq;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn firewall_fixture_survives_write_and_reparse() {
    let first = parse_file(&fixture("fixtures/firewall.xml")).expect("initial parse");
    let written = write(&first).expect("write");
    let second = parse(&written).expect("re-parse");

    assert_eq!(first, second);
}

#[test]
fn panorama_fixture_round_trips_through_file() {
    let node = parse_file(&fixture("fixtures/panorama.xml")).expect("parse");
    let out_dir = tempfile::tempdir().expect("tempdir");
    let out_path = out_dir.path().join("panorama-copy.xml");

    write_file(&node, &out_path).expect("write_file");
    let reparsed = parse_file(&out_path).expect("parse_file");

    assert_eq!(node, reparsed);
}

#[test]
fn device_group_entries_are_addressable() {
    let node = parse_file(&fixture("fixtures/panorama.xml")).expect("parse");
    let groups = ConfigPath::parse("/config/devices/entry[@name='localhost.localdomain']/device-group")
        .expect("path")
        .select(&node)
        .expect("device-group container");

    assert_eq!(groups.entry_names(), vec!["DG1", "DG2"]);
}
