use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn pan_dbedit() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pan-dbedit"))
}

#[test]
fn check_lists_admitted_operations_and_skipped_rows() {
    pan_dbedit()
        .arg("check")
        .arg("--changes")
        .arg(fixture("fixtures/changes/panorama-dg1.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("rows=5 admitted=4 skipped=1"))
        .stdout(predicate::str::contains("name=bad-host"))
        .stdout(predicate::str::contains(
            "OP location=DG1 action=create type=address name=host1",
        ))
        .stdout(predicate::str::contains(
            "OP location=DG1 action=addtogroup type=address-group name=web-servers",
        ));
}

#[test]
fn strict_check_fails_on_skipped_rows() {
    pan_dbedit()
        .arg("check")
        .arg("--strict")
        .arg("--changes")
        .arg(fixture("fixtures/changes/panorama-dg1.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("check failed in strict mode: 1 row(s) skipped"));
}

#[test]
fn unsupported_vendor_rows_are_reported() {
    pan_dbedit()
        .arg("check")
        .arg("--changes")
        .arg(fixture("fixtures/changes/firewall-vsys1.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("admitted=4 skipped=1"))
        .stdout(predicate::str::contains("unsupported vendor 'junos'"));
}

#[test]
fn json_check_report() {
    let output = pan_dbedit()
        .arg("check")
        .arg("--format")
        .arg("json")
        .arg("--quiet")
        .arg("--changes")
        .arg(fixture("fixtures/changes/panorama-dg1.csv"))
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["parse"]["admitted"], 4);
    assert_eq!(report["parse"]["skipped"][0]["name"], "bad-host");
    assert_eq!(report["operations"][0]["type"], "tag");
}

#[test]
fn missing_changeset_is_an_error() {
    pan_dbedit()
        .arg("check")
        .arg("--changes")
        .arg(fixture("fixtures/changes/does-not-exist.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read changeset"));
}
