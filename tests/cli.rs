#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(roster: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("callplan-cli").unwrap();
    cmd.arg("--roster").arg(roster);
    cmd
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");

    cli(&roster)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 14 residents"));
    cli(&roster)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    cli(&roster).args(["init", "--force"]).assert().success();
}

#[test]
fn generate_reports_incomplete_quarter() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    let out = dir.path().join("schedule.csv");
    cli(&roster).arg("init").assert().success();

    cli(&roster)
        .arg("generate")
        .arg("--out-csv")
        .arg(&out)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("shifts:"))
        .stderr(predicate::str::contains("chief_input_required"));
    assert!(out.exists());

    cli(&roster)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("weekday_call"));
}

#[test]
fn override_and_explain() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    cli(&roster).arg("init").assert().success();

    cli(&roster)
        .args([
            "override",
            "--date",
            "2025-07-09",
            "--resident",
            "Dr. Chen",
            "--shift-type",
            "weekday_call",
        ])
        .assert()
        .success();
    cli(&roster)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2025-07-09 | weekday_call | Dr. Chen (PGY-3) | chief",
        ));

    cli(&roster)
        .args(["explain", "--resident", "Dr. Chen", "--date", "2025-07-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- post-call recovery until 2025-07-10"));
    cli(&roster)
        .args(["explain", "--resident", "Dr. Haddad", "--date", "2025-07-22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- time off"));
    cli(&roster)
        .args(["explain", "--resident", "Dr. Larsen", "--date", "2025-07-22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dr. Larsen is available on 2025-07-22"));
}

#[test]
fn bad_input_is_rejected() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    cli(&roster).arg("init").assert().success();

    cli(&roster)
        .args([
            "override",
            "--date",
            "2025-07-09",
            "--resident",
            "Dr. Chen",
            "--shift-type",
            "night_call",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown shift type"));
    cli(&roster)
        .args([
            "override",
            "--date",
            "2025-12-01",
            "--resident",
            "Dr. Chen",
            "--shift-type",
            "weekday_call",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the scheduling period"));
    cli(&roster)
        .args(["explain", "--resident", "Dr. Nobody", "--date", "2025-07-22"])
        .assert()
        .failure();
}
