use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use tasktide::error::exit_codes;

fn tasktide(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tasktide").expect("binary");
    cmd.env("TASKTIDE_HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn login_add_and_list() {
    let home = tempfile::tempdir().unwrap();

    tasktide(&home)
        .args(["login", "ann"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as ann (0 tasks)."));

    tasktide(&home)
        .args(["add", "Buy milk", "--priority", "high"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task added (id = t_"));

    tasktide(&home)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("Progress: 0% (0/1 done)"));

    tasktide(&home)
        .arg("whoami")
        .assert()
        .success()
        .stdout("ann\n");
}

#[test]
fn list_json_reports_view() {
    let home = tempfile::tempdir().unwrap();
    tasktide(&home).args(["login", "ann"]).assert().success();
    tasktide(&home)
        .args(["add", "Old", "--due", "2000-01-01"])
        .assert()
        .success();

    let output = tasktide(&home).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["overdue"][0]["title"], "Old");
    assert_eq!(view["progressPercent"], 0);
}

#[test]
fn errors_map_to_exit_codes() {
    let home = tempfile::tempdir().unwrap();

    tasktide(&home)
        .args(["add", "Nobody home"])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(predicate::str::contains("No active user"));

    tasktide(&home).args(["login", "ann"]).assert().success();

    tasktide(&home)
        .args(["add", "   "])
        .assert()
        .code(exit_codes::USER_ERROR)
        .stderr(predicate::str::contains("title must not be empty"));

    tasktide(&home)
        .args(["add", "Bad date", "--due", "2024-02-30"])
        .assert()
        .code(exit_codes::USER_ERROR);

    tasktide(&home)
        .args(["remove", "t_missing"])
        .assert()
        .code(exit_codes::NOT_FOUND);
}

#[test]
fn logout_then_whoami_fails() {
    let home = tempfile::tempdir().unwrap();
    tasktide(&home).args(["login", "ann"]).assert().success();
    tasktide(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out ann."));
    tasktide(&home)
        .arg("whoami")
        .assert()
        .code(exit_codes::USER_ERROR);
    tasktide(&home)
        .arg("users")
        .assert()
        .success()
        .stdout(predicate::str::contains("ann"));
}
