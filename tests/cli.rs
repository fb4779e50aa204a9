use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

struct Env {
    home: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        let env = Self {
            home: tempfile::tempdir().unwrap(),
        };
        env.budgie()
            .args(["init", "--data-dir"])
            .arg(env.data_dir())
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized budgie"));
        env
    }

    fn data_dir(&self) -> PathBuf {
        self.home.path().join("data")
    }

    fn db_path(&self) -> PathBuf {
        self.data_dir().join("budgie.db")
    }

    fn budgie(&self) -> Command {
        let mut cmd = Command::cargo_bin("budgie").unwrap();
        cmd.env("HOME", self.home.path())
            .env("NO_COLOR", "1")
            .env_remove("BUDGIE_LOG");
        cmd
    }

    fn with_rent(self) -> Self {
        self.budgie()
            .args(["accounts", "add", "Checking", "--type", "checking"])
            .assert()
            .success();
        self.budgie()
            .args([
                "recurring", "add", "Rent",
                "--amount", "-1000.00",
                "--frequency", "monthly",
                "--start", "2025-01-15",
                "--account", "Checking",
                "--category", "Rent / Mortgage",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Added recurring transaction 1"));
        self
    }
}

fn query_one(db: &Path, sql: &str) -> String {
    let conn = rusqlite::Connection::open(db).unwrap();
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

#[test]
fn test_process_materializes_and_advances() {
    let env = Env::new().with_rent();

    env.budgie()
        .args(["process", "--today", "2025-01-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed, 0 failed, 1 transaction(s) created"))
        .stdout(predicate::str::contains("-$1,000.00"));

    assert_eq!(
        query_one(&env.db_path(), "SELECT next_date FROM recurring_transactions WHERE id = 1"),
        "2025-02-15"
    );
    assert_eq!(query_one(&env.db_path(), "SELECT date FROM transactions"), "2025-01-15");

    env.budgie()
        .args(["transactions", "list", "--recurring", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-15"));
}

#[test]
fn test_second_process_same_day_is_noop() {
    let env = Env::new().with_rent();
    env.budgie().args(["process", "--today", "2025-01-20"]).assert().success();
    env.budgie()
        .args(["process", "--today", "2025-01-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 processed, 0 failed, 0 transaction(s) created"));
}

#[test]
fn test_dry_run_writes_nothing() {
    let env = Env::new().with_rent();
    env.budgie()
        .args(["process", "--today", "2025-03-20", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing written"))
        .stdout(predicate::str::contains("3 transaction(s) would be created"));

    assert_eq!(
        query_one(&env.db_path(), "SELECT next_date FROM recurring_transactions WHERE id = 1"),
        "2025-01-15"
    );
    assert_eq!(
        query_one(&env.db_path(), "SELECT CAST(count(*) AS TEXT) FROM transactions"),
        "0"
    );
}

#[test]
fn test_failure_sets_exit_status_but_others_proceed() {
    let env = Env::new().with_rent();
    let conn = rusqlite::Connection::open(env.db_path()).unwrap();
    conn.execute(
        "INSERT INTO recurring_transactions \
         (user_id, amount, description, frequency, start_date, next_date, auto_process, account_id) \
         VALUES (1, NULL, 'Broken', 'weekly', '2025-01-01', '2025-01-01', 1, 1)",
        [],
    )
    .unwrap();
    drop(conn);

    env.budgie()
        .args(["process", "--today", "2025-01-20"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("1 processed, 1 failed"))
        .stdout(predicate::str::contains("FAILED #2 Broken (validation)"))
        .stderr(predicate::str::contains("1 recurring transaction(s) failed"));

    assert_eq!(
        query_one(&env.db_path(), "SELECT next_date FROM recurring_transactions WHERE id = 1"),
        "2025-02-15"
    );
}

#[test]
fn test_unreadable_row_fails_alone() {
    let env = Env::new().with_rent();
    let conn = rusqlite::Connection::open(env.db_path()).unwrap();
    conn.execute(
        "INSERT INTO recurring_transactions \
         (user_id, amount, description, frequency, start_date, next_date, auto_process, account_id) \
         VALUES (1, 'abc', 'Garbled', 'monthly', '2025-01-01', '2025-01-01', 1, 1)",
        [],
    )
    .unwrap();
    drop(conn);

    env.budgie()
        .args(["process", "--today", "2025-01-20"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1 processed, 1 failed"))
        .stdout(predicate::str::contains("FAILED #2 unreadable recurring transaction (validation)"));

    assert_eq!(
        query_one(&env.db_path(), "SELECT next_date FROM recurring_transactions WHERE id = 1"),
        "2025-02-15"
    );
}

#[test]
fn test_max_catch_up_flag_limits_one_run() {
    let env = Env::new().with_rent();
    env.budgie()
        .args(["process", "--today", "2025-06-20", "--max-catch-up", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed, 0 failed, 2 transaction(s) created"))
        .stdout(predicate::str::contains("still behind"));

    env.budgie()
        .args(["process", "--today", "2025-06-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed, 0 failed, 4 transaction(s) created"));
}

#[test]
fn test_disabled_definition_is_skipped() {
    let env = Env::new().with_rent();
    env.budgie().args(["recurring", "disable", "1"]).assert().success();
    env.budgie()
        .args(["process", "--today", "2025-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 processed"));
}

#[test]
fn test_user_scope_excludes_other_owners() {
    let env = Env::new().with_rent();
    env.budgie()
        .args(["process", "--today", "2025-01-20", "--user", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 processed"));
}

#[test]
fn test_next_shows_following_date() {
    let env = Env::new();
    env.budgie()
        .args(["accounts", "add", "Checking", "--type", "checking"])
        .assert()
        .success();
    env.budgie()
        .args([
            "recurring", "add", "Domain renewal",
            "--amount", "-12.99",
            "--frequency", "annually",
            "--start", "2024-02-29",
            "--account", "Checking",
        ])
        .assert()
        .success();
    env.budgie()
        .args(["recurring", "next", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("next on 2024-02-29, then 2025-02-28"));
}

#[test]
fn test_invalid_frequency_rejected() {
    let env = Env::new();
    env.budgie()
        .args(["accounts", "add", "Checking", "--type", "checking"])
        .assert()
        .success();
    env.budgie()
        .args([
            "recurring", "add", "Coffee",
            "--amount", "-4.50",
            "--frequency", "daily",
            "--start", "2025-01-01",
            "--account", "Checking",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid frequency"));
}

#[test]
fn test_unknown_account_rejected() {
    let env = Env::new();
    env.budgie()
        .args([
            "recurring", "add", "Coffee",
            "--amount", "-4.50",
            "--frequency", "weekly",
            "--start", "2025-01-01",
            "--account", "Nowhere",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown account: Nowhere"));
}

#[test]
fn test_status_reports_counts() {
    let env = Env::new().with_rent();
    env.budgie()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Recurring:     1"));
}
