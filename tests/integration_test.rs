//! Integration tests for the vending machine CLI.
//!
//! These tests run the actual binary against data files in a temporary
//! directory, drive it through stdin, and check both the output and the
//! files it saves.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const GOODS: &str = "# num,name,price,stock
1,Cola,15,2
2,Water,10,0
3,Juice,50,5
";

const WALLET: &str = "# denom,count
1,5
5,3
10,1
";

/// Creates a temp dir holding Goods.txt and Wallet.txt.
fn setup(goods: &str, wallet: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Goods.txt"), goods).unwrap();
    fs::write(dir.path().join("Wallet.txt"), wallet).unwrap();
    dir
}

/// Builds a command pointed at the data files in `dir`.
fn machine(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vending-machine").unwrap();
    cmd.arg(dir.join("Goods.txt"))
        .arg(dir.join("Wallet.txt"))
        .env_remove("VENDING_ADMIN_PASSWORD")
        .env_remove("VENDING_IDLE_TIMEOUT_SECS")
        .env_remove("VENDING_REJECT_POLICY");
    cmd
}

/// Reads a data file back, ignoring comment lines.
fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.trim().to_string())
        .collect()
}

#[test]
fn test_purchase_saves_stock_and_cash() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .write_stdin("b\n1\n20\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Purchase successful!"))
        .stdout(predicate::str::contains("Change: 5 Baht"));

    let goods = data_lines(&dir.path().join("Goods.txt"));
    assert!(goods.contains(&"1,Cola,15,1".to_string()));

    let wallet = data_lines(&dir.path().join("Wallet.txt"));
    assert!(wallet.contains(&"5,2".to_string()));
    assert!(wallet.contains(&"20,1".to_string()));
    assert!(wallet.contains(&"1,5".to_string()));
}

#[test]
fn test_no_change_leaves_files_untouched() {
    let dir = setup(GOODS, "# denom,count\n1,2\n");

    machine(dir.path())
        .write_stdin("b\n1\n20\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("no change available"))
        .stdout(predicate::str::contains("Refunding 20 Baht:"));

    assert_eq!(
        fs::read_to_string(dir.path().join("Wallet.txt")).unwrap(),
        "# denom,count\n1,2\n"
    );
    assert_eq!(fs::read_to_string(dir.path().join("Goods.txt")).unwrap(), GOODS);
}

#[test]
fn test_out_of_stock_slot() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .write_stdin("b\n2\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Slot 2 is out of stock"));
}

#[test]
fn test_unsupported_denomination_aborts() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .write_stdin("b\n3\n20\n3\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid denomination 3, purchase aborted"))
        .stdout(predicate::str::contains("20 Baht x 1 notes"));
}

#[test]
fn test_reprompt_policy_from_environment() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .env("VENDING_REJECT_POLICY", "reprompt")
        .write_stdin("b\n3\n3\n50\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid denomination 3, returned"))
        .stdout(predicate::str::contains("Purchase successful!"));
}

#[test]
fn test_maintenance_replaces_products() {
    let dir = setup(GOODS, WALLET);
    let input = "m\n1234\ng\nTea\n12\n4\n\n\n\n\n\n\n\n\nc\n";

    machine(dir.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCESS GRANTED"))
        .stdout(predicate::str::contains("Products saved"));

    assert_eq!(
        data_lines(&dir.path().join("Goods.txt")),
        vec!["1,Tea,12,4".to_string()]
    );
}

#[test]
fn test_custom_admin_password() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .env("VENDING_ADMIN_PASSWORD", "letmein")
        .write_stdin("s\n1234\ns\nletmein\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCESS DENIED"))
        .stdout(predicate::str::contains("System shutdown complete"));
}

#[test]
fn test_missing_files_start_empty() {
    let dir = tempfile::tempdir().unwrap();

    machine(dir.path())
        .write_stdin("b\n1\ne\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Slot 1 is not configured"));
}

#[test]
fn test_invalid_config_fails_startup() {
    let dir = setup(GOODS, WALLET);

    machine(dir.path())
        .env("VENDING_IDLE_TIMEOUT_SECS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[test]
fn test_too_many_arguments() {
    let mut cmd = Command::cargo_bin("vending-machine").unwrap();
    cmd.args(["a", "b", "c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage"));
}
