use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_commands(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, loan, installment, amount, rate, term, date, method").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn test_cli_end_to_end() {
    let file = write_commands(&[
        "loan, L1, , 1000, 10, 2, 2024-01-15, ",
        "payment, L1, , 550, , , 2024-02-15, cash",
        "payment, L1, , 550, , , 2024-03-15, transfer",
        "loan, L2, , 1000, 10, 2, 2024-01-15, ",
        "payment, L2, 2, 100, , , 2024-02-15, card",
    ]);

    let mut cmd = Command::new(cargo_bin!("loan-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "loan,status,total_with_interest,total_paid,remaining_debt",
        ))
        .stdout(predicate::str::contains("L1,paid,1100,1100,0"))
        .stdout(predicate::str::contains("L2,active,1100,100,1000"));
}

#[test]
fn test_cli_rejected_payment_is_reported_not_applied() {
    let file = write_commands(&[
        "loan, L1, , 1000, 10, 2, 2024-01-15, ",
        "payment, L1, 1, 600, , , 2024-02-15, cash",
    ]);

    let mut cmd = Command::new(cargo_bin!("loan-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("L1,active,1100,0,1100"))
        .stderr(predicate::str::contains("exceeds remaining installment debt"));
}

#[test]
fn test_cli_canceled_loan() {
    let file = write_commands(&[
        "loan, L1, , 1000, 10, 2, 2024-01-15, ",
        "cancel, L1, , , , , , ",
        "payment, L1, , 550, , , 2024-02-15, cash",
    ]);

    let mut cmd = Command::new(cargo_bin!("loan-ledger"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("L1,canceled,1100,0,1100"))
        .stderr(predicate::str::contains("canceled loan"));
}

#[test]
fn test_cli_json_output() {
    let file = write_commands(&[
        "loan, L1, , 1000, 10, 2, 2024-01-15, ",
        "payment, L1, , 550, , , 2024-02-15, cash",
    ]);

    let mut cmd = Command::new(cargo_bin!("loan-ledger"));
    cmd.arg(file.path()).arg("--json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"active\""))
        .stdout(predicate::str::contains("\"installments\""));
}
