use assert_cmd::Command;
use assert_cmd::cargo_bin;
use predicates::prelude::*;

#[test]
fn test_garbage_menu_input_is_ignored() {
    let mut cmd = Command::new(cargo_bin!("cardbank"));
    cmd.write_stdin("abc\n\n99\n-1\n0\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1. Create an account").count(5))
        .stdout(predicate::str::ends_with("Bye!\n"));
}

#[test]
fn test_malformed_login_is_rejected() {
    let mut cmd = Command::new(cargo_bin!("cardbank"));
    cmd.write_stdin("2\nnot-a-card\n12\n2\n4000008449433403\n0000\n0\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Wrong card number or PIN!").count(2))
        .stdout(predicate::str::contains("You have successfully logged in!").not());
}

#[test]
fn test_input_ending_mid_prompt_exits_cleanly() {
    let mut cmd = Command::new(cargo_bin!("cardbank"));
    cmd.write_stdin("2\n4000008449433403\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Enter your PIN:"))
        .stdout(predicate::str::ends_with("Bye!\n"));
}
