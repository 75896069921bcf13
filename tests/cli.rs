use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn paramatch() -> Command {
    let mut cmd = Command::cargo_bin("paramatch").unwrap();
    cmd.arg("--no-color");
    cmd
}

#[test]
fn test_match_extracts_parameters() {
    paramatch()
        .args(["/application/{seg}", "/application/path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ /application/path"))
        .stdout(predicate::str::contains("seg = \"path\""))
        .stdout(predicate::str::contains("1/1 inputs matched"));
}

#[test]
fn test_no_match_exits_one() {
    paramatch()
        .args(["/application/{seg}", "/application/a/b"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ /application/a/b"));
}

#[test]
fn test_where_constraint() {
    paramatch()
        .args(["-w", "id=[0-9]+", "/path/{id}", "/path/42", "/path/abc"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("id = \"42\""))
        .stdout(predicate::str::contains("1/2 inputs matched"));
}

#[test]
fn test_typed_parameter() {
    paramatch()
        .args(["-t", "id=number", "/path/{id}", "/path/42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id = 42"));
}

#[test]
fn test_conversion_failure() {
    paramatch()
        .args(["-t", "id=number", "/path/{id}", "/path/abc"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("not a number"));
}

#[test]
fn test_regex_literals() {
    paramatch()
        .args(["--regex", "/application/.*", "/application/anything"])
        .assert()
        .success();

    paramatch()
        .args(["/application/.*", "/application/anything"])
        .assert()
        .code(1);
}

#[test]
fn test_unknown_parameter_is_usage_error() {
    paramatch()
        .args(["-w", "nope=x", "/path/{id}", "/path/1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown parameter 'nope'"));
}

#[test]
fn test_invalid_template() {
    paramatch()
        .args(["/path/{id", "/path/1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unclosed '{'"));
}

#[test]
fn test_invalid_assignment() {
    paramatch()
        .args(["-w", "id", "/path/{id}", "/path/1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected NAME=VALUE"));
}

#[test]
fn test_inputs_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "/item/1").unwrap();
    writeln!(file, "/item/2").unwrap();

    paramatch()
        .args(["/item/{n}", "-f"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2/2 inputs matched"));
}

#[test]
fn test_inputs_from_stdin() {
    paramatch()
        .args(["-s", "/item/{n}", "-f", "-"])
        .write_stdin("/item/1\n/other/2\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("1/2 inputs matched"));
}

#[test]
fn test_missing_file() {
    paramatch()
        .args(["/item/{n}", "-f", "/nonexistent/inputs.txt"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read inputs"));
}

#[test]
fn test_render() {
    paramatch()
        .args(["-r", "id=42", "-r", "other=x", "/path/{id}/{other}"])
        .assert()
        .success()
        .stdout("/path/42/x\n");
}

#[test]
fn test_render_checks_constraints() {
    paramatch()
        .args(["-w", "id=[0-9]+", "-r", "id=abc", "/path/{id}"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not satisfy"));
}

#[test]
fn test_quiet() {
    paramatch()
        .args(["-q", "/path/{id}", "/path/1"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_no_inputs() {
    paramatch()
        .arg("/path/{id}")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No inputs"));
}
