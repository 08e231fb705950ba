//! End-to-end tests of the `toi` binary, exercising it the way a user would:
//! as a subprocess with real files and real stdin.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn script(contents: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("create temp script");
    f.write_all(contents.as_bytes()).expect("write temp script");
    f
}

#[test]
fn runs_a_script_and_prints_its_output() {
    let f = script("println(1 + 2 * 3)\n");
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::eq("7\n"));
}

#[test]
fn reads_script_from_stdin_when_no_path_given() {
    Command::cargo_bin("toi")
        .unwrap()
        .write_stdin("println(\"hi\")\n")
        .assert()
        .success()
        .stdout(predicate::eq("hi\n"));
}

#[test]
fn passes_stdin_through_as_runtime_input_when_a_script_path_is_given() {
    let f = script("line = inputLines()\nprintln(line)\n");
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .write_stdin("hello\n")
        .assert()
        .success()
        .stdout(predicate::eq("[hello]\n"));
}

#[test]
fn a_parse_error_exits_nonzero_with_a_diagnostic() {
    let f = script("if {\n");
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn a_runtime_error_exits_nonzero_with_a_diagnostic() {
    let f = script("println(1/0)\n");
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn minus_o_writes_a_readable_bytecode_file() {
    let f = script("println(1 + 2)\n");
    let out = NamedTempFile::new().unwrap();
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .arg("-o")
        .arg(out.path())
        .write_stdin("")
        .assert()
        .success();

    let contents = std::fs::read_to_string(out.path()).unwrap();
    assert!(contents.contains("constants"));
    assert!(contents.contains("instructions"));
}

#[test]
fn verbose_flag_is_accepted_and_does_not_change_stdout() {
    let f = script("println(42)\n");
    Command::cargo_bin("toi")
        .unwrap()
        .arg(f.path())
        .arg("--verbose")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::eq("42\n"));
}
