use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn sayulisp_eval_prints_value() {
    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.arg("eval").arg("(+ 1 2 3)");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("6"));
}

#[test]
fn sayulisp_eval_display() {
    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.arg("eval").arg(r#"(display "Hello from Sayulisp!")"#);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from Sayulisp!"));
}

#[test]
fn sayulisp_run_script() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("main.scm");
    fs::write(
        &script,
        r#"
        ; greet everyone on the list
        (define (greet name) (display "Hello, " name "!"))
        (for (name '("Ada" "Grace")) (greet name))
        "#,
    )
    .expect("write script");

    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello, Ada!"))
        .stdout(predicate::str::contains("Hello, Grace!"));
}

#[test]
fn sayulisp_reports_uncaught_exceptions() {
    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.arg("eval").arg("(car missing)");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error: @unbound: 'missing' is not bound."));
}

#[test]
fn sayulisp_limits_recursion_depth() {
    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.args(["--max-depth", "500", "eval", "(define (f) (f)) (f)"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("@runtime-error"));
}

#[test]
fn sayulisp_run_missing_script_fails() {
    let dir = tempdir().expect("create temp dir");
    let mut cmd = Command::cargo_bin("sayulisp").expect("binary exists");
    cmd.arg("run").arg(dir.path().join("absent.scm"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("I/O error"));
}
