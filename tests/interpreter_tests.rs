// Integration tests for the Ruff interpreter
//
// These run complete Ruff programs through the `ruff run` binary and check
// stdout, stderr and exit codes end-to-end, matching spec.md §8's scenarios.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn script(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file creation succeeds");
    file.write_all(source.as_bytes()).expect("write succeeds");
    file
}

fn run(source: &str) -> assert_cmd::assert::Assert {
    let file = script(source);
    Command::cargo_bin("ruff")
        .expect("binary builds")
        .arg("run")
        .arg(file.path())
        .assert()
}

#[test]
fn prints_arithmetic_result() {
    run("print 1 + 2 * 3;").success().stdout(predicate::str::contains("7"));
}

#[test]
fn if_else_picks_the_right_branch() {
    let source = r#"
        var x = 10;
        if (x > 5) {
            print "big";
        } else {
            print "small";
        }
    "#;
    run(source).success().stdout(predicate::str::contains("big"));
}

#[test]
fn while_loop_accumulates() {
    let source = r#"
        var i = 0;
        var total = 0;
        while (i < 5) {
            total = total + i;
            i = i + 1;
        }
        print total;
    "#;
    run(source).success().stdout(predicate::str::contains("10"));
}

#[test]
fn for_loop_counts_up() {
    let source = r#"
        for (var i = 0; i < 3; i = i + 1) {
            print i;
        }
    "#;
    run(source).success().stdout(predicate::str::contains("0\n1\n2\n"));
}

#[test]
fn closures_capture_outer_locals() {
    let source = r#"
        fun makeAdder(a) {
            fun adder(b) {
                return a + b;
            }
            return adder;
        }
        var addFive = makeAdder(5);
        print addFive(3);
    "#;
    run(source).success().stdout(predicate::str::contains("8"));
}

#[test]
fn recursive_function_computes_fibonacci() {
    let source = r#"
        fun fib(n) {
            if (n < 2) { return n; }
            return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
    "#;
    run(source).success().stdout(predicate::str::contains("55"));
}

#[test]
fn compile_error_exits_65() {
    run("print ;").failure().code(65);
}

#[test]
fn runtime_error_exits_70_with_stack_trace() {
    run("print x;").failure().code(70).stderr(predicate::str::contains("Undefined variable"));
}

#[test]
fn missing_file_exits_64() {
    Command::cargo_bin("ruff")
        .expect("binary builds")
        .arg("run")
        .arg("/no/such/file.ruff")
        .assert()
        .failure()
        .code(64);
}

#[test]
fn closure_over_a_block_scope_local_survives_the_scope_ending() {
    let source = r#"
        fun outer() {
            var getter;
            { var a = 1; fun get() { return a; } getter = get; }
            var b = 2;
            return getter();
        }
        print outer();
    "#;
    run(source).success().stdout(predicate::str::contains("1"));
}

#[test]
fn and_or_short_circuit() {
    let source = r#"
        fun loud() {
            print "called";
            return true;
        }
        print false and loud();
        print true or loud();
    "#;
    let assert = run(source).success();
    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("called"));
}
