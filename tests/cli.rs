//! Integration test: the binary's argument surface.

use std::process::Command;

fn pipelog(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_pipelog"))
        .args(args)
        .output()
        .expect("Failed to execute binary")
}

#[test]
fn binary_prints_version() {
    let output = pipelog(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "Expected version in output, got: {}",
        stdout
    );
}

#[test]
fn help_lists_auto_open_values() {
    let output = pipelog(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--auto-open"), "got: {}", stdout);
    assert!(stdout.contains("--search"), "got: {}", stdout);
}

#[test]
fn invalid_auto_open_is_rejected_before_startup() {
    let output = pipelog(&["--auto-open", "sometimes"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("sometimes"), "got: {}", stderr);
}
