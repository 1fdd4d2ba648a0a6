//! Tests for `--version`, `completion` and `man`.

use crate::support::harness::{exit_code, stdout, TestHarness};

#[test]
fn test_long_version_includes_build_info() {
    let harness = TestHarness::new();

    let output = harness.run(&["--version"]);
    assert_eq!(exit_code(&output), 0);
    let text = stdout(&output);
    assert!(text.starts_with(&format!("govgate {}", env!("CARGO_PKG_VERSION"))));
    assert!(text.contains("commit: "));
    assert!(text.contains("built: "));

    let output = harness.run(&["-V"]);
    assert_eq!(
        stdout(&output).trim(),
        format!("govgate {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_version_is_not_a_subcommand() {
    let harness = TestHarness::new();
    let output = harness.run(&["version"]);
    assert_eq!(exit_code(&output), 2);
}

#[test]
fn test_man_writes_page_per_command() {
    let harness = TestHarness::new();

    let output = harness.run(&["man", "--out-dir", "share/man"]);
    assert_eq!(exit_code(&output), 0);
    assert!(harness.exists("share/man/govgate.1"));
    assert!(harness.exists("share/man/govgate-validate.1"));
    assert!(harness.exists("share/man/govgate-graph.1"));
    assert!(stdout(&output).contains("govgate-validate.1"));
}

#[test]
fn test_completion_script() {
    let harness = TestHarness::new();
    let output = harness.run(&["completion", "zsh"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).contains("#compdef govgate"));
}
