//! Tests for `govgate graph`.

use crate::support::builders::RegistryBuilder;
use crate::support::harness::{exit_code, stderr, stdout, TestHarness};

#[test]
fn test_build_order_lists_dependencies_first() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("app", &["billing"])
        .module("billing", &["auth"])
        .module("auth", &[])
        .write_to(&harness);

    let output = harness.run(&["--quiet", "graph"]);
    assert_eq!(exit_code(&output), 0);
    assert_eq!(stdout(&output), "auth\nbilling\napp\n");

    let output = harness.run(&["--quiet", "graph", "--topological"]);
    assert_eq!(stdout(&output), "app\nbilling\nauth\n");
}

#[test]
fn test_summary_shows_roots_and_leaves() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("app", &["auth"])
        .module("auth", &[])
        .write_to(&harness);

    let output = harness.run(&["graph"]);
    let text = stdout(&output);
    assert!(text.contains("Build order"));
    assert!(text.contains("roots: app, leaves: auth"));
}

#[test]
fn test_cycles_are_reported() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("a", &["b"])
        .module("b", &["a"])
        .module("c", &["c"])
        .write_to(&harness);

    let output = harness.run(&["graph"]);
    assert_eq!(exit_code(&output), 1);
    let err = stderr(&output);
    assert!(err.contains("2 cycle(s)"));
    assert!(err.contains("a -> b -> a"));
    assert!(err.contains("c -> c"));
}

#[test]
fn test_graph_without_registry() {
    let harness = TestHarness::new();
    let output = harness.run(&["graph"]);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr(&output).contains("registry/modules.yaml"));
}
