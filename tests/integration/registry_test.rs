//! Tests for `govgate registry` and `govgate rules`.

use crate::support::builders::{RegistryBuilder, RulesBuilder};
use crate::support::harness::{exit_code, stderr, stdout, TestHarness};

fn project() -> TestHarness {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("auth", &[])
        .module("billing", &["auth"])
        .urn("urn:acme:svc:billing:1.0", "billing")
        .urn("urn:acme:svc:billing:2.0", "billing")
        .write_to(&harness);
    harness
}

#[test]
fn test_lists_modules_with_urns() {
    let harness = project();
    let output = harness.run(&["registry"]);
    assert_eq!(exit_code(&output), 0);

    let text = stdout(&output);
    assert!(text.contains("auth"));
    assert!(text.contains("depends on: auth"));
    assert!(text.contains("urn:acme:svc:billing:1.0"));
    assert!(text.contains("urn:acme:svc:billing:2.0"));
    assert!(text.contains("2 modules, 2 URNs"));
}

#[test]
fn test_single_module() {
    let harness = project();
    let output = harness.run(&["registry", "--module", "auth"]);
    assert_eq!(exit_code(&output), 0);
    assert!(!stdout(&output).contains("urn:acme"));

    let output = harness.run(&["registry", "--module", "ghost"]);
    assert_eq!(exit_code(&output), 1);
    assert!(stderr(&output).contains("Module 'ghost' is not registered"));
}

#[test]
fn test_rules_grouped_by_family() {
    let harness = project();
    RulesBuilder::new()
        .rule("uses", "references", &["resolve: modules", "field: uses"])
        .rule("kebab", "naming", &["severity: warning", "pattern: '^[a-z-]+$'"])
        .write_to(&harness);

    let output = harness.run(&["rules"]);
    assert_eq!(exit_code(&output), 0);
    let text = stdout(&output);
    let naming = text.find("naming").unwrap();
    let references = text.find("references").unwrap();
    assert!(naming < references);
    assert!(text.contains("kebab"));
    assert!(text.contains("warn"));
}

#[test]
fn test_no_rules_configured() {
    let harness = project();
    let output = harness.run(&["rules"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).contains("No rules configured"));
}
