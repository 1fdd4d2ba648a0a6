//! End-to-end tests for `govgate validate`.

use crate::support::builders::{RegistryBuilder, RulesBuilder};
use crate::support::harness::{exit_code, stderr, stdout, TestHarness};

fn billing_project() -> TestHarness {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("auth", &[])
        .module("billing", &["auth"])
        .urn("urn:acme:svc:billing:1.0", "billing")
        .urn("urn:acme:svc:auth:1.0", "auth")
        .write_to(&harness);
    RulesBuilder::new()
        .rule("service-uses", "references", &["resolve: modules", "field: uses"])
        .write_to(&harness);
    harness
}

#[test]
fn test_clean_project_passes() {
    let harness = billing_project();
    harness.write("services/api.yaml", "name: api\nuses: [billing, auth]\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("PASS 0 errors, 0 warnings"));

    let report = harness.report();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["pass"], true);
    assert_eq!(report["summary"]["modules"], 2);
    assert_eq!(report["summary"]["urns"], 2);
    assert_eq!(report["order"], serde_json::json!(["billing", "auth"]));
    assert!(report["abort"].is_null());
}

#[test]
fn test_unknown_reference_fails_gate() {
    let harness = billing_project();
    harness.write("services/api.yaml", "name: api\nuses: [billing, ghost]\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 1);
    assert!(stdout(&output).contains("reference to unknown module 'ghost'"));

    let report = harness.report();
    assert_eq!(report["pass"], false);
    assert_eq!(report["summary"]["errors"], 1);
    assert_eq!(report["findings"][0]["rule"], "service-uses");
    assert_eq!(report["findings"][0]["location"]["source"], "services/api.yaml");
}

#[test]
fn test_duplicate_module_aborts() {
    let harness = TestHarness::new();
    harness.write(
        "registry/modules.yaml",
        "modules:\n  - name: auth\n---\nmodules:\n  - name: auth\n",
    );
    harness.write("registry/urns.yaml", "urns: []\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 2);
    assert!(stdout(&output).contains("run aborted during REGISTERING"));

    let report = harness.report();
    assert_eq!(report["status"], "aborted");
    assert_eq!(report["pass"], false);
    assert_eq!(report["abort"]["stage"], "REGISTERING");
    assert_eq!(report["abort"]["kind"], "duplicate_key");
}

#[test]
fn test_missing_registry_aborts() {
    let harness = TestHarness::new();
    harness.write("registry/urns.yaml", "urns: []\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 2);
    let report = harness.report();
    assert_eq!(report["abort"]["stage"], "LOADING");
    assert_eq!(report["abort"]["kind"], "missing_source");
}

#[test]
fn test_cycle_fails_gate() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("a", &["b"])
        .module("b", &["a"])
        .write_to(&harness);

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 1);

    let report = harness.report();
    assert_eq!(report["findings"][0]["category"], "cycle");
    assert_eq!(report["findings"][0]["rule"], "graph.cycle");
    assert_eq!(report["order"], serde_json::json!([]));
}

#[test]
fn test_malformed_source_is_a_finding() {
    let harness = billing_project();
    harness.write("services/broken.yaml", "name: [unclosed\n");
    harness.write("services/api.yaml", "uses: [auth]\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 1);

    let report = harness.report();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["findings"][0]["rule"], "document.parse");
    assert_eq!(report["findings"][0]["location"]["source"], "services/broken.yaml");
}

#[test]
fn test_dry_run_writes_nothing() {
    let harness = billing_project();
    let output = harness.validate(&["--dry-run"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).contains("Dry run"));
    assert!(!harness.exists(".govgate/report.json"));
}

#[test]
fn test_json_format_matches_artifact() {
    let harness = billing_project();
    harness.write("services/api.yaml", "uses: [ghost]\n");

    let output = harness.validate(&["--format", "json"]);
    assert_eq!(exit_code(&output), 1);
    assert_eq!(stdout(&output), harness.read(".govgate/report.json"));
}

#[test]
fn test_reports_are_deterministic() {
    let harness = billing_project();
    harness.write("services/a.yaml", "uses: [ghost]\n");
    harness.write("services/b.yaml", "uses: [phantom]\n---\nuses: [auth]\n");

    harness.validate(&["--jobs", "1"]);
    let first = harness.read(".govgate/report.json");
    harness.validate(&["--jobs", "8"]);
    let second = harness.read(".govgate/report.json");
    assert_eq!(first, second);
}

#[test]
fn test_strict_fails_on_warnings() {
    let harness = TestHarness::new();
    RegistryBuilder::new().module("My_Module", &[]).write_to(&harness);
    RulesBuilder::new()
        .rule(
            "kebab-modules",
            "naming",
            &["severity: warning", "pattern: '^[a-z][a-z0-9-]*$'"],
        )
        .write_to(&harness);

    assert_eq!(exit_code(&harness.validate(&[])), 0);
    assert_eq!(harness.report()["summary"]["warnings"], 1);

    assert_eq!(exit_code(&harness.validate(&["--strict"])), 1);
}

#[test]
fn test_markdown_output() {
    let harness = billing_project();
    let output = harness.validate(&["--output", "out/report.md"]);
    assert_eq!(exit_code(&output), 0);

    let markdown = harness.read("out/report.md");
    assert!(markdown.starts_with("# Governance Validation Report"));
    assert!(markdown.contains("**Gate:** PASS"));
}

#[test]
fn test_invalid_rules_exit_2() {
    let harness = billing_project();
    RulesBuilder::new()
        .rule("bad", "naming", &["pattern: '(['"])
        .write_to(&harness);

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr(&output).contains("Invalid rule configuration"));
    assert!(!harness.exists(".govgate/report.json"));
}

#[test]
fn test_quiet_prints_nothing() {
    let harness = billing_project();
    let output = harness.run(&["--quiet", "validate"]);
    assert_eq!(exit_code(&output), 0);
    assert!(stdout(&output).is_empty());
    assert!(harness.exists(".govgate/report.json"));
}

#[test]
fn test_validate_other_directory() {
    let harness = billing_project();
    let outer = TestHarness::new();
    let target = harness.path().to_string_lossy().to_string();

    let output = outer.validate(&[&target]);
    assert_eq!(exit_code(&output), 0);
    assert!(harness.exists(".govgate/report.json"));
    assert!(!outer.exists(".govgate/report.json"));
}
