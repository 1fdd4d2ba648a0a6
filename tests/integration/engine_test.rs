//! Library-level runs over a project on disk.

use std::sync::Arc;

use govgate::config::Config;
use govgate::engine::{Engine, Stage};
use govgate::finding::{Category, Severity};
use govgate::graph::DependencyGraph;
use govgate::report::GateDecision;
use govgate::repository::FileSourceRepository;
use govgate::rules::RuleSet;

use crate::support::builders::{RegistryBuilder, RulesBuilder};
use crate::support::harness::TestHarness;

fn run(harness: &TestHarness) -> govgate::engine::RunOutcome {
    let config = Config::load(harness.path()).unwrap();
    let repo = FileSourceRepository::from_config(harness.path(), &config).unwrap();
    let rules = RuleSet::load_from(harness.path(), &config).unwrap();
    Engine::new(Arc::new(repo), rules, config.engine_options()).run()
}

fn all_families(harness: &TestHarness) {
    RegistryBuilder::new()
        .module("platform", &[])
        .module("billing", &["platform"])
        .urn("urn:acme:svc:billing:1.0", "billing")
        .write_to(harness);
    RulesBuilder::new()
        .rule("kebab-keys", "naming", &["target: field_keys", "pattern: '^[a-z][a-z0-9_]*$'", "exceptions: [apiVersion]"])
        .rule("urn-refs", "references", &["resolve: urns", "pattern: 'urn:[^\\s]+'"])
        .rule("dir-purpose", "mapping", &["path: directories", "key: dir", "value: purpose"])
        .rule(
            "secure-boot",
            "logic",
            &["when: { field: boot.mode, equals: secure }", "require: { field: boot.keys, present: true }"],
        )
        .rule("versions", "context", &["check: version_sequence", "field: version", "sources: [\"changelog.yaml\"]"])
        .write_to(harness);
}

#[test]
fn test_every_family_reports_through_one_run() {
    let harness = TestHarness::new();
    all_families(&harness);
    harness.write(
        "deploy/app.yaml",
        "apiVersion: v1\nservice: urn:acme:svc:billing:1.0\nupstream: urn:acme:svc:ghost:1.0\nBadKey: 1\n",
    );
    harness.write(
        "layout.yaml",
        "directories:\n  - {dir: src, purpose: code}\n  - {dir: src, purpose: tests}\n",
    );
    harness.write("boot.yaml", "boot:\n  mode: secure\n");
    harness.write("changelog.yaml", "version: \"1.2\"\n---\nversion: \"1.1\"\n");

    let outcome = run(&harness);
    let report = &outcome.report;
    assert_eq!(report.decision(), GateDecision::Fail);
    assert_eq!(outcome.stages.last(), Some(&Stage::Done));

    let categories: Vec<Category> = report.findings.iter().map(|f| f.category).collect();
    for category in [
        Category::Naming,
        Category::References,
        Category::Mapping,
        Category::Logic,
        Category::Context,
    ] {
        assert!(categories.contains(&category), "missing {:?} in {:?}", category, categories);
    }
    assert!(report.findings.iter().all(|f| f.severity == Severity::Error));
    assert_eq!(report.summary.errors, 5);

    let urn_finding = report
        .findings
        .iter()
        .find(|f| f.rule == "urn-refs")
        .unwrap();
    assert!(urn_finding.message.contains("urn:acme:svc:ghost:1.0"));
}

#[test]
fn test_scaffolding_registry_only_after_pass() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("platform", &[])
        .module("billing", &["platform"])
        .write_to(&harness);

    let outcome = run(&harness);
    assert!(outcome.report.pass);
    let registry = outcome.registry_for_scaffolding().unwrap();
    let graph = DependencyGraph::new(registry);
    assert_eq!(graph.build_order().unwrap(), vec!["platform", "billing"]);

    harness.write("registry/modules.yaml", "modules:\n  - name: billing\n    dependencies: [ghost]\n");
    let outcome = run(&harness);
    assert!(!outcome.report.pass);
    assert!(outcome.registry_for_scaffolding().is_none());
    assert!(outcome.registry.is_some());
}

#[test]
fn test_registry_sources_never_trigger_reference_rules() {
    let harness = TestHarness::new();
    RegistryBuilder::new()
        .module("billing", &[])
        .urn("urn:acme:svc:billing:1.0", "billing")
        .write_to(&harness);
    RulesBuilder::new()
        .rule("urn-refs", "references", &["resolve: urns", "pattern: 'urn:[^\\s]+'"])
        .write_to(&harness);

    let outcome = run(&harness);
    assert!(outcome.report.findings.is_empty(), "{:?}", outcome.report.findings);
}

#[test]
fn test_project_wide_checks_see_the_filesystem() {
    let harness = TestHarness::new();
    RegistryBuilder::new().module("billing", &[]).write_to(&harness);
    RulesBuilder::new()
        .rule("runbooks-exist", "references", &["resolve: files", "field: runbook"])
        .rule(
            "service-file-names",
            "naming",
            &["target: source_names", "pattern: '^[a-z-]+\\.yaml$'", "sources: [\"services/**\"]"],
        )
        .rule(
            "one-platform-version",
            "context",
            &["check: uniform", "field: platform", "scope: sources", "sources: [\"services/**\"]"],
        )
        .rule("replicas-number", "logic", &["require: { field: replicas, type: integer }"])
        .write_to(&harness);
    harness.write("docs/billing.md", "# Billing runbook\n");
    harness.write(
        "services/billing.yaml",
        "platform: \"3\"\nrunbook: ../docs/billing.md\nreplicas: 2\n",
    );
    harness.write(
        "services/payments_v2.yaml",
        "platform: \"4\"\nrunbook: docs/ledger.md\nreplicas: two\n",
    );

    let outcome = run(&harness);
    let mut rules: Vec<&str> = outcome.report.findings.iter().map(|f| f.rule.as_str()).collect();
    rules.sort();
    assert_eq!(
        rules,
        vec!["one-platform-version", "replicas-number", "runbooks-exist", "service-file-names"]
    );
    assert!(outcome
        .report
        .findings
        .iter()
        .all(|f| f.location.source == "services/payments_v2.yaml"));
}
