//! Project configuration as seen through the CLI.

use crate::support::builders::{write_config, RegistryBuilder};
use crate::support::harness::{exit_code, stderr, TestHarness};

#[test]
fn test_custom_registry_sources() {
    let harness = TestHarness::new();
    let registry = RegistryBuilder::new().module("core", &[]);
    harness.write("gov/mods.yaml", &registry.modules_yaml());
    harness.write("gov/urns.yaml", &registry.urns_yaml());
    write_config(
        &harness,
        "registry:\n  modules: gov/mods.yaml\n  urns: gov/urns.yaml\nreport:\n  output: build/gate.json\n",
    );

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
    assert!(harness.exists("build/gate.json"));
}

#[test]
fn test_invalid_config_exit_2() {
    let harness = TestHarness::new();
    RegistryBuilder::new().module("core", &[]).write_to(&harness);
    write_config(&harness, "engine:\n  timeout_ms: 0\n");

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr(&output).contains("engine.timeout_ms must be greater than 0"));
}

#[test]
fn test_flag_overrides_are_validated() {
    let harness = TestHarness::new();
    RegistryBuilder::new().module("core", &[]).write_to(&harness);

    let output = harness.validate(&["--jobs", "0"]);
    assert_eq!(exit_code(&output), 2);
    assert!(stderr(&output).contains("engine.max_concurrent must be greater than 0"));
}

#[test]
fn test_strict_from_config() {
    let harness = TestHarness::new();
    harness.write("registry/modules.yaml", "modules:\n  - name: core\n");
    harness.write(
        "registry/urns.yaml",
        "urns:\n  - urn: urn:acme:lib:core:1.0\n    module: core\n    version: \"2.0\"\n",
    );

    assert_eq!(exit_code(&harness.validate(&[])), 0);
    assert_eq!(harness.report()["summary"]["warnings"], 1);

    write_config(&harness, "report:\n  strict: true\n");
    assert_eq!(exit_code(&harness.validate(&[])), 1);
}

#[test]
fn test_excluded_sources_are_ignored() {
    let harness = TestHarness::new();
    RegistryBuilder::new().module("core", &[]).write_to(&harness);
    harness.write("vendor/broken.yaml", "key: [oops\n");
    write_config(
        &harness,
        "sources:\n  exclude: [\".govgate/**\", \"vendor/**\"]\n",
    );

    let output = harness.validate(&[]);
    assert_eq!(exit_code(&output), 0, "stderr: {}", stderr(&output));
    assert_eq!(harness.report()["summary"]["sources"], 2);
}
