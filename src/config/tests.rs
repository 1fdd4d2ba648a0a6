use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_parse_config() {
    let content = r#"---
registry:
  modules: catalog/modules.yaml
  urns: catalog/urns.yaml
rules: policy/rules.yaml
engine:
  timeout_ms: 5000
  max_concurrent: 8
report:
  output: out/report.md
  strict: true
---

# Governance gate

Free-form notes for humans.
"#;
    let config = Config::parse(content).unwrap();
    assert_eq!(config.registry.modules, "catalog/modules.yaml");
    assert_eq!(config.registry.urns, "catalog/urns.yaml");
    assert_eq!(config.rules, "policy/rules.yaml");
    assert_eq!(config.engine.timeout_ms, 5000);
    assert_eq!(config.engine.max_concurrent, 8);
    assert_eq!(config.report.output, "out/report.md");
    assert!(config.report.strict);
}

#[test]
fn test_parse_minimal_config_uses_defaults() {
    let content = r#"---
engine:
  timeout_ms: 1000
---
"#;
    let config = Config::parse(content).unwrap();
    assert_eq!(config.engine.timeout_ms, 1000);
    assert_eq!(config.engine.max_concurrent, 4); // default
    assert_eq!(config.registry.modules, "registry/modules.yaml");
    assert_eq!(config.sources.include, vec!["**/*.yaml", "**/*.yml"]);
    assert_eq!(config.rules, ".govgate/rules.yaml");
    assert_eq!(config.report.output, ".govgate/report.json");
    assert!(!config.report.strict);
}

#[test]
fn test_parse_empty_frontmatter() {
    let config = Config::parse("---\n---\n# nothing configured\n").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_parse_without_frontmatter_fails() {
    let result = Config::parse("# just a heading\n");
    assert!(result.is_err());
}

#[test]
fn test_zero_timeout_rejected() {
    let content = "---\nengine:\n  timeout_ms: 0\n---\n";
    let err = Config::parse(content).unwrap_err();
    assert!(err.to_string().contains("timeout_ms"));
}

#[test]
fn test_zero_concurrency_rejected() {
    let content = "---\nengine:\n  max_concurrent: 0\n---\n";
    let err = Config::parse(content).unwrap_err();
    assert!(err.to_string().contains("max_concurrent"));
}

#[test]
fn test_identical_registry_sources_rejected() {
    let content = "---\nregistry:\n  modules: registry.yaml\n  urns: registry.yaml\n---\n";
    let err = Config::parse(content).unwrap_err();
    assert!(err.to_string().contains("different sources"));
}

#[test]
fn test_load_missing_file_gives_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = Config::load(tmp.path()).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_from_project_root() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(".govgate")).unwrap();
    fs::write(
        tmp.path().join(".govgate/config.md"),
        "---\nreport:\n  strict: true\n---\n",
    )
    .unwrap();

    let config = Config::load(tmp.path()).unwrap();
    assert!(config.report.strict);
}

#[test]
fn test_load_invalid_yaml_names_file() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(".govgate")).unwrap();
    fs::write(
        tmp.path().join(".govgate/config.md"),
        "---\nengine: [unclosed\n---\n",
    )
    .unwrap();

    let err = Config::load(tmp.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("config.md"));
}

#[test]
fn test_overrides_take_precedence() {
    let mut config = Config::default();
    config
        .apply_overrides(&ConfigOverrides {
            timeout_ms: Some(250),
            max_concurrent: Some(1),
            output: Some("gate.md".to_string()),
            strict: true,
        })
        .unwrap();

    assert_eq!(config.engine.timeout_ms, 250);
    assert_eq!(config.engine.max_concurrent, 1);
    assert_eq!(config.report.output, "gate.md");
    assert!(config.report.strict);
}

#[test]
fn test_overrides_are_validated() {
    let mut config = Config::default();
    let result = config.apply_overrides(&ConfigOverrides {
        max_concurrent: Some(0),
        ..Default::default()
    });
    assert!(result.is_err());
}

#[test]
fn test_engine_options() {
    let config = Config::default();
    let options = config.engine_options();
    assert_eq!(options.modules_source, "registry/modules.yaml");
    assert_eq!(options.urns_source, "registry/urns.yaml");
    assert_eq!(options.timeout, std::time::Duration::from_secs(30));
    assert_eq!(options.max_concurrent, 4);
    assert!(!options.strict);
}

#[test]
fn test_report_path() {
    let config = Config::default();
    let path = config.report_path(std::path::Path::new("/project"));
    assert_eq!(
        path,
        std::path::PathBuf::from("/project").join(".govgate/report.json")
    );
}

#[test]
fn test_split_frontmatter() {
    let (frontmatter, body) = split_frontmatter("---\na: 1\n---\n# Title\n");
    assert_eq!(frontmatter.as_deref(), Some("a: 1\n"));
    assert_eq!(body, "# Title\n");

    let (frontmatter, body) = split_frontmatter("no frontmatter");
    assert!(frontmatter.is_none());
    assert_eq!(body, "no frontmatter");
}

#[test]
fn test_split_frontmatter_ignores_inline_dashes() {
    let (frontmatter, _) = split_frontmatter("---\nnote: a---b\n---\n");
    assert_eq!(frontmatter.as_deref(), Some("note: a---b\n"));
}
