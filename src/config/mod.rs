//! Configuration management for govgate projects.
//!
//! The project configuration is the YAML frontmatter of
//! `<target>/.govgate/config.md`; the Markdown body is free documentation.
//! A project without a config file runs with every default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineOptions;
use crate::paths;

pub mod defaults;
pub mod validation;

pub use defaults::*;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Source id of the rule configuration (default: .govgate/rules.yaml)
    #[serde(default = "defaults::default_rules_source")]
    pub rules: String,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            sources: SourcesConfig::default(),
            rules: defaults::default_rules_source(),
            engine: EngineConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub timeout_ms: Option<u64>,
    pub max_concurrent: Option<usize>,
    pub output: Option<String>,
    /// `--strict` can only switch strict mode on
    pub strict: bool,
}

impl Config {
    /// Load the configuration of the project rooted at `root`.
    ///
    /// A missing `.govgate/config.md` yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let (frontmatter, _body) = split_frontmatter(content);
        let frontmatter = frontmatter.context("Failed to extract frontmatter from config")?;

        let config: Config = if frontmatter.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&frontmatter).context("Failed to parse config frontmatter")?
        };

        config.validate()?;

        Ok(config)
    }

    /// Apply command-line overrides, then re-validate.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.engine.timeout_ms = timeout_ms;
        }
        if let Some(max_concurrent) = overrides.max_concurrent {
            self.engine.max_concurrent = max_concurrent;
        }
        if let Some(output) = &overrides.output {
            self.report.output = output.clone();
        }
        if overrides.strict {
            self.report.strict = true;
        }
        self.validate()
    }

    /// Engine settings derived from this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            modules_source: self.registry.modules.clone(),
            urns_source: self.registry.urns.clone(),
            timeout: Duration::from_millis(self.engine.timeout_ms),
            max_concurrent: self.engine.max_concurrent,
            strict: self.report.strict,
        }
    }

    /// Absolute path of the report artifact for a project rooted at `root`.
    pub fn report_path(&self, root: &Path) -> PathBuf {
        let output = Path::new(&self.report.output);
        if output.is_absolute() {
            output.to_path_buf()
        } else {
            root.join(output)
        }
    }
}

/// Path of the config file for a project rooted at `root`.
pub fn config_path(root: &Path) -> PathBuf {
    root.join(paths::CONFIG_FILE)
}

/// Split a Markdown file into its YAML frontmatter and body.
///
/// The frontmatter sits between a leading `---` line and the next `---` line.
pub fn split_frontmatter(content: &str) -> (Option<String>, &str) {
    let content = content.trim_start();
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(rest) = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))
    else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let frontmatter = rest[..offset].to_string();
            let body = rest[offset + line.len()..].trim_start();
            return (Some(frontmatter), body);
        }
        offset += line.len();
    }

    (None, content)
}

#[cfg(test)]
mod tests;
