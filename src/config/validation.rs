//! Validation logic for configuration values.

use anyhow::Result;

use super::defaults::{EngineConfig, RegistryConfig, ReportConfig};
use super::Config;

impl Config {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.engine.validate()?;
        self.report.validate()?;

        if self.rules.trim().is_empty() {
            anyhow::bail!("rules must name a rule configuration source");
        }

        Ok(())
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.modules.trim().is_empty() || self.urns.trim().is_empty() {
            anyhow::bail!("registry.modules and registry.urns must both be set");
        }
        if self.modules == self.urns {
            anyhow::bail!(
                "registry.modules and registry.urns must be different sources, both are '{}'",
                self.modules
            );
        }

        Ok(())
    }
}

impl EngineConfig {
    /// Validate engine limits
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            anyhow::bail!("engine.timeout_ms must be greater than 0");
        }
        if self.max_concurrent == 0 {
            anyhow::bail!("engine.max_concurrent must be greater than 0");
        }

        Ok(())
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output.trim().is_empty() {
            anyhow::bail!("report.output must not be empty");
        }

        Ok(())
    }
}
