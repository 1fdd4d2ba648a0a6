//! Command module structure for govgate CLI

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use govgate::config::Config;
use govgate::engine::{Engine, RunOutcome};
use govgate::repository::FileSourceRepository;
use govgate::rules::RuleSet;

pub mod docs;
pub mod graph;
pub mod registry;
pub mod rules;
pub mod validate;

/// A target directory and its loaded configuration.
pub struct Project {
    pub root: PathBuf,
    pub config: Config,
}

impl Project {
    /// Load the project at `dir` (current directory when `None`).
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let root = dir.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        if !root.is_dir() {
            anyhow::bail!("Not a directory: {}", root.display());
        }
        let config = Config::load(&root)?;
        Ok(Self { root, config })
    }

    pub fn repository(&self) -> Result<Arc<FileSourceRepository>> {
        let repo = FileSourceRepository::from_config(&self.root, &self.config)
            .context("Invalid source globs in config")?;
        Ok(Arc::new(repo))
    }

    pub fn rules(&self) -> Result<RuleSet> {
        RuleSet::load_from(&self.root, &self.config)
            .with_context(|| format!("Invalid rule configuration in {}", self.config.rules))
    }

    /// Run the engine with no rules; enough to build the registry and graph.
    pub fn load_registry(&self) -> Result<RunOutcome> {
        let engine = Engine::new(self.repository()?, RuleSet::empty(), self.config.engine_options());
        Ok(engine.run())
    }
}
