//! # govgate - governance validation gate
//!
//! govgate loads declarative YAML documents, reconciles them against a
//! single-source-of-truth registry of modules and URNs, and produces a
//! deterministic pass/fail report used to gate merges.
//!
//! ## Pipeline
//!
//! Data flows one way through the engine:
//!
//! ```text
//! sources -> documents -> registry -> rule findings -> graph findings -> report -> gate
//! ```
//!
//! ## Modules
//!
//! - [`document`] - multi-document YAML loading with per-document provenance
//! - [`repository`] - where sources come from (filesystem or in-memory)
//! - [`registry`] - the module/URN registry store and URN grammar
//! - [`rules`] - the declarative rule set (naming, references, mapping, logic, context)
//! - [`graph`] - dependency graph, topological order and cycle detection
//! - [`engine`] - the validation engine state machine
//! - [`report`] - validation report, gate decision and artifacts
//! - [`config`] - project configuration (`.govgate/config.md`)
//! - [`formatters`], [`ui`] - terminal and Markdown rendering of reports
//! - [`logging`] - `GOVGATE_LOG`-filtered diagnostics on stderr
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use govgate::config::Config;
//! use govgate::engine::Engine;
//! use govgate::repository::FileSourceRepository;
//!
//! let root = Path::new(".");
//! let config = Config::load(root).expect("Failed to load config");
//! let repo = Arc::new(FileSourceRepository::from_config(root, &config).expect("bad globs"));
//! let rules = govgate::rules::RuleSet::load_from(root, &config).expect("bad rules");
//!
//! let outcome = Engine::new(repo, rules, config.engine_options()).run();
//! println!("pass = {}", outcome.report.pass);
//! ```

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod finding;
pub mod formatters;
pub mod graph;
pub mod logging;
pub mod registry;
pub mod report;
pub mod repository;
pub mod rules;
pub mod ui;

/// Default path constants for the govgate project layout.
pub mod paths {
    /// Directory holding govgate's own files: `.govgate`
    pub const GOVGATE_DIR: &str = ".govgate";
    /// Project configuration file: `.govgate/config.md`
    pub const CONFIG_FILE: &str = ".govgate/config.md";
    /// Default rule configuration source: `.govgate/rules.yaml`
    pub const RULES_FILE: &str = ".govgate/rules.yaml";
    /// Default report artifact: `.govgate/report.json`
    pub const REPORT_FILE: &str = ".govgate/report.json";
}
