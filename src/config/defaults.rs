//! Default values and configuration structs with default implementations.

use serde::{Deserialize, Serialize};

use crate::paths;

/// Macro to generate default functions for serde attributes
macro_rules! default_fn {
    ($name:ident, $type:ty, $value:expr) => {
        pub(crate) fn $name() -> $type {
            $value
        }
    };
}

// =========================================================================
// DEFAULT VALUE FUNCTIONS
// =========================================================================

default_fn!(default_modules_source, String, "registry/modules.yaml".to_string());
default_fn!(default_urns_source, String, "registry/urns.yaml".to_string());
default_fn!(
    default_include,
    Vec<String>,
    vec!["**/*.yaml".to_string(), "**/*.yml".to_string()]
);
default_fn!(
    default_exclude,
    Vec<String>,
    vec![
        format!("{}/**", paths::GOVGATE_DIR),
        "target/**".to_string(),
        ".git/**".to_string(),
    ]
);
default_fn!(default_rules_source, String, paths::RULES_FILE.to_string());
default_fn!(default_timeout_ms, u64, 30_000); // 30 seconds
default_fn!(default_max_concurrent, usize, 4);
default_fn!(default_report_output, String, paths::REPORT_FILE.to_string());

// =========================================================================
// CONFIG STRUCTS WITH DEFAULTS
// =========================================================================

/// Where the two registry tables are declared
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Source id of the module registry (default: registry/modules.yaml)
    #[serde(default = "default_modules_source")]
    pub modules: String,
    /// Source id of the URN registry (default: registry/urns.yaml)
    #[serde(default = "default_urns_source")]
    pub urns: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            modules: default_modules_source(),
            urns: default_urns_source(),
        }
    }
}

/// Which files under the target directory are validation sources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            include: default_include(),
            exclude: default_exclude(),
        }
    }
}

/// Validation engine limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Overall run timeout in milliseconds (default: 30000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Loader worker pool size (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Report artifact and gate settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Artifact path; a `.md` extension writes Markdown, anything else JSON
    #[serde(default = "default_report_output")]
    pub output: String,
    /// If true, warnings also fail the gate
    #[serde(default)]
    pub strict: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_report_output(),
            strict: false,
        }
    }
}
