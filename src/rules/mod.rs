//! The declarative rule set.
//!
//! Rules are data: they are loaded from the rules source (multi-document
//! YAML, each document carrying a `rules:` list), compiled once per run and
//! never mutated. Every rule belongs to one family and is evaluated through
//! [`evaluate`], which never fails: a rule yields zero or more findings.
//!
//! ```yaml
//! rules:
//!   - id: module-names
//!     family: naming
//!     pattern: "^[a-z][a-z0-9-]*$"
//!     exceptions: [apiVersion]
//!     hint: use lowercase kebab-case module names
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;

use crate::config::Config;
use crate::document::{value_kind, Document, Source};
use crate::error::ConfigError;
use crate::finding::{Category, Finding, Location, Severity};
use crate::registry::RegistryStore;
use crate::repository::SourceRepository;

pub mod context;
pub mod logic;
pub mod mapping;
pub mod naming;
pub mod path;
pub mod references;

pub use context::{ContextCheck, ContextRule, ContextSpan};
pub use logic::{Condition, LogicRule, ValueType};
pub use mapping::MappingRule;
pub use naming::{NamingRule, NamingTarget};
pub use path::FieldPath;
pub use references::{ReferencesRule, ResolveTarget};

/// Rule family; decides what a rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Naming,
    References,
    Mapping,
    Logic,
    Context,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Naming,
        Family::References,
        Family::Mapping,
        Family::Logic,
        Family::Context,
    ];

    pub fn category(self) -> Category {
        match self {
            Family::Naming => Category::Naming,
            Family::References => Category::References,
            Family::Mapping => Category::Mapping,
            Family::Logic => Category::Logic,
            Family::Context => Category::Context,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.category(), f)
    }
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub severity: Severity,
    pub hint: Option<String>,
    pub kind: RuleKind,
}

/// The family-specific part of a rule.
#[derive(Debug, Clone)]
pub enum RuleKind {
    Naming(NamingRule),
    References(ReferencesRule),
    Mapping(MappingRule),
    Logic(LogicRule),
    Context(ContextRule),
}

impl Rule {
    pub fn family(&self) -> Family {
        match &self.kind {
            RuleKind::Naming(_) => Family::Naming,
            RuleKind::References(_) => Family::References,
            RuleKind::Mapping(_) => Family::Mapping,
            RuleKind::Logic(_) => Family::Logic,
            RuleKind::Context(_) => Family::Context,
        }
    }

    /// A finding attributed to this rule.
    pub fn finding(&self, location: Location, message: impl Into<String>) -> Finding {
        Finding::new(
            self.id.clone(),
            self.family().category(),
            self.severity,
            location,
            message,
        )
        .with_optional_hint(self.hint.as_deref())
    }

    /// One-line description for listings.
    pub fn describe(&self) -> String {
        match &self.kind {
            RuleKind::Naming(rule) => rule.to_string(),
            RuleKind::References(rule) => rule.to_string(),
            RuleKind::Mapping(rule) => rule.to_string(),
            RuleKind::Logic(rule) => rule.to_string(),
            RuleKind::Context(rule) => rule.to_string(),
        }
    }
}

/// Source globs limiting which documents a rule looks at.
///
/// An empty scope covers every source.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    globs: Vec<glob::Pattern>,
}

impl Scope {
    pub fn compile(rule: &str, globs: &[String]) -> Result<Self, ConfigError> {
        let globs = globs
            .iter()
            .map(|g| {
                glob::Pattern::new(g).map_err(|source| ConfigError::InvalidGlob {
                    rule: rule.to_string(),
                    glob: g.clone(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { globs })
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.globs.is_empty() || self.globs.iter().any(|g| g.matches(source_id))
    }
}

/// Compile a regex rule field.
pub(crate) fn compile_regex(rule: &str, pattern: &str) -> Result<regex::Regex, ConfigError> {
    regex::Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// Compile a field path rule field.
pub(crate) fn compile_path(rule: &str, path: &str) -> Result<FieldPath, ConfigError> {
    path.parse().map_err(|message| ConfigError::Invalid {
        rule: rule.to_string(),
        message,
    })
}

/// Everything a rule may read while it is evaluated.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// All loaded documents, ordered by source id then document index
    pub documents: &'a [Document],
    pub registry: &'a RegistryStore,
    /// Ids of the registry sources, whose references the store checks itself
    pub registry_sources: &'a [String],
    /// Every listed source id, sorted, including sources that failed to load
    pub sources: &'a [String],
    /// Backing store, for rules that check whether a referenced file exists
    pub files: &'a dyn SourceRepository,
}

impl<'a> EvalContext<'a> {
    pub fn is_registry_source(&self, source_id: &str) -> bool {
        self.registry_sources.iter().any(|s| s == source_id)
    }

    /// Documents whose source is inside `scope`.
    pub fn documents_in<'s>(&self, scope: &'s Scope) -> impl Iterator<Item = &'a Document> + 's
    where
        'a: 's,
    {
        self.documents
            .iter()
            .filter(move |document| scope.contains(&document.source))
    }

    /// Source ids inside `scope`.
    pub fn sources_in<'s>(&self, scope: &'s Scope) -> impl Iterator<Item = &'a str> + 's
    where
        'a: 's,
    {
        self.sources
            .iter()
            .map(String::as_str)
            .filter(move |id| scope.contains(id))
    }
}

/// Evaluate one rule.
pub fn evaluate(rule: &Rule, ctx: &EvalContext<'_>) -> Vec<Finding> {
    let findings = match &rule.kind {
        RuleKind::Naming(naming) => naming.evaluate(rule, ctx),
        RuleKind::References(references) => references.evaluate(rule, ctx),
        RuleKind::Mapping(mapping) => mapping.evaluate(rule, ctx),
        RuleKind::Logic(logic) => logic.evaluate(rule, ctx),
        RuleKind::Context(context) => context.evaluate(rule, ctx),
    };
    tracing::debug!(rule = %rule.id, findings = findings.len(), "rule evaluated");
    findings
}

// =========================================================================
// CONFIGURATION
// =========================================================================

#[derive(Debug, Deserialize)]
struct RuleConfig {
    #[serde(default)]
    severity: Severity,
    #[serde(default)]
    hint: Option<String>,
    #[serde(flatten)]
    family: FamilyConfig,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
enum FamilyConfig {
    Naming(naming::NamingConfig),
    References(references::ReferencesConfig),
    Mapping(mapping::MappingConfig),
    Logic(logic::LogicConfig),
    Context(context::ContextConfig),
}

impl RuleConfig {
    fn compile(self, id: String) -> Result<Rule, ConfigError> {
        let kind = match self.family {
            FamilyConfig::Naming(config) => RuleKind::Naming(config.compile(&id)?),
            FamilyConfig::References(config) => RuleKind::References(config.compile(&id)?),
            FamilyConfig::Mapping(config) => RuleKind::Mapping(config.compile(&id)?),
            FamilyConfig::Logic(config) => RuleKind::Logic(config.compile(&id)?),
            FamilyConfig::Context(config) => RuleKind::Context(config.compile(&id)?),
        };
        Ok(Rule {
            id,
            severity: self.severity,
            hint: self.hint,
            kind,
        })
    }
}

/// The rules configured for a run, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from already compiled rules, rejecting duplicate ids.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let mut ids = BTreeSet::new();
        for rule in &rules {
            if !ids.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.id.clone()));
            }
        }
        Ok(Self { rules })
    }

    /// Parse and compile the rules declared in `source`.
    pub fn load(source: &Source) -> Result<Self, ConfigError> {
        let documents = source.documents().collect_all()?;
        let mut rules = Vec::new();

        for document in &documents {
            let items = match document.get("rules") {
                None | Some(Value::Null) => continue,
                Some(Value::Sequence(items)) => items,
                Some(other) => {
                    return Err(ConfigError::Invalid {
                        rule: format!("{}#{}", document.source, document.index),
                        message: format!("`rules` must be a list, found {}", value_kind(other)),
                    })
                }
            };

            for (index, item) in items.iter().enumerate() {
                rules.push(compile_rule(item, rules.len(), index)?);
            }
        }

        tracing::debug!(source = %source.id(), rules = rules.len(), "rules loaded");
        Self::from_rules(rules)
    }

    /// Load the rules source configured for the project at `root`.
    ///
    /// A project without a rules file runs only the built-in checks.
    pub fn load_from(root: &Path, config: &Config) -> Result<Self, ConfigError> {
        let path = root.join(&config.rules);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no rules file, built-in checks only");
            return Ok(Self::empty());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Unreadable {
            source_id: config.rules.clone(),
            source,
        })?;
        Self::load(&Source::new(config.rules.as_str(), text))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Rules of one family, in declaration order.
    pub fn by_family(&self, family: Family) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |rule| rule.family() == family)
    }
}

fn compile_rule(item: &Value, position: usize, index: usize) -> Result<Rule, ConfigError> {
    let fallback = format!("rules[{}]", position);
    let Value::Mapping(fields) = item else {
        return Err(ConfigError::Invalid {
            rule: fallback,
            message: format!("a rule must be a mapping, found {}", value_kind(item)),
        });
    };

    let id = match fields.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        _ => {
            return Err(ConfigError::MissingField {
                rule: fallback,
                field: "id",
            })
        }
    };
    if fields.get("family").is_none() {
        return Err(ConfigError::MissingField {
            rule: id,
            field: "family",
        });
    }

    let mut fields = fields.clone();
    fields.remove("id");
    let config: RuleConfig =
        serde_yaml::from_value(Value::Mapping(fields)).map_err(|err| ConfigError::Invalid {
            rule: id.clone(),
            message: err.to_string(),
        })?;

    tracing::trace!(rule = %id, index, "compiling rule");
    config.compile(id)
}
