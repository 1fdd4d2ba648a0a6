//! The single-source-of-truth registry of modules and URNs.
//!
//! A [`RegistryStore`] is built fresh from the module and URN registry
//! documents on every run and is read-only afterwards. Duplicate identities
//! make the registry ambiguous and fail the load; every other problem with
//! an entry (missing fields, malformed URNs, unresolved references) is
//! collected as a finding.
//!
//! Module registry documents carry a `modules:` (or `entries:`) sequence:
//!
//! ```yaml
//! modules:
//!   - name: billing
//!     label: Billing
//!     dependencies: [ledger]
//!     owner: payments
//! ```
//!
//! URN registry documents carry a `urns:` (or `entries:`) sequence:
//!
//! ```yaml
//! urns:
//!   - urn: urn:acme:service:billing:1.2
//!     module: billing
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::document::{scalar_text, value_kind, Document};
use crate::error::{DuplicateKeyError, Table};
use crate::finding::{Category, Finding, Location, Severity};

pub const MALFORMED_ENTRY: &str = "registry.malformed-entry";
pub const URN_SYNTAX: &str = "registry.urn-syntax";
pub const URN_VERSION: &str = "registry.urn-version";
pub const URN_MODULE: &str = "references.urn-module";
pub const MODULE_DEPENDENCY: &str = "references.module-dependency";

/// Keys of a module entry that are not free-form metadata
const MODULE_FIELDS: [&str; 5] = ["name", "label", "dependencies", "owner", "category"];

// =========================================================================
// URN GRAMMAR
// =========================================================================

/// A parsed `urn:<namespace>:<type>:<identifier>[:<version>]` string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Urn {
    pub namespace: String,
    pub kind: String,
    pub identifier: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{urn}' is not a valid URN: {reason}")]
pub struct UrnSyntaxError {
    pub urn: String,
    pub reason: &'static str,
}

impl Urn {
    /// The URN without its version segment.
    pub fn base(&self) -> String {
        format!("urn:{}:{}:{}", self.namespace, self.kind, self.identifier)
    }
}

impl FromStr for Urn {
    type Err = UrnSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| UrnSyntaxError {
            urn: s.to_string(),
            reason,
        };

        let segments: Vec<&str> = s.split(':').collect();
        if segments.first() != Some(&"urn") {
            return Err(invalid("must start with 'urn:'"));
        }
        if !(4..=5).contains(&segments.len()) {
            return Err(invalid(
                "expected urn:<namespace>:<type>:<identifier>[:<version>]",
            ));
        }
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid("segments must not be empty"));
        }
        if segments
            .iter()
            .any(|segment| segment.chars().any(char::is_whitespace))
        {
            return Err(invalid("segments must not contain whitespace"));
        }

        Ok(Urn {
            namespace: segments[1].to_string(),
            kind: segments[2].to_string(),
            identifier: segments[3].to_string(),
            version: segments.get(4).map(|v| v.to_string()),
        })
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())?;
        if let Some(version) = &self.version {
            write!(f, ":{}", version)?;
        }
        Ok(())
    }
}

// =========================================================================
// ENTRIES
// =========================================================================

/// One row of the module table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Declared dependency names, in declaration order
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    pub origin: Location,
}

/// One row of the URN table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrnEntry {
    pub urn: String,
    /// `None` when the URN string is malformed
    #[serde(skip)]
    pub parsed: Option<Urn>,
    /// Owning module, by name
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub origin: Location,
}

/// A reference that does not resolve within the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DanglingReference {
    UrnModule {
        urn: String,
        module: String,
        origin: Location,
    },
    ModuleDependency {
        module: String,
        dependency: String,
        origin: Location,
    },
}

impl DanglingReference {
    pub fn to_finding(&self) -> Finding {
        match self {
            DanglingReference::UrnModule {
                urn,
                module,
                origin,
            } => Finding::new(
                URN_MODULE,
                Category::References,
                Severity::Error,
                origin.clone(),
                format!(
                    "URN '{}' belongs to module '{}', which is not in the module registry",
                    urn, module
                ),
            )
            .with_hint(format!(
                "register module '{}' or point the URN at an existing module",
                module
            )),
            DanglingReference::ModuleDependency {
                module,
                dependency,
                origin,
            } => Finding::new(
                MODULE_DEPENDENCY,
                Category::References,
                Severity::Error,
                origin.clone(),
                format!(
                    "module '{}' depends on '{}', which is not in the module registry",
                    module, dependency
                ),
            )
            .with_hint(format!(
                "register module '{}' or remove it from the dependencies of '{}'",
                dependency, module
            )),
        }
    }
}

// =========================================================================
// STORE
// =========================================================================

/// The registry tables for one run.
#[derive(Debug, Clone, Default)]
pub struct RegistryStore {
    modules: BTreeMap<String, ModuleEntry>,
    urns: BTreeMap<String, UrnEntry>,
    by_module: BTreeMap<String, BTreeSet<String>>,
    findings: Vec<Finding>,
}

impl RegistryStore {
    /// Populate the store from the module and URN registry documents.
    ///
    /// Documents are consumed in order, so on a duplicate the first
    /// declaration is the one reported as `first`.
    pub fn load(
        module_documents: &[Document],
        urn_documents: &[Document],
    ) -> Result<RegistryStore, DuplicateKeyError> {
        let mut store = RegistryStore::default();

        for document in module_documents {
            for (entry, location) in table_entries(document, "modules", &mut store.findings) {
                if let Some(module) = store.module_entry(entry, location) {
                    store.insert_module(module)?;
                }
            }
        }

        for document in urn_documents {
            for (entry, location) in table_entries(document, "urns", &mut store.findings) {
                if let Some(urn) = store.urn_entry(entry, location) {
                    store.insert_urn(urn)?;
                }
            }
        }

        Ok(store)
    }

    pub fn resolve(&self, name: &str) -> Option<&ModuleEntry> {
        self.modules.get(name)
    }

    /// Resolve a URN reference.
    ///
    /// An exact match wins; a reference without a version also resolves to
    /// any registered version of the same URN.
    pub fn resolve_urn(&self, reference: &str) -> Option<&UrnEntry> {
        if let Some(entry) = self.urns.get(reference) {
            return Some(entry);
        }

        let wanted = reference.parse::<Urn>().ok()?;
        if wanted.version.is_some() {
            return None;
        }
        let base = wanted.base();
        self.urns.values().find(|entry| {
            entry
                .parsed
                .as_ref()
                .is_some_and(|parsed| parsed.base() == base)
        })
    }

    /// URNs belonging to `module`, ordered by URN.
    pub fn urns_of(&self, module: &str) -> Vec<&UrnEntry> {
        self.by_module
            .get(module)
            .map(|urns| urns.iter().filter_map(|urn| self.urns.get(urn)).collect())
            .unwrap_or_default()
    }

    /// Modules in name order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleEntry> {
        self.modules.values()
    }

    /// URN entries in URN order.
    pub fn urns(&self) -> impl Iterator<Item = &UrnEntry> {
        self.urns.values()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn urn_count(&self) -> usize {
        self.urns.len()
    }

    /// Every reference that does not resolve: URN owners first, then
    /// module dependencies, each in identity order.
    ///
    /// A dependency declared twice on the same module is reported once.
    pub fn dangling(&self) -> Vec<DanglingReference> {
        let mut dangling = Vec::new();

        for entry in self.urns.values() {
            if !self.modules.contains_key(&entry.module) {
                dangling.push(DanglingReference::UrnModule {
                    urn: entry.urn.clone(),
                    module: entry.module.clone(),
                    origin: entry.origin.clone(),
                });
            }
        }

        for module in self.modules.values() {
            let mut seen = BTreeSet::new();
            for (index, dependency) in module.dependencies.iter().enumerate() {
                if self.modules.contains_key(dependency) || !seen.insert(dependency.as_str()) {
                    continue;
                }
                let path = match &module.origin.path {
                    Some(path) => format!("{}.dependencies[{}]", path, index),
                    None => format!("dependencies[{}]", index),
                };
                dangling.push(DanglingReference::ModuleDependency {
                    module: module.name.clone(),
                    dependency: dependency.clone(),
                    origin: module.origin.clone().with_path(path),
                });
            }
        }

        dangling
    }

    /// Findings raised while loading entries (malformed entries and URNs).
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    fn insert_module(&mut self, module: ModuleEntry) -> Result<(), DuplicateKeyError> {
        if let Some(existing) = self.modules.get(&module.name) {
            return Err(DuplicateKeyError {
                table: Table::Modules,
                key: module.name,
                first: existing.origin.clone(),
                second: module.origin,
            });
        }
        self.modules.insert(module.name.clone(), module);
        Ok(())
    }

    fn insert_urn(&mut self, entry: UrnEntry) -> Result<(), DuplicateKeyError> {
        if let Some(existing) = self.urns.get(&entry.urn) {
            return Err(DuplicateKeyError {
                table: Table::Urns,
                key: entry.urn,
                first: existing.origin.clone(),
                second: entry.origin,
            });
        }
        self.by_module
            .entry(entry.module.clone())
            .or_default()
            .insert(entry.urn.clone());
        self.urns.insert(entry.urn.clone(), entry);
        Ok(())
    }

    fn malformed(&mut self, location: &Location, message: String) {
        self.findings.push(
            Finding::new(
                MALFORMED_ENTRY,
                Category::References,
                Severity::Error,
                location.clone(),
                message,
            )
            .with_hint("fix the registry entry so it can be loaded"),
        );
    }

    fn module_entry(&mut self, entry: &Mapping, origin: Location) -> Option<ModuleEntry> {
        let Some(name) = required_text(entry, "name") else {
            self.malformed(&origin, "module entry has no `name`".to_string());
            return None;
        };

        let mut dependencies = Vec::new();
        match entry.get("dependencies") {
            None | Some(Value::Null) => {}
            Some(Value::Sequence(items)) => {
                for (index, item) in items.iter().enumerate() {
                    match scalar_text(item) {
                        Some(dependency) => dependencies.push(dependency),
                        None => self.malformed(
                            &origin,
                            format!(
                                "module '{}' dependency {} must be a name, found {}",
                                name,
                                index,
                                value_kind(item)
                            ),
                        ),
                    }
                }
            }
            Some(other) => self.malformed(
                &origin,
                format!(
                    "module '{}' dependencies must be a list, found {}",
                    name,
                    value_kind(other)
                ),
            ),
        }

        let metadata = entry
            .iter()
            .filter_map(|(key, value)| {
                let key = key.as_str()?;
                (!MODULE_FIELDS.contains(&key)).then(|| (key.to_string(), value.clone()))
            })
            .collect();

        Some(ModuleEntry {
            label: optional_text(entry, "label"),
            owner: optional_text(entry, "owner"),
            category: optional_text(entry, "category"),
            name,
            dependencies,
            metadata,
            origin,
        })
    }

    fn urn_entry(&mut self, entry: &Mapping, origin: Location) -> Option<UrnEntry> {
        let Some(urn) = required_text(entry, "urn") else {
            self.malformed(&origin, "URN entry has no `urn`".to_string());
            return None;
        };
        let Some(module) = required_text(entry, "module") else {
            self.malformed(&origin, format!("URN '{}' has no owning `module`", urn));
            return None;
        };

        let declared_version = optional_text(entry, "version");
        let parsed = match urn.parse::<Urn>() {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                self.findings.push(
                    Finding::new(
                        URN_SYNTAX,
                        Category::Naming,
                        Severity::Error,
                        origin.clone(),
                        err.to_string(),
                    )
                    .with_hint("use urn:<namespace>:<type>:<identifier>[:<version>]"),
                );
                None
            }
        };

        let segment_version = parsed.as_ref().and_then(|p| p.version.clone());
        if let (Some(declared), Some(segment)) = (&declared_version, &segment_version) {
            if declared != segment {
                self.findings.push(
                    Finding::new(
                        URN_VERSION,
                        Category::Naming,
                        Severity::Warning,
                        origin.clone(),
                        format!(
                            "URN '{}' declares version '{}' but its version segment is '{}'",
                            urn, declared, segment
                        ),
                    )
                    .with_hint("make the `version` field agree with the URN"),
                );
            }
        }

        Some(UrnEntry {
            version: declared_version.or(segment_version),
            urn,
            parsed,
            module,
            origin,
        })
    }
}

/// Entries of a registry document's table, with their locations.
///
/// Documents without the table are not registry tables and are skipped.
fn table_entries<'d>(
    document: &'d Document,
    table: &str,
    findings: &mut Vec<Finding>,
) -> Vec<(&'d Mapping, Location)> {
    let (key, value) = match (document.get(table), document.get("entries")) {
        (Some(value), _) => (table, value),
        (None, Some(value)) => ("entries", value),
        (None, None) => {
            tracing::debug!(
                source = %document.source,
                document = document.index,
                "document has no `{}` table, skipping",
                table
            );
            return Vec::new();
        }
    };

    let items = match value {
        Value::Sequence(items) => items,
        Value::Null => return Vec::new(),
        other => {
            findings.push(
                Finding::new(
                    MALFORMED_ENTRY,
                    Category::References,
                    Severity::Error,
                    document.location().with_path(key),
                    format!("`{}` must be a list of entries, found {}", key, value_kind(other)),
                )
                .with_hint("fix the registry entry so it can be loaded"),
            );
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let location = document
            .location()
            .with_path(format!("{}[{}]", key, index));
        match item {
            Value::Mapping(entry) => entries.push((entry, location)),
            other => findings.push(
                Finding::new(
                    MALFORMED_ENTRY,
                    Category::References,
                    Severity::Error,
                    location,
                    format!("registry entry must be a mapping, found {}", value_kind(other)),
                )
                .with_hint("fix the registry entry so it can be loaded"),
            ),
        }
    }
    entries
}

fn required_text(entry: &Mapping, key: &str) -> Option<String> {
    optional_text(entry, key).filter(|text| !text.trim().is_empty())
}

fn optional_text(entry: &Mapping, key: &str) -> Option<String> {
    entry.get(key).and_then(scalar_text)
}
