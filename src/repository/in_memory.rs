use std::collections::BTreeMap;

use anyhow::{Context, Result};

use crate::document::Source;

use super::source_repository::SourceRepository;

/// In-memory implementation of SourceRepository for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceRepository {
    sources: BTreeMap<String, String>,
}

impl InMemorySourceRepository {
    /// Create a new empty InMemorySourceRepository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `(id, text)` pairs.
    pub fn with_sources<I, K, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(id, text)| (id.into(), text.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.sources.insert(id.into(), text.into());
    }
}

impl SourceRepository for InMemorySourceRepository {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.sources.keys().cloned().collect())
    }

    fn read(&self, id: &str) -> Result<Source> {
        self.sources
            .get(id)
            .map(|text| Source::new(id, text.clone()))
            .context(format!("Source not found: {}", id))
    }

    fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_sorted() {
        let repo = InMemorySourceRepository::with_sources([("b.yaml", "b: 1"), ("a.yaml", "a: 1")]);
        assert_eq!(repo.list().unwrap(), vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_read_missing_source() {
        let repo = InMemorySourceRepository::new();
        let err = repo.read("nope.yaml").unwrap_err();
        assert!(err.to_string().contains("Source not found: nope.yaml"));
        assert!(!repo.contains("nope.yaml"));
    }
}
