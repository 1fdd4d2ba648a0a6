use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use glob::Pattern;

use crate::config::Config;
use crate::document::Source;

/// A trait for listing and reading validation sources from a storage backend.
///
/// Implementations are shared with loader worker threads.
pub trait SourceRepository: Send + Sync {
    /// List the ids of all sources to validate, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Read one source by id.
    fn read(&self, id: &str) -> Result<Source>;

    /// Whether a source with this id exists, listed or not.
    fn contains(&self, id: &str) -> bool;
}

/// Filesystem implementation of SourceRepository rooted at a project directory.
#[derive(Debug, Clone)]
pub struct FileSourceRepository {
    root: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    /// Directory parts of `dir/**` excludes; the walk does not descend into them
    prune: Vec<Pattern>,
}

impl FileSourceRepository {
    /// Create a repository selecting files by include/exclude globs relative to `root`.
    pub fn new(root: impl Into<PathBuf>, include: &[String], exclude: &[String]) -> Result<Self> {
        let compile = |globs: &[String]| -> Result<Vec<Pattern>> {
            globs
                .iter()
                .map(|g| Pattern::new(g).with_context(|| format!("Invalid source glob `{}`", g)))
                .collect()
        };

        let prune: Vec<String> = exclude
            .iter()
            .filter_map(|g| g.strip_suffix("/**"))
            .map(str::to_string)
            .collect();

        Ok(Self {
            root: root.into(),
            include: compile(include)?,
            exclude: compile(exclude)?,
            prune: compile(&prune)?,
        })
    }

    pub fn from_config(root: &Path, config: &Config) -> Result<Self> {
        Self::new(root, &config.sources.include, &config.sources.exclude)
    }

    fn is_selected(&self, id: &str) -> bool {
        self.include.iter().any(|p| p.matches(id)) && !self.exclude.iter().any(|p| p.matches(id))
    }

    /// Whether an exclude glob of the form `dir/**` covers directory `id`.
    fn is_pruned(&self, id: &str) -> bool {
        self.prune.iter().any(|p| p.matches(id))
    }

    fn collect(&self, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry?;
            // Does not follow symlinks
            let file_type = entry.file_type()?;
            let path = entry.path();
            let Some(id) = source_id(&self.root, &path) else {
                continue;
            };

            if file_type.is_dir() {
                if entry.file_name() == ".git" || self.is_pruned(&id) {
                    continue;
                }
                self.collect(&path, out)?;
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && self.is_selected(&id)
            {
                out.push(id);
            }
        }
        Ok(())
    }
}

/// Logical id of a file: its path relative to `root` joined with `/`.
fn source_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl SourceRepository for FileSourceRepository {
    fn list(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        self.collect(&self.root, &mut ids)?;
        ids.sort();
        Ok(ids)
    }

    fn read(&self, id: &str) -> Result<Source> {
        let path = self.root.join(id);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read source {}", path.display()))?;
        Ok(Source::new(id, text))
    }

    fn contains(&self, id: &str) -> bool {
        self.root.join(id).is_file()
    }
}
