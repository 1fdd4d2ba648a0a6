//! Multi-document YAML loading.
//!
//! A source is split on `---` boundary lines and each chunk is parsed on
//! demand, so a [`DocumentStream`] is lazy, finite and restartable. Document
//! order within a source is preserved and every document keeps its
//! provenance (source id, index, starting line) for precise finding locations.

use std::sync::Arc;

use serde_yaml::{Mapping, Value};

use crate::error::ParseError;
use crate::finding::Location;

/// A named body of text to load documents from.
///
/// The id is a logical name (a `/`-separated path relative to the project
/// root for filesystem sources), never an absolute filesystem detail.
#[derive(Debug, Clone)]
pub struct Source {
    id: Arc<str>,
    text: Arc<str>,
}

impl Source {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Arc::from(id.into()),
            text: Arc::from(text.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Lazily parse the documents of this source.
    pub fn documents(&self) -> DocumentStream {
        DocumentStream::new(self.clone())
    }
}

/// One parsed document: a mapping tree plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: String,
    /// Zero-based position within the source
    pub index: usize,
    /// 1-based line where the document body starts
    pub line: usize,
    pub tree: Mapping,
}

impl Document {
    pub fn new(source: impl Into<String>, index: usize, line: usize, tree: Mapping) -> Self {
        Self {
            source: source.into(),
            index,
            line,
            tree,
        }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tree.get(key)
    }

    pub fn location(&self) -> Location {
        Location::document(self.source.clone(), self.index, self.line)
    }
}

/// A raw chunk of source text between boundary markers.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    line: usize,
    body: String,
}

impl Chunk {
    /// Chunks holding only blank lines and comments are not documents.
    fn is_blank(&self) -> bool {
        is_blank(&self.body)
    }
}

fn is_blank(text: &str) -> bool {
    text.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    })
}

enum Marker<'a> {
    /// `---`, with whatever follows it on the same line
    Start(&'a str),
    /// `...`
    End,
}

fn marker(line: &str) -> Option<Marker<'_>> {
    let line = line.trim_end();
    if line == "..." {
        return Some(Marker::End);
    }
    let rest = line.strip_prefix("---")?;
    if rest.is_empty() {
        Some(Marker::Start(""))
    } else if rest.starts_with(' ') || rest.starts_with('\t') {
        let inline = rest.trim();
        if inline.starts_with('#') {
            Some(Marker::Start(""))
        } else {
            Some(Marker::Start(inline))
        }
    } else {
        None
    }
}

/// Lazy, restartable sequence of the documents in one source.
///
/// Yields `Err` once for the first malformed document and then stops: there is
/// no partial recovery inside a malformed source.
#[derive(Debug, Clone)]
pub struct DocumentStream {
    source: Source,
    offset: usize,
    line: usize,
    index: usize,
    finished: bool,
}

impl DocumentStream {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            index: 0,
            finished: false,
        }
    }

    pub fn source_id(&self) -> &str {
        self.source.id()
    }

    /// Rewind to the first document.
    pub fn restart(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.index = 0;
        self.finished = false;
    }

    /// Eagerly collect every document, failing on the first malformed one.
    pub fn collect_all(mut self) -> Result<Vec<Document>, ParseError> {
        self.restart();
        self.collect()
    }

    fn next_chunk(&mut self) -> Option<Chunk> {
        let text = Arc::clone(&self.source.text);
        let rest = &text[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let mut body = String::new();
        let mut first_line: Option<usize> = None;
        let mut consumed = false;
        let mut started = false;

        for raw in rest.split_inclusive('\n') {
            let line = raw.trim_end_matches('\n').trim_end_matches('\r');
            match marker(line) {
                Some(Marker::Start(inline)) => {
                    if consumed {
                        break;
                    }
                    if !inline.is_empty() {
                        first_line = Some(self.line);
                        body.push_str(inline);
                        body.push('\n');
                    }
                    self.advance(raw);
                    consumed = true;
                    started = true;
                }
                Some(Marker::End) => {
                    self.advance(raw);
                    break;
                }
                // `%YAML`/`%TAG` directives belong to the document that the
                // next `---` opens; they are not content
                None if !started && line.starts_with('%') && is_blank(&body) => {
                    self.advance(raw);
                }
                None => {
                    first_line.get_or_insert(self.line);
                    body.push_str(line);
                    body.push('\n');
                    self.advance(raw);
                    consumed = true;
                }
            }
        }

        Some(Chunk {
            line: first_line.unwrap_or(self.line),
            body,
        })
    }

    fn advance(&mut self, raw: &str) {
        self.offset += raw.len();
        if raw.ends_with('\n') {
            self.line += 1;
        }
    }

    fn parse_chunk(&self, chunk: &Chunk) -> Result<Option<Mapping>, ParseError> {
        let value: Value = serde_yaml::from_str(&chunk.body).map_err(|err| {
            let parse_error = ParseError::new(self.source.id(), err.to_string());
            match err.location() {
                Some(loc) => parse_error.at(chunk.line + loc.line() - 1, Some(loc.column())),
                None => parse_error.at(chunk.line, None),
            }
        })?;

        match value {
            Value::Mapping(mapping) => Ok(Some(mapping)),
            Value::Null => Ok(None),
            other => Err(ParseError::new(
                self.source.id(),
                format!(
                    "document {} root must be a mapping, found {}",
                    self.index,
                    value_kind(&other)
                ),
            )
            .at(chunk.line, None)),
        }
    }
}

impl Iterator for DocumentStream {
    type Item = Result<Document, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some(chunk) = self.next_chunk() {
            if chunk.is_blank() {
                continue;
            }
            match self.parse_chunk(&chunk) {
                Ok(Some(tree)) => {
                    let document = Document::new(self.source.id(), self.index, chunk.line, tree);
                    self.index += 1;
                    return Some(Ok(document));
                }
                Ok(None) => continue,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            }
        }

        self.finished = true;
        None
    }
}

/// Human name of a YAML value's kind, for messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Text of a scalar value; sequences, mappings and null have none.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}
