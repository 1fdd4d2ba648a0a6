//! Field paths over document trees.
//!
//! A path is a dotted list of keys with optional `[n]` indices, e.g.
//! `boot.required_files[0]`. `*` (or `[*]`) matches every key of a mapping
//! or every element of a sequence.

use std::fmt;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

/// A value found under a path, with its concrete location.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'v> {
    pub path: String,
    pub value: &'v Value,
}

impl FromStr for FieldPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err("field path is empty".to_string());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (key, mut indices) = match part.find('[') {
                Some(open) => (&part[..open], &part[open..]),
                None => (part, ""),
            };

            match key {
                "" if indices.is_empty() => {
                    return Err(format!("field path `{}` has an empty segment", s))
                }
                "" => {}
                "*" => segments.push(Segment::Any),
                key => segments.push(Segment::Key(key.to_string())),
            }

            while !indices.is_empty() {
                let close = indices
                    .find(']')
                    .ok_or_else(|| format!("field path `{}` has an unclosed `[`", s))?;
                let inner = &indices[1..close];
                if inner == "*" {
                    segments.push(Segment::Any);
                } else {
                    let index = inner
                        .parse()
                        .map_err(|_| format!("field path `{}` has a bad index `{}`", s, inner))?;
                    segments.push(Segment::Index(index));
                }
                indices = &indices[close + 1..];
                if !indices.is_empty() && !indices.starts_with('[') {
                    return Err(format!("field path `{}` is malformed", s));
                }
            }
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FieldPath {
    /// Every value under this path, in document order.
    pub fn lookup<'v>(&self, root: &'v Mapping) -> Vec<Match<'v>> {
        let mut current: Vec<(String, &'v Value)> = Vec::new();
        let mut first = true;

        for segment in &self.segments {
            let mut next = Vec::new();
            if first {
                descend_mapping(root, "", segment, &mut next);
                first = false;
            } else {
                for (path, value) in &current {
                    match value {
                        Value::Mapping(mapping) => descend_mapping(mapping, path, segment, &mut next),
                        Value::Sequence(items) => descend_sequence(items, path, segment, &mut next),
                        Value::Tagged(tagged) => {
                            if let Value::Mapping(mapping) = &tagged.value {
                                descend_mapping(mapping, path, segment, &mut next)
                            }
                        }
                        _ => {}
                    }
                }
            }
            current = next;
        }

        current
            .into_iter()
            .map(|(path, value)| Match { path, value })
            .collect()
    }

    /// The first value under this path.
    pub fn first<'v>(&self, root: &'v Mapping) -> Option<Match<'v>> {
        self.lookup(root).into_iter().next()
    }
}

fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn descend_mapping<'v>(
    mapping: &'v Mapping,
    parent: &str,
    segment: &Segment,
    out: &mut Vec<(String, &'v Value)>,
) {
    match segment {
        Segment::Key(key) => {
            if let Some(value) = mapping.get(key.as_str()) {
                out.push((join_key(parent, key), value));
            }
        }
        Segment::Any => {
            for (key, value) in mapping {
                if let Some(key) = key_text(key) {
                    out.push((join_key(parent, &key), value));
                }
            }
        }
        Segment::Index(_) => {}
    }
}

fn descend_sequence<'v>(
    items: &'v [Value],
    parent: &str,
    segment: &Segment,
    out: &mut Vec<(String, &'v Value)>,
) {
    match segment {
        Segment::Index(index) => {
            if let Some(value) = items.get(*index) {
                out.push((format!("{}[{}]", parent, index), value));
            }
        }
        Segment::Any => {
            for (index, value) in items.iter().enumerate() {
                out.push((format!("{}[{}]", parent, index), value));
            }
        }
        Segment::Key(_) => {}
    }
}

fn key_text(key: &Value) -> Option<String> {
    crate::document::scalar_text(key)
}

/// One node of a document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'v> {
    pub path: String,
    /// Mapping key of this node, if it sits in a mapping
    pub key: Option<String>,
    pub value: &'v Value,
}

/// Every node of a tree, depth-first in document order.
pub fn walk(root: &Mapping) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    walk_mapping(root, "", &mut nodes);
    nodes
}

fn walk_mapping<'v>(mapping: &'v Mapping, parent: &str, out: &mut Vec<Node<'v>>) {
    for (key, value) in mapping {
        let Some(key) = key_text(key) else { continue };
        let path = join_key(parent, &key);
        out.push(Node {
            path: path.clone(),
            key: Some(key),
            value,
        });
        walk_value(value, &path, out);
    }
}

fn walk_value<'v>(value: &'v Value, path: &str, out: &mut Vec<Node<'v>>) {
    match value {
        Value::Mapping(mapping) => walk_mapping(mapping, path, out),
        Value::Sequence(items) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                out.push(Node {
                    path: item_path.clone(),
                    key: None,
                    value: item,
                });
                walk_value(item, &item_path, out);
            }
        }
        Value::Tagged(tagged) => walk_value(&tagged.value, path, out),
        _ => {}
    }
}
