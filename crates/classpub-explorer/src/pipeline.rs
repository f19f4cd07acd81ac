//! Declarative filter/map/sort pipeline over the trie.
//!
//! The pipeline is a fixed set of named, statically registered strategies
//! selected by configuration - no caller-supplied code runs. Each step kind
//! applies at most once; the default order is filter, map, sort. Unknown
//! step or strategy names parsed from configuration are reported to the
//! caller, which ignores them as forward-compatible no-ops.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::trie::TrieNode;

/// A pipeline step kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStep {
    /// Remove nodes via the configured filter strategy.
    Filter,
    /// Transform nodes via the configured map strategy.
    Map,
    /// Reorder folder children via the configured sort strategy.
    Sort,
}

impl PipelineStep {
    /// The default step order.
    #[must_use]
    pub fn default_order() -> Vec<Self> {
        vec![Self::Filter, Self::Map, Self::Sort]
    }
}

/// Error for an unrecognized step or strategy name.
///
/// Callers treat this as a no-op with a logged warning, not a failure.
#[derive(Debug, thiserror::Error)]
#[error("unknown name: {0}")]
pub struct UnknownName(pub String);

impl FromStr for PipelineStep {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "filter" => Ok(Self::Filter),
            "map" => Ok(Self::Map),
            "sort" => Ok(Self::Sort),
            other => Err(UnknownName(other.to_owned())),
        }
    }
}

/// Named filter strategies.
#[derive(Clone, Debug)]
pub enum FilterStrategy {
    /// Drop nodes named in the hidden set: files by record title, folders
    /// by path segment.
    HideTitles(BTreeSet<String>),
}

impl FilterStrategy {
    /// True if the node survives the filter.
    #[must_use]
    pub fn keep(&self, node: &TrieNode) -> bool {
        match self {
            Self::HideTitles(hidden) => match node {
                TrieNode::File(f) => !hidden.contains(&f.record.title),
                TrieNode::Folder(f) => !hidden.contains(&f.name),
            },
        }
    }
}

/// Named map strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapStrategy {
    /// Title-case synthesized folder titles (`"my-folder"` -> `"My Folder"`).
    TitleizeFolders,
}

impl MapStrategy {
    /// Apply the transform to one node.
    pub fn apply(self, node: &mut TrieNode) {
        match self {
            Self::TitleizeFolders => {
                if let TrieNode::Folder(folder) = node
                    && folder.synthetic
                    && let Some(record) = &mut folder.record
                {
                    record.title = titleize(&folder.name);
                }
            }
        }
    }
}

/// Named sort strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortStrategy {
    /// Folders first, then natural display-name order.
    Alphabetical,
    /// Most recently modified first; undated nodes last.
    NewestFirst,
}

impl FromStr for SortStrategy {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alphabetical" => Ok(Self::Alphabetical),
            "newest-first" => Ok(Self::NewestFirst),
            other => Err(UnknownName(other.to_owned())),
        }
    }
}

impl SortStrategy {
    /// Compare two sibling nodes.
    #[must_use]
    pub fn compare(self, a: &TrieNode, b: &TrieNode) -> Ordering {
        match self {
            Self::Alphabetical => b
                .is_folder()
                .cmp(&a.is_folder())
                .then_with(|| natural_cmp(a.display_name(), b.display_name())),
            Self::NewestFirst => {
                let (da, db) = (a.dates().modified, b.dates().modified);
                match (da, db) {
                    (Some(da), Some(db)) => db.cmp(&da),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
                .then_with(|| natural_cmp(a.display_name(), b.display_name()))
            }
        }
    }
}

/// Natural-order comparison of display names.
///
/// Case-insensitive; digit runs compare by numeric value rather than
/// character by character, so `"Unit 2"` sorts before `"Unit 10"`. Equal
/// names under those rules fall back to plain ordering so the comparison
/// stays antisymmetric.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ia = Chunks::new(a);
    let mut ib = Chunks::new(b);

    loop {
        match (ia.next(), ib.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                let ord = match (&ca, &cb) {
                    (Chunk::Number(na), Chunk::Number(nb)) => cmp_digit_runs(na, nb),
                    _ => ca.text_key().cmp(&cb.text_key()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compare two digit runs by numeric value without parsing to an integer
/// (runs of arbitrary length).
fn cmp_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A maximal run of digits or non-digits.
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

impl Chunk<'_> {
    fn text_key(&self) -> String {
        match self {
            Chunk::Text(s) | Chunk::Number(s) => s.to_lowercase(),
        }
    }
}

/// Iterator splitting a string into digit and non-digit chunks.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let is_digit = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if is_digit {
            Chunk::Number(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

/// Title-case a path segment (`"my-folder"` -> `"My Folder"`).
fn titleize(segment: &str) -> String {
    segment
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
