//! Navigation tree building and explorer state for classpub.
//!
//! This crate turns a composed record set into the sidebar and folder-page
//! models the static renderer consumes:
//!
//! - [`PathTrie`] - ordered hierarchical index of records by path segment
//! - [`ExplorerTree`] - the built navigation tree: trie + pipeline +
//!   synthesized folder records + expandability
//! - [`ExplorerState`] / [`StateStore`] - persisted expand/collapse state,
//!   reconciled against each freshly built tree
//! - [`list`] - per-folder listing assembly for index pages
//!
//! # Rebuild model
//!
//! A tree is rebuilt from scratch for every navigation event; nothing is
//! cached at module level. The pipeline mutates folder child lists in
//! place, so a tree instance is not meant to be shared across threads while
//! building - build, then read.

mod listing;
mod pipeline;
mod state;
mod tree;
mod trie;

pub use listing::{ListItem, ListingOptions, list, listing_enabled};
pub use pipeline::{
    FilterStrategy, MapStrategy, PipelineStep, SortStrategy, UnknownName, natural_cmp,
};
pub use state::{ExplorerState, FileStateStore, FolderDefault, FolderState, NullStateStore, StateStore};
pub use tree::{ExplorerOptions, ExplorerTree, FolderClickBehavior, NavFolder, NavItem, Navigation};
pub use trie::{FileNode, FolderNode, PathTrie, TrieNode};
