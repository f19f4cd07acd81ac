//! Per-folder listing assembly for index pages.
//!
//! A folder's index page lists its direct children in the order the tree
//! builder already established - the assembler never re-sorts. A
//! `renderFolderPages` frontmatter flag on the folder's index record turns
//! the listing off entirely; it defaults to on.

use serde::Serialize;

use classpub_content::{RecordDates, flag_enabled};

use crate::trie::{FolderNode, TrieNode};

/// Frontmatter flag controlling whether a folder's listing is rendered.
const RENDER_FLAG: &str = "renderFolderPages";

/// Options for assembling a folder listing.
#[derive(Clone, Copy, Debug)]
pub struct ListingOptions {
    /// Include synthetic entries for direct subfolders.
    pub show_subfolders: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            show_subfolders: true,
        }
    }
}

/// One entry of a folder's index page listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListItem {
    /// Display title.
    pub title: String,
    /// Link target path.
    pub path: String,
    /// True for subfolder entries.
    pub folder: bool,
    /// Entry dates for display.
    #[serde(skip_serializing_if = "RecordDates::is_empty")]
    pub dates: RecordDates,
}

/// True when the folder's index page should render a listing.
///
/// Recognized false-ish values of the `renderFolderPages` flag
/// (case-insensitive) are `false`, `no`, `off`, and `0`; anything else,
/// including a folder without the key or without an index record, renders.
#[must_use]
pub fn listing_enabled(folder: &FolderNode) -> bool {
    let value = folder
        .record
        .as_ref()
        .and_then(|record| record.extra.get(RENDER_FLAG));
    flag_enabled(value)
}

/// Assemble the listing of a folder's direct children.
///
/// Files map directly; subfolders become synthetic entries only when
/// `options.show_subfolders` is set, and are omitted entirely otherwise.
/// Ordering follows the folder's child order as built.
#[must_use]
pub fn list(folder: &FolderNode, options: &ListingOptions) -> Vec<ListItem> {
    folder
        .children
        .iter()
        .filter_map(|child| match child {
            TrieNode::File(file) => Some(ListItem {
                title: file.record.title.clone(),
                path: file.record.path.clone(),
                folder: false,
                dates: file.record.dates.clone(),
            }),
            TrieNode::Folder(sub) => options.show_subfolders.then(|| ListItem {
                title: sub.display_name().to_owned(),
                path: sub.path.clone(),
                folder: true,
                dates: sub
                    .record
                    .as_ref()
                    .map(|r| r.dates.clone())
                    .unwrap_or_default(),
            }),
        })
        .collect()
}
