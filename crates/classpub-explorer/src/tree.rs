//! Navigation tree building and rendering.
//!
//! [`ExplorerTree::build`] turns a composed record set into a navigation
//! tree:
//!
//! 1. Build the path trie from every record.
//! 2. Synthesize index records for folders that have none.
//! 3. Run the configured filter/map/sort pipeline.
//! 4. Determine which folders are expandable (allow-list, case-insensitive)
//!    and order the root's direct children: non-expandable folders,
//!    expandable folders, then files.
//!
//! A tree is rebuilt from scratch per navigation event; building twice from
//! identical inputs yields identical shape and ordering.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use classpub_content::{ContentRecord, RecordDates};

use crate::pipeline::{FilterStrategy, MapStrategy, PipelineStep, SortStrategy, UnknownName, natural_cmp};
use crate::state::{ExplorerState, FolderDefault};
use crate::trie::{FolderNode, PathTrie, TrieNode};

/// What clicking a folder label does in the rendered sidebar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderClickBehavior {
    /// Navigate to the folder's index page.
    #[default]
    Link,
    /// Toggle the folder's collapse state.
    Collapse,
}

impl FromStr for FolderClickBehavior {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "link" => Ok(Self::Link),
            "collapse" => Ok(Self::Collapse),
            other => Err(UnknownName(other.to_owned())),
        }
    }
}

/// Configuration for building and rendering an explorer tree.
#[derive(Clone, Debug)]
pub struct ExplorerOptions {
    /// Pipeline step order. Each kind applies at most once.
    pub order: Vec<PipelineStep>,
    /// Filter strategy, if any.
    pub filter: Option<FilterStrategy>,
    /// Map strategy, if any.
    pub map: Option<MapStrategy>,
    /// Sort strategy, if any.
    pub sort: Option<SortStrategy>,
    /// Allow-list of expandable folder names (matched case-insensitively).
    pub expandable: Vec<String>,
    /// Collapse state for folders without saved state.
    pub folder_default_state: FolderDefault,
    /// Folder label click behavior.
    pub folder_click_behavior: FolderClickBehavior,
    /// Whether saved collapse state is honored at render time.
    pub use_saved_state: bool,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        Self {
            order: PipelineStep::default_order(),
            filter: None,
            map: None,
            sort: Some(SortStrategy::Alphabetical),
            expandable: Vec::new(),
            folder_default_state: FolderDefault::Collapsed,
            folder_click_behavior: FolderClickBehavior::Link,
            use_saved_state: true,
        }
    }
}

/// A rendered sidebar entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NavItem {
    /// Display title.
    pub title: String,
    /// Link target path.
    pub path: String,
    /// Folder rendering info; `None` for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder: Option<NavFolder>,
    /// Child entries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
}

/// Folder-specific rendering info.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NavFolder {
    /// True when the folder participates in expand/collapse.
    pub expandable: bool,
    /// Current collapse state (always `false` for flat folders).
    pub collapsed: bool,
}

/// The rendered sidebar model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Navigation {
    /// Top-level entries.
    pub items: Vec<NavItem>,
    /// Folder label click behavior.
    pub folder_click_behavior: FolderClickBehavior,
}

/// A built navigation tree: trie plus expandable folder paths.
#[derive(Clone, Debug)]
pub struct ExplorerTree {
    trie: PathTrie,
    folder_paths: Vec<String>,
    expandable: BTreeSet<String>,
    options: ExplorerOptions,
}

impl ExplorerTree {
    /// Build a navigation tree from a composed record set.
    ///
    /// `now` supplies the dates of folders with no dated descendants;
    /// callers pass the build's start time so repeated builds from the same
    /// inputs are identical.
    #[must_use]
    pub fn build(
        records: impl IntoIterator<Item = ContentRecord>,
        options: ExplorerOptions,
        now: DateTime<Utc>,
    ) -> Self {
        let mut trie = PathTrie::from_records(records);

        synthesize_folder_records(trie.root_mut(), now);

        let mut applied: Vec<PipelineStep> = Vec::new();
        for step in &options.order {
            if applied.contains(step) {
                tracing::debug!(?step, "Pipeline step repeated, ignoring");
                continue;
            }
            applied.push(*step);
            match step {
                PipelineStep::Filter => {
                    if let Some(filter) = &options.filter {
                        trie.filter(|node| filter.keep(node));
                    }
                }
                PipelineStep::Map => {
                    if let Some(map) = options.map {
                        trie.for_each_mut(|node| map.apply(node));
                    }
                }
                PipelineStep::Sort => {
                    if let Some(sort) = options.sort {
                        trie.sort_by(|a, b| sort.compare(a, b));
                    }
                }
            }
        }

        let expandable: BTreeSet<String> = options
            .expandable
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        order_top_level(trie.root_mut(), &expandable);

        let mut folder_paths = Vec::new();
        collect_expandable_paths(trie.root(), &expandable, &mut folder_paths);

        Self {
            trie,
            folder_paths,
            expandable,
            options,
        }
    }

    /// Paths of expandable folders, in tree order.
    #[must_use]
    pub fn folder_paths(&self) -> &[String] {
        &self.folder_paths
    }

    /// The underlying trie.
    #[must_use]
    pub fn trie(&self) -> &PathTrie {
        &self.trie
    }

    /// Node at a path, or `None` when the location has no content.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&TrieNode> {
        self.trie.find(path)
    }

    /// Build options used for this tree.
    #[must_use]
    pub fn options(&self) -> &ExplorerOptions {
        &self.options
    }

    /// Render the sidebar model.
    ///
    /// Collapse state comes from `state` (already reconciled against this
    /// tree), falling back to the configured default. A folder whose path is
    /// a prefix of `active_path` always renders expanded so the current
    /// location stays reachable.
    #[must_use]
    pub fn navigation(&self, state: &ExplorerState, active_path: Option<&str>) -> Navigation {
        let items = self
            .trie
            .root()
            .children
            .iter()
            .map(|child| self.render_node(child, state, active_path))
            .collect();

        Navigation {
            items,
            folder_click_behavior: self.options.folder_click_behavior,
        }
    }

    fn render_node(
        &self,
        node: &TrieNode,
        state: &ExplorerState,
        active_path: Option<&str>,
    ) -> NavItem {
        match node {
            TrieNode::File(file) => NavItem {
                title: file.record.title.clone(),
                path: file.record.path.clone(),
                folder: None,
                children: Vec::new(),
            },
            TrieNode::Folder(folder) => {
                let expandable = self.is_expandable(folder);
                let collapsed = expandable && self.resolve_collapsed(folder, state, active_path);

                NavItem {
                    title: folder.display_name().to_owned(),
                    path: folder.path.clone(),
                    folder: Some(NavFolder {
                        expandable,
                        collapsed,
                    }),
                    children: folder
                        .children
                        .iter()
                        .map(|child| self.render_node(child, state, active_path))
                        .collect(),
                }
            }
        }
    }

    fn resolve_collapsed(
        &self,
        folder: &FolderNode,
        state: &ExplorerState,
        active_path: Option<&str>,
    ) -> bool {
        if active_path.is_some_and(|active| path_is_prefix(&folder.path, active)) {
            return false;
        }
        if self.options.use_saved_state
            && let Some(collapsed) = state.collapsed(&folder.path)
        {
            return collapsed;
        }
        self.options.folder_default_state.collapsed()
    }

    fn is_expandable(&self, folder: &FolderNode) -> bool {
        self.expandable.contains(&folder.name.to_lowercase())
    }
}

/// True when `folder_path` is `active` or an ancestor of it.
fn path_is_prefix(folder_path: &str, active: &str) -> bool {
    active == folder_path
        || (active.len() > folder_path.len()
            && active.starts_with(folder_path)
            && active.as_bytes()[folder_path.len()] == b'/')
}

/// Synthesize index records for folders that have none.
///
/// Returns the aggregate of real (file-backed) record dates in the subtree;
/// synthesized dates never feed back into an ancestor's aggregate.
fn synthesize_folder_records(folder: &mut FolderNode, now: DateTime<Utc>) -> RecordDates {
    let mut aggregate = if folder.is_file_backed() {
        folder
            .record
            .as_ref()
            .map(|r| r.dates.clone())
            .unwrap_or_default()
    } else {
        RecordDates::default()
    };

    for child in &mut folder.children {
        match child {
            TrieNode::File(file) => aggregate = aggregate.max(&file.record.dates),
            TrieNode::Folder(sub) => {
                aggregate = aggregate.max(&synthesize_folder_records(sub, now));
            }
        }
    }

    if folder.record.is_none() && !folder.path.is_empty() {
        let dates = if aggregate.is_empty() {
            RecordDates {
                created: Some(now),
                modified: Some(now),
                published: Some(now),
            }
        } else {
            aggregate.clone()
        };

        let mut record = ContentRecord::new(folder.path.clone(), folder.name.clone());
        record.dates = dates;
        folder.record = Some(record);
        folder.synthetic = true;
    }

    aggregate
}

/// Order the root's direct children: non-expandable folders, expandable
/// folders, then files.
///
/// The folder groups each sort by natural display-name order; the file
/// group keeps whatever order the pipeline produced. Applies only at the
/// top level, never deeper.
fn order_top_level(root: &mut FolderNode, expandable: &BTreeSet<String>) {
    let children = std::mem::take(&mut root.children);

    let mut flat_folders = Vec::new();
    let mut expandable_folders = Vec::new();
    let mut files = Vec::new();

    for child in children {
        match &child {
            TrieNode::Folder(folder) => {
                if expandable.contains(&folder.name.to_lowercase()) {
                    expandable_folders.push(child);
                } else {
                    flat_folders.push(child);
                }
            }
            TrieNode::File(_) => files.push(child),
        }
    }

    flat_folders.sort_by(|a, b| natural_cmp(a.display_name(), b.display_name()));
    expandable_folders.sort_by(|a, b| natural_cmp(a.display_name(), b.display_name()));

    root.children = flat_folders;
    root.children.extend(expandable_folders);
    root.children.extend(files);
}

/// Collect expandable folder paths, pre-order.
fn collect_expandable_paths(
    folder: &FolderNode,
    expandable: &BTreeSet<String>,
    out: &mut Vec<String>,
) {
    for child in &folder.children {
        if let TrieNode::Folder(sub) = child {
            if expandable.contains(&sub.name.to_lowercase()) {
                out.push(sub.path.clone());
            }
            collect_expandable_paths(sub, expandable, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    // A built tree is read concurrently by render and listing consumers
    static_assertions::assert_impl_all!(super::ExplorerTree: Send, Sync);

    use crate::state::FolderState;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn dated(path: &str, title: &str, created: DateTime<Utc>) -> ContentRecord {
        let mut record = ContentRecord::new(path, title);
        record.dates.created = Some(created);
        record.dates.modified = Some(created);
        record
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_synthesizes_missing_folder_records() {
        let tree = ExplorerTree::build(
            [ContentRecord::new("Concepts/vars", "Variables")],
            ExplorerOptions::default(),
            now(),
        );

        let Some(TrieNode::Folder(folder)) = tree.find("Concepts") else {
            panic!("expected folder");
        };
        assert!(folder.synthetic);
        let record = folder.record.as_ref().unwrap();
        assert_eq!(record.title, "Concepts");
    }

    #[test]
    fn test_synthetic_dates_take_component_max() {
        let tree = ExplorerTree::build(
            [
                dated("Unit/a", "A", date(2024, 1, 1)),
                dated("Unit/b", "B", date(2024, 6, 1)),
            ],
            ExplorerOptions::default(),
            now(),
        );

        let Some(TrieNode::Folder(folder)) = tree.find("Unit") else {
            panic!("expected folder");
        };
        let dates = &folder.record.as_ref().unwrap().dates;
        assert_eq!(dates.created, Some(date(2024, 6, 1)));
        assert_eq!(dates.modified, Some(date(2024, 6, 1)));
    }

    #[test]
    fn test_synthetic_dates_default_to_now_when_undated() {
        let mut record = ContentRecord::new("Empty/child", "Child");
        record.dates = RecordDates::default();

        let tree = ExplorerTree::build([record], ExplorerOptions::default(), now());

        let Some(TrieNode::Folder(folder)) = tree.find("Empty") else {
            panic!("expected folder");
        };
        let dates = &folder.record.as_ref().unwrap().dates;
        assert_eq!(dates.created, Some(now()));
        assert_eq!(dates.modified, Some(now()));
    }

    #[test]
    fn test_synthetic_sibling_dates_do_not_leak_upward() {
        // "Outer" has one dated file and one undated subfolder; the
        // subfolder's synthesized now-dates must not override the real max
        let tree = ExplorerTree::build(
            [
                dated("Outer/dated", "Dated", date(2024, 3, 1)),
                ContentRecord::new("Outer/Undated/leaf", "Leaf"),
            ],
            ExplorerOptions::default(),
            now(),
        );

        let Some(TrieNode::Folder(outer)) = tree.find("Outer") else {
            panic!("expected folder");
        };
        assert_eq!(
            outer.record.as_ref().unwrap().dates.created,
            Some(date(2024, 3, 1))
        );
    }

    #[test]
    fn test_top_level_ordering_policy() {
        let options = ExplorerOptions {
            expandable: vec!["Exercises".to_owned()],
            sort: None,
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [
                ContentRecord::new("Zeta/a", "A"),
                ContentRecord::new("Exercises/b", "B"),
                ContentRecord::new("intro", "intro.md"),
                ContentRecord::new("Apple/c", "C"),
            ],
            options,
            now(),
        );

        let names: Vec<_> = tree
            .trie()
            .root()
            .children
            .iter()
            .map(TrieNode::segment)
            .collect();
        assert_eq!(names, vec!["Apple", "Zeta", "Exercises", "intro"]);
    }

    #[test]
    fn test_top_level_file_order_keeps_pipeline_order() {
        let options = ExplorerOptions {
            sort: Some(SortStrategy::Alphabetical),
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [
                ContentRecord::new("zeta", "Zeta"),
                ContentRecord::new("apple", "Apple"),
            ],
            options,
            now(),
        );

        let names: Vec<_> = tree
            .trie()
            .root()
            .children
            .iter()
            .map(TrieNode::segment)
            .collect();
        // Pipeline sort already ordered the files; top-level pass keeps it
        assert_eq!(names, vec!["apple", "zeta"]);
    }

    #[test]
    fn test_expandability_is_case_insensitive() {
        let options = ExplorerOptions {
            expandable: vec!["exercises".to_owned()],
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [ContentRecord::new("Exercises/a", "A")],
            options,
            now(),
        );

        assert_eq!(tree.folder_paths(), ["Exercises".to_owned()]);
    }

    #[test]
    fn test_non_expandable_folders_excluded_from_folder_paths() {
        let options = ExplorerOptions {
            expandable: vec!["Tasks".to_owned()],
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [
                ContentRecord::new("Tasks/a", "A"),
                ContentRecord::new("Media/b", "B"),
            ],
            options,
            now(),
        );

        assert_eq!(tree.folder_paths(), ["Tasks".to_owned()]);
    }

    #[test]
    fn test_hidden_filter_runs_in_pipeline() {
        let hidden = ["Media".to_owned()].into();
        let options = ExplorerOptions {
            filter: Some(FilterStrategy::HideTitles(hidden)),
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [
                ContentRecord::new("Media/logo", "Logo"),
                ContentRecord::new("guide", "Guide"),
            ],
            options,
            now(),
        );

        assert!(tree.find("Media").is_none());
        assert!(tree.find("guide").is_some());
    }

    #[test]
    fn test_build_is_idempotent() {
        let records = vec![
            ContentRecord::new("Tasks/quiz", "Quiz"),
            ContentRecord::new("Concepts/vars", "Variables"),
            ContentRecord::new("intro", "Intro"),
        ];
        let options = ExplorerOptions {
            expandable: vec!["Tasks".to_owned()],
            ..Default::default()
        };

        let first = ExplorerTree::build(records.clone(), options.clone(), now());
        let second = ExplorerTree::build(records, options, now());

        assert_eq!(first.folder_paths(), second.folder_paths());
        let state = ExplorerState::default();
        assert_eq!(first.navigation(&state, None), second.navigation(&state, None));
    }

    #[test]
    fn test_navigation_collapse_state_resolution() {
        let options = ExplorerOptions {
            expandable: vec!["Tasks".to_owned(), "Concepts".to_owned()],
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [
                ContentRecord::new("Tasks/quiz", "Quiz"),
                ContentRecord::new("Concepts/vars", "Variables"),
            ],
            options,
            now(),
        );

        let state = ExplorerState::from_entries(vec![FolderState {
            path: "Tasks".to_owned(),
            collapsed: false,
        }]);
        let nav = tree.navigation(&state, None);

        let by_path = |p: &str| {
            nav.items
                .iter()
                .find(|i| i.path == p)
                .and_then(|i| i.folder)
                .unwrap()
        };
        // Saved state wins for Tasks; Concepts falls back to the default
        assert!(!by_path("Tasks").collapsed);
        assert!(by_path("Concepts").collapsed);
    }

    #[test]
    fn test_active_path_forces_ancestors_expanded() {
        let options = ExplorerOptions {
            expandable: vec!["Tasks".to_owned()],
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [ContentRecord::new("Tasks/unit1/quiz", "Quiz")],
            options,
            now(),
        );

        let state = ExplorerState::from_entries(vec![FolderState {
            path: "Tasks".to_owned(),
            collapsed: true,
        }]);

        let nav = tree.navigation(&state, Some("Tasks/unit1/quiz"));
        assert!(!nav.items[0].folder.unwrap().collapsed);

        // Without an active path inside it, saved state applies
        let nav = tree.navigation(&state, Some("elsewhere"));
        assert!(nav.items[0].folder.unwrap().collapsed);
    }

    #[test]
    fn test_use_saved_state_false_ignores_state() {
        let options = ExplorerOptions {
            expandable: vec!["Tasks".to_owned()],
            use_saved_state: false,
            ..Default::default()
        };
        let tree = ExplorerTree::build(
            [ContentRecord::new("Tasks/quiz", "Quiz")],
            options,
            now(),
        );

        let state = ExplorerState::from_entries(vec![FolderState {
            path: "Tasks".to_owned(),
            collapsed: false,
        }]);
        let nav = tree.navigation(&state, None);

        // Default state (collapsed) wins because saved state is disabled
        assert!(nav.items[0].folder.unwrap().collapsed);
    }

    #[test]
    fn test_flat_folders_render_uncollapsed() {
        let tree = ExplorerTree::build(
            [ContentRecord::new("Media/logo", "Logo")],
            ExplorerOptions::default(),
            now(),
        );

        let state = ExplorerState::default();
        let nav = tree.navigation(&state, None);

        let folder = nav.items[0].folder.unwrap();
        assert!(!folder.expandable);
        assert!(!folder.collapsed);
    }

    #[test]
    fn test_unknown_pipeline_step_name_is_ignored_at_parse() {
        let parsed: Vec<PipelineStep> = ["filter", "shuffle", "sort"]
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();

        assert_eq!(parsed, vec![PipelineStep::Filter, PipelineStep::Sort]);
    }

    #[test]
    fn test_path_is_prefix() {
        assert!(path_is_prefix("Tasks", "Tasks"));
        assert!(path_is_prefix("Tasks", "Tasks/unit1"));
        assert!(!path_is_prefix("Tasks", "Tasks2/unit1"));
        assert!(!path_is_prefix("Tasks/unit1", "Tasks"));
    }
}
