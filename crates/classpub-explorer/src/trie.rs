//! Path trie over content records.
//!
//! Records are indexed by their slash-delimited path segments. Leaves are
//! [`FileNode`]s wrapping exactly one record; interior nodes are
//! [`FolderNode`]s that may carry their own record (a folder index page) and
//! own an ordered child list. Child ordering is insertion order until a sort
//! step reorders it.

use std::cmp::Ordering;

use classpub_content::{ContentRecord, RecordDates};

/// A node in the path trie: a file leaf or a folder.
#[derive(Clone, Debug, PartialEq)]
pub enum TrieNode {
    /// Leaf wrapping exactly one content record.
    File(FileNode),
    /// Interior node owning an ordered child list.
    Folder(FolderNode),
}

impl TrieNode {
    /// URL path of this node.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.record.path,
            Self::Folder(f) => &f.path,
        }
    }

    /// Last path segment of this node.
    #[must_use]
    pub fn segment(&self) -> &str {
        match self {
            Self::File(f) => f.record.file_name(),
            Self::Folder(f) => &f.name,
        }
    }

    /// Display name: the record title for files, the folder's display name
    /// for folders.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::File(f) => &f.record.title,
            Self::Folder(f) => f.display_name(),
        }
    }

    /// Dates of the node's record (empty when a folder has none yet).
    #[must_use]
    pub fn dates(&self) -> RecordDates {
        match self {
            Self::File(f) => f.record.dates.clone(),
            Self::Folder(f) => f
                .record
                .as_ref()
                .map(|r| r.dates.clone())
                .unwrap_or_default(),
        }
    }

    /// True for folder nodes.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// Leaf node wrapping one content record.
#[derive(Clone, Debug, PartialEq)]
pub struct FileNode {
    /// The wrapped record.
    pub record: ContentRecord,
}

/// Interior node: a folder with an ordered child list.
#[derive(Clone, Debug, PartialEq)]
pub struct FolderNode {
    /// URL path of the folder (`""` for the root).
    pub path: String,
    /// Last path segment (`""` for the root).
    pub name: String,
    /// The folder's own index record, if any.
    pub record: Option<ContentRecord>,
    /// True when `record` was synthesized rather than file-backed.
    pub synthetic: bool,
    /// Ordered children, keyed by path segment.
    pub children: Vec<TrieNode>,
}

impl FolderNode {
    fn new(path: String, name: String) -> Self {
        Self {
            path,
            name,
            record: None,
            synthetic: false,
            children: Vec::new(),
        }
    }

    /// Display name: the index record's title when one exists, else the
    /// path segment.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.record.as_ref().map_or(&self.name, |r| &r.title)
    }

    /// True when the folder's record is backed by an actual file.
    #[must_use]
    pub fn is_file_backed(&self) -> bool {
        self.record.is_some() && !self.synthetic
    }

    /// Child node with the given path segment.
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&TrieNode> {
        self.children.iter().find(|c| c.segment() == segment)
    }
}

/// Ordered hierarchical index of content records.
#[derive(Clone, Debug)]
pub struct PathTrie {
    root: FolderNode,
}

impl Default for PathTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTrie {
    /// Create an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: FolderNode::new(String::new(), String::new()),
        }
    }

    /// Build a trie by inserting every record in order.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let mut trie = Self::new();
        for record in records {
            trie.insert(record);
        }
        trie
    }

    /// Root folder of the trie.
    #[must_use]
    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    /// Mutable root folder of the trie.
    pub fn root_mut(&mut self) -> &mut FolderNode {
        &mut self.root
    }

    /// Insert a record, creating intermediate folders as needed.
    ///
    /// A record whose path names an existing folder attaches to it as the
    /// folder's index record. Repeated inserts at the same path are
    /// last-write-wins - the trie never holds duplicate siblings.
    pub fn insert(&mut self, record: ContentRecord) {
        let path = record.path.clone();
        let segments: Vec<&str> = path.split('/').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        let mut walked = String::new();
        for segment in parents {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(segment);
            current = Self::ensure_folder(current, segment, &walked);
        }

        Self::attach(current, last, record);
    }

    /// Attach a record as a child of `folder` under segment `name`.
    fn attach(folder: &mut FolderNode, name: &str, record: ContentRecord) {
        for child in &mut folder.children {
            match child {
                TrieNode::Folder(f) if f.name == name => {
                    // Folder index record; last write wins
                    f.record = Some(record);
                    f.synthetic = false;
                    return;
                }
                TrieNode::File(f) if f.record.file_name() == name => {
                    f.record = record;
                    return;
                }
                _ => {}
            }
        }
        folder.children.push(TrieNode::File(FileNode { record }));
    }

    /// Get or create the folder child of `parent` named `name`.
    ///
    /// An existing file leaf at that position is promoted to a folder
    /// carrying the file's record as its index.
    fn ensure_folder<'a>(
        parent: &'a mut FolderNode,
        name: &str,
        path: &str,
    ) -> &'a mut FolderNode {
        let position = parent.children.iter().position(|c| c.segment() == name);

        let index = match position {
            Some(i) => {
                if let TrieNode::File(file) = &parent.children[i] {
                    let mut folder = FolderNode::new(path.to_owned(), name.to_owned());
                    folder.record = Some(file.record.clone());
                    parent.children[i] = TrieNode::Folder(folder);
                }
                i
            }
            None => {
                parent
                    .children
                    .push(TrieNode::Folder(FolderNode::new(path.to_owned(), name.to_owned())));
                parent.children.len() - 1
            }
        };

        match &mut parent.children[index] {
            TrieNode::Folder(f) => f,
            TrieNode::File(_) => unreachable!("file leaf was just promoted to a folder"),
        }
    }

    /// Node at the given path, or `None` when the location is not in the
    /// tree (a recoverable "no content" signal, not an error).
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&TrieNode> {
        if path.is_empty() {
            return None;
        }

        let mut segments = path.split('/');
        let first = segments.next()?;
        let mut node = self.root.child(first)?;

        for segment in segments {
            match node {
                TrieNode::Folder(f) => node = f.child(segment)?,
                TrieNode::File(_) => return None,
            }
        }
        Some(node)
    }

    /// Remove subtrees whose root fails the predicate, bottom-up.
    ///
    /// Children are filtered before their parent is evaluated. A folder that
    /// passes the predicate but ends up with no children and no file-backed
    /// record of its own is pruned as well - synthesized records exist for
    /// display, not for keeping empty subtrees alive.
    pub fn filter<F: Fn(&TrieNode) -> bool>(&mut self, predicate: F) {
        Self::filter_folder(&mut self.root, &predicate);
    }

    fn filter_folder<F: Fn(&TrieNode) -> bool>(folder: &mut FolderNode, predicate: &F) {
        folder.children.retain_mut(|child| {
            if let TrieNode::Folder(f) = child {
                Self::filter_folder(f, predicate);
            }
            if !predicate(child) {
                return false;
            }
            match child {
                TrieNode::File(_) => true,
                TrieNode::Folder(f) => !f.children.is_empty() || f.is_file_backed(),
            }
        });
    }

    /// Apply a side-effecting transform to every node, pre-order.
    pub fn for_each_mut<F: FnMut(&mut TrieNode)>(&mut self, mut f: F) {
        Self::visit_folder(&mut self.root, &mut f);
    }

    fn visit_folder<F: FnMut(&mut TrieNode)>(folder: &mut FolderNode, f: &mut F) {
        for child in &mut folder.children {
            f(child);
            if let TrieNode::Folder(sub) = child {
                Self::visit_folder(sub, f);
            }
        }
    }

    /// Reorder every folder's children with the comparator, recursively.
    ///
    /// The sort is stable: ties keep their existing relative order.
    pub fn sort_by<F: Fn(&TrieNode, &TrieNode) -> Ordering>(&mut self, comparator: F) {
        Self::sort_folder(&mut self.root, &comparator);
    }

    fn sort_folder<F: Fn(&TrieNode, &TrieNode) -> Ordering>(folder: &mut FolderNode, cmp: &F) {
        folder.children.sort_by(|a, b| cmp(a, b));
        for child in &mut folder.children {
            if let TrieNode::Folder(sub) = child {
                Self::sort_folder(sub, cmp);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(path: &str) -> ContentRecord {
        let title = path.rsplit('/').next().unwrap_or(path).to_owned();
        ContentRecord::new(path, title)
    }

    fn trie(paths: &[&str]) -> PathTrie {
        PathTrie::from_records(paths.iter().map(|p| record(p)))
    }

    #[test]
    fn test_insert_creates_intermediate_folders() {
        let trie = trie(&["a/b/c"]);

        let Some(TrieNode::Folder(a)) = trie.find("a") else {
            panic!("expected folder at a");
        };
        assert_eq!(a.path, "a");
        assert!(a.record.is_none());

        assert!(matches!(trie.find("a/b"), Some(TrieNode::Folder(_))));
        assert!(matches!(trie.find("a/b/c"), Some(TrieNode::File(_))));
    }

    #[test]
    fn test_insert_attaches_folder_index() {
        // Index record first, child after
        let trie = trie(&["Exercises", "Exercises/loops"]);

        let Some(TrieNode::Folder(folder)) = trie.find("Exercises") else {
            panic!("expected folder");
        };
        assert!(folder.is_file_backed());
        assert_eq!(folder.children.len(), 1);
    }

    #[test]
    fn test_insert_index_after_children() {
        // Child first; index record attaches to the existing folder
        let trie = trie(&["Exercises/loops", "Exercises"]);

        let Some(TrieNode::Folder(folder)) = trie.find("Exercises") else {
            panic!("expected folder");
        };
        assert!(folder.is_file_backed());
        assert_eq!(folder.children.len(), 1);
    }

    #[test]
    fn test_insert_same_path_last_write_wins() {
        let mut trie = PathTrie::new();
        trie.insert(ContentRecord::new("page", "First"));
        trie.insert(ContentRecord::new("page", "Second"));

        assert_eq!(trie.root().children.len(), 1);
        let Some(TrieNode::File(file)) = trie.find("page") else {
            panic!("expected file");
        };
        assert_eq!(file.record.title, "Second");
    }

    #[test]
    fn test_insertion_order_preserved() {
        let trie = trie(&["zeta", "alpha", "mid"]);

        let names: Vec<_> = trie.root().children.iter().map(TrieNode::segment).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_find_miss_is_none() {
        let trie = trie(&["a/b"]);

        assert!(trie.find("a/x").is_none());
        assert!(trie.find("a/b/c").is_none());
        assert!(trie.find("").is_none());
    }

    #[test]
    fn test_filter_removes_failing_subtree() {
        let mut trie = trie(&["keep/one", "drop/two", "drop/three"]);

        trie.filter(|node| node.segment() != "drop");

        assert!(trie.find("keep/one").is_some());
        assert!(trie.find("drop").is_none());
        assert!(trie.find("drop/two").is_none());
    }

    #[test]
    fn test_filter_prunes_emptied_folders() {
        let mut trie = trie(&["folder/only-child"]);

        trie.filter(|node| node.segment() != "only-child");

        // Folder had no file-backed record and lost its only child
        assert!(trie.find("folder").is_none());
    }

    #[test]
    fn test_filter_keeps_file_backed_emptied_folder() {
        let mut trie = trie(&["folder", "folder/only-child"]);

        trie.filter(|node| node.segment() != "only-child");

        assert!(trie.find("folder").is_some());
    }

    #[test]
    fn test_filter_keeps_folder_with_surviving_descendant() {
        let mut trie = trie(&["folder/keep", "folder/drop"]);

        trie.filter(|node| node.segment() != "drop");

        assert!(trie.find("folder").is_some());
        assert!(trie.find("folder/keep").is_some());
        assert!(trie.find("folder/drop").is_none());
    }

    #[test]
    fn test_for_each_mut_visits_every_node() {
        let mut trie = trie(&["a/b", "c"]);

        let mut visited = Vec::new();
        trie.for_each_mut(|node| visited.push(node.path().to_owned()));

        assert_eq!(visited, vec!["a", "a/b", "c"]);
    }

    #[test]
    fn test_sort_recursive_and_stable() {
        let mut trie = trie(&["f/z", "f/a", "b", "a"]);

        trie.sort_by(|x, y| x.segment().cmp(y.segment()));

        let top: Vec<_> = trie.root().children.iter().map(TrieNode::segment).collect();
        assert_eq!(top, vec!["a", "b", "f"]);

        let Some(TrieNode::Folder(f)) = trie.find("f") else {
            panic!("expected folder");
        };
        let inner: Vec<_> = f.children.iter().map(TrieNode::segment).collect();
        assert_eq!(inner, vec!["a", "z"]);
    }
}
