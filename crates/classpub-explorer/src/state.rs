//! Persisted expand/collapse state.
//!
//! The sidebar's collapse state survives across builds as a flat array of
//! `(path, collapsed)` pairs under a single storage key. Each navigation
//! render loads the stored state once, reconciles it against the freshly
//! built tree (stale paths dropped, new folders defaulted), and writes it
//! back wholesale on every toggle. Missing or corrupt stored state is
//! treated as empty - never an error.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pipeline::UnknownName;

/// Default collapse state for folders without saved state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderDefault {
    /// New folders start collapsed.
    #[default]
    Collapsed,
    /// New folders start expanded.
    Expanded,
}

impl FolderDefault {
    /// The collapse value this default resolves to.
    #[must_use]
    pub fn collapsed(self) -> bool {
        matches!(self, Self::Collapsed)
    }
}

impl FromStr for FolderDefault {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "collapsed" => Ok(Self::Collapsed),
            "expanded" => Ok(Self::Expanded),
            other => Err(UnknownName(other.to_owned())),
        }
    }
}

/// Collapse state of one expandable folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderState {
    /// Folder path.
    pub path: String,
    /// True when the folder is collapsed.
    pub collapsed: bool,
}

/// Collapse state of every expandable folder, in tree order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExplorerState {
    entries: Vec<FolderState>,
}

impl ExplorerState {
    /// Create state from entries.
    #[must_use]
    pub fn from_entries(entries: Vec<FolderState>) -> Self {
        Self { entries }
    }

    /// The entries, in stored order.
    #[must_use]
    pub fn entries(&self) -> &[FolderState] {
        &self.entries
    }

    /// True when no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored collapse value for a path, if present.
    #[must_use]
    pub fn collapsed(&self, path: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.collapsed)
    }

    /// Reconcile stored state against a freshly built tree.
    ///
    /// Every path in `folder_paths` gets its stored value when present,
    /// else the default. Stored paths absent from `folder_paths` are
    /// dropped - the folder no longer exists or became non-expandable. The
    /// result follows `folder_paths` order, so persisted output is stable.
    #[must_use]
    pub fn reconcile(&self, folder_paths: &[String], default: FolderDefault) -> Self {
        let entries = folder_paths
            .iter()
            .map(|path| FolderState {
                path: path.clone(),
                collapsed: self.collapsed(path).unwrap_or_else(|| default.collapsed()),
            })
            .collect();
        Self { entries }
    }

    /// Flip the stored value for a path, creating an entry if absent.
    ///
    /// A missing entry flips from the supplied default.
    pub fn toggle(&mut self, path: &str, default: FolderDefault) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.path == path) {
            entry.collapsed = !entry.collapsed;
        } else {
            self.entries.push(FolderState {
                path: path.to_owned(),
                collapsed: !default.collapsed(),
            });
        }
    }
}

/// Persistence boundary for [`ExplorerState`].
///
/// One externally addressable key holds the whole serialized array; every
/// save overwrites it wholesale. No locking is provided - state is read
/// once per render and written on discrete user actions, last write wins.
pub trait StateStore {
    /// Load the stored state. Missing or corrupt state loads as empty.
    fn load(&self) -> ExplorerState;

    /// Persist the state, replacing whatever was stored.
    ///
    /// Failures are logged, never propagated - collapse state is a
    /// convenience, not content.
    fn save(&self, state: &ExplorerState);
}

/// File-backed [`StateStore`] holding the state as one JSON document.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Create a store persisting to `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> ExplorerState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved explorer state");
                return ExplorerState::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read explorer state, starting empty");
                return ExplorerState::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Corrupt explorer state, starting empty");
                ExplorerState::default()
            }
        }
    }

    fn save(&self, state: &ExplorerState) {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create state directory");
            return;
        }

        match serde_json::to_vec_pretty(state) {
            Ok(bytes) => {
                if let Err(e) = fs::write(&self.path, bytes) {
                    tracing::warn!(path = %self.path.display(), error = %e, "Failed to write explorer state");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize explorer state");
            }
        }
    }
}

/// No-op [`StateStore`] for builds with saved state disabled.
pub struct NullStateStore;

impl StateStore for NullStateStore {
    fn load(&self) -> ExplorerState {
        ExplorerState::default()
    }

    fn save(&self, _state: &ExplorerState) {}
}
