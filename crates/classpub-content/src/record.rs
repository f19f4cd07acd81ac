//! Core content record types.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::visibility::SectionFlags;

/// An audience section of a published course site.
///
/// Sections are numbered from 1 and rendered as `section<N>` in paths and
/// configuration keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

impl SectionId {
    /// Section number (1-based).
    #[must_use]
    pub fn number(self) -> u32 {
        self.0
    }

    /// Directory name for this section (e.g., `section2`).
    #[must_use]
    pub fn dir_name(self) -> String {
        format!("section{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section{}", self.0)
    }
}

/// Timestamps attached to a content record.
///
/// Each component is optional: a record may carry only a creation date, or
/// none at all. Composition and tree building treat missing components as
/// "unknown", never as epoch zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDates {
    /// When the content was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// When the content was last modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    /// When the content was published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl RecordDates {
    /// True if no component is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_none() && self.modified.is_none() && self.published.is_none()
    }

    /// Component-wise maximum of two date sets.
    ///
    /// For each component, the more recent of the two values wins; a missing
    /// component never beats a present one.
    #[must_use]
    pub fn max(&self, other: &Self) -> Self {
        fn later(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
            match (a, b) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            }
        }

        Self {
            created: later(self.created, other.created),
            modified: later(self.modified, other.modified),
            published: later(self.published, other.published),
        }
    }
}

/// A single piece of content: one page of the published site.
///
/// Identified uniquely by `path`, a slash-delimited URL path without a
/// leading slash (e.g., `"Exercises/loops"`). A record whose path names a
/// directory position (`"Exercises"`) acts as that folder's index page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// URL path, slash-delimited, no leading slash.
    pub path: String,
    /// Display title.
    pub title: String,
    /// Content tags from frontmatter.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// Record timestamps.
    #[serde(default, skip_serializing_if = "RecordDates::is_empty")]
    pub dates: RecordDates,
    /// Per-section visibility rules parsed from frontmatter.
    #[serde(default, skip_serializing_if = "SectionFlags::is_empty")]
    pub section_flags: SectionFlags,
    /// Remaining frontmatter, passed through opaquely to the renderer.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContentRecord {
    /// Create a record with just a path and title.
    #[must_use]
    pub fn new(path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            tags: BTreeSet::new(),
            dates: RecordDates::default(),
            section_flags: SectionFlags::default(),
            extra: BTreeMap::new(),
        }
    }

    /// Last path segment (the record's own name within its folder).
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_section_id_display() {
        assert_eq!(SectionId(2).to_string(), "section2");
        assert_eq!(SectionId(2).dir_name(), "section2");
    }

    #[test]
    fn test_dates_max_prefers_later() {
        let a = RecordDates {
            created: Some(date(2024, 1, 1)),
            modified: Some(date(2024, 6, 1)),
            published: None,
        };
        let b = RecordDates {
            created: Some(date(2024, 3, 1)),
            modified: None,
            published: Some(date(2024, 2, 1)),
        };

        let max = a.max(&b);

        assert_eq!(max.created, Some(date(2024, 3, 1)));
        assert_eq!(max.modified, Some(date(2024, 6, 1)));
        assert_eq!(max.published, Some(date(2024, 2, 1)));
    }

    #[test]
    fn test_dates_max_empty_is_identity() {
        let a = RecordDates {
            created: Some(date(2024, 1, 1)),
            ..Default::default()
        };

        assert_eq!(a.max(&RecordDates::default()), a);
        assert_eq!(RecordDates::default().max(&a), a);
    }

    #[test]
    fn test_record_file_name() {
        assert_eq!(ContentRecord::new("a/b/c", "C").file_name(), "c");
        assert_eq!(ContentRecord::new("top", "Top").file_name(), "top");
    }
}
