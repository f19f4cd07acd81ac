//! Filesystem record source.
//!
//! Provides [`FsSource`] for scanning a directory tree of markdown files
//! with YAML frontmatter into content records.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;

use classpub_content::{ContentRecord, RecordDates, SectionFlags, parse_date_value};

use crate::source::RecordSource;
use crate::{StoreError, StoreErrorKind};

/// Frontmatter keys lifted into typed [`ContentRecord`] fields.
const LIFTED_KEYS: &[&str] = &["title", "tags", "created", "modified", "published"];

/// Filesystem record source.
///
/// Scans a root directory recursively for `.md` files, parses their YAML
/// frontmatter, and maps file paths to URL paths:
///
/// - `guide.md` -> `guide`
/// - `Exercises/index.md` -> `Exercises`
/// - `index.md` at the root -> `index`
///
/// An optional prefix re-roots every emitted path, so a scan of one shared
/// folder can be overlaid into a larger composed tree. Hidden and
/// underscore-prefixed entries are skipped, as are common non-content
/// directories.
pub struct FsSource {
    /// Root directory to scan.
    root: PathBuf,
    /// URL path prefix for emitted records (empty for none).
    prefix: String,
    /// Regex for extracting the first H1 heading.
    h1_regex: Regex,
}

impl FsSource {
    /// Create a source scanning `root` with no path prefix.
    ///
    /// # Panics
    ///
    /// Panics if the internal H1 regex fails to compile. This should never
    /// happen as the regex is a compile-time constant.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self::with_prefix(root, "")
    }

    /// Create a source whose emitted paths are re-rooted under `prefix`.
    ///
    /// With prefix `"Exercises"`, the file `loops.md` becomes
    /// `Exercises/loops` and `index.md` becomes `Exercises` itself.
    ///
    /// # Panics
    ///
    /// Panics if the internal H1 regex fails to compile. This should never
    /// happen as the regex is a compile-time constant.
    #[must_use]
    pub fn with_prefix(root: PathBuf, prefix: &str) -> Self {
        Self {
            root,
            prefix: prefix.trim_matches('/').to_owned(),
            h1_regex: Regex::new(r"(?m)^#\s+(.+)$").unwrap(),
        }
    }

    /// Read a single markdown file relative to the source root.
    ///
    /// # Errors
    ///
    /// Returns an error if the path escapes the root or the file cannot be
    /// read.
    pub fn read_record(&self, rel: &Path) -> Result<ContentRecord, StoreError> {
        validate_path(rel)?;
        let full = self.root.join(rel);
        let content = fs::read_to_string(&full).map_err(|e| StoreError::io(e, Some(full.clone())))?;
        let mtime = file_mtime(&full);
        Ok(self.build_record(rel, &content, mtime))
    }

    /// Scan a directory recursively, collecting records.
    fn scan_directory(&self, dir_path: &Path, base_path: &Path, records: &mut Vec<ContentRecord>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            return;
        };

        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name_lower = e.file_name().to_string_lossy().to_lowercase();
                (e, is_dir, name_lower)
            })
            .collect();

        // Deterministic scan order: directories first, then alphabetical
        entries.sort_by(|(_, a_is_dir, a_name), (_, b_is_dir, b_name)| {
            b_is_dir.cmp(a_is_dir).then_with(|| a_name.cmp(b_name))
        });

        for (entry, is_dir, name_lower) in entries {
            // Skip hidden and underscore-prefixed files/dirs
            if name_lower.starts_with('.') || name_lower.starts_with('_') {
                continue;
            }

            // Skip common non-content directories
            if is_dir
                && matches!(
                    name_lower.as_str(),
                    "node_modules" | "target" | "dist" | "build" | "vendor"
                )
            {
                continue;
            }

            let path = entry.path();

            if is_dir {
                let rel_path = base_path.join(entry.file_name());
                self.scan_directory(&path, &rel_path, records);
            } else if path.extension().is_some_and(|e| e == "md") {
                let rel_path = base_path.join(entry.file_name());
                match fs::read_to_string(&path) {
                    Ok(content) => {
                        let mtime = file_mtime(&path);
                        records.push(self.build_record(&rel_path, &content, mtime));
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to read file, skipping");
                    }
                }
            }
        }
    }

    /// Build a content record from a file's relative path and content.
    fn build_record(
        &self,
        rel: &Path,
        content: &str,
        mtime: Option<DateTime<Utc>>,
    ) -> ContentRecord {
        let (frontmatter, body) = split_frontmatter(content);

        let mut extra = match frontmatter {
            Some(yaml) => match serde_yaml::from_str::<BTreeMap<String, serde_json::Value>>(yaml) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %rel.display(), error = %e, "Malformed frontmatter, treating as empty");
                    BTreeMap::new()
                }
            },
            None => BTreeMap::new(),
        };

        let name_lower = rel
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let title = extra
            .get("title")
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_owned())
            .or_else(|| self.extract_h1(body))
            .unwrap_or_else(|| title_from_filename(&name_lower));

        let tags = parse_tags(extra.get("tags"));

        let dates = RecordDates {
            created: extra.get("created").and_then(parse_date_value).or(mtime),
            modified: extra.get("modified").and_then(parse_date_value).or(mtime),
            published: extra.get("published").and_then(parse_date_value),
        };

        let section_flags = SectionFlags::from_extra(&extra);

        for key in LIFTED_KEYS {
            extra.remove(*key);
        }

        ContentRecord {
            path: self.url_path(rel),
            title,
            tags,
            dates,
            section_flags,
            extra,
        }
    }

    /// Extract title from the first H1 heading in the body.
    fn extract_h1(&self, body: &str) -> Option<String> {
        self.h1_regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_owned())
    }

    /// Map a relative file path to the emitted URL path.
    fn url_path(&self, rel: &Path) -> String {
        let s = rel.to_string_lossy().replace('\\', "/");
        let without_ext = s.strip_suffix(".md").unwrap_or(&s);

        let mapped = if let Some(parent) = without_ext.strip_suffix("/index") {
            parent
        } else if without_ext == "index" {
            ""
        } else {
            without_ext
        };

        match (self.prefix.is_empty(), mapped.is_empty()) {
            // Root index with no prefix stays addressable as "index"
            (true, true) => "index".to_owned(),
            (true, false) => mapped.to_owned(),
            // A prefixed folder's own index maps to the folder itself
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{mapped}", self.prefix),
        }
    }
}

impl RecordSource for FsSource {
    fn scan(&self) -> Result<Vec<ContentRecord>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        self.scan_directory(&self.root, Path::new(""), &mut records);
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }
}

/// Reject paths containing parent directory components.
fn validate_path(path: &Path) -> Result<(), StoreError> {
    let has_parent_dir = path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));

    if has_parent_dir {
        return Err(StoreError::new(StoreErrorKind::InvalidPath).with_path(path));
    }
    Ok(())
}

/// File modification time as a UTC timestamp.
fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
}

/// Split a leading `---` YAML frontmatter block from the body.
fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let rest = content.strip_prefix("---").and_then(|r| {
        r.strip_prefix('\n')
            .or_else(|| r.strip_prefix("\r\n"))
    });
    let Some(rest) = rest else {
        return (None, content);
    };

    for marker in ["\n---\n", "\n---\r\n"] {
        if let Some(end) = rest.find(marker) {
            return (Some(&rest[..end]), &rest[end + marker.len()..]);
        }
    }
    // Frontmatter runs to the end of the file
    if let Some(yaml) = rest.strip_suffix("\n---").or_else(|| rest.strip_suffix("\n---\n")) {
        return (Some(yaml), "");
    }

    (None, content)
}

/// Parse a frontmatter tags value (list or single string).
fn parse_tags(value: Option<&serde_json::Value>) -> BTreeSet<String> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_owned())
            .collect(),
        Some(serde_json::Value::String(s)) => {
            std::iter::once(s.trim().to_owned()).collect()
        }
        _ => BTreeSet::new(),
    }
}

/// Generate a title from a lowercased filename.
fn title_from_filename(name_lower: &str) -> String {
    let name = name_lower.strip_suffix(".md").unwrap_or(name_lower);

    name.replace(['-', '_'], " ")
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

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FsSource::new(tmp.path().join("nope"));

        assert!(source.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_maps_paths() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "index.md", "# Home");
        write(tmp.path(), "guide.md", "# Guide");
        write(tmp.path(), "Exercises/index.md", "# Exercises");
        write(tmp.path(), "Exercises/loops.md", "# Loops");

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();

        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Exercises", "Exercises/loops", "guide", "index"]);
    }

    #[test]
    fn test_scan_with_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "index.md", "# Exercises");
        write(tmp.path(), "loops.md", "# Loops");

        let source = FsSource::with_prefix(tmp.path().to_path_buf(), "Exercises");
        let records = source.scan().unwrap();

        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["Exercises", "Exercises/loops"]);
    }

    #[test]
    fn test_scan_skips_hidden_and_underscore() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".hidden.md", "# Hidden");
        write(tmp.path(), "_partial.md", "# Partial");
        write(tmp.path(), "visible.md", "# Visible");

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "visible");
    }

    #[test]
    fn test_frontmatter_title_wins_over_h1() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "page.md",
            "---\ntitle: Frontmatter Title\n---\n# Heading Title\n",
        );

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();

        assert_eq!(records[0].title, "Frontmatter Title");
        // Lifted keys are removed from the opaque map
        assert!(!records[0].extra.contains_key("title"));
    }

    #[test]
    fn test_title_falls_back_to_h1_then_filename() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "with-heading.md", "# From Heading\n\nBody.");
        write(tmp.path(), "setup-guide.md", "Body without heading.");

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();

        let by_path = |p: &str| records.iter().find(|r| r.path == p).unwrap();
        assert_eq!(by_path("with-heading").title, "From Heading");
        assert_eq!(by_path("setup-guide").title, "Setup Guide");
    }

    #[test]
    fn test_frontmatter_dates_and_flags() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "task.md",
            "---\ntitle: Task\ncreated: 2024-01-15\ndraftSection2: true\ntags:\n  - homework\n  - unit1\n---\nBody.\n",
        );

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();
        let record = &records[0];

        assert_eq!(
            record.dates.created.unwrap().format("%Y-%m-%d").to_string(),
            "2024-01-15"
        );
        assert!(record.tags.contains("homework"));
        assert!(record.tags.contains("unit1"));
        assert!(!record.section_flags.is_empty());
        // Section-scoped keys stay in extra until composition strips them
        assert!(record.extra.contains_key("draftSection2"));
    }

    #[test]
    fn test_malformed_frontmatter_degrades_to_empty() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "broken.md",
            "---\ntitle: [unclosed\n---\n# Fallback\n",
        );

        let source = FsSource::new(tmp.path().to_path_buf());
        let records = source.scan().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Fallback");
        assert!(records[0].extra.is_empty());
    }

    #[test]
    fn test_read_record_rejects_parent_components() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FsSource::new(tmp.path().to_path_buf());

        let err = source.read_record(Path::new("../outside.md")).unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::InvalidPath);
    }

    #[test]
    fn test_read_record_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "syllabus.md", "---\ntitle: Syllabus\n---\nTerms.\n");

        let source = FsSource::new(tmp.path().to_path_buf());
        let record = source.read_record(Path::new("syllabus.md")).unwrap();

        assert_eq!(record.path, "syllabus");
        assert_eq!(record.title, "Syllabus");
    }

    #[test]
    fn test_split_frontmatter_absent() {
        let (fm, body) = split_frontmatter("# Just a heading\n");
        assert!(fm.is_none());
        assert_eq!(body, "# Just a heading\n");
    }

    #[test]
    fn test_split_frontmatter_present() {
        let (fm, body) = split_frontmatter("---\ntitle: X\n---\nBody\n");
        assert_eq!(fm, Some("title: X"));
        assert_eq!(body, "Body\n");
    }
}
