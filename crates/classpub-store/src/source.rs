//! Record source trait.

use classpub_content::ContentRecord;

use crate::StoreError;

/// A producer of content records.
///
/// Implementations scan some backing store (filesystem, fixture set) and
/// return a flat record collection in a deterministic order. Per-record
/// problems (malformed frontmatter, unreadable file) are reported through
/// `tracing` and degrade that record, never the whole scan.
pub trait RecordSource {
    /// Scan the source and return all content records, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error only when the source as a whole is unusable; a
    /// missing root directory yields an empty scan instead.
    fn scan(&self) -> Result<Vec<ContentRecord>, StoreError>;
}
