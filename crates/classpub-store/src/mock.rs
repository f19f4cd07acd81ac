//! In-memory record source for testing.

use classpub_content::ContentRecord;

use crate::source::RecordSource;
use crate::{StoreError, StoreErrorKind};

/// In-memory [`RecordSource`] for tests.
///
/// Returns a fixed record set, or a configured error.
pub struct MockSource {
    records: Vec<ContentRecord>,
    fail: bool,
}

impl MockSource {
    /// Create a mock source returning the given records.
    #[must_use]
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    /// Make every `scan` call fail.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }
}

impl RecordSource for MockSource {
    fn scan(&self) -> Result<Vec<ContentRecord>, StoreError> {
        if self.fail {
            return Err(StoreError::new(StoreErrorKind::Other));
        }
        let mut records = self.records.clone();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }
}
