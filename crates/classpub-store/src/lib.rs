//! Record source abstraction for the classpub engine.
//!
//! This crate provides a [`RecordSource`] trait for abstracting content
//! scanning from the underlying storage, along with:
//!
//! - [`FsSource`] - filesystem scanner for markdown trees with YAML
//!   frontmatter
//! - [`MockSource`] - in-memory source for testing (behind the `mock`
//!   feature flag)
//!
//! The engine core (`classpub-compose`, `classpub-explorer`) never reads
//! files directly; it consumes the flat [`ContentRecord`] collections a
//! source produces.
//!
//! [`ContentRecord`]: classpub_content::ContentRecord

mod error;
mod fs;
#[cfg(feature = "mock")]
mod mock;
mod source;

pub use error::{StoreError, StoreErrorKind};
pub use fs::FsSource;
#[cfg(feature = "mock")]
pub use mock::MockSource;
pub use source::RecordSource;
