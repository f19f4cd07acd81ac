//! Content record types and section visibility rules for classpub.
//!
//! This crate provides the data model shared by the rest of the engine:
//!
//! - [`ContentRecord`] - a single piece of content (path, title, metadata)
//! - [`SectionId`] - an audience section (e.g., class section 2)
//! - [`SectionFlags`] - per-section visibility rules parsed from frontmatter
//!
//! Records are produced by a scanning collaborator (see `classpub-store`)
//! and consumed, never mutated, by the composer and explorer. The only
//! exception is composition itself, which produces *new* records with
//! section-scoped frontmatter folded into the generic keys.

mod frontmatter;
mod record;
mod visibility;

pub use frontmatter::{flag_enabled, parse_date_value};
pub use record::{ContentRecord, RecordDates, SectionId};
pub use visibility::{ExcludeReason, SectionFlags, SectionRule, Visibility};
