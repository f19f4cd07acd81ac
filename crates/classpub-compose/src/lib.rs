//! Shared/section content composition.
//!
//! [`compose`] merges the shared content tree with one section's
//! section-specific tree into a single record set:
//!
//! 1. Shared records form the base; section records are overlaid on top,
//!    and on a path collision the section-specific record wins outright
//!    ("this file is overridden for this section").
//! 2. Each merged record's visibility rules are evaluated for the target
//!    section at the composer's reference time; excluded records are
//!    dropped.
//! 3. Surviving records have their section-scoped frontmatter folded into
//!    the generic `draft`/`created` keys the downstream renderer
//!    understands, and all section-scoped keys stripped.
//!
//! Composition is best-effort: a record with a blank path is skipped with a
//! reported warning so one malformed file cannot block a section's build.
//! For a fixed `(shared, section, section_id, reference_time)` input the
//! output is identical run to run — records are emitted sorted by path and
//! the ambient clock is never consulted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use classpub_content::{ContentRecord, ExcludeReason, SectionFlags, SectionId, Visibility};

/// Options for a composition run.
#[derive(Clone, Copy, Debug)]
pub struct ComposeOptions {
    /// Reference time for release-date rules.
    ///
    /// Passed explicitly so a fixed input always composes identically;
    /// callers typically pass the build's start time.
    pub reference_time: DateTime<Utc>,
}

/// Result of composing shared and section content.
#[derive(Clone, Debug)]
pub struct Composition {
    /// Merged, filtered records, sorted by path.
    pub records: Vec<ContentRecord>,
    /// Records that were skipped, with reasons.
    pub warnings: Vec<ComposeWarning>,
}

/// A non-fatal problem encountered during composition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComposeWarning {
    /// Title of the offending record (paths may be blank).
    pub title: String,
    /// What was wrong.
    pub reason: String,
}

/// Compose shared and section-specific records for one section.
///
/// Shared records form the base set; `section_records` overlay it, winning
/// any path collision. The overlay order is the precedence policy — callers
/// wanting a different policy pass the sets in a different order.
#[must_use]
pub fn compose(
    shared: Vec<ContentRecord>,
    section_records: Vec<ContentRecord>,
    section_id: SectionId,
    options: &ComposeOptions,
) -> Composition {
    let mut merged: BTreeMap<String, ContentRecord> = BTreeMap::new();
    let mut warnings = Vec::new();

    for record in shared.into_iter().chain(section_records) {
        if record.path.trim().is_empty() {
            tracing::warn!(title = %record.title, "Record has no path, skipping");
            warnings.push(ComposeWarning {
                title: record.title,
                reason: "record has no path".to_owned(),
            });
            continue;
        }

        if let Some(previous) = merged.insert(record.path.clone(), record) {
            tracing::debug!(path = %previous.path, "Section record overrides shared record");
        }
    }

    let records = merged
        .into_values()
        .filter_map(|record| {
            match record.section_flags.evaluate(section_id, options.reference_time) {
                Visibility::Included => Some(fold_section_keys(record, section_id)),
                Visibility::Excluded(reason) => {
                    let reason_str = match reason {
                        ExcludeReason::Draft => "draft",
                        ExcludeReason::NotYetReleased(_) => "not yet released",
                    };
                    tracing::debug!(path = %record.path, reason = reason_str, section = %section_id, "Record excluded");
                    None
                }
            }
        })
        .collect();

    Composition { records, warnings }
}

/// Fold section-scoped frontmatter into generic keys and strip the rest.
///
/// `draftSection<N>` becomes `draft` and `createdSection<N>` becomes
/// `created` (both the typed date and the frontmatter key) for the target
/// section; every section-scoped key, for any section, is then removed so
/// the renderer never sees another section's flags.
fn fold_section_keys(mut record: ContentRecord, section_id: SectionId) -> ContentRecord {
    if let Some(rule) = record.section_flags.rule(section_id) {
        if let Some(draft) = rule.draft {
            record
                .extra
                .insert("draft".to_owned(), serde_json::Value::Bool(draft));
        }
        if let Some(created) = rule.created {
            record.dates.created = Some(created);
        }
    }

    record
        .extra
        .retain(|key, _| !SectionFlags::is_section_key(key));
    record.section_flags = SectionFlags::default();

    record
}
