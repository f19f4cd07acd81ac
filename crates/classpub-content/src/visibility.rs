//! Per-section visibility rules.
//!
//! Frontmatter may scope a record to individual sections:
//!
//! - `draftSection<N>: true` hides the record from section `N`.
//! - `createdSection<N>: <date>` (also accepted as `createdForSection<N>`)
//!   hides the record from section `N` until that date has been reached, and
//!   supplies the record's creation date for that section once visible.
//!
//! A record with no section-scoped keys is visible to every section.
//! Evaluation takes an explicit reference time so that composing a fixed
//! input always yields the same output.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frontmatter::parse_date_value;

/// `draftSection<N>` frontmatter key.
static DRAFT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^draftSection(\d+)$").unwrap());

/// `createdSection<N>` / `createdForSection<N>` frontmatter key.
static CREATED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^created(?:For)?Section(\d+)$").unwrap());

/// Visibility rule for one section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRule {
    /// Record is a draft for this section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,
    /// Record becomes visible to this section at this date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// All section-scoped visibility rules of one record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionFlags {
    rules: BTreeMap<u32, SectionRule>,
}

impl SectionFlags {
    /// Extract section-scoped rules from raw frontmatter.
    ///
    /// Unrecognized values under a recognized key (e.g., a list where a date
    /// was expected) leave the corresponding rule component unset.
    #[must_use]
    pub fn from_extra(extra: &BTreeMap<String, Value>) -> Self {
        let mut rules: BTreeMap<u32, SectionRule> = BTreeMap::new();

        for (key, value) in extra {
            if let Some(caps) = DRAFT_KEY.captures(key) {
                if let Ok(n) = caps[1].parse::<u32>() {
                    rules.entry(n).or_default().draft = value.as_bool();
                }
            } else if let Some(caps) = CREATED_KEY.captures(key)
                && let Ok(n) = caps[1].parse::<u32>()
            {
                rules.entry(n).or_default().created = parse_date_value(value);
            }
        }

        Self { rules }
    }

    /// True if a frontmatter key is section-scoped (and should be stripped
    /// from composed output).
    #[must_use]
    pub fn is_section_key(key: &str) -> bool {
        DRAFT_KEY.is_match(key) || CREATED_KEY.is_match(key)
    }

    /// Rule for a section, if any key targeted it.
    #[must_use]
    pub fn rule(&self, section: crate::SectionId) -> Option<&SectionRule> {
        self.rules.get(&section.0)
    }

    /// True if no section-scoped key was present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate visibility for a section at a reference time.
    #[must_use]
    pub fn evaluate(&self, section: crate::SectionId, reference: DateTime<Utc>) -> Visibility {
        let Some(rule) = self.rules.get(&section.0) else {
            return Visibility::Included;
        };

        if rule.draft == Some(true) {
            return Visibility::Excluded(ExcludeReason::Draft);
        }
        if let Some(created) = rule.created
            && created > reference
        {
            return Visibility::Excluded(ExcludeReason::NotYetReleased(created));
        }

        Visibility::Included
    }
}

/// Outcome of evaluating a record's visibility for one section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    /// Record is part of the section's composed output.
    Included,
    /// Record is dropped from the section's composed output.
    Excluded(ExcludeReason),
}

/// Why a record was excluded from a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExcludeReason {
    /// Flagged as a draft for this section.
    Draft,
    /// Release date has not been reached yet.
    NotYetReleased(DateTime<Utc>),
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use crate::SectionId;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn extra(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn test_no_flags_included_everywhere() {
        let flags = SectionFlags::from_extra(&BTreeMap::new());

        assert!(flags.is_empty());
        assert_eq!(
            flags.evaluate(SectionId(1), date(2024, 1, 1)),
            Visibility::Included
        );
    }

    #[test]
    fn test_draft_excludes_only_flagged_section() {
        let flags = SectionFlags::from_extra(&extra(&[("draftSection2", json!(true))]));

        assert_eq!(
            flags.evaluate(SectionId(1), date(2024, 1, 1)),
            Visibility::Included
        );
        assert_eq!(
            flags.evaluate(SectionId(2), date(2024, 1, 1)),
            Visibility::Excluded(ExcludeReason::Draft)
        );
    }

    #[test]
    fn test_draft_false_is_included() {
        let flags = SectionFlags::from_extra(&extra(&[("draftSection1", json!(false))]));

        assert_eq!(
            flags.evaluate(SectionId(1), date(2024, 1, 1)),
            Visibility::Included
        );
    }

    #[test]
    fn test_created_date_gates_release() {
        let flags = SectionFlags::from_extra(&extra(&[("createdSection1", json!("2024-06-01"))]));

        assert_eq!(
            flags.evaluate(SectionId(1), date(2024, 5, 31)),
            Visibility::Excluded(ExcludeReason::NotYetReleased(date(2024, 6, 1)))
        );
        assert_eq!(
            flags.evaluate(SectionId(1), date(2024, 6, 1)),
            Visibility::Included
        );
    }

    #[test]
    fn test_created_for_section_spelling_accepted() {
        let flags =
            SectionFlags::from_extra(&extra(&[("createdForSection3", json!("2024-06-01"))]));

        assert_eq!(
            flags.rule(SectionId(3)).unwrap().created,
            Some(date(2024, 6, 1))
        );
    }

    #[test]
    fn test_unrelated_keys_ignored() {
        let flags = SectionFlags::from_extra(&extra(&[
            ("title", json!("Hello")),
            ("draftSectionX", json!(true)),
            ("draft", json!(true)),
        ]));

        assert!(flags.is_empty());
    }

    #[test]
    fn test_is_section_key() {
        assert!(SectionFlags::is_section_key("draftSection1"));
        assert!(SectionFlags::is_section_key("createdSection12"));
        assert!(SectionFlags::is_section_key("createdForSection2"));
        assert!(!SectionFlags::is_section_key("draft"));
        assert!(!SectionFlags::is_section_key("created"));
        assert!(!SectionFlags::is_section_key("draftSection"));
    }
}
