//! Record-to-external identity matching
//!
//! A pluggable strategy deciding which external record a caller-supplied
//! paper record corresponds to, with a confidence score. Testable in
//! isolation from any network dependency.

use citegraph_common::model::PaperRecord;
use citegraph_common::source::{normalize_title, ExternalRecord};
use std::collections::HashSet;

/// A positive match decision.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchDecision {
    /// The matched external id
    pub external_id: String,

    /// Confidence in [0, 1]
    pub confidence: f32,
}

/// Strategy for reconciling a caller record against candidate externals.
pub trait RecordMatcher: Send + Sync {
    /// Decide which candidate (if any) the record corresponds to.
    /// Candidates are the not-yet-consumed external input records.
    fn match_record(
        &self,
        record: &PaperRecord,
        candidates: &[&ExternalRecord],
    ) -> Option<MatchDecision>;
}

/// Default matcher: external-id hint first, then normalized exact title
/// equality.
///
/// An id hint only matches when it names exactly one candidate; ambiguous
/// hints fall through to title matching.
#[derive(Debug, Default)]
pub struct DefaultMatcher;

impl RecordMatcher for DefaultMatcher {
    fn match_record(
        &self,
        record: &PaperRecord,
        candidates: &[&ExternalRecord],
    ) -> Option<MatchDecision> {
        let hints: HashSet<&str> = record.external_ids.values().map(|s| s.as_str()).collect();
        if !hints.is_empty() {
            let mut hit: Option<&ExternalRecord> = None;
            let mut ambiguous = false;
            for candidate in candidates {
                if hints.contains(candidate.id.as_str()) {
                    if hit.replace(*candidate).is_some() {
                        ambiguous = true;
                        break;
                    }
                }
            }
            if !ambiguous {
                if let Some(candidate) = hit {
                    return Some(MatchDecision {
                        external_id: candidate.id.clone(),
                        confidence: 1.0,
                    });
                }
            }
        }

        let title = normalize_title(&record.title);
        candidates
            .iter()
            .find(|candidate| normalize_title(&candidate.title) == title)
            .map(|candidate| MatchDecision {
                external_id: candidate.id.clone(),
                confidence: 0.9,
            })
    }
}
