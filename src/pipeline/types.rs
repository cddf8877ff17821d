//! Shared types for the email analysis pipeline.

use serde::{Deserialize, Serialize};

// ── Email record ────────────────────────────────────────────────────

/// One retrieved email, as the mail gateway returned it.
///
/// Immutable once dispatched. Embedded verbatim (as JSON) in every
/// classification prompt, so field names match the provider payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Provider-native message id (uuid-filled by the gateway when the
    /// provider omits one).
    #[serde(default)]
    pub id: String,
    /// Sender address or display string.
    pub from: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Date header as the provider rendered it.
    #[serde(default)]
    pub date: String,
    /// Plain-text message body.
    #[serde(default)]
    pub body: String,
}

// ── Category ────────────────────────────────────────────────────────

/// The six-way email category classification.
///
/// Declaration order doubles as the tie-break order wherever histogram
/// counts are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmailCategory {
    Personal,
    Work,
    Duties,
    Ads,
    News,
    Other,
}

impl EmailCategory {
    /// Every category, in declaration order.
    pub const ALL: [EmailCategory; 6] = [
        EmailCategory::Personal,
        EmailCategory::Work,
        EmailCategory::Duties,
        EmailCategory::Ads,
        EmailCategory::News,
        EmailCategory::Other,
    ];

    /// Human-readable label used in prompts and the rendered digest.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Duties => "Official duties",
            Self::Ads => "Marketing and promotions",
            Self::News => "News and newsletters",
            Self::Other => "Other",
        }
    }

    /// Index into a fixed-size per-category array.
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Parse a capability answer into a category.
    ///
    /// Accepts the label, the variant name, and the short aliases the
    /// categorization prompt tends to elicit, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().trim_end_matches('.').to_lowercase();
        match normalized.as_str() {
            "personal" => Some(Self::Personal),
            "work" => Some(Self::Work),
            "duties" | "official duties" => Some(Self::Duties),
            "ads" | "marketing" | "marketing and promotions" | "marketing/promotions" => {
                Some(Self::Ads)
            }
            "news" | "newsletters" | "news and newsletters" | "news/newsletters" => {
                Some(Self::News)
            }
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

// ── Per-email analysis ──────────────────────────────────────────────

/// Completed analysis for one email.
///
/// Built exactly once when the email leaves the stage pipeline; no stage
/// revisits an earlier field.
#[derive(Debug, Clone, Serialize)]
pub struct EmailAnalysis {
    /// The analyzed email.
    pub email: EmailRecord,
    /// Position of the email in the dispatched batch. The stable tie-break
    /// key for every downstream ordering decision.
    pub dispatch_index: usize,
    /// Stage 1: spam likelihood, 0-100.
    pub spam_likelihood: u8,
    /// Stage 2: importance, 0-100. Zero when the spam cutoff skipped the
    /// call.
    pub importance: u8,
    /// Stage 3: bullet-point summary. None when the importance cutoff
    /// skipped the call.
    pub summary: Option<Vec<String>>,
    /// Stage 4: detected category.
    pub category: EmailCategory,
}

// ── Accumulator ─────────────────────────────────────────────────────

/// Accumulator for completed analyses.
///
/// `merge` is append-only, commutative and associative — task completion
/// order is unspecified, so nothing downstream may observe it. Consumers
/// that need a stable ordering go through [`AnalysisSet::in_dispatch_order`].
#[derive(Debug, Default)]
pub struct AnalysisSet {
    completed: Vec<EmailAnalysis>,
}

impl AnalysisSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one completed analysis into the set.
    pub fn merge(&mut self, analysis: EmailAnalysis) {
        self.completed.push(analysis);
    }

    /// Combine two sets (associative counterpart of [`AnalysisSet::merge`]).
    pub fn absorb(&mut self, other: AnalysisSet) {
        self.completed.extend(other.completed);
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EmailAnalysis> {
        self.completed.iter()
    }

    /// Analyses sorted by dispatch position, independent of completion
    /// order.
    pub fn in_dispatch_order(&self) -> Vec<&EmailAnalysis> {
        let mut ordered: Vec<&EmailAnalysis> = self.completed.iter().collect();
        ordered.sort_by_key(|a| a.dispatch_index);
        ordered
    }
}
