//! Digest report — the deterministic reduction over completed analyses.
//!
//! `build` is a pure function of its inputs (the clock is passed in, never
//! read), so rebuilding from the same accumulator renders byte-identical
//! output regardless of task completion order.

use chrono::{DateTime, Utc};

use crate::pipeline::{AnalysisSet, EmailAnalysis, EmailCategory};

/// Number of entries in the importance ranking.
pub const TOP_ENTRIES: usize = 5;

/// Spam likelihood strictly above this tags an email for the spam ratio.
pub const SPAM_TAG_CUTOFF: u8 = 70;

/// The spam section renders only when strictly more emails than this were
/// tagged — a single stray hit is noise, not a trend.
const SPAM_SECTION_MIN_TAGGED: usize = 1;

/// Aggregated digest over one analyzed batch.
#[derive(Debug, Clone)]
pub struct DigestReport {
    /// Batch size the caller asked for (report denominators use this).
    pub total_requested: usize,
    /// Analyses that actually completed.
    pub analyzed: usize,
    /// Up to [`TOP_ENTRIES`] analyses, descending by importance; dispatch
    /// order breaks ties.
    pub top: Vec<EmailAnalysis>,
    /// Per-category counts, indexed by declaration order.
    pub category_counts: [usize; EmailCategory::ALL.len()],
    /// Emails with spam likelihood above [`SPAM_TAG_CUTOFF`].
    pub spam_tagged: usize,
    /// Timestamp supplied by the caller, rendered in the footer.
    pub generated_at: DateTime<Utc>,
}

impl DigestReport {
    /// Reduce an accumulator into a report.
    ///
    /// Selection starts from the dispatch-ordered view, so arrival order
    /// cannot influence the output; among equal importance scores the
    /// earlier-dispatched email wins (stable sort).
    pub fn build(
        results: &AnalysisSet,
        total_requested: usize,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let ordered = results.in_dispatch_order();

        let mut by_importance = ordered.clone();
        by_importance.sort_by(|a, b| b.importance.cmp(&a.importance));
        let top: Vec<EmailAnalysis> = by_importance
            .into_iter()
            .take(TOP_ENTRIES)
            .cloned()
            .collect();

        let mut category_counts = [0usize; EmailCategory::ALL.len()];
        let mut spam_tagged = 0;
        for analysis in &ordered {
            category_counts[analysis.category.index()] += 1;
            if analysis.spam_likelihood > SPAM_TAG_CUTOFF {
                spam_tagged += 1;
            }
        }

        Self {
            total_requested,
            analyzed: ordered.len(),
            top,
            category_counts,
            spam_tagged,
            generated_at,
        }
    }

    /// Subject line for the outgoing digest email.
    pub fn subject(&self) -> String {
        format!("Inbox digest (latest {} emails)", self.total_requested)
    }

    /// Category counts with count > 0, descending; declaration order breaks
    /// ties (the underlying stable sort keeps it).
    pub fn histogram(&self) -> Vec<(EmailCategory, usize)> {
        let mut entries: Vec<(EmailCategory, usize)> = EmailCategory::ALL
            .iter()
            .map(|&category| (category, self.category_counts[category.index()]))
            .filter(|&(_, count)| count > 0)
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// Spam-tagged count and percentage of the requested batch. None unless
    /// more than one email was tagged.
    pub fn spam_ratio(&self) -> Option<(usize, f64)> {
        if self.spam_tagged > SPAM_SECTION_MIN_TAGGED && self.total_requested > 0 {
            let percent = self.spam_tagged as f64 / self.total_requested as f64 * 100.0;
            Some((self.spam_tagged, percent))
        } else {
            None
        }
    }

    /// Render the plain-text digest body.
    pub fn render(&self) -> String {
        let mut body = String::new();
        body.push_str("Your inbox digest\n\n");
        body.push_str(&format!(
            "After analyzing {} emails on your behalf, here's a summary:\n\n",
            self.total_requested
        ));

        body.push_str(&format!(
            "The top {} most important/urgent\n",
            TOP_ENTRIES
        ));
        for entry in &self.top {
            body.push_str(&render_entry(entry));
        }

        body.push_str("\nHere's the distribution of detected categories\n");
        for (category, count) in self.histogram() {
            body.push_str(&format!("- {}: {}\n", category.label(), count));
        }

        if let Some((tagged, percent)) = self.spam_ratio() {
            body.push_str(&format!(
                "\n{} out of {} ({:.2}%) of all analyzed emails tagged as SPAM.\n",
                tagged, self.total_requested, percent
            ));
        }

        body.push_str(&format!(
            "\nGenerated on {} by inbox-digest\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        body
    }
}

fn render_entry(entry: &EmailAnalysis) -> String {
    let summary = match &entry.summary {
        Some(points) => points.join("\n    "),
        None => "(not summarized)".to_string(),
    };
    format!(
        "\nfrom: {}\ndate: {}\nsubject: {}\nsummary:\n    {}\n",
        entry.email.from, entry.email.date, entry.email.subject, summary
    )
}
