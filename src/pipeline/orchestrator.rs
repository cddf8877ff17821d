//! Fan-out/fan-in orchestration over the email pipeline.
//!
//! Each email in the batch becomes one independent task running the full
//! stage sequence. Tasks share no state; the only meeting point is the
//! accumulator fold at the fan-in, which a single draining task performs, so
//! the accumulator needs no internal locking. Concurrency level is a
//! throughput choice, never a correctness one.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{self, StreamExt};
use tracing::{error, info};

use crate::classify::Classify;
use crate::pipeline::stages::EmailPipeline;
use crate::pipeline::types::{AnalysisSet, EmailRecord};

/// Default number of emails classified concurrently.
///
/// Bounds pressure on the classification capability; any value (including 1)
/// yields the same accumulator contents.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Progress callback: (completed so far, batch size, subject of the email
/// that just finished).
pub type ProgressFn = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Dispatches one pipeline task per email and folds completed analyses into
/// an [`AnalysisSet`].
pub struct Orchestrator {
    classifier: Arc<dyn Classify>,
    concurrency: usize,
    progress: Option<ProgressFn>,
}

impl Orchestrator {
    pub fn new(classifier: Arc<dyn Classify>) -> Self {
        Self {
            classifier,
            concurrency: DEFAULT_CONCURRENCY,
            progress: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Install a callback fired once per completed email.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every email through the stage pipeline and collect the results.
    ///
    /// Each email is dispatched exactly once, tagged with its position in
    /// the batch. A failure inside one email's pipeline is logged and drops
    /// that email from the accumulator; it never blocks or corrupts the rest
    /// of the batch. Returns only after every dispatched task has completed
    /// or failed — no partial accumulator escapes.
    pub async fn process(&self, emails: Vec<EmailRecord>) -> AnalysisSet {
        let total = emails.len();
        info!(total, concurrency = self.concurrency, "Dispatching email batch");

        let pipeline = EmailPipeline::new(Arc::clone(&self.classifier));
        let completed = AtomicUsize::new(0);

        let results = stream::iter(emails.into_iter().enumerate())
            .map(|(dispatch_index, email)| {
                let pipeline = &pipeline;
                let completed = &completed;
                let progress = self.progress.as_deref();
                async move {
                    let subject = email.subject.clone();
                    let email_id = email.id.clone();
                    let outcome = pipeline.run(email, dispatch_index).await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = progress {
                        progress(done, total, &subject);
                    }

                    match outcome {
                        Ok(analysis) => Some(analysis),
                        Err(e) => {
                            error!(
                                email_id = %email_id,
                                dispatch_index,
                                error = %e,
                                "Email pipeline failed — dropping from digest"
                            );
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .fold(AnalysisSet::new(), |mut set, outcome| async move {
                if let Some(analysis) = outcome {
                    set.merge(analysis);
                }
                set
            })
            .await;

        info!(analyzed = results.len(), total, "Email batch complete");
        results
    }
}
