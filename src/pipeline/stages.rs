//! The ordered classification stage sequence for one email.
//!
//! Flow (strict order, each stage optionally short-circuiting the next):
//! 1. Spam detection — always runs
//! 2. Importance — skipped for likely spam
//! 3. Summary — skipped for unimportant email
//! 4. Categorization — always runs
//!
//! The order is load-bearing: an email pre-judged as spam never pays for an
//! importance or summary call, and an unimportant email never pays for a
//! summary call. Reordering the stages breaks that cost contract.

use std::sync::Arc;

use tracing::debug;

use crate::classify::Classify;
use crate::error::ClassifyError;
use crate::pipeline::types::{EmailAnalysis, EmailRecord};

/// Spam likelihood at or above this skips the importance call; email flagged
/// as likely spam is defined as unimportant.
pub const SPAM_IMPORTANCE_CUTOFF: u8 = 60;

/// Importance at or below this skips the summary call.
pub const SUMMARY_IMPORTANCE_CUTOFF: u8 = 60;

/// Runs one email through the four classification stages.
pub struct EmailPipeline {
    classifier: Arc<dyn Classify>,
}

impl EmailPipeline {
    pub fn new(classifier: Arc<dyn Classify>) -> Self {
        Self { classifier }
    }

    /// Run all stages over one email.
    ///
    /// Stage order is strict and sequential; each stage issues exactly one
    /// capability call unless short-circuited. A capability failure at any
    /// stage aborts this email only — isolation happens in the orchestrator.
    pub async fn run(
        &self,
        email: EmailRecord,
        dispatch_index: usize,
    ) -> Result<EmailAnalysis, ClassifyError> {
        let spam_likelihood = self.classifier.spam_likelihood(&email).await?;

        let importance = if spam_likelihood >= SPAM_IMPORTANCE_CUTOFF {
            debug!(
                email_id = %email.id,
                spam_likelihood,
                "Spam cutoff hit — importance defaults to 0"
            );
            0
        } else {
            self.classifier.importance(&email).await?
        };

        let summary = if importance <= SUMMARY_IMPORTANCE_CUTOFF {
            debug!(
                email_id = %email.id,
                importance,
                "Importance cutoff hit — skipping summary"
            );
            None
        } else {
            Some(self.classifier.summarize(&email).await?)
        };

        let category = self.classifier.categorize(&email).await?;

        Ok(EmailAnalysis {
            email,
            dispatch_index,
            spam_likelihood,
            importance,
            summary,
            category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::pipeline::types::EmailCategory;

    /// Fake capability with scripted scores and per-task call counters.
    struct ScriptedClassifier {
        spam: u8,
        importance: u8,
        spam_calls: AtomicUsize,
        importance_calls: AtomicUsize,
        summarize_calls: AtomicUsize,
        categorize_calls: AtomicUsize,
    }

    impl ScriptedClassifier {
        fn new(spam: u8, importance: u8) -> Self {
            Self {
                spam,
                importance,
                spam_calls: AtomicUsize::new(0),
                importance_calls: AtomicUsize::new(0),
                summarize_calls: AtomicUsize::new(0),
                categorize_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Classify for ScriptedClassifier {
        async fn spam_likelihood(&self, _email: &EmailRecord) -> Result<u8, ClassifyError> {
            self.spam_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.spam)
        }

        async fn importance(&self, _email: &EmailRecord) -> Result<u8, ClassifyError> {
            self.importance_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.importance)
        }

        async fn summarize(&self, _email: &EmailRecord) -> Result<Vec<String>, ClassifyError> {
            self.summarize_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["point one".into(), "point two".into()])
        }

        async fn categorize(&self, _email: &EmailRecord) -> Result<EmailCategory, ClassifyError> {
            self.categorize_calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmailCategory::Work)
        }
    }

    fn email(subject: &str) -> EmailRecord {
        EmailRecord {
            id: format!("id-{subject}"),
            from: "sender@example.com".into(),
            subject: subject.into(),
            date: "2026-08-03 12:00".into(),
            body: "body".into(),
        }
    }

    async fn run_with(spam: u8, importance: u8) -> (EmailAnalysis, Arc<ScriptedClassifier>) {
        let classifier = Arc::new(ScriptedClassifier::new(spam, importance));
        let pipeline = EmailPipeline::new(classifier.clone() as Arc<dyn Classify>);
        let analysis = pipeline.run(email("t"), 0).await.unwrap();
        (analysis, classifier)
    }

    #[tokio::test]
    async fn likely_spam_skips_importance_call_and_defaults_to_zero() {
        let (analysis, classifier) = run_with(60, 95).await;
        assert_eq!(analysis.spam_likelihood, 60);
        assert_eq!(analysis.importance, 0);
        assert!(analysis.summary.is_none());
        assert_eq!(classifier.importance_calls.load(Ordering::SeqCst), 0);
        assert_eq!(classifier.summarize_calls.load(Ordering::SeqCst), 0);
        // Categorization is independent of earlier short-circuits.
        assert_eq!(classifier.categorize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn just_below_spam_cutoff_still_scores_importance() {
        let (analysis, classifier) = run_with(59, 40).await;
        assert_eq!(analysis.importance, 40);
        assert_eq!(classifier.importance_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unimportant_email_skips_summary_call() {
        let (analysis, classifier) = run_with(10, 60).await;
        assert_eq!(analysis.importance, 60);
        assert!(analysis.summary.is_none());
        assert_eq!(classifier.summarize_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn important_email_gets_a_summary() {
        let (analysis, classifier) = run_with(10, 61).await;
        assert_eq!(analysis.summary.as_ref().unwrap().len(), 2);
        assert_eq!(classifier.summarize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_stage_issues_at_most_one_call() {
        let (_, classifier) = run_with(10, 90).await;
        assert_eq!(classifier.spam_calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.importance_calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.summarize_calls.load(Ordering::SeqCst), 1);
        assert_eq!(classifier.categorize_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn capability_failure_propagates_out_of_run() {
        struct FailingClassifier;

        #[async_trait]
        impl Classify for FailingClassifier {
            async fn spam_likelihood(&self, _email: &EmailRecord) -> Result<u8, ClassifyError> {
                Err(ClassifyError::MalformedResponse {
                    task: "spam",
                    reason: "scripted failure".into(),
                })
            }

            async fn importance(&self, _email: &EmailRecord) -> Result<u8, ClassifyError> {
                unreachable!("stage order is strict — spam failed first")
            }

            async fn summarize(&self, _email: &EmailRecord) -> Result<Vec<String>, ClassifyError> {
                unreachable!()
            }

            async fn categorize(
                &self,
                _email: &EmailRecord,
            ) -> Result<EmailCategory, ClassifyError> {
                unreachable!()
            }
        }

        let pipeline = EmailPipeline::new(Arc::new(FailingClassifier));
        assert!(pipeline.run(email("boom"), 0).await.is_err());
    }
}
