//! Email analysis pipeline.
//!
//! One batch flows through:
//! 1. `Orchestrator::process` — one independent task per email
//! 2. `EmailPipeline::run` — spam → importance → summary → category, with
//!    cost-saving short-circuits
//! 3. `AnalysisSet` — order-insensitive accumulation of completed analyses
//!
//! The report reduction over the accumulator lives in [`crate::report`].

pub mod orchestrator;
pub mod stages;
pub mod types;

pub use orchestrator::{DEFAULT_CONCURRENCY, Orchestrator, ProgressFn};
pub use stages::{EmailPipeline, SPAM_IMPORTANCE_CUTOFF, SUMMARY_IMPORTANCE_CUTOFF};
pub use types::{AnalysisSet, EmailAnalysis, EmailCategory, EmailRecord};
