//! Inbox Digest — classify a batch of recent emails, aggregate the results,
//! and mail back a summary report.

pub mod classify;
pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod report;
