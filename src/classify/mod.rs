//! Classification capability — the LLM-backed answers the stage pipeline
//! consumes.
//!
//! The `Classify` trait is the seam: the pipeline only sees typed answers
//! (a percentage, a bullet list, a category). `LlmClassifier` implements it
//! with one tight prompt per task, structured JSON-only responses, and
//! cumulative token accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{ClassifyError, LlmError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, TokenUsage};
use crate::pipeline::{EmailCategory, EmailRecord};

/// Temperature for classification calls (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Max tokens for single-value answers (kept tight — runs on every email).
const CLASSIFY_MAX_TOKENS: u32 = 256;

/// Max tokens for the bullet-point summary.
const SUMMARY_MAX_TOKENS: u32 = 512;

// ── Capability trait ────────────────────────────────────────────────

/// The classification capability the stage pipeline depends on.
///
/// Latency and failure of the underlying model are opaque to callers; every
/// method either returns a typed answer or a [`ClassifyError`].
#[async_trait]
pub trait Classify: Send + Sync {
    /// Probability (0-100) that the email is spam.
    async fn spam_likelihood(&self, email: &EmailRecord) -> Result<u8, ClassifyError>;

    /// Probability (0-100) that the email is important or urgent.
    async fn importance(&self, email: &EmailRecord) -> Result<u8, ClassifyError>;

    /// Bullet-point summary of an important email.
    async fn summarize(&self, email: &EmailRecord) -> Result<Vec<String>, ClassifyError>;

    /// Single best-fit category for the email.
    async fn categorize(&self, email: &EmailRecord) -> Result<EmailCategory, ClassifyError>;
}

// ── Prompt construction ─────────────────────────────────────────────

fn spam_system_prompt() -> String {
    "You are an expert e-mail assistant assessing whether an email is spam.\n\
     Judge the probability that the email is spam: 0 meaning not spam, 100 meaning \
     absolute certainty it is spam.\n\
     Respond with ONLY a JSON object: {\"percent\": <number from 0 to 100>}"
        .to_string()
}

fn importance_system_prompt() -> String {
    "You are an expert e-mail assistant assessing whether an email is important.\n\
     Judge the probability that the email is important: 0 meaning not important, \
     100 meaning critically important and/or urgent.\n\
     Respond with ONLY a JSON object: {\"percent\": <number from 0 to 100>}"
        .to_string()
}

fn summary_system_prompt() -> String {
    "This is an important email. Summarize it in 3 bullet points that capture its \
     most important content. Prioritize any deadlines or actions the recipient has \
     to take.\n\
     Respond with ONLY a JSON object: {\"main_points\": [\"...\", \"...\", \"...\"]}"
        .to_string()
}

fn category_system_prompt() -> String {
    "Categorize the email into exactly one of the following categories:\n\
     1. Personal\n\
     2. Work\n\
     3. Official duties\n\
     4. Marketing and promotions\n\
     5. News and newsletters\n\
     6. Other\n\n\
     If multiple categories match, choose the most appropriate one.\n\
     Respond with ONLY a JSON object: {\"category\": \"<category name>\"}"
        .to_string()
}

fn email_user_prompt(email_json: &str) -> String {
    format!("Here's the email in JSON format: {email_json}")
}

// ── LLM-backed implementation ───────────────────────────────────────

/// `Classify` implementation over an [`LlmProvider`].
///
/// Tracks cumulative token usage across all calls so the caller can log the
/// cost of a run.
pub struct LlmClassifier {
    llm: Arc<dyn LlmProvider>,
    input_tokens: AtomicU64,
    output_tokens: AtomicU64,
}

impl LlmClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            input_tokens: AtomicU64::new(0),
            output_tokens: AtomicU64::new(0),
        }
    }

    /// Token usage accumulated so far.
    pub fn usage(&self) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens.load(Ordering::Relaxed),
            output_tokens: self.output_tokens.load(Ordering::Relaxed),
        }
    }

    /// Estimated USD cost of the usage so far, from the provider's per-token
    /// pricing.
    pub fn estimated_cost(&self) -> Decimal {
        let usage = self.usage();
        let (input_price, output_price) = self.llm.cost_per_token();
        Decimal::from(usage.input_tokens) * input_price
            + Decimal::from(usage.output_tokens) * output_price
    }

    async fn ask(
        &self,
        task: &'static str,
        system: String,
        email: &EmailRecord,
        max_tokens: u32,
    ) -> Result<String, ClassifyError> {
        let email_json = serde_json::to_string(email)
            .map_err(LlmError::Json)
            .map_err(|source| ClassifyError::Capability { task, source })?;

        let request = CompletionRequest::new(vec![
            ChatMessage::system(system),
            ChatMessage::user(email_user_prompt(&email_json)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(max_tokens);

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|source| ClassifyError::Capability { task, source })?;

        self.input_tokens
            .fetch_add(u64::from(response.input_tokens), Ordering::Relaxed);
        self.output_tokens
            .fetch_add(u64::from(response.output_tokens), Ordering::Relaxed);

        debug!(
            task,
            email_id = %email.id,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Classification call complete"
        );

        Ok(response.content)
    }
}

#[async_trait]
impl Classify for LlmClassifier {
    async fn spam_likelihood(&self, email: &EmailRecord) -> Result<u8, ClassifyError> {
        let raw = self
            .ask("spam", spam_system_prompt(), email, CLASSIFY_MAX_TOKENS)
            .await?;
        parse_percent(&raw).map_err(|reason| ClassifyError::MalformedResponse {
            task: "spam",
            reason,
        })
    }

    async fn importance(&self, email: &EmailRecord) -> Result<u8, ClassifyError> {
        let raw = self
            .ask(
                "importance",
                importance_system_prompt(),
                email,
                CLASSIFY_MAX_TOKENS,
            )
            .await?;
        parse_percent(&raw).map_err(|reason| ClassifyError::MalformedResponse {
            task: "importance",
            reason,
        })
    }

    async fn summarize(&self, email: &EmailRecord) -> Result<Vec<String>, ClassifyError> {
        let raw = self
            .ask("summary", summary_system_prompt(), email, SUMMARY_MAX_TOKENS)
            .await?;
        parse_main_points(&raw).map_err(|reason| ClassifyError::MalformedResponse {
            task: "summary",
            reason,
        })
    }

    async fn categorize(&self, email: &EmailRecord) -> Result<EmailCategory, ClassifyError> {
        let raw = self
            .ask(
                "category",
                category_system_prompt(),
                email,
                CLASSIFY_MAX_TOKENS,
            )
            .await?;
        parse_category(&raw).map_err(|reason| ClassifyError::MalformedResponse {
            task: "category",
            reason,
        })
    }
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct PercentResponse {
    percent: i64,
}

#[derive(Debug, serde::Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    main_points: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct CategoryResponse {
    category: String,
}

fn parse_percent(raw: &str) -> Result<u8, String> {
    let json = extract_json_object(raw);
    let response: PercentResponse =
        serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))?;
    Ok(response.percent.clamp(0, 100) as u8)
}

fn parse_main_points(raw: &str) -> Result<Vec<String>, String> {
    let json = extract_json_object(raw);
    let response: SummaryResponse =
        serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))?;
    if response.main_points.is_empty() {
        return Err("summary contained no points".to_string());
    }
    Ok(response.main_points)
}

fn parse_category(raw: &str) -> Result<EmailCategory, String> {
    let json = extract_json_object(raw);
    let response: CategoryResponse =
        serde_json::from_str(&json).map_err(|e| format!("JSON parse error: {e}"))?;
    EmailCategory::parse(&response.category)
        .ok_or_else(|| format!("unknown category: '{}'", response.category))
}

/// Pull a JSON object out of model output.
///
/// Models asked for bare JSON still occasionally wrap it in a markdown fence
/// or surround it with prose; take the outermost brace-delimited span.
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed.to_string();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}
