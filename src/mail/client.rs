//! HTTP client for a hosted mail-tool provider.
//!
//! The provider exposes Gmail access as named tools behind a single
//! execute endpoint, plus an OAuth handshake that must reach completed
//! status before any tool call is attempted.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::MailError;
use crate::mail::{AuthStatus, Authorization, MailGateway, OutgoingEmail};
use crate::pipeline::EmailRecord;

const GMAIL_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.readonly",
];

const LIST_TOOL: &str = "Google.ListEmails";
const SEND_TOOL: &str = "Google.SendEmail";

/// How often a pending handshake is re-checked.
const AUTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Total time the user gets to finish a pending handshake.
const AUTH_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// HTTP gateway to the mail-tool provider.
pub struct HttpMailClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl HttpMailClient {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn fetch_auth_status(&self, auth_id: &str) -> Result<Authorization, MailError> {
        let response = self
            .http
            .get(format!("{}/v1/auth/status", self.base_url))
            .query(&[("id", auth_id)])
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Http(e.to_string()))?;

        response
            .json::<Authorization>()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))
    }

    async fn execute_tool(
        &self,
        account: &str,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<ToolOutcome, MailError> {
        debug!(tool_name, account, "Executing provider tool");
        let response = self
            .http
            .post(format!("{}/v1/tools/execute", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "tool_name": tool_name,
                "user_id": account,
                "input": input,
            }))
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Http(e.to_string()))?;

        response
            .json::<ToolOutcome>()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))
    }
}

// ── Provider wire types ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ToolOutcome {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    output: Option<ToolOutput>,
}

impl ToolOutcome {
    fn failure_reason(self) -> String {
        self.error
            .unwrap_or_else(|| "provider reported failure without detail".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ToolOutput {
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EmailListing {
    #[serde(default)]
    emails: Vec<EmailRecord>,
}

// ── Gateway impl ────────────────────────────────────────────────────

#[async_trait]
impl MailGateway for HttpMailClient {
    async fn authorize(&self, account: &str) -> Result<Authorization, MailError> {
        let response = self
            .http
            .post(format!("{}/v1/auth/authorize", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&json!({
                "user_id": account,
                "provider": "google",
                "scopes": GMAIL_SCOPES,
            }))
            .send()
            .await
            .map_err(|e| MailError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| MailError::Http(e.to_string()))?;

        let auth = response
            .json::<Authorization>()
            .await
            .map_err(|e| MailError::InvalidResponse(e.to_string()))?;

        debug!(auth_id = %auth.id, status = ?auth.status, "Authorization handshake started");
        Ok(auth)
    }

    async fn wait_for_authorization(&self, auth: &Authorization) -> Result<(), MailError> {
        if auth.status == AuthStatus::Completed {
            return Ok(());
        }

        let deadline = tokio::time::Instant::now() + AUTH_WAIT_TIMEOUT;
        loop {
            tokio::time::sleep(AUTH_POLL_INTERVAL).await;

            let current = self.fetch_auth_status(&auth.id).await?;
            if current.status == AuthStatus::Completed {
                info!(auth_id = %auth.id, "Authorization completed");
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                warn!(auth_id = %auth.id, "Authorization wait timed out");
                return Err(MailError::AuthorizationIncomplete {
                    auth_id: auth.id.clone(),
                });
            }
        }
    }

    async fn list_recent(
        &self,
        account: &str,
        count: usize,
    ) -> Result<Vec<EmailRecord>, MailError> {
        let outcome = self
            .execute_tool(account, LIST_TOOL, json!({ "n_emails": count }))
            .await?;

        if !outcome.success {
            return Err(MailError::Retrieval(outcome.failure_reason()));
        }

        let value = outcome
            .output
            .map(|o| o.value)
            .ok_or_else(|| MailError::InvalidResponse("listing carried no output".to_string()))?;
        let listing: EmailListing = serde_json::from_value(value)
            .map_err(|e| MailError::InvalidResponse(e.to_string()))?;

        let mut emails = listing.emails;
        for email in &mut emails {
            if email.id.is_empty() {
                email.id = Uuid::new_v4().to_string();
            }
        }

        info!(account, fetched = emails.len(), "Fetched recent emails");
        Ok(emails)
    }

    async fn send(&self, account: &str, email: &OutgoingEmail) -> Result<(), MailError> {
        let outcome = self
            .execute_tool(
                account,
                SEND_TOOL,
                json!({
                    "subject": email.subject,
                    "body": email.body,
                    "recipient": email.recipient,
                }),
            )
            .await?;

        if !outcome.success {
            return Err(MailError::Delivery(outcome.failure_reason()));
        }

        info!(recipient = %email.recipient, "Digest delivered");
        Ok(())
    }
}
