//! Mail provider gateway — authorization handshake, retrieval, delivery.
//!
//! Pure I/O at the provider seam; no classification logic lives here.

pub mod client;

pub use client::HttpMailClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MailError;
use crate::pipeline::EmailRecord;

/// Authorization handshake state reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Pending,
    Completed,
}

/// An in-flight (or completed) authorization handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub id: String,
    pub status: AuthStatus,
    /// User-facing URL to finish the handshake; present while pending.
    #[serde(default)]
    pub url: Option<String>,
}

/// An email to deliver on the account owner's behalf.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub recipient: String,
}

/// Mail provider operations a digest run depends on.
///
/// Retrieval and delivery must not be attempted until the authorization
/// handshake reports completed.
#[async_trait]
pub trait MailGateway: Send + Sync {
    /// Start (or resume) the authorization handshake for an account.
    async fn authorize(&self, account: &str) -> Result<Authorization, MailError>;

    /// Block until the handshake completes, or fail with
    /// [`MailError::AuthorizationIncomplete`].
    async fn wait_for_authorization(&self, auth: &Authorization) -> Result<(), MailError>;

    /// Fetch the most recent `count` emails from the account.
    async fn list_recent(&self, account: &str, count: usize)
    -> Result<Vec<EmailRecord>, MailError>;

    /// Send an email from the account.
    async fn send(&self, account: &str, email: &OutgoingEmail) -> Result<(), MailError>;
}
