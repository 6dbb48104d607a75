//! Notification Port
//!
//! Trait seam for channels that deliver alert messages.

use async_trait::async_trait;
use thiserror::Error;

/// Notification delivery error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotifyError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Channel is configured off or missing credentials
    #[error("Notification channel disabled")]
    Disabled,
}

/// A channel that can deliver one alert message
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Channel name for logging ("telegram", "discord")
    fn channel(&self) -> &str;
}
