//! Social Feed Port
//!
//! Trait seam for platforms that deliver recent posts about a token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Social feed error type
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SocialError {
    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Credentials missing or rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Platform a post came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SocialSource {
    Twitter,
    Reddit,
}

impl SocialSource {
    /// Stable key for logging and feed-breaker bookkeeping
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialSource::Twitter => "twitter",
            SocialSource::Reddit => "reddit",
        }
    }
}

impl fmt::Display for SocialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One collected post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub text: String,
    pub author: String,
    pub source: SocialSource,
    pub posted_at: Option<DateTime<Utc>>,
}

/// A platform that can return recent posts matching a query
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialFeed: Send + Sync {
    /// Fetch up to `limit` recent posts matching the query
    async fn recent_posts(&self, query: &str, limit: u32) -> Result<Vec<SocialPost>, SocialError>;

    fn source(&self) -> SocialSource;
}
