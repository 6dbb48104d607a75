//! Reddit Feed Adapter
//!
//! Search client for the public Reddit JSON API. Joins submission title
//! and body into one scoreable text per post.

use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::SocialSection;
use crate::ports::social::{SocialError, SocialFeed, SocialPost, SocialSource};

/// Reddit requires a descriptive User-Agent and throttles generic ones
const REDDIT_USER_AGENT: &str = "insider-bot/0.1";

/// The listing endpoint caps results at 100 per request
const MAX_LISTING_LIMIT: u32 = 100;

/// Reddit search client
#[derive(Debug, Clone)]
pub struct RedditFeed {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl RedditFeed {
    pub fn new(cfg: &SocialSection) -> Result<Self, SocialError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(REDDIT_USER_AGENT)
            .build()
            .map_err(|e| SocialError::Http {
                url: cfg.reddit_base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: cfg.reddit_base_url.trim_end_matches('/').to_string(),
            token: cfg.reddit_client_token(),
        })
    }
}

#[async_trait]
impl SocialFeed for RedditFeed {
    async fn recent_posts(&self, query: &str, limit: u32) -> Result<Vec<SocialPost>, SocialError> {
        let url = format!("{}/search.json", self.base_url);
        let limit = limit.clamp(1, MAX_LISTING_LIMIT).to_string();

        let mut request = self.http.get(&url).query(&[
            ("q", query),
            ("sort", "new"),
            ("limit", limit.as_str()),
        ]);
        // Public search works anonymously; a token only raises rate limits
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| SocialError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SocialError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: Listing = response.json().await.map_err(|e| SocialError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let posts: Vec<SocialPost> = body
            .data
            .children
            .into_iter()
            .map(|child| map_submission(child.data))
            .collect();

        debug!(query, count = posts.len(), "Collected reddit posts");
        Ok(posts)
    }

    fn source(&self) -> SocialSource {
        SocialSource::Reddit
    }
}

fn map_submission(submission: Submission) -> SocialPost {
    let text = format!("{} {}", submission.title, submission.selftext)
        .trim()
        .to_string();
    let posted_at = submission
        .created_utc
        .and_then(|epoch| DateTime::from_timestamp(epoch as i64, 0));

    SocialPost {
        id: submission.id,
        text,
        author: submission.author.unwrap_or_default(),
        source: SocialSource::Reddit,
        posted_at,
    }
}

/// Reddit listing response
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    author: Option<String>,
    created_utc: Option<f64>,
}
