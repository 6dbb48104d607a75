//! Twitter Feed Adapter
//!
//! Recent-search client for the Twitter v2 API. Wraps a subject in the
//! crypto search template, excludes retweets and maps tweets into
//! `SocialPost` records.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::SocialSection;
use crate::ports::social::{SocialError, SocialFeed, SocialPost, SocialSource};

/// The recent-search endpoint accepts max_results in this range only
const MIN_SEARCH_RESULTS: u32 = 10;
const MAX_SEARCH_RESULTS: u32 = 100;

/// Twitter v2 recent-search client
#[derive(Debug, Clone)]
pub struct TwitterFeed {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl TwitterFeed {
    pub fn new(cfg: &SocialSection) -> Result<Self, SocialError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SocialError::Http {
                url: cfg.twitter_base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: cfg.twitter_base_url.trim_end_matches('/').to_string(),
            bearer_token: cfg.twitter_bearer_token(),
        })
    }
}

#[async_trait]
impl SocialFeed for TwitterFeed {
    async fn recent_posts(&self, query: &str, limit: u32) -> Result<Vec<SocialPost>, SocialError> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| SocialError::Auth("Twitter bearer token not configured".to_string()))?;

        let url = format!("{}/tweets/search/recent", self.base_url);
        let search = format!("{} (crypto OR memecoin OR solana) -is:retweet lang:en", query);
        let max_results = limit.clamp(MIN_SEARCH_RESULTS, MAX_SEARCH_RESULTS).to_string();

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("query", search.as_str()),
                ("max_results", max_results.as_str()),
                ("tweet.fields", "author_id,created_at"),
            ])
            .send()
            .await
            .map_err(|e| SocialError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SocialError::Auth(format!(
                "Twitter rejected credentials: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(SocialError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response.json().await.map_err(|e| SocialError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let posts: Vec<SocialPost> = body
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| SocialPost {
                id: tweet.id,
                text: tweet.text,
                author: tweet.author_id.unwrap_or_default(),
                source: SocialSource::Twitter,
                posted_at: tweet.created_at,
            })
            .collect();

        debug!(query, count = posts.len(), "Collected tweets");
        Ok(posts)
    }

    fn source(&self) -> SocialSource {
        SocialSource::Twitter
    }
}

/// Twitter v2 recent-search response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}
