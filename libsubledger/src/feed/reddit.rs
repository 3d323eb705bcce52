//! Reddit feed implementation
//!
//! Polls `/r/<topic>/new` with an app-only OAuth token and yields posts
//! that have not been seen before, oldest first. Streaming is emulated
//! the way the platform's own client libraries do it: a fixed polling
//! cadence over the newest page plus a bounded window of seen ids.
//!
//! Deliberately not handled here: rate-limit negotiation and historical
//! backfill. A subscription only ever moves forward from "now".

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{FeedError, Result};
use crate::feed::{FeedSource, Subscription};
use crate::types::{RawAuthor, RawPost};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";
const PAGE_LIMIT: u32 = 100;

// Matches the seen-id window the platform's stream helpers keep.
const SEEN_WINDOW: usize = 301;

pub struct RedditFeed {
    client: reqwest::Client,
    credentials: Credentials,
    user_agent: String,
    poll_interval: Duration,
}

impl RedditFeed {
    pub fn new(credentials: Credentials, user_agent: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            user_agent: user_agent.into(),
            poll_interval: Duration::from_secs(5),
        }
    }

    /// Override the polling cadence (default 5s).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

#[async_trait]
impl FeedSource for RedditFeed {
    async fn subscribe(
        &mut self,
        topic: &str,
        skip_existing: bool,
    ) -> Result<Box<dyn Subscription>> {
        let mut sub = RedditSubscription {
            client: self.client.clone(),
            credentials: self.credentials.clone(),
            user_agent: self.user_agent.clone(),
            poll_interval: self.poll_interval,
            topic: topic.to_string(),
            token: None,
            seen: HashSet::new(),
            seen_order: VecDeque::new(),
            buffer: VecDeque::new(),
        };

        // Prime the seen set so the first poll only yields posts created
        // after subscription. Failures here are feed-layer and count as
        // a failed subscription attempt.
        if skip_existing {
            let page = sub.fetch_page().await?;
            for post in page {
                sub.mark_seen(post.name.clone());
            }
            debug!(topic, seen = sub.seen.len(), "primed subscription");
        }

        Ok(Box::new(sub))
    }

    fn name(&self) -> &str {
        "reddit"
    }
}

struct RedditSubscription {
    client: reqwest::Client,
    credentials: Credentials,
    user_agent: String,
    poll_interval: Duration,
    topic: String,
    token: Option<String>,
    seen: HashSet<String>,
    seen_order: VecDeque<String>,
    buffer: VecDeque<RawPost>,
}

#[async_trait]
impl Subscription for RedditSubscription {
    async fn next_post(&mut self) -> Result<Option<RawPost>> {
        loop {
            if let Some(post) = self.buffer.pop_front() {
                return Ok(Some(post));
            }

            sleep(self.poll_interval).await;

            let page = self.fetch_page().await?;
            // Listing is newest-first; yield in creation order.
            for post in page.into_iter().rev() {
                if !self.seen.contains(&post.name) {
                    self.mark_seen(post.name.clone());
                    self.buffer.push_back(post);
                }
            }
        }
    }
}

impl RedditSubscription {
    fn mark_seen(&mut self, fullname: String) {
        if self.seen.insert(fullname.clone()) {
            self.seen_order.push_back(fullname);
            while self.seen_order.len() > SEEN_WINDOW {
                if let Some(evicted) = self.seen_order.pop_front() {
                    self.seen.remove(&evicted);
                }
            }
        }
    }

    async fn ensure_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| FeedError::Network(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FeedError::Authentication(format!(
                "token endpoint returned {}",
                response.status()
            ))
            .into());
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Protocol(format!("bad token response: {}", e)))?;

        self.token = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    async fn fetch_page(&mut self) -> Result<Vec<RawPost>> {
        let token = self.ensure_token().await?;

        let url = format!(
            "{}/r/{}/new?limit={}&raw_json=1",
            API_BASE, self.topic, PAGE_LIMIT
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| FeedError::Network(format!("listing request failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::UNAUTHORIZED => {
                // Expired token; next attempt re-authenticates.
                self.token = None;
                return Err(FeedError::Authentication("token rejected".to_string()).into());
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(FeedError::RateLimited(format!("{} returned 429", url)).into());
            }
            status => {
                return Err(FeedError::Protocol(format!("listing returned {}", status)).into());
            }
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| FeedError::Protocol(format!("bad listing: {}", e)))?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_raw_post())
            .collect())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    data: ChildData,
}

#[derive(Deserialize)]
struct ChildData {
    author: String,
    created_utc: f64,
    id: String,
    name: String,
    #[serde(default)]
    selftext: String,
    title: String,
    #[serde(default)]
    url: String,
    permalink: String,
    #[serde(default)]
    link_flair_text: Option<String>,
}

impl ChildData {
    fn into_raw_post(self) -> RawPost {
        RawPost {
            author: RawAuthor { name: self.author },
            created_utc: self.created_utc,
            id: self.id,
            name: self.name,
            selftext: self.selftext,
            title: self.title,
            url: self.url,
            permalink: self.permalink,
            link_flair_text: self.link_flair_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_deserializes_api_shape() {
        let body = r#"{
            "data": {
                "children": [
                    {
                        "data": {
                            "author": "lender42",
                            "created_utc": 1700000000.73,
                            "id": "abc123",
                            "name": "t3_abc123",
                            "selftext": "body",
                            "title": "[REQ] $100",
                            "url": "https://example.com",
                            "permalink": "/r/borrow/comments/abc123/",
                            "link_flair_text": null
                        }
                    }
                ]
            }
        }"#;

        let listing: Listing = serde_json::from_str(body).unwrap();
        assert_eq!(listing.data.children.len(), 1);

        let post = listing.data.children.into_iter().next().unwrap().data.into_raw_post();
        assert_eq!(post.author.name, "lender42");
        assert_eq!(post.name, "t3_abc123");
        assert_eq!(post.link_flair_text, None);
    }

    #[test]
    fn test_seen_window_is_bounded() {
        let mut sub = RedditSubscription {
            client: reqwest::Client::new(),
            credentials: Credentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            },
            user_agent: "test".to_string(),
            poll_interval: Duration::from_millis(1),
            topic: "borrow".to_string(),
            token: None,
            seen: HashSet::new(),
            seen_order: VecDeque::new(),
            buffer: VecDeque::new(),
        };

        for i in 0..(SEEN_WINDOW + 50) {
            sub.mark_seen(format!("t3_{}", i));
        }

        assert_eq!(sub.seen.len(), SEEN_WINDOW);
        assert!(!sub.seen.contains("t3_0"));
        assert!(sub.seen.contains(&format!("t3_{}", SEEN_WINDOW + 49)));
    }
}
