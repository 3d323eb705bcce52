//! Mock feed implementation for testing
//!
//! A scripted feed source: each `subscribe` call consumes the next
//! subscription plan, and each plan replays a fixed sequence of steps.
//! Shared counters let tests verify how many subscription attempts and
//! reads the ingestion loop performed, without network access.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{FeedError, Result};
use crate::feed::{FeedSource, Subscription};
use crate::types::{RawAuthor, RawPost};

/// One scripted read from a mock subscription.
pub enum Step {
    /// Yield a post.
    Yield(RawPost),
    /// Set the shared signal flag, then continue with the next step.
    /// Used to simulate an operator interrupt arriving mid-stream.
    Signal,
    /// Fail with a feed-layer error.
    Fail(FeedError),
    /// End the stream cleanly.
    End,
}

/// What one `subscribe` call does.
pub enum SubscribePlan {
    /// The subscription cannot be opened.
    Fail(FeedError),
    /// The subscription opens and replays these steps.
    Stream(Vec<Step>),
}

pub struct MockFeed {
    plans: VecDeque<SubscribePlan>,
    signal: Option<Arc<AtomicBool>>,
    subscribe_calls: Arc<Mutex<usize>>,
    skip_existing_seen: Arc<Mutex<Vec<bool>>>,
}

impl MockFeed {
    pub fn new(plans: Vec<SubscribePlan>) -> Self {
        Self {
            plans: plans.into(),
            signal: None,
            subscribe_calls: Arc::new(Mutex::new(0)),
            skip_existing_seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Flag set by `Step::Signal`, typically the ingestion loop's
    /// shutdown flag.
    pub fn with_signal(mut self, flag: Arc<AtomicBool>) -> Self {
        self.signal = Some(flag);
        self
    }

    /// Handle for asserting the number of subscribe calls after the
    /// feed itself has been moved into the loop.
    pub fn subscribe_counter(&self) -> Arc<Mutex<usize>> {
        self.subscribe_calls.clone()
    }

    /// Handle for asserting the `skip_existing` flag of each call.
    pub fn skip_existing_log(&self) -> Arc<Mutex<Vec<bool>>> {
        self.skip_existing_seen.clone()
    }

    /// A post fixture with the given id and title.
    pub fn post(id: &str, title: &str, created_utc: f64) -> RawPost {
        RawPost {
            author: RawAuthor {
                name: "mock_author".to_string(),
            },
            created_utc,
            id: id.to_string(),
            name: format!("t3_{}", id),
            selftext: String::new(),
            title: title.to_string(),
            url: format!("https://example.com/{}", id),
            permalink: format!("/r/mock/comments/{}/", id),
            link_flair_text: None,
        }
    }
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn subscribe(
        &mut self,
        _topic: &str,
        skip_existing: bool,
    ) -> Result<Box<dyn Subscription>> {
        *self.subscribe_calls.lock().unwrap() += 1;
        self.skip_existing_seen.lock().unwrap().push(skip_existing);

        match self.plans.pop_front() {
            Some(SubscribePlan::Fail(err)) => Err(err.into()),
            Some(SubscribePlan::Stream(steps)) => Ok(Box::new(MockSubscription {
                steps: steps.into(),
                signal: self.signal.clone(),
            })),
            None => Err(FeedError::Network("mock script exhausted".to_string()).into()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSubscription {
    steps: VecDeque<Step>,
    signal: Option<Arc<AtomicBool>>,
}

#[async_trait]
impl Subscription for MockSubscription {
    async fn next_post(&mut self) -> Result<Option<RawPost>> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Yield(post)) => return Ok(Some(post)),
                Some(Step::Signal) => {
                    if let Some(flag) = &self.signal {
                        flag.store(true, Ordering::Relaxed);
                    }
                }
                Some(Step::Fail(err)) => return Err(err.into()),
                Some(Step::End) | None => return Ok(None),
            }
        }
    }
}
