//! Feed abstraction and implementations
//!
//! A feed source produces a live, append-only stream of new posts for a
//! topic. The platform-specific plumbing (auth, polling cadence, rate
//! limits) lives entirely behind these traits so the ingestion loop can
//! run against any implementation, including the scripted mock used in
//! tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RawPost;

pub mod mock;
pub mod reddit;

/// A source of live post subscriptions.
#[async_trait]
pub trait FeedSource: Send {
    /// Open a fresh subscription for `topic`.
    ///
    /// With `skip_existing` the subscription does not replay historical
    /// backlog; only posts created after the subscription opens are
    /// yielded.
    ///
    /// # Errors
    ///
    /// Returns a `FeedError` (transient from the caller's point of view)
    /// if the subscription cannot be opened.
    async fn subscribe(&mut self, topic: &str, skip_existing: bool)
        -> Result<Box<dyn Subscription>>;

    /// Lowercase identifier for diagnostics (e.g., "reddit", "mock").
    fn name(&self) -> &str;
}

/// A live subscription yielding raw posts.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next post.
    ///
    /// `Ok(Some(post))` yields one post. `Ok(None)` means the stream
    /// ended cleanly; a live feed never does this, but implementations
    /// backed by finite fixtures may. `Err` is a feed-layer failure and
    /// invalidates the subscription; the caller is expected to
    /// re-subscribe.
    async fn next_post(&mut self) -> Result<Option<RawPost>>;
}
