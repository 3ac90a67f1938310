//! # Core Traits (Ports)
//!
//! Any backend plugin must implement [`FeedBackend`] to be used by the stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::locale::Locale;
use crate::models::{CreatedPost, Post, PostDraft, PostId, ToggleAck};

/// Asynchronous data source behind the feed.
///
/// # Developer Note
/// Implementations are free to fail any call. The stores treat an `Err` and
/// an ack with `success: false` the same way.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FeedBackend: Send + Sync {
    /// Returns one page of posts. Pages are 1-based.
    async fn fetch_posts(&self, page: usize, limit: usize) -> Result<Vec<Post>>;

    async fn toggle_like(&self, post_id: PostId) -> Result<ToggleAck>;

    async fn toggle_retweet(&self, post_id: PostId) -> Result<ToggleAck>;

    /// Persists a draft and returns the post as the backend sees it.
    async fn create_post(&self, draft: PostDraft) -> Result<CreatedPost>;
}

/// Locale-aware "distance to now" wording used for timestamps older than a week.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait DistanceFormatter: Send + Sync {
    fn distance_to_now(&self, date: DateTime<Utc>, now: DateTime<Utc>, locale: Locale) -> String;
}

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Thread-local RNG from the `rand` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::random::<f64>()
    }
}

/// Replays a fixed list of samples, wrapping around at the end.
/// An empty list always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct SequenceRandom {
    samples: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(samples: impl Into<Vec<f64>>) -> Self {
        Self { samples: samples.into(), cursor: 0 }
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        sample
    }
}
