//! # rf-mock-backend
//!
//! In-memory implementation of `FeedBackend`.
//! Serves a fixed dataset and answers every call after a fixed artificial delay,
//! so loading states and optimistic updates are visible in the UI.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rf_core::error::{FeedError, Result};
use rf_core::models::{Author, CreatedPost, Post, PostDraft, PostId, ToggleAck};
use rf_core::traits::FeedBackend;
use tracing::debug;

const SEED_POSTS: &str = include_str!("../data/seed_posts.json");

/// Artificial delay applied to each kind of call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub fetch: Duration,
    pub toggle: Duration,
    pub create: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            fetch: Duration::from_millis(2000),
            toggle: Duration::from_millis(300),
            create: Duration::from_millis(500),
        }
    }
}

impl Latency {
    /// No delay at all. Handy for tests that do not care about timing.
    pub fn none() -> Self {
        Self { fetch: Duration::ZERO, toggle: Duration::ZERO, create: Duration::ZERO }
    }
}

/// The twelve posts the feed starts with, newest first.
pub fn seed_posts() -> Result<Vec<Post>> {
    serde_json::from_str(SEED_POSTS).map_err(|e| FeedError::Backend(format!("seed dataset is malformed: {e}")))
}

/// The signed-in user that authors every post created through this backend.
pub fn current_user() -> Author {
    Author {
        name: "내 이름".to_string(),
        username: "myusername".to_string(),
        profile_image: "https://picsum.photos/40/40?random=99".to_string(),
        verified: false,
    }
}

pub struct InMemoryBackend {
    posts: Vec<Post>,
    latency: Latency,
    author: Author,
}

impl InMemoryBackend {
    /// Backend over the built-in seed dataset.
    pub fn seeded(latency: Latency) -> Result<Self> {
        Ok(Self::with_posts(seed_posts()?, latency))
    }

    pub fn with_posts(posts: Vec<Post>, latency: Latency) -> Self {
        Self { posts, latency, author: current_user() }
    }

    /// Total number of posts available for paging.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[async_trait]
impl FeedBackend for InMemoryBackend {
    /// Slices `[(page - 1) * limit, page * limit)`, clamped to the dataset.
    async fn fetch_posts(&self, page: usize, limit: usize) -> Result<Vec<Post>> {
        self.delay(self.latency.fetch).await;

        let Some(start) = page.checked_sub(1).map(|p| p.saturating_mul(limit)) else {
            return Ok(Vec::new());
        };
        let start = start.min(self.posts.len());
        let end = start.saturating_add(limit).min(self.posts.len());
        debug!(page, limit, returned = end - start, "served feed page");
        Ok(self.posts[start..end].to_vec())
    }

    async fn toggle_like(&self, post_id: PostId) -> Result<ToggleAck> {
        self.delay(self.latency.toggle).await;
        debug!(%post_id, "acknowledged like toggle");
        Ok(ToggleAck { success: true })
    }

    async fn toggle_retweet(&self, post_id: PostId) -> Result<ToggleAck> {
        self.delay(self.latency.toggle).await;
        debug!(%post_id, "acknowledged retweet toggle");
        Ok(ToggleAck { success: true })
    }

    async fn create_post(&self, draft: PostDraft) -> Result<CreatedPost> {
        self.delay(self.latency.create).await;

        let post = Post {
            id: PostId::generate(),
            author: self.author.clone(),
            content: draft.content,
            images: draft.images,
            created_at: Utc::now(),
            likes: 0,
            retweets: 0,
            comments: 0,
            is_liked: false,
            is_retweeted: false,
        };
        debug!(post_id = %post.id, "created post");
        Ok(CreatedPost { success: true, post: Some(post) })
    }
}
