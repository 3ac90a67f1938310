//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Feed.
//! Field names serialize in camelCase so the data shape matches what the
//! view layer consumes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FeedError, Result};

/// Numeric post identifier. Seeded posts use small integers; posts created
/// at runtime use a clock-derived value from [`PostId::generate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

static LAST_GENERATED_ID: AtomicU64 = AtomicU64::new(0);

impl PostId {
    /// Returns a new id derived from the current time in milliseconds.
    /// Strictly increasing within the process, even when called twice in
    /// the same millisecond.
    pub fn generate() -> Self {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut last = LAST_GENERATED_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match LAST_GENERATED_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return PostId(next),
                Err(actual) => last = actual,
            }
        }
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author data, embedded by value in every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    /// Unique handle, without the leading `@`
    pub username: String,
    pub profile_image: String,
    pub verified: bool,
}

/// The fundamental unit of the feed.
///
/// Posts are value records: the store replaces a post with a modified copy
/// instead of sharing mutable references to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author: Author,
    pub content: String,
    /// Up to four image URLs, in display order
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub retweets: u32,
    pub comments: u32,
    pub is_liked: bool,
    pub is_retweeted: bool,
}

/// The two engagement toggles a reader can apply to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engagement {
    Like,
    Retweet,
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Engagement::Like => f.write_str("like"),
            Engagement::Retweet => f.write_str("retweet"),
        }
    }
}

/// Flag and counter of one engagement kind, captured together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementState {
    pub active: bool,
    pub count: u32,
}

impl Post {
    /// Current flag and counter for `kind`.
    pub fn engagement(&self, kind: Engagement) -> EngagementState {
        match kind {
            Engagement::Like => EngagementState { active: self.is_liked, count: self.likes },
            Engagement::Retweet => EngagementState { active: self.is_retweeted, count: self.retweets },
        }
    }

    /// Returns a copy with `kind` flipped and its counter moved by one in
    /// the same direction, or `None` when the counter cannot move that way
    /// (zero while active, `u32::MAX` while inactive). Toggling a returned
    /// record again always succeeds and yields the original.
    pub fn toggled(&self, kind: Engagement) -> Option<Post> {
        let current = self.engagement(kind);
        let count = if current.active { current.count.checked_sub(1) } else { current.count.checked_add(1) }?;
        Some(self.with_engagement(kind, EngagementState { active: !current.active, count }))
    }

    /// Returns a copy with `kind` set to exactly `state`.
    pub fn with_engagement(&self, kind: Engagement, state: EngagementState) -> Post {
        let mut post = self.clone();
        match kind {
            Engagement::Like => {
                post.is_liked = state.active;
                post.likes = state.count;
            }
            Engagement::Retweet => {
                post.is_retweeted = state.active;
                post.retweets = state.count;
            }
        }
        post
    }

    /// Case-insensitive substring match over content, author name and handle.
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        self.content.to_lowercase().contains(needle)
            || self.author.name.to_lowercase().contains(needle)
            || self.author.username.to_lowercase().contains(needle)
    }
}

/// A post being written, before the backend assigns it an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub content: String,
    pub images: Vec<String>,
}

impl PostDraft {
    pub const MAX_CONTENT_CHARS: usize = 280;
    pub const MAX_IMAGES: usize = 4;

    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), images: Vec::new() }
    }

    /// Attaches images, keeping only the first [`Self::MAX_IMAGES`] overall.
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images.extend(images.into_iter().map(Into::into));
        self.images.truncate(Self::MAX_IMAGES);
        self
    }

    /// Remaining characters before the limit. Negative when over it.
    pub fn chars_left(&self) -> i64 {
        Self::MAX_CONTENT_CHARS as i64 - self.content.chars().count() as i64
    }

    pub fn can_post(&self) -> bool {
        !self.content.trim().is_empty() && self.chars_left() >= 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.content.trim().is_empty() {
            return Err(FeedError::Validation("post content is empty".to_string()));
        }
        if self.chars_left() < 0 {
            return Err(FeedError::Validation(format!(
                "post content exceeds {} characters by {}",
                Self::MAX_CONTENT_CHARS,
                -self.chars_left()
            )));
        }
        Ok(())
    }
}

/// Acknowledgement returned by the backend for a like/retweet toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleAck {
    pub success: bool,
}

/// Backend response to a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    pub success: bool,
    pub post: Option<Post>,
}

/// Time-derived notification identifier (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn generate() -> Self {
        NotificationId(Uuid::now_v7())
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewPost,
    Like,
    Retweet,
    Comment,
}

/// An ephemeral toast. Expires on its own after the queue's TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_visible: bool,
}
