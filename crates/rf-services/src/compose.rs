//! # Compose
//!
//! Submits a [`PostDraft`] to the backend and, once the backend returns the
//! created post, puts it at the head of the feed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rf_core::error::{FeedError, Result};
use rf_core::models::{CreatedPost, Post, PostDraft};
use tracing::{info, warn};

use crate::store::PostStore;

/// Clears the submitting flag however the submit ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct Composer {
    store: PostStore,
    submitting: Arc<AtomicBool>,
}

impl Composer {
    pub fn new(store: PostStore) -> Self {
        Self { store, submitting: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Whether `draft` could be submitted right now.
    pub fn can_post(&self, draft: &PostDraft) -> bool {
        draft.can_post() && !self.is_submitting()
    }

    /// Validates and creates the post. Only one submit runs at a time; a
    /// second call while one is pending fails with a validation error.
    pub async fn submit(&self, draft: PostDraft) -> Result<Post> {
        draft.validate()?;
        if self
            .submitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(FeedError::Validation("a post is already being submitted".to_string()));
        }
        let _guard = SubmitGuard(&self.submitting);

        match self.store.backend().create_post(draft).await {
            Ok(CreatedPost { success: true, post: Some(post) }) => {
                info!(post_id = %post.id, images = post.images.len(), "post created");
                self.store.add_post(post.clone());
                Ok(post)
            }
            Ok(_) => {
                warn!("backend did not return a created post");
                Err(FeedError::Backend("post was not created".to_string()))
            }
            Err(err) => {
                warn!(%err, "create post failed");
                Err(err)
            }
        }
    }
}
