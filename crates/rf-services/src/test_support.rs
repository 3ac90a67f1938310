//! Fixtures and a scriptable backend shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rf_core::error::{FeedError, Result};
use rf_core::models::{Author, CreatedPost, Post, PostDraft, PostId, ToggleAck};
use rf_core::traits::FeedBackend;

pub fn post(id: u64, name: &str, username: &str, content: &str) -> Post {
    Post {
        id: PostId(id),
        author: Author {
            name: name.to_string(),
            username: username.to_string(),
            profile_image: format!("https://picsum.photos/40/40?random={id}"),
            verified: false,
        },
        content: content.to_string(),
        images: vec![],
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
        likes: (id % 1000) as u32 * 10,
        retweets: (id % 1000) as u32,
        comments: 0,
        is_liked: false,
        is_retweeted: false,
    }
}

/// Posts A, B, C with ids 1, 2, 3.
pub fn abc() -> Vec<Post> {
    vec![
        post(1, "Alice", "alice", "Learning React hooks #React"),
        post(2, "Bob", "bobby", "Rust ownership finally clicked #Rust"),
        post(3, "김개발", "kimdev", "성능 최적화 #성능"),
    ]
}

/// Backend whose toggle results are scripted in call order. Unscripted
/// calls succeed. Every call waits `latency` first.
#[derive(Default)]
pub struct ScriptedBackend {
    pub latency: Duration,
    pub posts: Vec<Post>,
    toggle_script: Mutex<VecDeque<Result<ToggleAck>>>,
    fetch_script: Mutex<VecDeque<Result<Vec<Post>>>>,
    pub toggle_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(latency: Duration) -> Self {
        Self { latency, ..Default::default() }
    }

    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }

    pub fn then_toggle(self, result: Result<ToggleAck>) -> Self {
        self.toggle_script.lock().unwrap().push_back(result);
        self
    }

    pub fn then_fail_toggle(self) -> Self {
        self.then_toggle(Err(FeedError::Backend("forced failure".to_string())))
    }

    pub fn then_fetch(self, result: Result<Vec<Post>>) -> Self {
        self.fetch_script.lock().unwrap().push_back(result);
        self
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn scripted_toggle(&self) -> Result<ToggleAck> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.toggle_script.lock().unwrap().pop_front();
        self.wait().await;
        scripted.unwrap_or(Ok(ToggleAck { success: true }))
    }
}

#[async_trait]
impl FeedBackend for ScriptedBackend {
    async fn fetch_posts(&self, page: usize, limit: usize) -> Result<Vec<Post>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.fetch_script.lock().unwrap().pop_front();
        self.wait().await;
        if let Some(result) = scripted {
            return result;
        }
        let start = (page.saturating_sub(1) * limit).min(self.posts.len());
        let end = (start + limit).min(self.posts.len());
        Ok(self.posts[start..end].to_vec())
    }

    async fn toggle_like(&self, _post_id: PostId) -> Result<ToggleAck> {
        self.scripted_toggle().await
    }

    async fn toggle_retweet(&self, _post_id: PostId) -> Result<ToggleAck> {
        self.scripted_toggle().await
    }

    async fn create_post(&self, draft: PostDraft) -> Result<CreatedPost> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        let mut created = post(PostId::generate().0, "Me", "myusername", &draft.content);
        created.images = draft.images;
        created.likes = 0;
        created.retweets = 0;
        Ok(CreatedPost { success: true, post: Some(created) })
    }
}
