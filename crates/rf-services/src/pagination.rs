//! # Feed Pagination
//!
//! Loads the feed page by page from the backend into a [`PostStore`]. The
//! store's loading flag doubles as the guard against overlapping loads.

use std::sync::{Arc, Mutex, PoisonError};

use rf_core::error::Result;
use tracing::{debug, info, warn};

use crate::store::PostStore;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy)]
struct Cursor {
    page: usize,
    has_more: bool,
}

/// Clears the store's loading flag when dropped.
struct LoadingGuard<'a>(&'a PostStore);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set_loading(false);
    }
}

#[derive(Clone)]
pub struct FeedLoader {
    store: PostStore,
    page_size: usize,
    cursor: Arc<Mutex<Cursor>>,
}

impl FeedLoader {
    pub fn new(store: PostStore, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            cursor: Arc::new(Mutex::new(Cursor { page: 0, has_more: true })),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Last page that was loaded, `0` before the first load.
    pub fn page(&self) -> usize {
        self.cursor().page
    }

    pub fn has_more(&self) -> bool {
        self.cursor().has_more
    }

    fn cursor(&self) -> Cursor {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_cursor(&self, cursor: Cursor) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = cursor;
    }

    /// Fetches page 1 and replaces the post list with it. Returns the number
    /// of posts loaded; `0` without fetching if a load is already running.
    pub async fn load_initial(&self) -> Result<usize> {
        if !self.store.begin_loading() {
            debug!("load already in progress");
            return Ok(0);
        }
        let _guard = LoadingGuard(&self.store);

        let posts = self.store.backend().fetch_posts(1, self.page_size).await.inspect_err(|err| {
            warn!(%err, "failed to load posts");
        })?;
        let count = posts.len();
        self.set_cursor(Cursor { page: 1, has_more: count == self.page_size });
        self.store.set_posts(posts);
        info!(count, "initial page loaded");
        Ok(count)
    }

    /// Fetches the next page and appends it. Does nothing while another load
    /// runs or once the backend ran out of posts.
    pub async fn load_more(&self) -> Result<usize> {
        if !self.has_more() {
            return Ok(0);
        }
        if !self.store.begin_loading() {
            debug!("load already in progress");
            return Ok(0);
        }
        let _guard = LoadingGuard(&self.store);

        let next = self.page() + 1;
        let posts = self.store.backend().fetch_posts(next, self.page_size).await.inspect_err(|err| {
            warn!(%err, page = next, "failed to load more posts");
        })?;

        let count = posts.len();
        if count == 0 {
            self.set_cursor(Cursor { page: next - 1, has_more: false });
            debug!(page = next, "no more posts");
            return Ok(0);
        }
        self.set_cursor(Cursor { page: next, has_more: count == self.page_size });
        self.store.append_posts(posts);
        info!(count, page = next, "page appended");
        Ok(count)
    }
}
