//! # Post Store
//!
//! Single source of truth for the feed. Holds the post list, the search
//! query and the filtered view derived from them, and the loading flag.
//!
//! Like and retweet toggles are optimistic: the post changes immediately,
//! the backend is called, and the change is undone if the backend fails.
//!
//! # Developer Note
//! A toggle flips a flag and moves its counter by one in the same direction,
//! so toggles on one field commute and undoing one is just flipping again.
//! That holds even when several toggles on the same post are in flight and
//! resolve out of order. What a blind re-flip cannot see is the list being
//! replaced underneath it, so each toggle records the list generation and the
//! undo is skipped when `set_posts` ran in between or the post is gone.
//!
//! The generation and the pending-toggle counts live beside the watched
//! [`FeedState`], not in it, so subscribers only receive what they render.
//! They are always locked after the watch value, never before.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rf_core::models::{Engagement, Post, PostId, ToggleAck};
use rf_core::traits::FeedBackend;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Posts whose content, author name or username contain `query`,
/// ignoring case. A blank query keeps every post. Order is preserved.
pub fn filter_posts(posts: &[Post], query: &str) -> Vec<Post> {
    if query.trim().is_empty() {
        return posts.to_vec();
    }
    let needle = query.to_lowercase();
    posts.iter().filter(|post| post.matches_lowercase(&needle)).cloned().collect()
}

/// How an engagement toggle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The backend accepted the change; the optimistic state stands.
    Confirmed,
    /// The backend failed and the optimistic change was undone.
    RolledBack,
    /// The backend failed but there was nothing left to undo: the post was
    /// not in the list, or the list was replaced while the call was pending.
    Stale,
}

/// Observable feed state. Cloned out of the store by [`PostStore::snapshot`]
/// and delivered to [`PostStore::subscribe`] receivers.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    posts: Vec<Post>,
    filtered: Vec<Post>,
    query: String,
    loading: bool,
}

impl FeedState {
    fn with_posts(posts: Vec<Post>) -> Self {
        let mut state = FeedState { posts, ..Default::default() };
        state.refresh_filtered();
        state
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    /// Posts matching the current search query; all posts when it is blank.
    pub fn filtered_posts(&self) -> &[Post] {
        &self.filtered
    }

    pub fn search_query(&self) -> &str {
        &self.query
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn position(&self, post_id: PostId) -> Option<usize> {
        self.posts.iter().position(|post| post.id == post_id)
    }

    fn refresh_filtered(&mut self) {
        self.filtered = filter_posts(&self.posts, &self.query);
    }
}

/// List generation and the number of unresolved toggles per post and field.
#[derive(Debug, Default)]
struct Bookkeeping {
    generation: u64,
    in_flight: HashMap<(PostId, Engagement), usize>,
}

impl Bookkeeping {
    fn release(&mut self, ticket: &ToggleTicket) {
        if self.generation != ticket.generation {
            return;
        }
        if let Some(count) = self.in_flight.get_mut(&ticket.key()) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&ticket.key());
            }
        }
    }
}

/// Bookkeeping for one optimistic toggle.
#[derive(Debug, Clone, Copy)]
struct ToggleTicket {
    post_id: PostId,
    kind: Engagement,
    generation: u64,
    applied: bool,
}

impl ToggleTicket {
    fn key(&self) -> (PostId, Engagement) {
        (self.post_id, self.kind)
    }
}

/// Releases the pending mark of a toggle however its future ends,
/// including when it is dropped before the backend answers.
struct PendingToggle<'a> {
    store: &'a PostStore,
    ticket: ToggleTicket,
}

impl Drop for PendingToggle<'_> {
    fn drop(&mut self) {
        if self.ticket.applied {
            self.store.bookkeeping().release(&self.ticket);
        }
    }
}

struct StoreInner {
    backend: Arc<dyn FeedBackend>,
    state: watch::Sender<FeedState>,
    bookkeeping: Mutex<Bookkeeping>,
}

/// Cheap-to-clone handle to the shared feed state.
#[derive(Clone)]
pub struct PostStore {
    inner: Arc<StoreInner>,
}

impl PostStore {
    /// Empty store; call [`PostStore::set_posts`] or use a `FeedLoader` to fill it.
    pub fn new(backend: Arc<dyn FeedBackend>) -> Self {
        Self::with_posts(backend, Vec::new())
    }

    pub fn with_posts(backend: Arc<dyn FeedBackend>, posts: Vec<Post>) -> Self {
        let (state, _) = watch::channel(FeedState::with_posts(posts));
        Self { inner: Arc::new(StoreInner { backend, state, bookkeeping: Mutex::default() }) }
    }

    pub fn backend(&self) -> &Arc<dyn FeedBackend> {
        &self.inner.backend
    }

    /// Receiver that is notified after every visible state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedState {
        self.inner.state.borrow().clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.inner.state.borrow().posts.clone()
    }

    pub fn filtered_posts(&self) -> Vec<Post> {
        self.inner.state.borrow().filtered.clone()
    }

    pub fn post(&self, post_id: PostId) -> Option<Post> {
        let state = self.inner.state.borrow();
        state.posts.iter().find(|post| post.id == post_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state.borrow().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn search_query(&self) -> String {
        self.inner.state.borrow().query.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Whether a toggle of `kind` on `post_id` is waiting for the backend.
    pub fn is_toggle_pending(&self, post_id: PostId, kind: Engagement) -> bool {
        self.bookkeeping().in_flight.contains_key(&(post_id, kind))
    }

    fn bookkeeping(&self) -> MutexGuard<'_, Bookkeeping> {
        self.inner.bookkeeping.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_loading(&self, loading: bool) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    /// Sets the loading flag unless it is already set. Returns whether this
    /// call set it.
    pub fn begin_loading(&self) -> bool {
        self.inner.state.send_if_modified(|state| !std::mem::replace(&mut state.loading, true))
    }

    /// Replaces the whole list. Pending toggles issued against the old list
    /// will not roll back into the new one.
    pub fn set_posts(&self, posts: Vec<Post>) {
        self.inner.state.send_modify(|state| {
            let mut books = self.bookkeeping();
            books.generation += 1;
            books.in_flight.clear();
            state.posts = posts;
            state.refresh_filtered();
            debug!(count = state.posts.len(), generation = books.generation, "post list replaced");
        });
    }

    /// Appends a page of older posts to the tail.
    pub fn append_posts(&self, posts: Vec<Post>) {
        if posts.is_empty() {
            return;
        }
        self.inner.state.send_modify(|state| {
            state.posts.extend(posts);
            state.refresh_filtered();
        });
    }

    /// Inserts a post at the head of the list.
    pub fn add_post(&self, post: Post) {
        self.inner.state.send_modify(|state| {
            debug!(post_id = %post.id, "post added at head");
            state.posts.insert(0, post);
            state.refresh_filtered();
        });
    }

    /// Sets the search query and recomputes the filtered view.
    pub fn search_posts(&self, query: &str) {
        self.inner.state.send_modify(|state| {
            state.query = query.to_string();
            state.refresh_filtered();
            debug!(query, matches = state.filtered.len(), "search applied");
        });
    }

    pub fn clear_search(&self) {
        self.search_posts("");
    }

    pub async fn toggle_like(&self, post_id: PostId) -> ToggleOutcome {
        self.toggle(Engagement::Like, post_id).await
    }

    pub async fn toggle_retweet(&self, post_id: PostId) -> ToggleOutcome {
        self.toggle(Engagement::Retweet, post_id).await
    }

    /// Optimistically flips `kind` on `post_id`, then confirms with the backend.
    ///
    /// The backend is called even when no post has that id; the state is
    /// simply left untouched in that case.
    pub async fn toggle(&self, kind: Engagement, post_id: PostId) -> ToggleOutcome {
        let pending = PendingToggle { store: self, ticket: self.apply_optimistic(kind, post_id) };

        let backend = &self.inner.backend;
        let response = match kind {
            Engagement::Like => backend.toggle_like(post_id).await,
            Engagement::Retweet => backend.toggle_retweet(post_id).await,
        };

        match response {
            Ok(ToggleAck { success: true }) => ToggleOutcome::Confirmed,
            Ok(ToggleAck { success: false }) => {
                warn!(%post_id, %kind, "backend declined toggle, rolling back");
                self.roll_back(&pending.ticket)
            }
            Err(err) => {
                warn!(%post_id, %kind, %err, "toggle failed, rolling back");
                self.roll_back(&pending.ticket)
            }
        }
    }

    fn apply_optimistic(&self, kind: Engagement, post_id: PostId) -> ToggleTicket {
        let mut ticket = ToggleTicket { post_id, kind, generation: 0, applied: false };
        self.inner.state.send_if_modified(|state| {
            let mut books = self.bookkeeping();
            ticket.generation = books.generation;
            let Some(index) = state.position(post_id) else {
                debug!(%post_id, %kind, "toggle on unknown post leaves state untouched");
                return false;
            };
            let Some(toggled) = state.posts[index].toggled(kind) else {
                warn!(%post_id, %kind, "counter at its limit, toggle not applied");
                return false;
            };
            state.posts[index] = toggled;
            *books.in_flight.entry(ticket.key()).or_default() += 1;
            state.refresh_filtered();
            ticket.applied = true;
            debug!(%post_id, %kind, "optimistic toggle applied");
            true
        });
        ticket
    }

    fn roll_back(&self, ticket: &ToggleTicket) -> ToggleOutcome {
        if !ticket.applied {
            return ToggleOutcome::Stale;
        }
        let mut outcome = ToggleOutcome::Stale;
        self.inner.state.send_if_modified(|state| {
            if self.bookkeeping().generation != ticket.generation {
                debug!(post_id = %ticket.post_id, "post list replaced since toggle, skipping rollback");
                return false;
            }
            let Some(index) = state.position(ticket.post_id) else {
                return false;
            };
            let Some(restored) = state.posts[index].toggled(ticket.kind) else {
                return false;
            };
            state.posts[index] = restored;
            state.refresh_filtered();
            outcome = ToggleOutcome::RolledBack;
            true
        });
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{abc, post, ScriptedBackend};
    use mockall::predicate::eq;
    use rf_core::error::FeedError;
    use rf_core::traits::MockFeedBackend;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn store_with(backend: ScriptedBackend) -> (PostStore, Arc<ScriptedBackend>) {
        let backend = Arc::new(backend);
        (PostStore::with_posts(backend.clone(), abc()), backend)
    }

    fn likes(store: &PostStore, id: u64) -> (u32, bool) {
        let post = store.post(PostId(id)).unwrap();
        (post.likes, post.is_liked)
    }

    #[tokio::test]
    async fn double_toggle_restores_original_values() {
        let (store, _) = store_with(ScriptedBackend::default());
        let before = store.posts();

        assert_eq!(store.toggle_like(PostId(2)).await, ToggleOutcome::Confirmed);
        assert_eq!(likes(&store, 2), (21, true));
        assert_eq!(store.toggle_like(PostId(2)).await, ToggleOutcome::Confirmed);

        assert_eq!(store.posts(), before);
        assert!(!store.is_toggle_pending(PostId(2), Engagement::Like));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_like_is_visible_immediately_then_reverted() {
        let (store, backend) =
            store_with(ScriptedBackend::new(Duration::from_millis(300)).then_fail_toggle());

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_like(PostId(2)).await }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(likes(&store, 2), (21, true));
        assert!(store.is_toggle_pending(PostId(2), Engagement::Like));

        assert_eq!(task.await.unwrap(), ToggleOutcome::RolledBack);
        assert_eq!(likes(&store, 2), (20, false));
        assert!(!store.is_toggle_pending(PostId(2), Engagement::Like));
        assert_eq!(backend.toggle_calls.load(Ordering::SeqCst), 1);

        // Neighbours were never touched.
        assert_eq!(likes(&store, 1), (10, false));
        assert_eq!(likes(&store, 3), (30, false));
    }

    #[tokio::test]
    async fn failed_retweet_is_reverted() {
        let (store, _) = store_with(ScriptedBackend::default().then_fail_toggle());

        assert_eq!(store.toggle_retweet(PostId(3)).await, ToggleOutcome::RolledBack);
        let post = store.post(PostId(3)).unwrap();
        assert_eq!((post.retweets, post.is_retweeted), (3, false));
        assert_eq!(post.likes, 30);
    }

    #[tokio::test]
    async fn declined_ack_counts_as_failure() {
        let (store, _) =
            store_with(ScriptedBackend::default().then_toggle(Ok(ToggleAck { success: false })));

        assert_eq!(store.toggle_like(PostId(1)).await, ToggleOutcome::RolledBack);
        assert_eq!(likes(&store, 1), (10, false));
    }

    #[tokio::test]
    async fn unknown_post_still_calls_the_backend() {
        let mut backend = MockFeedBackend::new();
        backend
            .expect_toggle_like()
            .with(eq(PostId(99)))
            .times(1)
            .returning(|_| Ok(ToggleAck { success: true }));
        let store = PostStore::with_posts(Arc::new(backend), abc());

        assert_eq!(store.toggle_like(PostId(99)).await, ToggleOutcome::Confirmed);
        assert_eq!(store.posts(), abc());
    }

    #[tokio::test]
    async fn unknown_post_failure_has_nothing_to_undo() {
        let mut backend = MockFeedBackend::new();
        backend
            .expect_toggle_retweet()
            .times(1)
            .returning(|_| Err(FeedError::Backend("offline".into())));
        let store = PostStore::with_posts(Arc::new(backend), abc());

        assert_eq!(store.toggle_retweet(PostId(42)).await, ToggleOutcome::Stale);
        assert_eq!(store.posts(), abc());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_toggles_keep_the_surviving_intent() {
        // First call fails at t=300, second succeeds at t=400.
        let (store, _) = store_with(
            ScriptedBackend::new(Duration::from_millis(300))
                .then_fail_toggle()
                .then_toggle(Ok(ToggleAck { success: true })),
        );

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_like(PostId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(likes(&store, 1), (11, true));

        let second = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_like(PostId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(likes(&store, 1), (10, false));

        assert_eq!(first.await.unwrap(), ToggleOutcome::RolledBack);
        assert_eq!(likes(&store, 1), (11, true));
        assert!(store.is_toggle_pending(PostId(1), Engagement::Like));

        assert_eq!(second.await.unwrap(), ToggleOutcome::Confirmed);
        // Only the second (successful) toggle remains applied.
        assert_eq!(likes(&store, 1), (11, true));
        assert!(!store.is_toggle_pending(PostId(1), Engagement::Like));
    }

    #[tokio::test(start_paused = true)]
    async fn rollback_skips_a_replaced_list() {
        let (store, _) =
            store_with(ScriptedBackend::new(Duration::from_millis(300)).then_fail_toggle());

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_like(PostId(2)).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut fresh = abc();
        fresh[1].likes = 500;
        store.set_posts(fresh.clone());

        assert_eq!(task.await.unwrap(), ToggleOutcome::Stale);
        assert_eq!(store.posts(), fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_toggle_is_no_longer_pending() {
        let (store, _) = store_with(ScriptedBackend::new(Duration::from_millis(300)));

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_like(PostId(1)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.is_toggle_pending(PostId(1), Engagement::Like));

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!store.is_toggle_pending(PostId(1), Engagement::Like));
        // The optimistic change stays; nothing reported a failure.
        assert_eq!(likes(&store, 1), (11, true));
    }

    #[tokio::test]
    async fn counter_at_its_limit_is_left_alone() {
        let mut maxed = abc();
        maxed[0].likes = u32::MAX;
        let backend = Arc::new(ScriptedBackend::default().then_fail_toggle());
        let store = PostStore::with_posts(backend.clone(), maxed.clone());

        assert_eq!(store.toggle_like(PostId(1)).await, ToggleOutcome::Stale);
        assert_eq!(store.posts(), maxed);
        assert_eq!(backend.toggle_calls.load(Ordering::SeqCst), 1);
        assert!(!store.is_toggle_pending(PostId(1), Engagement::Like));
    }

    #[tokio::test]
    async fn confirmation_does_not_wake_subscribers() {
        let (store, _) = store_with(ScriptedBackend::default());
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        assert_eq!(store.toggle_like(PostId(3)).await, ToggleOutcome::Confirmed);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().posts()[2].is_liked);

        // A toggle on an unknown post leaves the watched state alone.
        assert_eq!(store.toggle_like(PostId(77)).await, ToggleOutcome::Confirmed);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn filtered_view_follows_toggles() {
        let (store, _) = store_with(ScriptedBackend::default());
        store.search_posts("rust");

        store.toggle_like(PostId(2)).await;
        let filtered = store.filtered_posts();
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].is_liked);
    }

    #[test]
    fn blank_query_returns_everything_in_order() {
        let posts = abc();
        assert_eq!(filter_posts(&posts, ""), posts);
        assert_eq!(filter_posts(&posts, "  \t"), posts);
    }

    #[test]
    fn query_matches_content_name_and_username_ignoring_case() {
        let posts = abc();
        let ids = |query: &str| filter_posts(&posts, query).iter().map(|p| p.id.0).collect::<Vec<_>>();

        assert_eq!(ids("REACT"), vec![1]);
        assert_eq!(ids("bob"), vec![2]);
        assert_eq!(ids("KimDev"), vec![3]);
        assert_eq!(ids("김개발"), vec![3]);
        assert_eq!(ids("#"), vec![1, 2, 3]);
        assert!(ids("haskell").is_empty());
    }

    #[test]
    fn search_state_and_reset() {
        let store = PostStore::with_posts(Arc::new(ScriptedBackend::default()), abc());

        store.search_posts("Alice");
        assert_eq!(store.search_query(), "Alice");
        assert_eq!(store.filtered_posts().len(), 1);

        store.search_posts("nothing matches this");
        assert!(store.filtered_posts().is_empty());

        store.clear_search();
        assert_eq!(store.filtered_posts(), store.posts());
    }

    #[test]
    fn add_post_goes_to_the_head() {
        let store = PostStore::with_posts(Arc::new(ScriptedBackend::default()), abc());
        let before = store.len();

        store.add_post(post(4, "Dana", "dana", "fresh"));

        let posts = store.posts();
        assert_eq!(posts.len(), before + 1);
        assert_eq!(posts[0].id, PostId(4));
        assert_eq!(&posts[1..], &abc()[..]);
        assert_eq!(store.filtered_posts(), posts);
    }

    #[test]
    fn add_post_with_active_query_refilters() {
        let store = PostStore::with_posts(Arc::new(ScriptedBackend::default()), abc());
        store.search_posts("rust");

        store.add_post(post(4, "Dana", "dana", "no match here"));
        assert_eq!(store.filtered_posts().len(), 1);

        store.add_post(post(5, "Eve", "eve", "More Rust please"));
        let filtered = store.filtered_posts();
        assert_eq!(filtered.iter().map(|p| p.id.0).collect::<Vec<_>>(), vec![5, 2]);
    }

    #[test]
    fn set_and_append_keep_the_view_in_sync() {
        let store = PostStore::new(Arc::new(ScriptedBackend::default()));
        assert!(store.is_empty());

        store.search_posts("alice");
        store.set_posts(abc());
        assert_eq!(store.filtered_posts().len(), 1);

        store.append_posts(vec![post(9, "Alice Again", "alice2", "older")]);
        assert_eq!(store.len(), 4);
        assert_eq!(store.filtered_posts().len(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let store = PostStore::with_posts(Arc::new(ScriptedBackend::default()), abc());
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.set_loading(true);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading());

        // Setting the same value again is not a change.
        store.set_loading(true);
        assert!(!rx.has_changed().unwrap());

        store.add_post(post(7, "Gus", "gus", "hello"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().posts()[0].id, PostId(7));
    }
}
