//! # rf-services
//!
//! Stateful services of the feed: the post store with optimistic engagement
//! toggles, the self-expiring notification queue, the background post
//! simulator, and the compose and pagination flows built on top of them.
//!
//! Every service is an owned handle that is cheap to clone. Construct them
//! once at startup and pass them to whatever needs them.

pub mod compose;
pub mod notifications;
pub mod pagination;
pub mod simulator;
pub mod store;

pub use compose::Composer;
pub use notifications::{NotificationQueue, DEFAULT_NOTIFICATION_TTL};
pub use pagination::{FeedLoader, DEFAULT_PAGE_SIZE};
pub use simulator::{PostSynthesizer, RealTimeSimulator, SimulatorConfig};
pub use store::{filter_posts, FeedState, PostStore, ToggleOutcome};

#[cfg(test)]
pub(crate) mod test_support;
