//! rusty-feed/crates/rf-core/src/lib.rs
//!
//! The domain models, text utilities and interface definitions for Rusty-Feed.

pub mod models;
pub mod traits;
pub mod error;
pub mod hashtags;
pub mod locale;
pub mod time;

// Re-exporting for easier access in other crates
pub use models::*;
pub use traits::*;
pub use error::*;
pub use hashtags::{hashtags, parse_hashtags, Segment, SegmentKind};
pub use locale::Locale;
pub use time::{format_relative_time, parse_timestamp, RelativeTimeFormatter};
