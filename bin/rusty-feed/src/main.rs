//! # Rusty-Feed Binary
//!
//! Assembles the feed from configuration: in-memory backend, post store,
//! notification queue and the real-time simulator. It then logs feed
//! activity until Ctrl-C.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rf_config::FeedConfig;
use rf_core::models::Post;
use rf_core::{hashtags, RelativeTimeFormatter};
use rf_mock_backend::{InMemoryBackend, Latency};
use rf_services::{FeedLoader, NotificationQueue, PostStore, RealTimeSimulator, SimulatorConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn log_post(formatter: &RelativeTimeFormatter, post: &Post) {
    info!(
        id = %post.id,
        author = %post.author.username,
        when = %formatter.format_datetime_at(post.created_at, Utc::now()),
        likes = post.likes,
        retweets = post.retweets,
        tags = ?hashtags(&post.content),
        "{}",
        post.content
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = FeedConfig::load().context("loading configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // 1. Backend
    let latency = Latency { fetch: cfg.fetch_latency(), toggle: cfg.toggle_latency(), create: cfg.create_latency() };
    let backend = Arc::new(InMemoryBackend::seeded(latency).context("loading seed posts")?);

    // 2. Stores
    let posts = PostStore::new(backend);
    let notifications = NotificationQueue::new(cfg.notification_ttl());
    let formatter = RelativeTimeFormatter::new(cfg.locale);

    // 3. First page
    let loader = FeedLoader::new(posts.clone(), cfg.feed.page_size);
    let count = loader.load_initial().await.context("loading the first page")?;
    info!(count, has_more = loader.has_more(), "🚀 Rusty-Feed ready");
    for post in posts.posts() {
        log_post(&formatter, &post);
    }

    // 4. Simulator
    let (min_delay, max_delay) = cfg.simulator_delays();
    let simulator = RealTimeSimulator::new(
        posts.clone(),
        notifications.clone(),
        SimulatorConfig {
            min_delay,
            max_delay,
            image_probability: cfg.simulator.image_probability,
            locale: cfg.locale,
        },
    );
    if cfg.simulator.enabled {
        simulator.start()?;
    }

    // 5. Observers
    let mut feed_rx = posts.subscribe();
    let feed_watch = tokio::spawn(async move {
        let mut head = feed_rx.borrow_and_update().posts().first().map(|p| p.id);
        while feed_rx.changed().await.is_ok() {
            let state = feed_rx.borrow_and_update().clone();
            let Some(newest) = state.posts().first() else { continue };
            if Some(newest.id) != head {
                head = Some(newest.id);
                log_post(&formatter, newest);
            }
        }
    });

    let mut toast_rx = notifications.subscribe();
    let toast_watch = tokio::spawn(async move {
        let mut seen = HashSet::new();
        while toast_rx.changed().await.is_ok() {
            let toasts = toast_rx.borrow_and_update().clone();
            for toast in toasts.iter().filter(|toast| !seen.contains(&toast.id)) {
                info!(kind = ?toast.kind, "🔔 {}", toast.message);
            }
            seen = toasts.iter().map(|toast| toast.id).collect();
        }
    });

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    info!("shutting down");

    simulator.stop();
    feed_watch.abort();
    toast_watch.abort();
    if !notifications.is_empty() {
        warn!(pending = notifications.len(), "dropping unexpired notifications");
    }
    Ok(())
}
