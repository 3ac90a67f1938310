//! # Real-Time Simulator
//!
//! Fabricates posts from other users at random intervals so the feed looks
//! alive. Each post is pushed through [`PostStore::add_post`] and announced
//! with a `new_post` notification.
//!
//! The schedule is a chain of one-shot delays, each drawn uniformly from
//! `[min_delay, max_delay)` after the previous post went out. It runs as a
//! single spawned task, so at most one delay is ever pending.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rf_core::error::{FeedError, Result};
use rf_core::locale::Locale;
use rf_core::models::{Author, NotificationKind, Post, PostId};
use rf_core::traits::{RandomSource, ThreadRandom};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notifications::NotificationQueue;
use crate::store::PostStore;

const ROSTER: [(&str, &str); 10] = [
    ("김개발", "kimdev"),
    ("이디자인", "leedesign"),
    ("박백엔드", "parkbackend"),
    ("최모바일", "choimobile"),
    ("정데이터", "jungdata"),
    ("강AI", "kangai"),
    ("손보안", "sonsecurity"),
    ("윤DevOps", "yundevops"),
    ("임게임", "limgame"),
    ("조클라우드", "jocloud"),
];

const PHRASES: [&str; 10] = [
    "새로운 JavaScript 프레임워크가 출시되었네요! 🚀 #JavaScript #웹개발",
    "오늘 배운 React Hook 패턴을 공유합니다 💡 #React #개발팁",
    "TypeScript 5.0의 새로운 기능들이 정말 인상적이에요 ⚡ #TypeScript #개발",
    "Next.js App Router 마이그레이션 완료! 성능이 확실히 개선됐습니다 📈 #NextJS #성능최적화",
    "CSS Grid vs Flexbox, 언제 뭘 써야 할까요? 🤔 #CSS #프론트엔드",
    "GitHub Actions로 CI/CD 파이프라인 구축하기 🔧 #DevOps #자동화",
    "모바일 퍼스트 디자인의 중요성을 다시 한번 느꼈습니다 📱 #반응형웹 #UX",
    "웹 접근성 개선 작업 진행 중입니다 ♿ #웹접근성 #포용성",
    "PWA 구현으로 네이티브 앱 같은 경험 제공! 🎯 #PWA #웹앱",
    "코드 리뷰 문화가 팀 성장에 미치는 영향 🔍 #코드리뷰 #팀워크",
];

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Chance that a simulated post carries one image
    pub image_probability: f64,
    /// Language of the new-post notification
    pub locale: Locale,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(20),
            max_delay: Duration::from_secs(40),
            image_probability: 0.4,
            locale: Locale::default(),
        }
    }
}

impl SimulatorConfig {
    /// Maps a uniform sample in `[0, 1)` onto `[min_delay, max_delay)`.
    pub fn delay_for(&self, sample: f64) -> Duration {
        let span = self.max_delay.saturating_sub(self.min_delay);
        self.min_delay + span.mul_f64(sample.clamp(0.0, 1.0))
    }
}

fn pick(sample: f64, len: usize) -> usize {
    ((sample * len as f64) as usize).min(len - 1)
}

fn scaled(sample: f64, upper: u32) -> u32 {
    ((sample * f64::from(upper)) as u32).min(upper.saturating_sub(1))
}

/// Builds random posts from the fixed roster and phrase bank.
#[derive(Debug, Clone)]
pub struct PostSynthesizer {
    image_probability: f64,
}

impl PostSynthesizer {
    pub fn new(image_probability: f64) -> Self {
        Self { image_probability }
    }

    pub fn synthesize(&self, random: &mut dyn RandomSource) -> Post {
        let content = PHRASES[pick(random.next_unit(), PHRASES.len())];
        let has_image = random.next_unit() < self.image_probability;

        let author_index = pick(random.next_unit(), ROSTER.len());
        let (name, username) = ROSTER[author_index];
        let author = Author {
            name: name.to_string(),
            username: username.to_string(),
            profile_image: format!("https://picsum.photos/40/40?random={}", author_index + 100),
            verified: random.next_unit() > 0.7,
        };

        let created_at = Utc::now();
        let images = if has_image {
            vec![format!("https://picsum.photos/500/300?random={}", created_at.timestamp_millis())]
        } else {
            Vec::new()
        };

        Post {
            id: PostId::generate(),
            author,
            content: content.to_string(),
            images,
            created_at,
            likes: scaled(random.next_unit(), 50),
            retweets: scaled(random.next_unit(), 20),
            comments: scaled(random.next_unit(), 15),
            is_liked: false,
            is_retweeted: false,
        }
    }
}

struct Shared {
    posts: PostStore,
    notifications: NotificationQueue,
    config: SimulatorConfig,
    synthesizer: PostSynthesizer,
    random: Mutex<Box<dyn RandomSource>>,
}

impl Shared {
    fn next_delay(&self) -> Duration {
        let sample = self.random.lock().unwrap_or_else(PoisonError::into_inner).next_unit();
        self.config.delay_for(sample)
    }

    fn publish(&self) -> Result<Post> {
        // Queueing the notification needs a runtime; check before touching the feed.
        Handle::try_current().map_err(|_| FeedError::RuntimeUnavailable("RealTimeSimulator::simulate_new_post"))?;

        let post = {
            let mut random = self.random.lock().unwrap_or_else(PoisonError::into_inner);
            self.synthesizer.synthesize(&mut **random)
        };
        self.posts.add_post(post.clone());
        self.notifications
            .add_notification(NotificationKind::NewPost, self.config.locale.new_post_notice(&post.author.name))?;
        info!(post_id = %post.id, author = %post.author.username, "simulated post published");
        Ok(post)
    }
}

async fn run_chain(shared: Arc<Shared>) {
    loop {
        let delay = shared.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "next simulated post scheduled");
        tokio::time::sleep(delay).await;
        if let Err(err) = shared.publish() {
            warn!(%err, "simulated post could not be published");
        }
    }
}

pub struct RealTimeSimulator {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RealTimeSimulator {
    pub fn new(posts: PostStore, notifications: NotificationQueue, config: SimulatorConfig) -> Self {
        Self::with_random(posts, notifications, config, ThreadRandom)
    }

    pub fn with_random(
        posts: PostStore,
        notifications: NotificationQueue,
        config: SimulatorConfig,
        random: impl RandomSource + 'static,
    ) -> Self {
        let synthesizer = PostSynthesizer::new(config.image_probability);
        Self {
            shared: Arc::new(Shared {
                posts,
                notifications,
                config,
                synthesizer,
                random: Mutex::new(Box::new(random) as Box<dyn RandomSource>),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.shared.config
    }

    /// Starts the chain. Does nothing if it is already running.
    pub fn start(&self) -> Result<()> {
        let runtime =
            Handle::try_current().map_err(|_| FeedError::RuntimeUnavailable("RealTimeSimulator::start"))?;

        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("simulator already running");
            return Ok(());
        }
        *task = Some(runtime.spawn(run_chain(Arc::clone(&self.shared))));
        info!(
            min_delay_ms = self.shared.config.min_delay.as_millis() as u64,
            max_delay_ms = self.shared.config.max_delay.as_millis() as u64,
            "simulator started"
        );
        Ok(())
    }

    /// Cancels the pending delay. Safe to call repeatedly.
    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.abort();
            info!("simulator stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Publishes one simulated post right away, outside the timed chain.
    pub fn simulate_new_post(&self) -> Result<Post> {
        self.shared.publish()
    }
}

impl Drop for RealTimeSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
