//! Speech request queue — prioritised, bounded, deadline-aware.
//!
//! The conversation engine hands lines to a [`VoiceQueue`] through the core
//! `SpeechSink` trait and moves on. Synthesis happens later, on the
//! dispatcher task, so a slow or absent speech backend never stalls a turn.
//!
//! - Replies to the player outrank scenario openings, which outrank
//!   ambient reactions.
//! - Within one priority, requests leave in the order they arrived.
//! - A full queue drops the new request; stale requests are skipped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moodloop_core::collaborators::{SpeechCue, SpeechRequest, SpeechSink};
use moodloop_core::config::VoiceConfig;
use moodloop_core::{CharacterId, Emotion};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Priority levels for speech requests (highest dequeued first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpeechPriority {
    /// Ambient reaction; fine to lose.
    Reaction = 0,
    /// Scenario opening line.
    Opening = 1,
    /// Reply to the player, who is waiting for it.
    Speech = 2,
}

impl From<SpeechCue> for SpeechPriority {
    fn from(cue: SpeechCue) -> Self {
        match cue {
            SpeechCue::Reaction => Self::Reaction,
            SpeechCue::Opening => Self::Opening,
            SpeechCue::Reply => Self::Speech,
        }
    }
}

/// A queued line of speech.
#[derive(Debug, Clone)]
pub struct VoiceRequest {
    /// Queue-assigned id, increasing in arrival order.
    pub id: u64,
    /// Priority level.
    pub priority: SpeechPriority,
    /// Who speaks.
    pub character: CharacterId,
    /// What to say.
    pub text: String,
    /// Emotion to voice it with.
    pub emotion: Emotion,
    /// When it was enqueued.
    pub enqueued_at: Instant,
    /// How long it stays worth saying.
    pub deadline: Duration,
}

impl VoiceRequest {
    /// Whether the request has outlived its deadline.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.enqueued_at.elapsed() > self.deadline
    }

    /// Time left before the deadline.
    #[must_use]
    pub fn time_remaining(&self) -> Duration {
        self.deadline.saturating_sub(self.enqueued_at.elapsed())
    }
}

// Max-heap: higher priority first, then lower id (older) first.
impl PartialEq for VoiceRequest {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for VoiceRequest {}

impl PartialOrd for VoiceRequest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VoiceRequest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Thread-safe speech queue. Clones share the same queue.
#[derive(Clone)]
pub struct VoiceQueue {
    inner: Arc<Mutex<VoiceQueueInner>>,
    ready: Arc<Notify>,
}

struct VoiceQueueInner {
    heap: BinaryHeap<VoiceRequest>,
    next_id: u64,
    max_queue_size: usize,
    default_deadline: Duration,
    total_enqueued: u64,
    total_dropped: u64,
    total_expired: u64,
}

/// Counters for a [`VoiceQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Current depth.
    pub depth: usize,
    /// Requests accepted.
    pub total_enqueued: u64,
    /// Requests refused because the queue was full.
    pub total_dropped: u64,
    /// Requests skipped because their deadline passed.
    pub total_expired: u64,
}

impl std::fmt::Debug for VoiceQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceQueue").field("stats", &self.stats()).finish()
    }
}

impl VoiceQueue {
    /// Queue holding at most `max_queue_size` requests, each valid for
    /// `default_deadline` unless enqueued with its own.
    #[must_use]
    pub fn new(max_queue_size: usize, default_deadline: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VoiceQueueInner {
                heap: BinaryHeap::new(),
                next_id: 0,
                max_queue_size,
                default_deadline,
                total_enqueued: 0,
                total_dropped: 0,
                total_expired: 0,
            })),
            ready: Arc::new(Notify::new()),
        }
    }

    /// Queue sized and timed from the `[voice]` config section.
    #[must_use]
    pub fn from_config(config: &VoiceConfig) -> Self {
        Self::new(
            config.max_queue_size,
            Duration::from_millis(config.speech_deadline_ms),
        )
    }

    /// Enqueue a line with the default deadline.
    ///
    /// Returns the request id, or `None` if the queue is full.
    pub fn enqueue(
        &self,
        priority: SpeechPriority,
        character: CharacterId,
        text: impl Into<String>,
        emotion: Emotion,
    ) -> Option<u64> {
        let deadline = self.inner.lock().default_deadline;
        self.enqueue_with_deadline(priority, character, text, emotion, deadline)
    }

    /// Enqueue a line with an explicit deadline.
    ///
    /// Returns the request id, or `None` if the queue is full.
    pub fn enqueue_with_deadline(
        &self,
        priority: SpeechPriority,
        character: CharacterId,
        text: impl Into<String>,
        emotion: Emotion,
        deadline: Duration,
    ) -> Option<u64> {
        let id = {
            let mut inner = self.inner.lock();
            if inner.heap.len() >= inner.max_queue_size {
                inner.total_dropped += 1;
                return None;
            }

            let id = inner.next_id;
            inner.next_id += 1;
            inner.total_enqueued += 1;
            inner.heap.push(VoiceRequest {
                id,
                priority,
                character,
                text: text.into(),
                emotion,
                enqueued_at: Instant::now(),
                deadline,
            });
            id
        };
        self.ready.notify_one();
        Some(id)
    }

    /// Highest-priority request that is still within its deadline.
    /// Expired requests on the way are discarded and counted.
    pub fn dequeue(&self) -> Option<VoiceRequest> {
        let mut inner = self.inner.lock();
        loop {
            let request = inner.heap.pop()?;
            if request.is_expired() {
                inner.total_expired += 1;
                continue;
            }
            return Some(request);
        }
    }

    /// Priority of the next request, without removing it.
    #[must_use]
    pub fn peek_priority(&self) -> Option<SpeechPriority> {
        self.inner.lock().heap.peek().map(|r| r.priority)
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        QueueStats {
            depth: inner.heap.len(),
            total_enqueued: inner.total_enqueued,
            total_dropped: inner.total_dropped,
            total_expired: inner.total_expired,
        }
    }

    /// Drop every expired request now. Returns how many were removed.
    pub fn purge_expired(&self) -> u64 {
        let mut inner = self.inner.lock();
        let before = inner.heap.len();
        let heap = std::mem::take(&mut inner.heap);
        inner.heap = heap.into_iter().filter(|r| !r.is_expired()).collect();
        let purged = (before - inner.heap.len()) as u64;
        inner.total_expired += purged;
        purged
    }

    /// Resolves once something has been enqueued since the last wake-up.
    pub(crate) async fn ready(&self) {
        self.ready.notified().await;
    }
}

impl SpeechSink for VoiceQueue {
    fn speak(&self, request: SpeechRequest) {
        let priority = SpeechPriority::from(request.cue);
        if self
            .enqueue(priority, request.character, request.text, request.emotion)
            .is_none()
        {
            tracing::debug!(character = %request.character, ?priority, "speech queue full, line dropped");
        }
    }
}
