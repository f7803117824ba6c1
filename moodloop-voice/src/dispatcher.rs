//! Async dispatcher that drains a [`VoiceQueue`] into a speech backend.
//!
//! ```text
//! engine ──speak()──▶ VoiceQueue ──notify──▶ dispatcher task ──▶ VoiceBackend
//!   (sync, never waits)                        (tokio)           (TTS, logs, ...)
//! ```
//!
//! Each request is synthesised within whatever is left of its deadline.
//! Backend failures are logged and counted; they never reach the engine.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::VoiceError;
use crate::queue::{VoiceQueue, VoiceRequest};

/// Something that can turn a [`VoiceRequest`] into audio.
pub trait VoiceBackend: Send + Sync + 'static {
    /// Speak one request. Called from the dispatcher task only.
    fn synthesize(&self, request: &VoiceRequest) -> impl Future<Output = Result<(), VoiceError>> + Send;
}

/// Backend that only logs what would have been said.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogBackend;

impl VoiceBackend for LogBackend {
    async fn synthesize(&self, request: &VoiceRequest) -> Result<(), VoiceError> {
        info!(
            character = %request.character,
            emotion = %request.emotion,
            priority = ?request.priority,
            text = %request.text,
            "speak"
        );
        Ok(())
    }
}

/// Totals reported when the dispatcher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Requests the backend completed.
    pub spoken: u64,
    /// Requests the backend failed or ran out of time on.
    pub failed: u64,
}

/// Handle to a running dispatcher task.
#[derive(Debug)]
pub struct VoiceDispatcher {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<DispatchStats>,
}

impl VoiceDispatcher {
    /// Start draining `queue` into `backend` on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn<B: VoiceBackend>(queue: VoiceQueue, backend: B) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let backend = Arc::new(backend);

        let handle = tokio::spawn(async move {
            let mut stats = DispatchStats::default();
            info!("voice dispatcher started");
            loop {
                if drain(&queue, backend.as_ref(), &mut stats, &mut stop).await {
                    break;
                }
                tokio::select! {
                    _ = &mut stop => break,
                    () = queue.ready() => {}
                }
            }
            info!(spoken = stats.spoken, failed = stats.failed, "voice dispatcher stopped");
            stats
        });

        Self { shutdown, handle }
    }

    /// Stop the task after the request in flight, if any, and return its
    /// totals. Requests still queued stay in the queue.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Dispatcher`] if the task panicked.
    pub async fn shutdown(self) -> Result<DispatchStats, VoiceError> {
        // The task may already be gone; joining below reports that.
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|e| VoiceError::Dispatcher(e.to_string()))
    }
}

/// Speak queued requests until the queue is empty. Returns `true` as soon
/// as a stop is seen between two requests.
async fn drain<B: VoiceBackend>(
    queue: &VoiceQueue,
    backend: &B,
    stats: &mut DispatchStats,
    stop: &mut oneshot::Receiver<()>,
) -> bool {
    loop {
        if !matches!(stop.try_recv(), Err(TryRecvError::Empty)) {
            return true;
        }
        let Some(request) = queue.dequeue() else {
            return false;
        };
        let start = Instant::now();
        let budget = request.time_remaining();
        let result = match tokio::time::timeout(budget, backend.synthesize(&request)).await {
            Ok(result) => result,
            Err(_) => Err(VoiceError::Timeout(
                u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        match result {
            Ok(()) => {
                stats.spoken += 1;
                debug!(
                    request = request.id,
                    priority = ?request.priority,
                    elapsed_ms = start.elapsed().as_millis(),
                    "speech delivered"
                );
            }
            Err(e) => {
                stats.failed += 1;
                warn!(request = request.id, character = %request.character, error = %e, "speech failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use moodloop_core::{CharacterId, Emotion};
    use parking_lot::Mutex;

    use super::*;
    use crate::queue::SpeechPriority;

    #[derive(Clone, Default)]
    struct Recorder {
        spoken: Arc<Mutex<Vec<String>>>,
    }

    impl VoiceBackend for Recorder {
        async fn synthesize(&self, request: &VoiceRequest) -> Result<(), VoiceError> {
            self.spoken.lock().push(request.text.clone());
            Ok(())
        }
    }

    struct Broken;

    impl VoiceBackend for Broken {
        async fn synthesize(&self, _request: &VoiceRequest) -> Result<(), VoiceError> {
            Err(VoiceError::Unavailable("no speakers".into()))
        }
    }

    struct Slow;

    impl VoiceBackend for Slow {
        async fn synthesize(&self, _request: &VoiceRequest) -> Result<(), VoiceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    async fn wait_for(predicate: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !predicate() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn drains_in_priority_order() {
        let queue = VoiceQueue::new(10, Duration::from_secs(30));
        let who = CharacterId::new();
        queue.enqueue(SpeechPriority::Reaction, who, "hmph", Emotion::Annoyed);
        queue.enqueue(SpeechPriority::Speech, who, "fine", Emotion::Neutral);
        queue.enqueue(SpeechPriority::Opening, who, "do I have to?", Emotion::Neutral);

        let recorder = Recorder::default();
        let dispatcher = VoiceDispatcher::spawn(queue.clone(), recorder.clone());
        wait_for(|| recorder.spoken.lock().len() == 3).await;

        let stats = dispatcher.shutdown().await.expect("shutdown");
        assert_eq!(stats, DispatchStats { spoken: 3, failed: 0 });
        assert_eq!(*recorder.spoken.lock(), vec!["fine", "do I have to?", "hmph"]);
    }

    #[tokio::test]
    async fn wakes_up_for_later_requests() {
        let queue = VoiceQueue::new(10, Duration::from_secs(30));
        let recorder = Recorder::default();
        let dispatcher = VoiceDispatcher::spawn(queue.clone(), recorder.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.enqueue(SpeechPriority::Speech, CharacterId::new(), "okay", Emotion::Happy);
        wait_for(|| recorder.spoken.lock().len() == 1).await;

        assert_eq!(dispatcher.shutdown().await.expect("shutdown").spoken, 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn backend_failures_are_counted_not_fatal() {
        let queue = VoiceQueue::new(10, Duration::from_secs(30));
        let dispatcher = VoiceDispatcher::spawn(queue.clone(), Broken);
        queue.enqueue(SpeechPriority::Speech, CharacterId::new(), "no", Emotion::Angry);
        queue.enqueue(SpeechPriority::Speech, CharacterId::new(), "never", Emotion::Angry);
        wait_for(|| queue.is_empty()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let stats = dispatcher.shutdown().await.expect("shutdown");
        assert_eq!(stats, DispatchStats { spoken: 0, failed: 2 });
    }

    #[derive(Clone, Default)]
    struct Paced {
        started: Arc<Mutex<u32>>,
    }

    impl VoiceBackend for Paced {
        async fn synthesize(&self, _request: &VoiceRequest) -> Result<(), VoiceError> {
            *self.started.lock() += 1;
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn shutdown_waits_for_the_request_in_flight_only() {
        let queue = VoiceQueue::new(10, Duration::from_secs(30));
        let who = CharacterId::new();
        for line in ["one", "two", "three", "four"] {
            queue.enqueue(SpeechPriority::Speech, who, line, Emotion::Neutral);
        }

        let backend = Paced::default();
        let dispatcher = VoiceDispatcher::spawn(queue.clone(), backend.clone());
        wait_for(|| *backend.started.lock() == 1).await;

        let stats = dispatcher.shutdown().await.expect("shutdown");
        assert_eq!(stats, DispatchStats { spoken: 1, failed: 0 });
        assert_eq!(*backend.started.lock(), 1);
        assert_eq!(queue.len(), 3);
    }

    #[tokio::test]
    async fn synthesis_is_cut_off_at_the_deadline() {
        let queue = VoiceQueue::new(10, Duration::from_millis(50));
        let dispatcher = VoiceDispatcher::spawn(queue.clone(), Slow);
        queue.enqueue(SpeechPriority::Speech, CharacterId::new(), "zzz", Emotion::Neutral);
        wait_for(|| queue.is_empty()).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        let stats = dispatcher.shutdown().await.expect("shutdown");
        assert_eq!(stats.failed, 1);
    }
}
