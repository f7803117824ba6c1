//! One character's conversation session, safe to share across threads.
//!
//! Turns and decay ticks both go through one `parking_lot::Mutex` around
//! the engine and the character, so a tick can never land in the middle of
//! a turn. Nothing slow happens under that lock: speech is queued, events
//! are buffered, and saves write a clone of the character under a separate
//! lock once the simulation lock is released.

use std::sync::Arc;

use moodloop_core::collaborators::{SpeechCue, SpeechRequest, SpeechSink};
use moodloop_core::engine::{EngineBuilder, Opening, Phase, TurnOutcome, TurnRejected};
use moodloop_core::persistence::PersistenceEngine;
use moodloop_core::policy::LearnedPolicy;
use moodloop_core::{Character, CharacterId, ConversationEngine, MemoryId, PlayerAction, ScenarioId};
use moodloop_voice::VoiceQueue;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::components::{CharacterSlot, SlotStats};
use crate::config::HostConfig;
use crate::dialogue::{TemplateDialogue, bark_line};
use crate::error::{HostError, Result};
use crate::events::{EventBuffer, HostEvent};

struct SessionInner {
    engine: ConversationEngine,
    slot: CharacterSlot,
    turns_since_save: u32,
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: HostConfig,
    engine: EngineBuilder,
    events: EventBuffer,
    character: Option<Character>,
    voice: Option<VoiceQueue>,
    saves: Option<PersistenceEngine>,
}

impl SessionBuilder {
    /// Use an existing character instead of a fresh one.
    #[must_use]
    pub fn character(mut self, character: Character) -> Self {
        self.character = Some(character);
        self
    }

    /// Send speech to `queue`.
    #[must_use]
    pub fn voice(mut self, queue: VoiceQueue) -> Self {
        self.engine = self.engine.speech(queue.clone());
        self.voice = Some(queue);
        self
    }

    /// Save to `saves`.
    #[must_use]
    pub fn saves(mut self, saves: PersistenceEngine) -> Self {
        self.saves = Some(saves);
        self
    }

    /// Drive responses with a learned policy (needs `policy.mode = "learned"`).
    #[must_use]
    pub fn learned_policy(mut self, policy: impl LearnedPolicy + 'static) -> Self {
        self.engine = self.engine.learned_policy(policy);
        self
    }

    /// Build the session. Opens `host.save_path` if set and no save
    /// database was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Core`] if the save database cannot be opened.
    pub fn build(self) -> Result<Session> {
        let saves = match (self.saves, &self.config.host.save_path) {
            (Some(saves), _) => Some(saves),
            (None, Some(path)) => Some(PersistenceEngine::open(path, &self.config.core.persistence)?),
            (None, None) => None,
        };

        let character = self
            .character
            .unwrap_or_else(|| Character::new(self.config.host.character_name.clone(), &self.config.core));
        info!(character = %character.id, name = %character.name, saves = saves.is_some(), "session created");

        Ok(Session {
            inner: Mutex::new(SessionInner {
                engine: self.engine.build(),
                slot: CharacterSlot::new(character),
                turns_since_save: 0,
            }),
            saves: saves.map(Mutex::new),
            events: self.events,
            voice: self.voice,
            autosave_every_turns: self.config.host.autosave_every_turns,
            config: self.config,
        })
    }
}

/// A character, its conversation engine and the host plumbing around them.
pub struct Session {
    inner: Mutex<SessionInner>,
    saves: Option<Mutex<PersistenceEngine>>,
    events: EventBuffer,
    voice: Option<VoiceQueue>,
    autosave_every_turns: u32,
    config: HostConfig,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("phase", &self.phase())
            .field("events", &self.events.len())
            .field("voice", &self.voice.is_some())
            .field("saves", &self.saves.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Start building a session.
    #[must_use]
    pub fn builder(config: HostConfig) -> SessionBuilder {
        let events = EventBuffer::new();
        let engine = ConversationEngine::builder(&config.core)
            .dialogue(TemplateDialogue::new(config.host.dialogue_seed))
            .reactions(events.clone());
        SessionBuilder {
            config,
            engine,
            events,
            character: None,
            voice: None,
            saves: None,
        }
    }

    // ------------------------------------------------------------------
    // Conversation
    // ------------------------------------------------------------------

    /// Start `scenario`. A finished conversation is reset first, so hosts
    /// can go straight from one scenario to the next.
    ///
    /// # Errors
    ///
    /// [`TurnRejected::InProgress`] if a conversation is running.
    pub fn start(&self, scenario: ScenarioId) -> std::result::Result<Opening, TurnRejected> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        if matches!(inner.engine.phase(), Phase::Ended(_)) {
            inner.engine.reset();
        }
        inner.engine.start(&mut inner.slot.character, scenario)
    }

    /// Play a turn from free text.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection if no conversation is active.
    pub fn submit_text(&self, text: &str) -> std::result::Result<TurnOutcome, TurnRejected> {
        let (outcome, due) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let outcome = inner.engine.handle_text(&mut inner.slot.character, text)?;
            (outcome, self.after_turn(inner))
        };
        if let Some(character) = due {
            self.save_best_effort(&character);
        }
        Ok(outcome)
    }

    /// Play a turn from a known action.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection if no conversation is active.
    pub fn submit_action(&self, action: PlayerAction) -> std::result::Result<TurnOutcome, TurnRejected> {
        let (outcome, due) = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            let outcome = inner.engine.handle_action(&mut inner.slot.character, action)?;
            (outcome, self.after_turn(inner))
        };
        if let Some(character) = due {
            self.save_best_effort(&character);
        }
        Ok(outcome)
    }

    /// Counts the turn. Returns a copy of the character when an autosave is due.
    fn after_turn(&self, inner: &mut SessionInner) -> Option<Character> {
        inner.turns_since_save += 1;
        if self.saves.is_none()
            || self.autosave_every_turns == 0
            || inner.turns_since_save < self.autosave_every_turns
        {
            return None;
        }
        inner.turns_since_save = 0;
        Some(inner.slot.character.clone())
    }

    /// Cut the running conversation short.
    pub fn abort(&self) -> bool {
        let mut inner = self.inner.lock();
        let aborted = inner.engine.abort();
        if aborted {
            self.events.push(HostEvent::ConversationEnded {
                character: inner.slot.character.id,
                reason: moodloop_core::engine::EndReason::Aborted,
                turns: inner.engine.turn(),
            });
        }
        aborted
    }

    /// Back to idle. Memories are kept.
    pub fn reset(&self) {
        self.inner.lock().engine.reset();
    }

    /// Record a promise made to the character.
    pub fn make_promise(&self, content: &str) -> MemoryId {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.engine.make_promise(&mut inner.slot.character, content)
    }

    /// Record that a promise was broken.
    pub fn break_promise(&self, content: &str) -> MemoryId {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.engine.break_promise(&mut inner.slot.character, content)
    }

    /// Where the conversation is.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.inner.lock().engine.phase()
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Decay tick of `dt` seconds. Emotion changes outside a conversation
    /// are reported as events and voiced as ambient reactions.
    pub fn tick(&self, dt: f32) {
        let mut inner = self.inner.lock();
        let Some((from, to)) = inner.slot.tick(dt) else {
            return;
        };
        if inner.engine.is_active() {
            return;
        }
        let character = inner.slot.character.id;
        drop(inner);

        debug!(%character, %from, %to, "emotion drifted");
        self.events.push(HostEvent::EmotionChanged { character, from, to });
        if let Some(voice) = &self.voice {
            voice.speak(SpeechRequest {
                character,
                text: bark_line(to).to_string(),
                emotion: to,
                cue: SpeechCue::Reaction,
            });
        }
    }

    /// Pause or resume decay for this character.
    pub fn set_active(&self, active: bool) {
        self.inner.lock().slot.active = active;
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Save the character now. `Ok(false)` when the session has no save
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Core`] if the save fails.
    pub fn save(&self) -> Result<bool> {
        let Some(saves) = &self.saves else {
            return Ok(false);
        };
        let character = {
            let mut inner = self.inner.lock();
            inner.turns_since_save = 0;
            inner.slot.character.clone()
        };
        saves.lock().save_character(&character)?;
        Ok(true)
    }

    fn save_best_effort(&self, character: &Character) {
        let Some(saves) = &self.saves else {
            return;
        };
        match saves.lock().save_character(character) {
            Ok(()) => debug!(character = %character.id, "autosaved"),
            Err(e) => warn!(character = %character.id, error = %e, "autosave failed, continuing in memory"),
        }
    }

    /// Replace the character with a saved one. Returns `Ok(false)` if there
    /// is no save database or nothing is saved under `id`.
    ///
    /// # Errors
    ///
    /// [`HostError::Busy`] while a conversation is running, or
    /// [`HostError::Core`] if loading fails.
    pub fn load(&self, id: &CharacterId) -> Result<bool> {
        if self.inner.lock().engine.is_active() {
            return Err(HostError::Busy);
        }
        let Some(saves) = &self.saves else {
            return Ok(false);
        };
        let Some(character) = saves.lock().load_character(id)? else {
            return Ok(false);
        };

        let mut inner = self.inner.lock();
        // A conversation may have started while the save was being read.
        if inner.engine.is_active() {
            return Err(HostError::Busy);
        }
        info!(character = %character.id, memories = character.memory.len(), "character loaded");
        inner.slot.character = character;
        inner.engine.reset();
        inner.turns_since_save = 0;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// Read access to the character.
    pub fn with_character<R>(&self, f: impl FnOnce(&Character) -> R) -> R {
        f(&self.inner.lock().slot.character)
    }

    /// Debug overlay numbers.
    #[must_use]
    pub fn stats(&self) -> SlotStats {
        self.inner.lock().slot.stats()
    }

    /// Take buffered UI events.
    #[must_use]
    pub fn drain_events(&self) -> Vec<HostEvent> {
        self.events.drain()
    }

    /// Configuration the session was built from.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

/// Handle to a background decay loop started by [`spawn_ticker`].
#[derive(Debug)]
pub struct Ticker {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<u64>,
}

impl Ticker {
    /// Stop ticking. Returns how many ticks ran.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(());
        self.handle.await.unwrap_or(0)
    }
}

/// Tick `session` at its configured rate on the current tokio runtime.
/// Each tick advances the simulation by the configured interval, so
/// simulated time stays independent of scheduler jitter.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use]
pub fn spawn_ticker(session: Arc<Session>) -> Ticker {
    let (shutdown, mut stop) = oneshot::channel();
    let period = session.config.host.tick_interval();
    let dt = period.as_secs_f32();

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut ticks = 0;
        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = interval.tick() => {
                    session.tick(dt);
                    ticks += 1;
                }
            }
        }
        ticks
    });

    Ticker { shutdown, handle }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use moodloop_core::config::PersistenceConfig;
    use moodloop_core::engine::EndReason;
    use moodloop_core::{Emotion, MoodloopConfig, ResponseKind};

    use super::*;

    fn session_with(core: MoodloopConfig) -> Session {
        let mut config = HostConfig {
            core,
            ..HostConfig::default()
        };
        config.host.dialogue_seed = Some(9);
        Session::builder(config).build().expect("build")
    }

    fn happy() -> MoodloopConfig {
        let mut core = MoodloopConfig::default();
        core.emotion.initial_relationship = 60.0;
        core.emotion.initial_mood = 50.0;
        core.emotion.initial_trust = 60.0;
        core
    }

    #[test]
    fn finished_conversations_restart_without_reset() {
        let session = session_with(happy());
        session.start(ScenarioId::Bedtime).expect("start");
        let outcome = session.submit_action(PlayerAction::Listen).expect("turn");
        assert_eq!(outcome.response, ResponseKind::Compliant);
        assert_eq!(session.phase(), Phase::Ended(EndReason::TerminalResponse));

        session.start(ScenarioId::CleanRoom).expect("restart");
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(
            session.start(ScenarioId::CleanRoom),
            Err(TurnRejected::InProgress)
        );
    }

    #[test]
    fn turns_and_aborts_become_events() {
        let session = session_with(MoodloopConfig::default());
        assert_eq!(
            session.submit_text("hello"),
            Err(TurnRejected::NotStarted)
        );
        session.start(ScenarioId::DoHomework).expect("start");
        session.submit_text("What do you think we should do?").expect("turn");
        assert!(session.abort());
        assert!(!session.abort());

        let events = session.drain_events();
        assert!(matches!(events[0], HostEvent::Reaction { turn: 1, .. }));
        assert!(matches!(
            events.last(),
            Some(HostEvent::ConversationEnded { reason: EndReason::Aborted, turns: 1, .. })
        ));
    }

    #[test]
    fn idle_drift_is_reported_and_voiced() {
        let mut config = HostConfig {
            core: happy(),
            ..HostConfig::default()
        };
        config.core.emotion.initial_mood = 52.0;
        let queue = VoiceQueue::new(8, Duration::from_secs(30));
        let session = Session::builder(config).voice(queue.clone()).build().expect("build");

        session.tick(2.0);
        let events = session.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            HostEvent::EmotionChanged { from: Emotion::Happy, .. }
        ));
        let bark = queue.dequeue().expect("bark queued");
        assert_eq!(bark.priority, moodloop_voice::SpeechPriority::Reaction);
    }

    #[test]
    fn autosave_and_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = HostConfig::default();
        config.host.autosave_every_turns = 2;
        config.host.save_path = Some(dir.path().join("saves.db"));
        let session = Session::builder(config).build().expect("build");
        let id = session.with_character(|c| c.id);

        session.start(ScenarioId::ScreenTime).expect("start");
        session.submit_action(PlayerAction::Humor).expect("turn 1");
        session.submit_action(PlayerAction::Humor).expect("turn 2");

        let saves = PersistenceEngine::open(dir.path().join("saves.db"), &PersistenceConfig::default())
            .expect("open");
        let saved = saves.load_character(&id).expect("load").expect("autosaved");
        assert_eq!(saved.memory.len(), 2);

        assert!(matches!(session.load(&id), Err(HostError::Busy)));
        assert!(session.abort());
        assert!(session.load(&id).expect("load"));
        assert_eq!(session.stats().short_term, 2);
        assert!(!session.load(&CharacterId::new()).expect("missing"));
        assert!(session.save().expect("save"));
    }

    #[test]
    fn autosave_runs_outside_the_simulation_lock() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = HostConfig::default();
        config.host.autosave_every_turns = 1;
        config.host.save_path = Some(dir.path().join("saves.db"));
        let session = Session::builder(config).build().expect("build");
        let id = session.with_character(|c| c.id);
        session.start(ScenarioId::CleanRoom).expect("start");

        let saves = session.saves.as_ref().expect("save database");
        let held = saves.lock();
        std::thread::scope(|scope| {
            let turn = scope.spawn(|| session.submit_action(PlayerAction::Humor));

            // The turn finishes and the autosave waits on the held save
            // lock; ticks and reads must still get through meanwhile.
            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            while session.with_character(|c| c.memory.len()) == 0 {
                assert!(std::time::Instant::now() < deadline, "turn never completed");
                std::thread::sleep(Duration::from_millis(5));
            }
            session.tick(0.1);
            assert_eq!(session.stats().sim_millis, 100);
            assert!(!turn.is_finished());

            drop(held);
            turn.join().expect("join").expect("turn");
        });

        let saved = saves.lock().load_character(&id).expect("load").expect("autosaved");
        assert_eq!(saved.memory.len(), 1);
        // The copy was taken when the turn ended, before the tick.
        assert_eq!(saved.clock.millis(), 0);
    }

    #[test]
    fn no_save_database_means_no_save() {
        let session = session_with(MoodloopConfig::default());
        assert!(!session.save().expect("save"));
    }

    #[tokio::test]
    async fn ticker_advances_sim_time() {
        let mut config = HostConfig::default();
        config.host.tick_rate_hz = 100.0;
        let session = Arc::new(Session::builder(config).build().expect("build"));
        let ticker = spawn_ticker(Arc::clone(&session));
        tokio::time::sleep(Duration::from_millis(60)).await;
        let ticks = ticker.stop().await;

        assert!(ticks > 0);
        assert_eq!(session.stats().sim_millis, ticks * 10);
    }
}
