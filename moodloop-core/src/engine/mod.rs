//! Conversation engine — turn processing and the conversation state machine.
//!
//! ```text
//!          start(scenario)            terminal response / max turns / abort
//!   Idle ─────────────────▶ Active ───────────────────────────────────────▶ Ended
//!    ▲                        │ ▲                                           │
//!    │                        └─┘ non-terminal turn                         │
//!    └────────────────────────────── reset ─────────────────────────────────┘
//! ```
//!
//! One turn runs to completion before the next is accepted:
//!
//! 1. apply the action's deltas to the emotional state
//! 2. recall the most relevant memory and let it nudge mood
//! 3. assemble the observation vector and ask the policy for a response
//! 4. record the turn as a memory and update the action pattern
//! 5. decide whether the conversation continues
//!
//! Dialogue, speech and reactions are handed to collaborators without
//! waiting on them. Memory survives [`ConversationEngine::reset`].

pub mod deltas;

use crate::character::Character;
use crate::classifier::{ActionClassifier, TextScorer};
use crate::collaborators::{
    CannedDialogue, DialogueProvider, NoReactions, Reaction, ReactionSink, SilentSpeech, SpeechCue,
    SpeechRequest, SpeechSink,
};
use crate::config::MoodloopConfig;
use crate::memory::RecalledMemory;
use crate::memory::record::{MemoryDraft, MemoryKind};
use crate::memory::scoring::RecallContext;
use crate::observation::ObservationVector;
use crate::policy::{LearnedPolicy, Policy, is_terminal};
use crate::reward::{EpisodeSummary, RewardModel, ShapedReward, Transition};
use crate::sentiment::SentimentAnalyzer;
use crate::types::{Emotion, MemoryId, PlayerAction, ResponseKind, ScenarioId, SimTimestamp};

use self::deltas::{
    PROMISE_WEIGHT, amplify_mood_delta, broken_promise_cost, deltas_for, turn_memory_kind,
    turn_memory_weight,
};

/// How much free-text sentiment shifts a turn's memory weight.
const SENTIMENT_BLEND: f32 = 0.25;

// ---------------------------------------------------------------------------
// State machine types
// ---------------------------------------------------------------------------

/// Why a conversation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndReason {
    /// The character gave a terminal response.
    TerminalResponse,
    /// The turn cap was reached.
    MaxTurns,
    /// The host cut the conversation short.
    Aborted,
}

/// Where the conversation state machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No conversation.
    Idle,
    /// Accepting turns.
    Active,
    /// Finished; only `reset` leaves this state.
    Ended(EndReason),
}

/// Whether a turn left the conversation open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// More turns are accepted.
    Continue,
    /// The conversation is over.
    Ended(EndReason),
}

/// A request the state machine cannot take in its current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TurnRejected {
    /// A turn arrived with no conversation started.
    #[error("no conversation has been started")]
    NotStarted,
    /// A turn or start arrived after the conversation ended.
    #[error("the conversation already ended ({0:?}); reset first")]
    AlreadyEnded(EndReason),
    /// A start arrived while a conversation is running.
    #[error("a conversation is already in progress")]
    InProgress,
}

/// What the character says when a scenario starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Opening {
    /// Scenario that started.
    pub scenario: ScenarioId,
    /// Opening line.
    pub line: String,
    /// Emotion after situational modifiers were applied.
    pub emotion: Emotion,
}

/// Result of one processed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Turn number (1-based).
    pub turn: u32,
    /// Action that was processed.
    pub action: PlayerAction,
    /// Chosen response.
    pub response: ResponseKind,
    /// Emotion after the turn.
    pub emotion: Emotion,
    /// Response line.
    pub line: String,
    /// Memory that came to mind, if any.
    pub recalled: Option<RecalledMemory>,
    /// Whether the conversation continues.
    pub status: TurnStatus,
    /// Reward for the turn (plus the episode reward on the final turn) when
    /// a reward model is attached.
    pub reward: Option<f32>,
}

impl TurnOutcome {
    /// Whether this turn ended the conversation.
    #[must_use]
    pub fn ended(&self) -> bool {
        matches!(self.status, TurnStatus::Ended(_))
    }
}

/// One entry of the per-conversation log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnRecord {
    /// Turn number.
    pub turn: u32,
    /// Scenario the turn was played in.
    pub scenario: ScenarioId,
    /// Sim time the turn was processed at.
    pub at: SimTimestamp,
    /// Player action.
    pub action: PlayerAction,
    /// Character response.
    pub response: ResponseKind,
    /// Emotion after the turn.
    pub emotion: Emotion,
    /// Net mood change over the turn.
    pub mood_delta: f32,
    /// Net relationship change over the turn.
    pub relationship_delta: f32,
    /// Memory the turn was recorded as.
    pub memory: MemoryId,
}

/// Engine-level knobs pulled out of [`MoodloopConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
struct EngineSettings {
    max_turns: u32,
    situational_amplification: bool,
    repeated_action_threshold: u32,
    memory_mood_influence: f32,
}

impl EngineSettings {
    fn from_config(config: &MoodloopConfig) -> Self {
        Self {
            max_turns: config.conversation.max_turns,
            situational_amplification: config.conversation.situational_amplification,
            repeated_action_threshold: config.memory.repeated_action_threshold,
            memory_mood_influence: config.memory.memory_mood_influence,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Wires collaborators into a [`ConversationEngine`].
pub struct EngineBuilder {
    config: MoodloopConfig,
    scorer: Option<Box<dyn TextScorer>>,
    dialogue: Option<Box<dyn DialogueProvider>>,
    speech: Option<Box<dyn SpeechSink>>,
    reactions: Option<Box<dyn ReactionSink>>,
    learned: Option<Box<dyn LearnedPolicy>>,
    reward: Option<Box<dyn RewardModel>>,
}

impl EngineBuilder {
    /// Replace the keyword classifier.
    #[must_use]
    pub fn scorer(mut self, scorer: impl TextScorer + 'static) -> Self {
        self.scorer = Some(Box::new(scorer));
        self
    }

    /// Dialogue wording.
    #[must_use]
    pub fn dialogue(mut self, dialogue: impl DialogueProvider + 'static) -> Self {
        self.dialogue = Some(Box::new(dialogue));
        self
    }

    /// Speech output.
    #[must_use]
    pub fn speech(mut self, speech: impl SpeechSink + 'static) -> Self {
        self.speech = Some(Box::new(speech));
        self
    }

    /// Reaction output.
    #[must_use]
    pub fn reactions(mut self, reactions: impl ReactionSink + 'static) -> Self {
        self.reactions = Some(Box::new(reactions));
        self
    }

    /// Learned policy; only used when `policy.mode = "learned"`.
    #[must_use]
    pub fn learned_policy(mut self, policy: impl LearnedPolicy + 'static) -> Self {
        self.learned = Some(Box::new(policy));
        self
    }

    /// Reward model. Without one, `reward.enabled` attaches a [`ShapedReward`].
    #[must_use]
    pub fn reward_model(mut self, model: impl RewardModel + 'static) -> Self {
        self.reward = Some(Box::new(model));
        self
    }

    /// Finish wiring.
    #[must_use]
    pub fn build(self) -> ConversationEngine {
        let policy = Policy::from_config(&self.config.policy, self.learned);
        let reward = self.reward.or_else(|| {
            self.config
                .reward
                .enabled
                .then(|| Box::new(ShapedReward::new(self.config.reward.clone())) as Box<dyn RewardModel>)
        });
        ConversationEngine {
            settings: EngineSettings::from_config(&self.config),
            phase: Phase::Idle,
            scenario: None,
            turn: 0,
            last_action: None,
            complied: false,
            last_relationship: 0.0,
            log: Vec::new(),
            episode_return: 0.0,
            policy,
            scorer: self.scorer.unwrap_or_else(|| Box::new(ActionClassifier::new())),
            sentiment: SentimentAnalyzer,
            dialogue: self.dialogue.unwrap_or_else(|| Box::new(CannedDialogue)),
            speech: self.speech.unwrap_or_else(|| Box::new(SilentSpeech)),
            reactions: self.reactions.unwrap_or_else(|| Box::new(NoReactions)),
            reward,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives conversations for one character at a time. The character is
/// borrowed per call; the engine itself only holds conversation state and
/// collaborators.
pub struct ConversationEngine {
    settings: EngineSettings,
    phase: Phase,
    scenario: Option<ScenarioId>,
    turn: u32,
    last_action: Option<PlayerAction>,
    complied: bool,
    last_relationship: f32,
    log: Vec<TurnRecord>,
    episode_return: f32,
    policy: Policy,
    scorer: Box<dyn TextScorer>,
    sentiment: SentimentAnalyzer,
    dialogue: Box<dyn DialogueProvider>,
    speech: Box<dyn SpeechSink>,
    reactions: Box<dyn ReactionSink>,
    reward: Option<Box<dyn RewardModel>>,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("phase", &self.phase)
            .field("scenario", &self.scenario)
            .field("turn", &self.turn)
            .field("policy", &self.policy)
            .field("reward", &self.reward.is_some())
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    /// Start wiring an engine.
    #[must_use]
    pub fn builder(config: &MoodloopConfig) -> EngineBuilder {
        EngineBuilder {
            config: config.clone(),
            scorer: None,
            dialogue: None,
            speech: None,
            reactions: None,
            learned: None,
            reward: None,
        }
    }

    /// Engine with default collaborators.
    #[must_use]
    pub fn new(config: &MoodloopConfig) -> Self {
        Self::builder(config).build()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// `Idle → Active`. Applies the scenario's situational modifiers and
    /// emits the opening line.
    ///
    /// # Errors
    ///
    /// [`TurnRejected::InProgress`] while a conversation is running,
    /// [`TurnRejected::AlreadyEnded`] until the engine is reset.
    pub fn start(&mut self, character: &mut Character, scenario: ScenarioId) -> Result<Opening, TurnRejected> {
        match self.phase {
            Phase::Idle => {}
            Phase::Active => return Err(TurnRejected::InProgress),
            Phase::Ended(reason) => return Err(TurnRejected::AlreadyEnded(reason)),
        }

        let (tiredness, hunger) = scenario.situation();
        character.state.set_situation(tiredness, hunger);

        self.clear_conversation();
        self.phase = Phase::Active;
        self.scenario = Some(scenario);
        self.last_relationship = character.state.relationship();

        let emotion = character.state.current_emotion();
        let line = self.dialogue.opening_line(scenario, emotion);
        self.speech.speak(SpeechRequest {
            character: character.id,
            text: line.clone(),
            emotion,
            cue: SpeechCue::Opening,
        });

        tracing::info!(character = %character.id, scenario = %scenario, emotion = ?emotion, "conversation started");
        Ok(Opening {
            scenario,
            line,
            emotion,
        })
    }

    /// Process a typed action.
    ///
    /// # Errors
    ///
    /// [`TurnRejected`] unless a conversation is active.
    pub fn handle_action(
        &mut self,
        character: &mut Character,
        action: PlayerAction,
    ) -> Result<TurnOutcome, TurnRejected> {
        self.process_turn(character, action, None)
    }

    /// Process an action given by name. Unknown names are treated as the
    /// neutral default action.
    ///
    /// # Errors
    ///
    /// [`TurnRejected`] unless a conversation is active.
    pub fn handle_action_id(&mut self, character: &mut Character, id: &str) -> Result<TurnOutcome, TurnRejected> {
        let action = id.parse().unwrap_or_else(|_| {
            let fallback = PlayerAction::default();
            tracing::warn!(id, fallback = %fallback, "unknown action id, using default");
            fallback
        });
        self.process_turn(character, action, None)
    }

    /// Classify free text and process it. Its sentiment also shifts the
    /// weight of the memory the turn leaves behind.
    ///
    /// # Errors
    ///
    /// [`TurnRejected`] unless a conversation is active.
    pub fn handle_text(&mut self, character: &mut Character, text: &str) -> Result<TurnOutcome, TurnRejected> {
        self.ensure_active()?;
        let score = self.scorer.score(text);
        let sentiment = self.sentiment.analyze(text);
        tracing::debug!(
            character = %character.id,
            action = %score.action,
            confidence = score.confidence,
            sentiment,
            "classified player text"
        );
        self.process_turn(character, score.action, Some(sentiment))
    }

    /// Force `Active → Ended(Aborted)`. Returns whether anything was aborted.
    /// Nothing is half-written: every memory write completes inside the
    /// call that makes it.
    ///
    /// With a reward model attached, the episode reward for the aborted
    /// conversation (relationship as of the last turn) is added to
    /// [`Self::episode_return`].
    pub fn abort(&mut self) -> bool {
        if self.phase != Phase::Active {
            return false;
        }
        self.phase = Phase::Ended(EndReason::Aborted);
        if let Some(model) = &self.reward {
            self.episode_return += model.episode_reward(&EpisodeSummary {
                turns: self.turn,
                final_relationship: self.last_relationship,
                complied: self.complied,
            });
        }
        tracing::info!(turns = self.turn, episode_return = self.episode_return, "conversation aborted");
        true
    }

    /// Back to `Idle`. Clears turn counters and the conversation log; the
    /// character's memory is kept.
    pub fn reset(&mut self) {
        self.clear_conversation();
        self.phase = Phase::Idle;
        self.scenario = None;
    }

    fn clear_conversation(&mut self) {
        self.turn = 0;
        self.last_action = None;
        self.complied = false;
        self.log.clear();
        self.episode_return = 0.0;
    }

    fn ensure_active(&self) -> Result<ScenarioId, TurnRejected> {
        match (self.phase, self.scenario) {
            (Phase::Active, Some(scenario)) => Ok(scenario),
            (Phase::Ended(reason), _) => Err(TurnRejected::AlreadyEnded(reason)),
            _ => Err(TurnRejected::NotStarted),
        }
    }

    // ------------------------------------------------------------------
    // Turn processing
    // ------------------------------------------------------------------

    fn process_turn(
        &mut self,
        character: &mut Character,
        action: PlayerAction,
        sentiment: Option<f32>,
    ) -> Result<TurnOutcome, TurnRejected> {
        let scenario = self.ensure_active()?;
        self.turn += 1;
        let turn = self.turn;
        let now = character.clock.now();
        let before = character.state.levels();

        // 1. Deltas.
        let d = deltas_for(action);
        let mood_delta = if self.settings.situational_amplification {
            amplify_mood_delta(d.mood, before.tiredness, before.hunger)
        } else {
            d.mood
        };
        character
            .state
            .apply_interaction(d.relationship, mood_delta, d.respect, d.respectful);
        if d.stress != 0.0 {
            character.state.adjust_stress(d.stress);
        }

        // 2. Memory context.
        let recalled = character.memory.relevant_memory(&RecallContext {
            scenario,
            emotion: character.state.current_emotion(),
            now,
        });
        if let Some(r) = &recalled {
            character
                .state
                .nudge_mood(r.memory.emotional_weight * self.settings.memory_mood_influence);
        }

        // 3. Decide.
        let observation =
            ObservationVector::assemble(&character.state, &character.memory, scenario, Some(action), &now);
        let response = self.policy.decide(&character.state, observation.as_slice());
        let emotion = character.state.current_emotion();
        let after = character.state.levels();
        let net_mood = after.mood - before.mood;
        let net_relationship = after.relationship - before.relationship;

        // 4. Remember.
        let pattern_count = character
            .memory
            .pattern(action, scenario)
            .map_or(1, |p| p.count.saturating_add(1));
        let kind = turn_memory_kind(
            action,
            response,
            pattern_count,
            self.settings.repeated_action_threshold,
            net_mood,
        );
        let mut weight = turn_memory_weight(kind, net_mood, net_relationship);
        if let Some(s) = sentiment {
            weight = (weight + SENTIMENT_BLEND * s).clamp(-1.0, 1.0);
        }
        let memory = character.memory.record(
            MemoryDraft {
                kind,
                content: format!("{action} during {scenario}, answered {response} while {emotion:?}"),
                emotional_weight: weight,
                scenario,
                emotion,
                relationship: after.relationship,
            },
            now,
        );
        character.memory.record_pattern(action, scenario, weight);

        // 5. Continue or end.
        self.complied |= response == ResponseKind::Compliant;
        self.last_action = Some(action);
        self.last_relationship = after.relationship;
        let status = if is_terminal(response) {
            TurnStatus::Ended(EndReason::TerminalResponse)
        } else if turn >= self.settings.max_turns {
            TurnStatus::Ended(EndReason::MaxTurns)
        } else {
            TurnStatus::Continue
        };
        let ended = match status {
            TurnStatus::Ended(reason) => Some(reason),
            TurnStatus::Continue => None,
        };

        let reward = self.reward.as_ref().map(|model| {
            let mut r = model.step_reward(&Transition {
                turn,
                action,
                response,
                emotion,
                mood: after.mood,
                mood_delta: net_mood,
                relationship_delta: net_relationship,
            });
            if ended.is_some() {
                r += model.episode_reward(&EpisodeSummary {
                    turns: turn,
                    final_relationship: after.relationship,
                    complied: self.complied,
                });
            }
            r
        });
        if let Some(r) = reward {
            self.episode_return += r;
        }

        self.log.push(TurnRecord {
            turn,
            scenario,
            at: now,
            action,
            response,
            emotion,
            mood_delta: net_mood,
            relationship_delta: net_relationship,
            memory,
        });

        let line = self.dialogue.response_line(scenario, response, emotion);
        self.speech.speak(SpeechRequest {
            character: character.id,
            text: line.clone(),
            emotion,
            cue: SpeechCue::Reply,
        });
        self.reactions.react(&Reaction {
            character: character.id,
            turn,
            response,
            emotion,
            ended,
        });

        tracing::debug!(
            character = %character.id,
            turn,
            action = %action,
            response = ?response,
            emotion = ?emotion,
            mood = after.mood,
            recalled = recalled.as_ref().map(|r| r.memory.id.0),
            memory_kind = %kind,
            "turn processed"
        );

        if let Some(reason) = ended {
            self.phase = Phase::Ended(reason);
            tracing::info!(
                character = %character.id,
                turns = turn,
                reason = ?reason,
                complied = self.complied,
                episode_return = self.episode_return,
                "conversation ended"
            );
        }

        Ok(TurnOutcome {
            turn,
            action,
            response,
            emotion,
            line,
            recalled,
            status,
            reward,
        })
    }

    // ------------------------------------------------------------------
    // Promises
    // ------------------------------------------------------------------

    /// Remember a promise the player made.
    pub fn make_promise(&mut self, character: &mut Character, content: impl Into<String>) -> MemoryId {
        let scenario = self.scenario.unwrap_or_default();
        let id = character.memory.record(
            MemoryDraft {
                kind: MemoryKind::Promise,
                content: content.into(),
                emotional_weight: PROMISE_WEIGHT,
                scenario,
                emotion: character.state.current_emotion(),
                relationship: character.state.relationship(),
            },
            character.clock.now(),
        );
        tracing::debug!(character = %character.id, memory = %id, "promise recorded");
        id
    }

    /// Remember a broken promise. Close relationships turn it into a
    /// betrayal, which costs more trust and relationship.
    pub fn break_promise(&mut self, character: &mut Character, content: impl Into<String>) -> MemoryId {
        let scenario = self.scenario.unwrap_or_default();
        let cost = broken_promise_cost(character.state.relationship());
        character.state.adjust_trust(cost.trust);
        character.state.adjust_relationship(cost.relationship);
        let id = character.memory.record(
            MemoryDraft {
                kind: cost.kind,
                content: content.into(),
                emotional_weight: cost.weight,
                scenario,
                emotion: character.state.current_emotion(),
                relationship: character.state.relationship(),
            },
            character.clock.now(),
        );
        tracing::info!(character = %character.id, memory = %id, kind = %cost.kind, "promise broken");
        id
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether turns are being accepted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Active (or just ended) scenario.
    #[must_use]
    pub fn scenario(&self) -> Option<ScenarioId> {
        self.scenario
    }

    /// Turns processed in the current conversation.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// Action of the latest turn.
    #[must_use]
    pub fn last_action(&self) -> Option<PlayerAction> {
        self.last_action
    }

    /// Per-conversation log.
    #[must_use]
    pub fn log(&self) -> &[TurnRecord] {
        &self.log
    }

    /// Sum of rewards handed out this conversation.
    #[must_use]
    pub fn episode_return(&self) -> f32 {
        self.episode_return
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::emotion::{EmotionLevels, EmotionTuning, EmotionalState};

    fn character_with(levels: EmotionLevels) -> Character {
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        c.state = EmotionalState::new(levels, EmotionTuning::default());
        c
    }

    #[derive(Clone, Default)]
    struct Recorder {
        speech: Arc<Mutex<Vec<SpeechRequest>>>,
        reactions: Arc<Mutex<Vec<Reaction>>>,
    }

    impl SpeechSink for Recorder {
        fn speak(&self, request: SpeechRequest) {
            self.speech.lock().push(request);
        }
    }

    impl ReactionSink for Recorder {
        fn react(&self, reaction: &Reaction) {
            self.reactions.lock().push(*reaction);
        }
    }

    #[test]
    fn turns_before_start_are_rejected() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        assert_eq!(
            engine.handle_action(&mut c, PlayerAction::Listen),
            Err(TurnRejected::NotStarted)
        );
        assert!(c.memory.is_empty());
    }

    #[test]
    fn start_applies_situation_and_speaks() {
        let recorder = Recorder::default();
        let mut engine = ConversationEngine::builder(&MoodloopConfig::default())
            .speech(recorder.clone())
            .build();
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        let opening = engine.start(&mut c, ScenarioId::FamilyDinner).expect("start");
        assert_eq!(opening.scenario, ScenarioId::FamilyDinner);
        assert_eq!(c.state.hunger(), 70.0);
        assert_eq!(engine.start(&mut c, ScenarioId::Bedtime), Err(TurnRejected::InProgress));
        let spoken = recorder.speech.lock();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].cue, SpeechCue::Opening);
    }

    #[test]
    fn max_turns_ends_the_conversation() {
        let mut config = MoodloopConfig::default();
        config.conversation.max_turns = 2;
        let mut engine = ConversationEngine::new(&config);
        // Neutral, low-trust character answers Dismissive to Logical.
        let mut c = character_with(EmotionLevels {
            trust: 20.0,
            ..EmotionLevels::default()
        });
        engine.start(&mut c, ScenarioId::ScreenTime).expect("start");
        let first = engine.handle_action(&mut c, PlayerAction::Logical).expect("turn 1");
        assert_eq!(first.status, TurnStatus::Continue);
        let second = engine.handle_action(&mut c, PlayerAction::Logical).expect("turn 2");
        assert_eq!(second.status, TurnStatus::Ended(EndReason::MaxTurns));
        assert_eq!(
            engine.handle_action(&mut c, PlayerAction::Logical),
            Err(TurnRejected::AlreadyEnded(EndReason::MaxTurns))
        );
        assert_eq!(engine.log().len(), 2);
    }

    #[test]
    fn reset_keeps_memory() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        engine.start(&mut c, ScenarioId::CleanRoom).expect("start");
        engine.handle_action(&mut c, PlayerAction::Humor).expect("turn");
        assert!(engine.abort());
        assert_eq!(engine.phase(), Phase::Ended(EndReason::Aborted));
        assert!(!engine.abort());

        engine.reset();
        assert_eq!(engine.phase(), Phase::Idle);
        assert_eq!(engine.turn(), 0);
        assert!(engine.log().is_empty());
        assert_eq!(c.memory.len(), 1);
        assert!(c.memory.pattern(PlayerAction::Humor, ScenarioId::CleanRoom).is_some());
    }

    #[test]
    fn unknown_action_id_uses_default_deltas() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        engine.start(&mut c, ScenarioId::DoHomework).expect("start");
        let outcome = engine.handle_action_id(&mut c, "interpretive dance").expect("turn");
        assert_eq!(outcome.action, PlayerAction::Logical);
        assert_eq!(c.state.relationship(), 2.0);
    }

    #[test]
    fn repeated_actions_are_remembered_as_such() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        engine.start(&mut c, ScenarioId::CleanRoom).expect("start");
        let kinds: Vec<MemoryKind> = (0..3)
            .map(|_| {
                let outcome = engine.handle_action(&mut c, PlayerAction::Bribe).expect("turn");
                assert!(!outcome.ended());
                let last = engine.log().last().map(|r| r.memory).expect("logged");
                c.memory.get(last).map(|m| m.kind).expect("stored")
            })
            .collect();
        assert_eq!(kinds, vec![MemoryKind::Reward, MemoryKind::Reward, MemoryKind::RepeatedAction]);
    }

    #[test]
    fn reactions_and_rewards_flow_out() {
        let recorder = Recorder::default();
        let mut config = MoodloopConfig::default();
        config.reward.enabled = true;
        let mut engine = ConversationEngine::builder(&config)
            .reactions(recorder.clone())
            .build();
        let mut c = character_with(EmotionLevels {
            relationship: 60.0,
            mood: 50.0,
            trust: 60.0,
            ..EmotionLevels::default()
        });
        engine.start(&mut c, ScenarioId::GoToSchool).expect("start");
        let outcome = engine.handle_action(&mut c, PlayerAction::Listen).expect("turn");
        assert_eq!(outcome.response, ResponseKind::Compliant);
        // Consistent step (0.1) + compliance (1.0) + positive relationship (0.5).
        assert!(outcome.reward.is_some_and(|r| (r - 1.6).abs() < 1e-5));
        assert!((engine.episode_return() - 1.6).abs() < 1e-5);

        let reactions = recorder.reactions.lock();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].ended, Some(EndReason::TerminalResponse));
    }

    #[test]
    fn text_is_classified_and_sentiment_shifts_weight() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = Character::new("Maya", &MoodloopConfig::default());
        engine.start(&mut c, ScenarioId::Bedtime).expect("start");
        let outcome = engine
            .handle_text(&mut c, "How do you feel about bedtime? Tell me, I love you.")
            .expect("turn");
        assert_eq!(outcome.action, PlayerAction::Listen);
        let record = engine.log()[0];
        let weight = c.memory.get(record.memory).map(|m| m.emotional_weight).expect("stored");
        let unshifted = turn_memory_weight(MemoryKind::PositiveMoment, record.mood_delta, record.relationship_delta);
        assert!(weight > unshifted);
    }

    #[test]
    fn log_records_scenario_and_sim_time() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = character_with(EmotionLevels {
            trust: 20.0,
            ..EmotionLevels::default()
        });
        c.tick(1.5);
        engine.start(&mut c, ScenarioId::ScreenTime).expect("start");
        engine.handle_action(&mut c, PlayerAction::Logical).expect("turn 1");
        c.tick(2.0);
        engine.handle_action(&mut c, PlayerAction::Logical).expect("turn 2");

        let log = engine.log();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|r| r.scenario == ScenarioId::ScreenTime));
        assert_eq!(log[0].at.millis, 1_500);
        assert_eq!(log[1].at.millis, 3_500);
    }

    struct RelationshipReward;

    impl RewardModel for RelationshipReward {
        fn step_reward(&self, _transition: &Transition) -> f32 {
            0.0
        }

        fn episode_reward(&self, summary: &EpisodeSummary) -> f32 {
            summary.final_relationship * 10.0 + summary.turns as f32
        }
    }

    #[test]
    fn aborted_conversations_still_get_an_episode_reward() {
        let mut engine = ConversationEngine::builder(&MoodloopConfig::default())
            .reward_model(RelationshipReward)
            .build();
        let mut c = character_with(EmotionLevels {
            trust: 20.0,
            ..EmotionLevels::default()
        });
        engine.start(&mut c, ScenarioId::ScreenTime).expect("start");
        let outcome = engine.handle_action(&mut c, PlayerAction::Logical).expect("turn");
        assert_eq!(outcome.status, TurnStatus::Continue);
        assert_eq!(outcome.reward, Some(0.0));

        assert!(engine.abort());
        // Relationship 2.0 after one Logical turn, one turn played.
        assert!((engine.episode_return() - 21.0).abs() < 1e-5);
        assert!(!engine.abort());
        assert!((engine.episode_return() - 21.0).abs() < 1e-5);
    }

    #[test]
    fn broken_promises_cost_more_when_close() {
        let mut engine = ConversationEngine::new(&MoodloopConfig::default());
        let mut c = character_with(EmotionLevels {
            relationship: 50.0,
            trust: 60.0,
            ..EmotionLevels::default()
        });
        engine.make_promise(&mut c, "We'll go to the park on Saturday");
        let id = engine.break_promise(&mut c, "Skipped the park");
        assert_eq!(c.memory.get(id).map(|m| m.kind), Some(MemoryKind::Betrayal));
        assert_eq!(c.state.trust(), 40.0);
        assert_eq!(c.state.relationship(), 35.0);
    }
}
