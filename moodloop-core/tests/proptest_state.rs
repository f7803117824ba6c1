//! Property-Based Tests for Moodloop Core
//!
//! Uses `proptest` to check the simulation's invariants under random
//! inputs: emotional levels stay in range, the memory store stays within
//! its capacities, and classification is deterministic.

use proptest::prelude::*;

use moodloop_core::classifier::ActionClassifier;
use moodloop_core::config::{EmotionConfig, MemoryConfig, MoodloopConfig};
use moodloop_core::emotion::EmotionalState;
use moodloop_core::memory::MemoryStore;
use moodloop_core::memory::record::{MemoryDraft, MemoryKind};
use moodloop_core::memory::scoring::RecallContext;
use moodloop_core::observation::{OBSERVATION_LEN, ObservationVector};
use moodloop_core::sentiment::SentimentAnalyzer;
use moodloop_core::{Character, ConversationEngine, Emotion, PlayerAction, ScenarioId, SimTimestamp};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_action() -> impl Strategy<Value = PlayerAction> {
    (0..PlayerAction::ALL.len()).prop_map(|i| PlayerAction::ALL[i])
}

fn arb_scenario() -> impl Strategy<Value = ScenarioId> {
    (0..ScenarioId::ALL.len()).prop_map(|i| ScenarioId::ALL[i])
}

fn arb_delta() -> impl Strategy<Value = f32> {
    prop_oneof![
        -500.0..500.0f32,
        Just(f32::NAN),
        Just(f32::INFINITY),
        Just(f32::NEG_INFINITY),
    ]
}

fn assert_in_range(state: &EmotionalState) -> Result<(), TestCaseError> {
    let l = state.levels();
    for signed in [l.relationship, l.mood] {
        prop_assert!((-100.0..=100.0).contains(&signed), "signed level {signed}");
    }
    for unsigned in [l.trust, l.stress, l.autonomy_need, l.respect_received, l.tiredness, l.hunger] {
        prop_assert!((0.0..=100.0).contains(&unsigned), "unsigned level {unsigned}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Property: every level stays clamped whatever is thrown at it
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn levels_stay_clamped(
        steps in prop::collection::vec((arb_delta(), arb_delta(), arb_delta(), any::<bool>(), arb_delta()), 1..60),
        dt in -10.0..1_000.0f32,
    ) {
        let mut state = EmotionalState::from_config(&EmotionConfig::default());
        for (rel, mood, respect, respectful, stress) in steps {
            state.apply_interaction(rel, mood, respect, respectful);
            state.adjust_stress(stress);
            state.nudge_mood(mood);
            assert_in_range(&state)?;
        }
        state.decay(dt);
        assert_in_range(&state)?;
    }
}

// ---------------------------------------------------------------------------
// Property: the store never exceeds its capacities
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn store_respects_capacities(
        weights in prop::collection::vec(-1.5..1.5f32, 1..200),
        short in 1..10usize,
        long in 0..10usize,
    ) {
        let config = MemoryConfig {
            short_term_capacity: short,
            long_term_capacity: long,
            ..MemoryConfig::default()
        };
        let mut store = MemoryStore::new(config);
        for (i, weight) in weights.iter().enumerate() {
            store.record(
                MemoryDraft {
                    kind: MemoryKind::Conversation,
                    content: format!("turn {i}"),
                    emotional_weight: *weight,
                    scenario: ScenarioId::Bedtime,
                    emotion: Emotion::Neutral,
                    relationship: 0.0,
                },
                SimTimestamp::now(i as u64 * 1_000),
            );
            let context = RecallContext {
                scenario: ScenarioId::Bedtime,
                emotion: Emotion::Neutral,
                now: SimTimestamp::now(i as u64 * 1_000),
            };
            let _ = store.relevant_memory(&context);
            prop_assert!(store.short_term_len() <= short);
            prop_assert!(store.long_term_len() <= long);
            prop_assert_eq!(store.len(), store.short_term_len() + store.long_term_len());
        }
        for memory in store.short_term().chain(store.long_term()) {
            prop_assert!((-1.0..=1.0).contains(&memory.emotional_weight));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: classification and sentiment are pure functions of the text
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn classification_is_deterministic(text in "[a-zA-Z !?,.']{0,80}") {
        let classifier = ActionClassifier::new();
        let first = classifier.classify(&text);
        let second = classifier.classify(&text);
        prop_assert_eq!(first.action, second.action);
        prop_assert_eq!(first.scores, second.scores);
        prop_assert!(first.confidence >= 0.0);

        let sentiment = SentimentAnalyzer.analyze(&text);
        prop_assert!((-1.0..=1.0).contains(&sentiment));
        prop_assert_eq!(sentiment, SentimentAnalyzer.analyze(&text));
    }
}

// ---------------------------------------------------------------------------
// Property: conversations always terminate within the turn cap and the
// observation vector stays finite
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn conversations_end_within_max_turns(
        actions in prop::collection::vec(arb_action(), 1..30),
        scenario in arb_scenario(),
    ) {
        let config = MoodloopConfig::default();
        let max_turns = config.conversation.max_turns;
        let mut character = Character::new("Maya", &config);
        let mut engine = ConversationEngine::new(&config);
        engine.start(&mut character, scenario).expect("start");

        let mut turns = 0;
        for action in actions {
            match engine.handle_action(&mut character, action) {
                Ok(outcome) => {
                    turns += 1;
                    prop_assert_eq!(outcome.turn, turns);
                    let observation = ObservationVector::assemble(
                        &character.state,
                        &character.memory,
                        scenario,
                        Some(action),
                        &character.clock.now(),
                    );
                    prop_assert_eq!(observation.as_slice().len(), OBSERVATION_LEN);
                    prop_assert!(observation.as_slice().iter().all(|v| v.is_finite()));
                }
                Err(_) => prop_assert!(!engine.is_active()),
            }
            assert_in_range(&character.state)?;
        }
        prop_assert!(turns <= max_turns);
    }
}
