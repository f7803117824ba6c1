//! moodloop Benchmark Suite
//!
//! Per-turn targets:
//!   classify_free_text ............... < 20μs
//!   relevant_memory_full_store ....... < 50μs
//!   full_turn_with_recall ............ < 100μs
//!   decay_tick_100_characters ........ < 20μs

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use moodloop_core::classifier::ActionClassifier;
use moodloop_core::memory::record::{MemoryDraft, MemoryKind};
use moodloop_core::memory::scoring::RecallContext;
use moodloop_core::{
    Character, ConversationEngine, Emotion, MemoryStore, MoodloopConfig, PlayerAction, ScenarioId, SimTimestamp,
};

const LINES: [&str; 4] = [
    "Go to bed right now, I'm not asking again!",
    "I understand you're upset, can we talk about it?",
    "If you finish your homework we can get pizza tonight",
    "Whatever, do what you want",
];

fn full_store(config: &MoodloopConfig) -> MemoryStore {
    let mut store = MemoryStore::new(config.memory.clone());
    let capacity = config.memory.short_term_capacity + config.memory.long_term_capacity;
    for i in 0..capacity * 2 {
        let scenario = ScenarioId::ALL[i % ScenarioId::ALL.len()];
        let weight = (i as f32 / capacity as f32) - 1.0;
        store.record(
            MemoryDraft {
                kind: if i % 3 == 0 { MemoryKind::EmotionalOutburst } else { MemoryKind::Conversation },
                content: format!("Exchange number {i} about {scenario}"),
                emotional_weight: weight,
                scenario,
                emotion: Emotion::Neutral,
                relationship: 0.0,
            },
            SimTimestamp::now(i as u64 * 60_000),
        );
    }
    store
}

/// Benchmark: keyword classification of one utterance (target: < 20μs).
fn bench_classify(c: &mut Criterion) {
    let classifier = ActionClassifier::new();
    c.bench_function("classify_free_text", |b| {
        b.iter(|| {
            for line in LINES {
                black_box(classifier.classify(black_box(line)));
            }
        });
    });
}

/// Benchmark: best memory out of a full short- and long-term store (target: < 50μs).
fn bench_relevant_memory(c: &mut Criterion) {
    let config = MoodloopConfig::default();
    let store = full_store(&config);
    let context = RecallContext {
        scenario: ScenarioId::Bedtime,
        emotion: Emotion::Annoyed,
        now: SimTimestamp::now(10_000_000),
    };

    c.bench_function("relevant_memory_full_store", |b| {
        b.iter_batched(
            || store.clone(),
            |mut store| black_box(store.relevant_memory(black_box(&context))),
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: one complete turn against a character with a full memory (target: < 100μs).
fn bench_full_turn(c: &mut Criterion) {
    let config = MoodloopConfig::default();
    let mut character = Character::new("Bench", &config);
    character.memory = full_store(&config);

    c.bench_function("full_turn_with_recall", |b| {
        b.iter_batched(
            || {
                let mut character = character.clone();
                let mut engine = ConversationEngine::new(&config);
                let _ = engine.start(&mut character, ScenarioId::CleanRoom);
                (engine, character)
            },
            |(mut engine, mut character)| {
                black_box(engine.handle_action(&mut character, black_box(PlayerAction::Logical)))
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmark: decay tick over 100 idle characters (target: < 20μs).
fn bench_decay_tick(c: &mut Criterion) {
    let config = MoodloopConfig::default();
    let mut characters: Vec<_> = (0..100).map(|i| Character::new(format!("c{i}"), &config)).collect();

    c.bench_function("decay_tick_100_characters", |b| {
        b.iter(|| {
            for character in &mut characters {
                character.tick(black_box(0.1));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_relevant_memory,
    bench_full_turn,
    bench_decay_tick,
);
criterion_main!(benches);
