//! Narrow interfaces to the world outside the simulation.
//!
//! The engine hands out decisions and never waits on any of these: dialogue
//! wording, speech synthesis and animation all happen elsewhere. Each trait
//! has a no-op or canned default so an engine works with nothing attached.

use crate::engine::EndReason;
use crate::types::{CharacterId, Emotion, ResponseKind, ScenarioId};

// ---------------------------------------------------------------------------
// Dialogue
// ---------------------------------------------------------------------------

/// Turns `(scenario, category, emotion)` into display text.
pub trait DialogueProvider: Send {
    /// Line the character opens a scenario with.
    fn opening_line(&mut self, scenario: ScenarioId, emotion: Emotion) -> String;

    /// Line for a chosen response.
    fn response_line(&mut self, scenario: ScenarioId, response: ResponseKind, emotion: Emotion) -> String;
}

/// One fixed line per scenario and per response.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedDialogue;

impl DialogueProvider for CannedDialogue {
    fn opening_line(&mut self, scenario: ScenarioId, _emotion: Emotion) -> String {
        match scenario {
            ScenarioId::GoToSchool => "Do I really have to go to school today?",
            ScenarioId::CleanRoom => "My room is fine the way it is.",
            ScenarioId::DoHomework => "I'll do my homework later.",
            ScenarioId::Bedtime => "Five more minutes, please?",
            ScenarioId::ScreenTime => "I'm almost done with this level.",
            ScenarioId::FamilyDinner => "I'm not hungry.",
        }
        .to_string()
    }

    fn response_line(&mut self, _scenario: ScenarioId, response: ResponseKind, _emotion: Emotion) -> String {
        match response {
            ResponseKind::Compliant => "Okay, fine. I'll do it.",
            ResponseKind::NegotiateCalm => "Can we meet in the middle?",
            ResponseKind::Sarcastic => "Oh, great. Wonderful idea.",
            ResponseKind::Angry => "Leave me alone!",
            ResponseKind::Dismissive => "Whatever.",
            ResponseKind::EmotionalPlead => "Please, just this once?",
            ResponseKind::Defiant => "No. You can't make me.",
            ResponseKind::ReasonableRefusal => "I hear you, but I don't think that's fair.",
        }
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// What a line of speech is for. Lets a speech backend prioritise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpeechCue {
    /// Ambient reaction outside a conversation.
    Reaction,
    /// Opening line of a scenario.
    Opening,
    /// Reply to a player turn.
    Reply,
}

/// Fire-and-forget speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Who is speaking.
    pub character: CharacterId,
    /// What to say.
    pub text: String,
    /// Emotion to say it with.
    pub emotion: Emotion,
    /// Why it is being said.
    pub cue: SpeechCue,
}

/// Receives speech requests. Must return without waiting on synthesis.
pub trait SpeechSink: Send {
    /// Queue `request`.
    fn speak(&self, request: SpeechRequest);
}

/// Drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechSink for SilentSpeech {
    fn speak(&self, _request: SpeechRequest) {}
}

// ---------------------------------------------------------------------------
// Reactions (UI / animation triggers)
// ---------------------------------------------------------------------------

/// A visible reaction to one player turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reaction {
    /// Who reacted.
    pub character: CharacterId,
    /// Turn number (1-based).
    pub turn: u32,
    /// Chosen response.
    pub response: ResponseKind,
    /// Emotion after the turn.
    pub emotion: Emotion,
    /// Set on the turn that ended the conversation.
    pub ended: Option<EndReason>,
}

/// Receives reactions for rendering. Must not block.
pub trait ReactionSink: Send {
    /// Handle one reaction.
    fn react(&self, reaction: &Reaction);
}

/// Ignores every reaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReactions;

impl ReactionSink for NoReactions {
    fn react(&self, _reaction: &Reaction) {}
}
