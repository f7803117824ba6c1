//! UI / animation events produced by a session.
//!
//! The engine reports each turn through the core `ReactionSink` trait. An
//! [`EventBuffer`] collects those reports (plus emotion changes seen on
//! decay ticks) so the render loop can drain them once per frame without
//! ever touching the simulation lock.

use std::sync::Arc;

use moodloop_core::collaborators::{Reaction, ReactionSink};
use moodloop_core::engine::EndReason;
use moodloop_core::{CharacterId, Emotion, ResponseKind};
use parking_lot::Mutex;

/// Something the UI may want to show.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// The character answered a turn.
    Reaction {
        /// Who reacted.
        character: CharacterId,
        /// Turn number.
        turn: u32,
        /// Chosen response.
        response: ResponseKind,
        /// Emotion after the turn.
        emotion: Emotion,
        /// Animation to play.
        animation: &'static str,
    },
    /// The conversation finished.
    ConversationEnded {
        /// Whose conversation.
        character: CharacterId,
        /// Why it ended.
        reason: EndReason,
        /// Turns taken.
        turns: u32,
    },
    /// Emotion drifted between conversations (decay).
    EmotionChanged {
        /// Whose emotion.
        character: CharacterId,
        /// Previous emotion.
        from: Emotion,
        /// New emotion.
        to: Emotion,
    },
}

/// Animation trigger for a response.
#[must_use]
pub fn animation_trigger(response: ResponseKind) -> &'static str {
    match response {
        ResponseKind::Compliant => "nod",
        ResponseKind::NegotiateCalm => "shrug",
        ResponseKind::Sarcastic => "eye_roll",
        ResponseKind::Angry => "stomp",
        ResponseKind::Dismissive => "look_away",
        ResponseKind::EmotionalPlead => "plead",
        ResponseKind::Defiant => "cross_arms",
        ResponseKind::ReasonableRefusal => "head_shake",
    }
}

/// Shared, clonable event list.
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    events: Arc<Mutex<Vec<HostEvent>>>,
}

impl EventBuffer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: HostEvent) {
        self.events.lock().push(event);
    }

    /// Take every buffered event, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<HostEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Buffered event count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl ReactionSink for EventBuffer {
    fn react(&self, reaction: &Reaction) {
        let mut events = self.events.lock();
        events.push(HostEvent::Reaction {
            character: reaction.character,
            turn: reaction.turn,
            response: reaction.response,
            emotion: reaction.emotion,
            animation: animation_trigger(reaction.response),
        });
        if let Some(reason) = reaction.ended {
            events.push(HostEvent::ConversationEnded {
                character: reaction.character,
                reason,
                turns: reaction.turn,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_reaction_also_reports_the_end() {
        let buffer = EventBuffer::new();
        let character = CharacterId::new();
        let sink = buffer.clone();
        sink.react(&Reaction {
            character,
            turn: 1,
            response: ResponseKind::Sarcastic,
            emotion: Emotion::Annoyed,
            ended: None,
        });
        sink.react(&Reaction {
            character,
            turn: 2,
            response: ResponseKind::Angry,
            emotion: Emotion::Angry,
            ended: Some(EndReason::TerminalResponse),
        });

        let events = buffer.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], HostEvent::Reaction { animation: "eye_roll", .. }));
        assert_eq!(
            events[2],
            HostEvent::ConversationEnded {
                character,
                reason: EndReason::TerminalResponse,
                turns: 2
            }
        );
        assert!(buffer.is_empty());
    }

    #[test]
    fn every_response_has_a_distinct_animation() {
        let mut names: Vec<_> = ResponseKind::ALL.iter().map(|r| animation_trigger(*r)).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ResponseKind::ALL.len());
    }
}
