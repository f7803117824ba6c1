//! Response policy — how the character answers.
//!
//! The rule cascade is the default. A learned policy can be plugged in as a
//! black box over the observation vector; whenever it has no answer the
//! cascade decides instead.

use crate::config::{PolicyConfig, PolicyMode};
use crate::emotion::EmotionalState;
use crate::types::ResponseKind;

/// Externally trained policy: observation vector in, response index out.
pub trait LearnedPolicy: Send {
    /// Pick a response index (see [`ResponseKind::index`]). `None` means the
    /// policy can't decide right now.
    fn decide(&self, observation: &[f32]) -> Option<usize>;
}

impl<F> LearnedPolicy for F
where
    F: Fn(&[f32]) -> Option<usize> + Send,
{
    fn decide(&self, observation: &[f32]) -> Option<usize> {
        self(observation)
    }
}

/// Which decision procedure picks responses.
#[derive(Default)]
pub enum Policy {
    /// Deterministic rule cascade.
    #[default]
    RuleBased,
    /// Learned policy with rule fallback.
    Learned(Box<dyn LearnedPolicy>),
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RuleBased => f.write_str("RuleBased"),
            Self::Learned(_) => f.write_str("Learned(..)"),
        }
    }
}

impl Policy {
    /// Build from configuration. Asking for a learned policy without
    /// supplying one falls back to the rules.
    #[must_use]
    pub fn from_config(config: &PolicyConfig, learned: Option<Box<dyn LearnedPolicy>>) -> Self {
        match (config.mode, learned) {
            (PolicyMode::Learned, Some(policy)) => Self::Learned(policy),
            (PolicyMode::Learned, None) => {
                tracing::warn!("learned policy requested but none supplied, using rules");
                Self::RuleBased
            }
            (PolicyMode::RuleBased, Some(_)) => {
                tracing::debug!("learned policy supplied but mode is rule_based, ignoring it");
                Self::RuleBased
            }
            (PolicyMode::RuleBased, None) => Self::RuleBased,
        }
    }

    /// Choose a response. `observation` is only consulted by a learned
    /// policy; an unavailable or out-of-range answer falls back to the rules.
    #[must_use]
    pub fn decide(&self, state: &EmotionalState, observation: &[f32]) -> ResponseKind {
        match self {
            Self::RuleBased => rule_based_response(state),
            Self::Learned(policy) => match policy.decide(observation) {
                Some(index) => ResponseKind::from_index(index).unwrap_or_else(|| {
                    tracing::warn!(index, "learned policy index out of range, using rules");
                    rule_based_response(state)
                }),
                None => {
                    tracing::warn!("learned policy unavailable, using rules");
                    rule_based_response(state)
                }
            },
        }
    }

    /// Whether this is the learned variant.
    #[must_use]
    pub fn is_learned(&self) -> bool {
        matches!(self, Self::Learned(_))
    }
}

/// The rule cascade. Evaluated in strict order, first match wins.
#[must_use]
pub fn rule_based_response(state: &EmotionalState) -> ResponseKind {
    let mood = state.mood();
    if mood > 30.0 && state.relationship() > 20.0 {
        ResponseKind::Compliant
    } else if mood < -40.0 {
        ResponseKind::Angry
    } else if state.respect_received() < 40.0 && state.autonomy_need() > 70.0 {
        ResponseKind::Defiant
    } else if mood < -20.0 {
        ResponseKind::Sarcastic
    } else if state.trust() > 50.0 && mood > 0.0 {
        ResponseKind::NegotiateCalm
    } else if mood < -10.0 {
        ResponseKind::EmotionalPlead
    } else if state.trust() > 40.0 {
        ResponseKind::ReasonableRefusal
    } else {
        ResponseKind::Dismissive
    }
}

/// Compliant, Angry and Defiant end the conversation.
#[must_use]
pub fn is_terminal(response: ResponseKind) -> bool {
    matches!(
        response,
        ResponseKind::Compliant | ResponseKind::Angry | ResponseKind::Defiant
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::{EmotionLevels, EmotionTuning};

    fn state(relationship: f32, mood: f32, trust: f32, respect: f32, autonomy: f32) -> EmotionalState {
        EmotionalState::new(
            EmotionLevels {
                relationship,
                mood,
                trust,
                stress: 30.0,
                autonomy_need: autonomy,
                respect_received: respect,
                tiredness: 0.0,
                hunger: 0.0,
            },
            EmotionTuning::default(),
        )
    }

    #[test]
    fn cascade_order() {
        let cases = [
            (state(21.0, 31.0, 0.0, 0.0, 100.0), ResponseKind::Compliant),
            (state(20.0, 31.0, 60.0, 50.0, 50.0), ResponseKind::NegotiateCalm),
            (state(50.0, -41.0, 90.0, 10.0, 90.0), ResponseKind::Angry),
            (state(0.0, -30.0, 90.0, 39.0, 71.0), ResponseKind::Defiant),
            (state(0.0, -30.0, 90.0, 40.0, 71.0), ResponseKind::Sarcastic),
            (state(0.0, 10.0, 51.0, 50.0, 50.0), ResponseKind::NegotiateCalm),
            (state(0.0, -15.0, 90.0, 50.0, 50.0), ResponseKind::EmotionalPlead),
            (state(0.0, 0.0, 41.0, 50.0, 50.0), ResponseKind::ReasonableRefusal),
            (state(0.0, 0.0, 40.0, 50.0, 50.0), ResponseKind::Dismissive),
        ];
        for (s, expected) in cases {
            assert_eq!(rule_based_response(&s), expected, "{:?}", s.levels());
        }
    }

    #[test]
    fn terminal_responses() {
        let terminal: Vec<_> = ResponseKind::ALL.into_iter().filter(|r| is_terminal(*r)).collect();
        assert_eq!(
            terminal,
            vec![ResponseKind::Compliant, ResponseKind::Angry, ResponseKind::Defiant]
        );
    }

    #[test]
    fn learned_policy_is_used_when_it_answers() {
        let policy = Policy::from_config(
            &PolicyConfig { mode: PolicyMode::Learned },
            Some(Box::new(|_: &[f32]| Some(ResponseKind::Sarcastic.index()))),
        );
        assert!(policy.is_learned());
        let s = state(0.0, 0.0, 40.0, 50.0, 50.0);
        assert_eq!(policy.decide(&s, &[0.0; 4]), ResponseKind::Sarcastic);
    }

    #[test]
    fn learned_policy_falls_back_to_rules() {
        let s = state(0.0, 0.0, 40.0, 50.0, 50.0);
        let silent = Policy::Learned(Box::new(|_: &[f32]| -> Option<usize> { None }));
        let wild = Policy::Learned(Box::new(|_: &[f32]| -> Option<usize> { Some(99) }));
        assert_eq!(silent.decide(&s, &[]), ResponseKind::Dismissive);
        assert_eq!(wild.decide(&s, &[]), ResponseKind::Dismissive);
    }

    #[test]
    fn learned_mode_without_policy_uses_rules() {
        let policy = Policy::from_config(&PolicyConfig { mode: PolicyMode::Learned }, None);
        assert!(!policy.is_learned());
    }
}
