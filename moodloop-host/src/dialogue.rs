//! Template dialogue with seeded wording variation.
//!
//! The engine decides *what kind* of thing the character says; this
//! provider decides the words. Each scenario has a few openings and each
//! response category a few lines, picked by a seeded RNG so a session can
//! be replayed word for word.

use moodloop_core::collaborators::DialogueProvider;
use moodloop_core::{Emotion, ResponseKind, ScenarioId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn openings(scenario: ScenarioId) -> &'static [&'static str] {
    match scenario {
        ScenarioId::GoToSchool => &[
            "Do I really have to go to school today?",
            "My stomach kind of hurts. Maybe I should stay home.",
            "Nobody else has to go this early.",
        ],
        ScenarioId::CleanRoom => &[
            "My room is fine the way it is.",
            "I know where everything is. It's organised chaos.",
            "Why does it matter if nobody goes in there?",
        ],
        ScenarioId::DoHomework => &[
            "I'll do my homework later.",
            "It's not even due until Friday.",
            "I already did most of it at school. Sort of.",
        ],
        ScenarioId::Bedtime => &[
            "Five more minutes, please?",
            "I'm not even tired.",
            "Everyone in my class stays up later than me.",
        ],
        ScenarioId::ScreenTime => &[
            "I'm almost done with this level.",
            "I can't pause, it's online!",
            "Just one more episode?",
        ],
        ScenarioId::FamilyDinner => &[
            "I'm not hungry.",
            "Can I eat in my room tonight?",
            "Do I have to sit at the table?",
        ],
    }
}

fn replies(response: ResponseKind) -> &'static [&'static str] {
    match response {
        ResponseKind::Compliant => &[
            "Okay, fine. I'll do it.",
            "Alright. You win this one.",
            "Fine, I'm going.",
        ],
        ResponseKind::NegotiateCalm => &[
            "Can we meet in the middle?",
            "What if I do half now and half later?",
            "Okay, but can I have something in return?",
        ],
        ResponseKind::Sarcastic => &[
            "Oh, great. Wonderful idea.",
            "Wow. Best day ever.",
            "Sure, because that always works.",
        ],
        ResponseKind::Angry => &[
            "Leave me alone!",
            "You never listen to me!",
            "This is so unfair!",
        ],
        ResponseKind::Dismissive => &["Whatever.", "Mm-hm.", "If you say so."],
        ResponseKind::EmotionalPlead => &[
            "Please, just this once?",
            "You don't understand how hard this is for me.",
            "Can't you just let me have this?",
        ],
        ResponseKind::Defiant => &[
            "No. You can't make me.",
            "I'm not doing it.",
            "Try and make me.",
        ],
        ResponseKind::ReasonableRefusal => &[
            "I hear you, but I don't think that's fair.",
            "I get it, but not right now.",
            "That makes sense, but I still don't want to.",
        ],
    }
}

/// Short ambient line when the character's mood shifts on its own.
#[must_use]
pub fn bark_line(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => "*hums a tune*",
        Emotion::Receptive => "*looks up, curious*",
        Emotion::Neutral => "*sighs*",
        Emotion::Annoyed => "Ugh.",
        Emotion::Angry => "Hmph!",
        Emotion::Defiant => "*crosses arms*",
        Emotion::Sad => "*sniffles*",
        Emotion::Anxious => "*fidgets*",
    }
}

/// [`DialogueProvider`] backed by the line pools above.
#[derive(Debug, Clone)]
pub struct TemplateDialogue {
    rng: StdRng,
}

impl TemplateDialogue {
    /// Provider with a fixed seed (replayable wording).
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Provider seeded from `seed`, or from entropy when `None`.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(
            || Self {
                rng: StdRng::from_entropy(),
            },
            Self::seeded,
        )
    }

    fn pick(&mut self, pool: &'static [&'static str]) -> &'static str {
        pool.choose(&mut self.rng).copied().unwrap_or("...")
    }
}

impl DialogueProvider for TemplateDialogue {
    fn opening_line(&mut self, scenario: ScenarioId, _emotion: Emotion) -> String {
        self.pick(openings(scenario)).to_string()
    }

    fn response_line(&mut self, _scenario: ScenarioId, response: ResponseKind, emotion: Emotion) -> String {
        let line = self.pick(replies(response));
        match emotion {
            Emotion::Sad | Emotion::Anxious if response != ResponseKind::Angry => {
                format!("{} {line}", bark_line(emotion))
            }
            _ => line.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_words() {
        let mut a = TemplateDialogue::seeded(42);
        let mut b = TemplateDialogue::seeded(42);
        for scenario in ScenarioId::ALL {
            assert_eq!(
                a.opening_line(scenario, Emotion::Neutral),
                b.opening_line(scenario, Emotion::Neutral)
            );
        }
        for response in ResponseKind::ALL {
            assert_eq!(
                a.response_line(ScenarioId::Bedtime, response, Emotion::Neutral),
                b.response_line(ScenarioId::Bedtime, response, Emotion::Neutral)
            );
        }
    }

    #[test]
    fn lines_come_from_the_right_pool() {
        let mut dialogue = TemplateDialogue::seeded(1);
        for _ in 0..20 {
            let line = dialogue.response_line(ScenarioId::CleanRoom, ResponseKind::Defiant, Emotion::Defiant);
            assert!(replies(ResponseKind::Defiant).contains(&line.as_str()));
        }
    }

    #[test]
    fn sad_lines_carry_a_cue() {
        let mut dialogue = TemplateDialogue::seeded(3);
        let line = dialogue.response_line(ScenarioId::Bedtime, ResponseKind::EmotionalPlead, Emotion::Sad);
        assert!(line.starts_with("*sniffles*"));
    }
}
