//! Free-text → [`PlayerAction`] classification.
//!
//! Keyword scoring over a fixed per-category table, followed by tone
//! modifiers read off punctuation, length and capitalisation. Stateless and
//! deterministic: the same table and input always give the same result.

use crate::types::PlayerAction;

/// Result of scoring a line of player text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionScore {
    /// Winning category.
    pub action: PlayerAction,
    /// Its raw (unnormalised) score.
    pub confidence: f32,
    /// Raw score per category, indexed by [`PlayerAction::index`].
    pub scores: [f32; PlayerAction::ALL.len()],
}

impl ActionScore {
    /// Result for empty input: the neutral default with zero confidence.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            action: PlayerAction::default(),
            confidence: 0.0,
            scores: [0.0; PlayerAction::ALL.len()],
        }
    }
}

/// Anything that can turn player text into an action category. Hosts can
/// swap in their own scorer.
pub trait TextScorer: Send + Sync {
    /// Score `text`.
    fn score(&self, text: &str) -> ActionScore;
}

/// One weighted keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Category the keyword votes for.
    pub action: PlayerAction,
    /// Lowercase substring to look for.
    pub phrase: String,
    /// Vote weight (1.0 to 3.0 in the built-in table).
    pub weight: f32,
}

const DEFAULT_KEYWORDS: &[(PlayerAction, &str, f32)] = &[
    // Authoritarian
    (PlayerAction::Authoritarian, "because i said so", 3.0),
    (PlayerAction::Authoritarian, "right now", 3.0),
    (PlayerAction::Authoritarian, "no excuses", 3.0),
    (PlayerAction::Authoritarian, "or else", 3.0),
    (PlayerAction::Authoritarian, "i'm the parent", 3.0),
    (PlayerAction::Authoritarian, "don't argue", 2.5),
    (PlayerAction::Authoritarian, "you will", 2.5),
    (PlayerAction::Authoritarian, "grounded", 2.5),
    (PlayerAction::Authoritarian, "do it", 2.0),
    (PlayerAction::Authoritarian, "go to", 1.5),
    (PlayerAction::Authoritarian, "must", 1.5),
    (PlayerAction::Authoritarian, "now", 1.0),
    // Empathetic
    (PlayerAction::Empathetic, "i understand", 3.0),
    (PlayerAction::Empathetic, "i know it's hard", 3.0),
    (PlayerAction::Empathetic, "are you okay", 2.5),
    (PlayerAction::Empathetic, "i care", 2.5),
    (PlayerAction::Empathetic, "feel", 2.0),
    (PlayerAction::Empathetic, "sorry", 2.0),
    (PlayerAction::Empathetic, "frustrat", 2.0),
    (PlayerAction::Empathetic, "tired", 1.5),
    (PlayerAction::Empathetic, "love you", 2.5),
    (PlayerAction::Empathetic, "hard day", 2.0),
    // Logical
    (PlayerAction::Logical, "the reason", 2.5),
    (PlayerAction::Logical, "consequence", 2.5),
    (PlayerAction::Logical, "so that", 2.0),
    (PlayerAction::Logical, "if you", 2.0),
    (PlayerAction::Logical, "think about", 2.0),
    (PlayerAction::Logical, "makes sense", 2.0),
    (PlayerAction::Logical, "because", 1.5),
    (PlayerAction::Logical, "important", 1.5),
    (PlayerAction::Logical, "healthy", 1.5),
    (PlayerAction::Logical, "then", 1.0),
    // Bribe
    (PlayerAction::Bribe, "i'll give you", 3.0),
    (PlayerAction::Bribe, "in exchange", 3.0),
    (PlayerAction::Bribe, "reward", 2.5),
    (PlayerAction::Bribe, "ice cream", 2.5),
    (PlayerAction::Bribe, "money", 2.5),
    (PlayerAction::Bribe, "extra", 2.0),
    (PlayerAction::Bribe, "dessert", 2.0),
    (PlayerAction::Bribe, "treat", 2.0),
    (PlayerAction::Bribe, "deal", 2.0),
    (PlayerAction::Bribe, "candy", 2.0),
    // GuiltTrip
    (PlayerAction::GuiltTrip, "how could you", 3.0),
    (PlayerAction::GuiltTrip, "after all i", 3.0),
    (PlayerAction::GuiltTrip, "i work so hard", 3.0),
    (PlayerAction::GuiltTrip, "disappointed", 3.0),
    (PlayerAction::GuiltTrip, "you never", 2.5),
    (PlayerAction::GuiltTrip, "sacrifice", 2.5),
    (PlayerAction::GuiltTrip, "ashamed", 2.5),
    (PlayerAction::GuiltTrip, "you always", 2.0),
    (PlayerAction::GuiltTrip, "upset", 1.5),
    // Humor
    (PlayerAction::Humor, "haha", 2.5),
    (PlayerAction::Humor, "race you", 2.5),
    (PlayerAction::Humor, "joke", 2.0),
    (PlayerAction::Humor, "funny", 2.0),
    (PlayerAction::Humor, "silly", 2.0),
    (PlayerAction::Humor, "lol", 2.0),
    (PlayerAction::Humor, "monster", 1.5),
    (PlayerAction::Humor, "pretend", 1.5),
    (PlayerAction::Humor, ":)", 1.5),
    // Listen
    (PlayerAction::Listen, "what do you think", 3.0),
    (PlayerAction::Listen, "how do you feel", 3.0),
    (PlayerAction::Listen, "help me understand", 3.0),
    (PlayerAction::Listen, "tell me", 2.5),
    (PlayerAction::Listen, "what's wrong", 2.5),
    (PlayerAction::Listen, "your side", 2.5),
    (PlayerAction::Listen, "listen", 2.0),
    (PlayerAction::Listen, "why", 1.5),
];

const EXCLAMATION_BOOST: f32 = 2.0;
const QUESTION_LISTEN_BOOST: f32 = 1.5;
const QUESTION_EMPATHY_BOOST: f32 = 1.0;
const LONG_MESSAGE_WORDS: usize = 15;
const LONG_MESSAGE_BOOST: f32 = 1.0;
const SHORT_MESSAGE_WORDS: usize = 5;
const SHORT_MESSAGE_BOOST: f32 = 1.5;
const SHOUTING_BOOST: f32 = 3.0;

/// Keyword + tone classifier.
#[derive(Debug, Clone)]
pub struct ActionClassifier {
    keywords: Vec<Keyword>,
}

impl Default for ActionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionClassifier {
    /// Classifier with the built-in keyword table.
    #[must_use]
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS.iter().map(|&(action, phrase, weight)| Keyword {
            action,
            phrase: phrase.to_string(),
            weight,
        }))
    }

    /// Classifier with a custom table. Phrases are lowercased.
    #[must_use]
    pub fn with_keywords(keywords: impl IntoIterator<Item = Keyword>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| Keyword {
                    phrase: k.phrase.to_lowercase(),
                    ..k
                })
                .collect(),
        }
    }

    /// The active keyword table.
    #[must_use]
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Classify `text`. Empty or whitespace-only input returns
    /// [`ActionScore::neutral`]. Ties go to the category declared first.
    #[must_use]
    pub fn classify(&self, text: &str) -> ActionScore {
        if text.trim().is_empty() {
            return ActionScore::neutral();
        }

        let lower = text.to_lowercase();
        let mut scores = [0.0_f32; PlayerAction::ALL.len()];

        for keyword in &self.keywords {
            if !keyword.phrase.is_empty() && lower.contains(keyword.phrase.as_str()) {
                scores[keyword.action.index()] += keyword.weight;
            }
        }

        apply_tone(text, &mut scores);

        let mut best = 0;
        for (i, score) in scores.iter().enumerate() {
            if *score > scores[best] {
                best = i;
            }
        }

        ActionScore {
            action: PlayerAction::ALL[best],
            confidence: scores[best],
            scores,
        }
    }
}

impl TextScorer for ActionClassifier {
    fn score(&self, text: &str) -> ActionScore {
        self.classify(text)
    }
}

fn apply_tone(text: &str, scores: &mut [f32; PlayerAction::ALL.len()]) {
    let exclamations = text.matches('!').count() as f32;
    let questions = text.matches('?').count() as f32;
    let words = text.split_whitespace().count();

    scores[PlayerAction::Authoritarian.index()] += EXCLAMATION_BOOST * exclamations;
    scores[PlayerAction::Listen.index()] += QUESTION_LISTEN_BOOST * questions;
    scores[PlayerAction::Empathetic.index()] += QUESTION_EMPATHY_BOOST * questions;

    if words > LONG_MESSAGE_WORDS {
        scores[PlayerAction::Empathetic.index()] += LONG_MESSAGE_BOOST;
        scores[PlayerAction::Logical.index()] += LONG_MESSAGE_BOOST;
    } else if words < SHORT_MESSAGE_WORDS {
        scores[PlayerAction::Authoritarian.index()] += SHORT_MESSAGE_BOOST;
    }

    if is_shouting(text) {
        scores[PlayerAction::Authoritarian.index()] += SHOUTING_BOOST;
    }
}

/// At least one letter and no lowercase ones.
fn is_shouting(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| !c.is_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_neutral() {
        let c = ActionClassifier::new();
        for text in ["", "   ", "\n\t"] {
            let s = c.classify(text);
            assert_eq!(s.action, PlayerAction::Logical);
            assert_eq!(s.confidence, 0.0);
        }
    }

    #[test]
    fn shouted_order_is_authoritarian() {
        let s = ActionClassifier::new().classify("GO TO SCHOOL NOW!");
        assert_eq!(s.action, PlayerAction::Authoritarian);
        // go to 1.5 + now 1.0 + one ! 2.0 + short 1.5 + caps 3.0
        assert!((s.confidence - 9.0).abs() < 1e-6);
    }

    #[test]
    fn open_question_is_listen() {
        let s = ActionClassifier::new().classify("What do you think we should do about bedtime?");
        assert_eq!(s.action, PlayerAction::Listen);
        assert!((s.scores[PlayerAction::Listen.index()] - 4.5).abs() < 1e-6);
        assert!((s.scores[PlayerAction::Empathetic.index()] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bribe_and_guilt_trip() {
        let c = ActionClassifier::new();
        assert_eq!(
            c.classify("Clean your room and I'll give you ice cream after dinner").action,
            PlayerAction::Bribe
        );
        assert_eq!(
            c.classify("I'm so disappointed, after all I do for you").action,
            PlayerAction::GuiltTrip
        );
    }

    #[test]
    fn ties_go_to_first_declared_category() {
        let c = ActionClassifier::with_keywords([
            Keyword { action: PlayerAction::Humor, phrase: "pizza".into(), weight: 2.0 },
            Keyword { action: PlayerAction::Empathetic, phrase: "PIZZA".into(), weight: 2.0 },
        ]);
        // Five plain words: no tone modifiers.
        let s = c.classify("we could get pizza tonight");
        assert_eq!(s.action, PlayerAction::Empathetic);
        assert!((s.confidence - 2.0).abs() < 1e-6);
    }

    #[test]
    fn any_all_caps_text_is_shouting() {
        assert!(is_shouting("OK"));
        assert!(is_shouting("I"));
        assert!(is_shouting("NO WAY"));
        assert!(!is_shouting("No way"));
        assert!(!is_shouting("123 !!"));
    }

    #[test]
    fn two_letter_shouts_get_the_caps_bonus() {
        let c = ActionClassifier::new();
        // short 1.5 + caps 3.0
        let s = c.classify("NO");
        assert_eq!(s.action, PlayerAction::Authoritarian);
        assert!((s.confidence - 4.5).abs() < 1e-6);
        // one ! 2.0 + short 1.5 + caps 3.0
        let s = c.classify("NO!");
        assert_eq!(s.action, PlayerAction::Authoritarian);
        assert!((s.confidence - 6.5).abs() < 1e-6);
        // caps 3.0 + short 1.5 on Authoritarian; ? puts 1.5 on Listen
        let s = c.classify("OK?");
        assert!((s.scores[PlayerAction::Authoritarian.index()] - 4.5).abs() < 1e-6);
    }
}
