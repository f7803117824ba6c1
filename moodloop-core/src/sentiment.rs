//! Lexicon sentiment for free-text player input.
//!
//! Tokens are matched against small positive and negative word lists. An
//! intensifier scales the next sentiment word, and a negator flips every
//! sentiment word within the next few tokens. The raw sum is squashed into
//! (-1, 1).

const POSITIVE: &[(&str, f32)] = &[
    ("love", 1.0),
    ("proud", 1.0),
    ("great", 0.8),
    ("wonderful", 0.9),
    ("amazing", 0.9),
    ("awesome", 0.8),
    ("happy", 0.8),
    ("thank", 0.7),
    ("thanks", 0.7),
    ("please", 0.4),
    ("good", 0.6),
    ("nice", 0.5),
    ("fun", 0.6),
    ("glad", 0.6),
    ("care", 0.5),
    ("together", 0.4),
    ("understand", 0.4),
    ("okay", 0.2),
    ("fair", 0.4),
    ("help", 0.3),
];

const NEGATIVE: &[(&str, f32)] = &[
    ("hate", 1.0),
    ("stupid", 0.9),
    ("lazy", 0.8),
    ("terrible", 0.9),
    ("awful", 0.9),
    ("disappointed", 0.8),
    ("ashamed", 0.8),
    ("angry", 0.7),
    ("mad", 0.6),
    ("bad", 0.6),
    ("wrong", 0.5),
    ("annoying", 0.6),
    ("ridiculous", 0.7),
    ("punish", 0.8),
    ("grounded", 0.7),
    ("shut", 0.7),
    ("useless", 0.9),
    ("sick", 0.4),
    ("tired", 0.3),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "don't", "dont", "isn't", "isnt", "aren't", "won't", "can't", "cant",
    "didn't", "doesn't",
];

const INTENSIFIERS: &[&str] = &["very", "really", "so", "extremely", "totally", "absolutely"];

const INTENSIFIER_SCALE: f32 = 1.5;
/// Tokens after a negator that it still flips.
const NEGATION_SPAN: u8 = 3;
/// Squash constant: `score = raw / sqrt(raw² + ALPHA)`.
const ALPHA: f32 = 4.0;

/// Stateless lexicon scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    /// Sentiment of `text` in (-1, 1). Text with no sentiment words scores 0.
    #[must_use]
    pub fn analyze(&self, text: &str) -> f32 {
        let mut raw = 0.0_f32;
        let mut negation_left = 0_u8;
        let mut scale = 1.0_f32;

        for token in tokens(text) {
            if NEGATORS.contains(&token.as_str()) {
                negation_left = NEGATION_SPAN;
                continue;
            }
            if INTENSIFIERS.contains(&token.as_str()) {
                scale = INTENSIFIER_SCALE;
                continue;
            }

            if let Some(polarity) = polarity(&token) {
                let signed = if negation_left > 0 { -polarity } else { polarity };
                raw += signed * scale;
                scale = 1.0;
            }
            negation_left = negation_left.saturating_sub(1);
        }

        if raw == 0.0 {
            0.0
        } else {
            raw / (raw * raw + ALPHA).sqrt()
        }
    }
}

fn polarity(token: &str) -> Option<f32> {
    POSITIVE
        .iter()
        .find(|(w, _)| *w == token)
        .map(|(_, p)| *p)
        .or_else(|| NEGATIVE.iter().find(|(w, _)| *w == token).map(|(_, p)| -p))
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| {
            t.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
}
