//! Core type definitions shared by every moodloop subsystem.
//!
//! All types are serializable so a character can be snapshotted at any
//! point between turns.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Unique identifier for a simulated character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    /// Create a new random character ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a memory inside one [`MemoryStore`](crate::memory::MemoryStore).
///
/// Ids are handed out in creation order, so comparing two ids also
/// compares their age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub u64);

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Simulation timestamp: milliseconds of simulated time since the character
/// was created, plus the wall-clock time it was taken (save metadata only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimTimestamp {
    /// Simulated milliseconds (monotonically increasing).
    pub millis: u64,
    /// Wall-clock time when the timestamp was taken.
    pub real_time: DateTime<Utc>,
}

impl SimTimestamp {
    /// Create a timestamp at `millis` of sim time, stamped with the current wall clock.
    #[must_use]
    pub fn now(millis: u64) -> Self {
        Self {
            millis,
            real_time: Utc::now(),
        }
    }

    /// Simulated days elapsed since `other` (zero if `other` is later).
    #[must_use]
    pub fn days_since(&self, other: &Self) -> f64 {
        self.millis.saturating_sub(other.millis) as f64 / MILLIS_PER_DAY
    }
}

/// The simulation clock owned by a character. The host advances it from its
/// own tick loop; nothing in this crate reads the wall clock for simulation
/// math.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    millis: u64,
}

impl SimClock {
    /// Clock starting at an arbitrary sim time.
    #[must_use]
    pub fn starting_at(millis: u64) -> Self {
        Self { millis }
    }

    /// Advance by `dt` seconds. Negative or non-finite values are ignored.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.millis = self.millis.saturating_add((f64::from(dt) * 1000.0).round() as u64);
        }
    }

    /// Current sim time in milliseconds.
    #[must_use]
    pub fn millis(&self) -> u64 {
        self.millis
    }

    /// Current timestamp.
    #[must_use]
    pub fn now(&self) -> SimTimestamp {
        SimTimestamp::now(self.millis)
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A fixed conversational situation. Provides dialogue context and the
/// situational modifiers the character starts the conversation with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ScenarioId {
    /// Getting ready for school in the morning.
    #[default]
    GoToSchool,
    /// Cleaning a messy bedroom.
    CleanRoom,
    /// Sitting down to do homework.
    DoHomework,
    /// Going to bed on time.
    Bedtime,
    /// Putting the phone / console away.
    ScreenTime,
    /// Joining the family for dinner.
    FamilyDinner,
}

impl ScenarioId {
    /// All scenarios in declaration order (one-hot order of the observation vector).
    pub const ALL: [Self; 6] = [
        Self::GoToSchool,
        Self::CleanRoom,
        Self::DoHomework,
        Self::Bedtime,
        Self::ScreenTime,
        Self::FamilyDinner,
    ];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Situational `(tiredness, hunger)` the character has when this scenario opens.
    #[must_use]
    pub fn situation(self) -> (f32, f32) {
        match self {
            Self::GoToSchool => (70.0, 40.0),
            Self::CleanRoom => (30.0, 20.0),
            Self::DoHomework => (50.0, 30.0),
            Self::Bedtime => (60.0, 10.0),
            Self::ScreenTime => (20.0, 20.0),
            Self::FamilyDinner => (30.0, 70.0),
        }
    }

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GoToSchool => "go_to_school",
            Self::CleanRoom => "clean_room",
            Self::DoHomework => "do_homework",
            Self::Bedtime => "bedtime",
            Self::ScreenTime => "screen_time",
            Self::FamilyDinner => "family_dinner",
        }
    }

    /// Parse a scenario name, falling back to the default scenario for
    /// anything unrecognised.
    #[must_use]
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_identifier(s);
        Self::ALL
            .into_iter()
            .find(|scenario| normalize_identifier(scenario.as_str()) == key)
            .ok_or_else(|| UnknownIdentifier(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Player actions
// ---------------------------------------------------------------------------

/// The approach the player takes in a turn.
///
/// Declaration order is load-bearing: the classifier breaks score ties in
/// favour of the earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Orders, threats, raised voice.
    Authoritarian,
    /// Acknowledging feelings.
    Empathetic,
    /// Reasons and consequences.
    Logical,
    /// Offering something in exchange.
    Bribe,
    /// Making them feel bad about refusing.
    GuiltTrip,
    /// Joking the tension away.
    Humor,
    /// Asking and letting them talk.
    Listen,
}

impl Default for PlayerAction {
    /// The neutral action used when input is empty or unrecognised.
    fn default() -> Self {
        Self::Logical
    }
}

impl PlayerAction {
    /// All actions in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Authoritarian,
        Self::Empathetic,
        Self::Logical,
        Self::Bribe,
        Self::GuiltTrip,
        Self::Humor,
        Self::Listen,
    ];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Action at `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authoritarian => "authoritarian",
            Self::Empathetic => "empathetic",
            Self::Logical => "logical",
            Self::Bribe => "bribe",
            Self::GuiltTrip => "guilt_trip",
            Self::Humor => "humor",
            Self::Listen => "listen",
        }
    }

    /// Parse an action name, falling back to [`PlayerAction::default`].
    #[must_use]
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_default()
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerAction {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_identifier(s);
        Self::ALL
            .into_iter()
            .find(|action| normalize_identifier(action.as_str()) == key)
            .ok_or_else(|| UnknownIdentifier(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Emotion & response labels
// ---------------------------------------------------------------------------

/// Discrete emotion label derived from an [`EmotionalState`](crate::emotion::EmotionalState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Emotion {
    /// Good mood and good relationship.
    Happy,
    /// Nothing stands out.
    #[default]
    Neutral,
    /// Mildly negative mood.
    Annoyed,
    /// Very negative mood under stress.
    Angry,
    /// Damaged relationship.
    Sad,
    /// Feels disrespected and wants control back.
    Defiant,
    /// Low trust under stress.
    Anxious,
    /// Open to being persuaded.
    Receptive,
}

impl Emotion {
    /// All labels in ordinal order.
    pub const ALL: [Self; 8] = [
        Self::Happy,
        Self::Neutral,
        Self::Annoyed,
        Self::Angry,
        Self::Sad,
        Self::Defiant,
        Self::Anxious,
        Self::Receptive,
    ];

    /// Ordinal used by the observation vector.
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Annoyed => "annoyed",
            Self::Angry => "angry",
            Self::Sad => "sad",
            Self::Defiant => "defiant",
            Self::Anxious => "anxious",
            Self::Receptive => "receptive",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete reaction the character picks for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Agrees to do it. Terminal.
    Compliant,
    /// Tries to strike a deal.
    NegotiateCalm,
    /// Mocking reply.
    Sarcastic,
    /// Blows up. Terminal.
    Angry,
    /// Shrugs it off.
    Dismissive,
    /// Begs to be let off.
    EmotionalPlead,
    /// Flat refusal. Terminal.
    Defiant,
    /// Polite, reasoned no.
    ReasonableRefusal,
}

impl ResponseKind {
    /// All responses in index order (the index a learned policy returns).
    pub const ALL: [Self; 8] = [
        Self::Compliant,
        Self::NegotiateCalm,
        Self::Sarcastic,
        Self::Angry,
        Self::Dismissive,
        Self::EmotionalPlead,
        Self::Defiant,
        Self::ReasonableRefusal,
    ];

    /// Response at `index`, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position in [`Self::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::NegotiateCalm => "negotiate_calm",
            Self::Sarcastic => "sarcastic",
            Self::Angry => "angry",
            Self::Dismissive => "dismissive",
            Self::EmotionalPlead => "emotional_plead",
            Self::Defiant => "defiant",
            Self::ReasonableRefusal => "reasonable_refusal",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Returned by the strict `FromStr` impls when an identifier is not known.
/// Gameplay code uses the `parse_lossy` variants instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown identifier: {0:?}")]
pub struct UnknownIdentifier(pub String);

/// Case-, space- and separator-insensitive form used for identifier matching,
/// so `GoToSchool`, `go_to_school` and `go-to-school` all agree.
fn normalize_identifier(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
