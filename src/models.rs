use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Smallest number of flashcards a generation may produce
pub const MIN_FLASHCARDS: u32 = 1;
/// Largest number of flashcards a generation may produce
pub const MAX_FLASHCARDS: u32 = 30;
/// Count used when the request does not specify one
pub const DEFAULT_FLASHCARDS: u32 = 10;

/// A finished term/definition pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flashcard {
    pub word: String,
    pub definition: String,
}

impl Flashcard {
    pub fn new(word: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            definition: definition.into(),
        }
    }
}

/// A card as observed mid-stream. Either field may be missing or hold a
/// value of the wrong type until the model has finished writing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFlashcard {
    pub word: Option<Value>,
    pub definition: Option<Value>,
}

impl PartialFlashcard {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => Self {
                word: fields.get("word").cloned(),
                definition: fields.get("definition").cloned(),
            },
            _ => Self::default(),
        }
    }

    /// Both fields present and strings
    pub fn complete(&self) -> Option<Flashcard> {
        match (&self.word, &self.definition) {
            (Some(Value::String(word)), Some(Value::String(definition))) => {
                Some(Flashcard::new(word.clone(), definition.clone()))
            }
            _ => None,
        }
    }
}

/// Best-effort view of `{ flashcards: Flashcard[] }` while it streams in.
///
/// `flashcards` is `None` until the decoder has seen the key, matching
/// the difference between "nothing yet" and "an empty list".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialDeck {
    pub flashcards: Option<Vec<PartialFlashcard>>,
}

impl PartialDeck {
    /// Initial value of a fresh generation
    pub fn empty() -> Self {
        Self {
            flashcards: Some(Vec::new()),
        }
    }

    /// Interpret any decoded JSON value as a deck. Shapes that do not fit
    /// degrade to "no cards" rather than failing.
    pub fn from_value(value: &Value) -> Self {
        let flashcards = value
            .get("flashcards")
            .and_then(Value::as_array)
            .map(|cards| cards.iter().map(PartialFlashcard::from_value).collect());
        Self { flashcards }
    }

    /// Fully known deck, as seen once a stream has finished
    pub fn from_deck(deck: &FlashcardDeck) -> Self {
        let flashcards = deck
            .flashcards
            .iter()
            .map(|card| PartialFlashcard {
                word: Some(Value::String(card.word.clone())),
                definition: Some(Value::String(card.definition.clone())),
            })
            .collect();
        Self {
            flashcards: Some(flashcards),
        }
    }

    /// Cards whose fields are both present strings, in arrival order
    pub fn complete_cards(&self) -> Vec<Flashcard> {
        self.flashcards
            .iter()
            .flatten()
            .filter_map(PartialFlashcard::complete)
            .collect()
    }
}

/// Strict form of the deck, used once a stream has finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub flashcards: Vec<Flashcard>,
}

/// Audience tier controlling how the prompt asks for vocabulary and depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeLevel {
    Elementary,
    #[default]
    Middle,
    HighSchool,
    College,
    Advanced,
}

impl GradeLevel {
    pub const ALL: [Self; 5] = [
        Self::Elementary,
        Self::Middle,
        Self::HighSchool,
        Self::College,
        Self::Advanced,
    ];

    /// Wire value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Elementary => "elementary",
            Self::Middle => "middle",
            Self::HighSchool => "highschool",
            Self::College => "college",
            Self::Advanced => "advanced",
        }
    }

    /// Human label shown in selectors
    pub fn label(self) -> &'static str {
        match self {
            Self::Elementary => "Elementary School (Grades 1-5)",
            Self::Middle => "Middle School (Grades 6-8)",
            Self::HighSchool => "High School (Grades 9-12)",
            Self::College => "College Level",
            Self::Advanced => "Advanced/Professional",
        }
    }

    /// Parse a wire value, falling back to `Middle` for anything unknown
    pub fn from_str_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown grade level '{s}', expected one of: elementary, middle, highschool, college, advanced"
                )
            })
    }
}

/// Parameters for one generation, as sent to the endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub topic: String,
    pub api_key: String,
    pub num_flashcards: u32,
    pub grade_level: GradeLevel,
}

/// Clamp a requested count into `[MIN_FLASHCARDS, MAX_FLASHCARDS]`
pub fn clamp_flashcard_count(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_FLASHCARDS), i64::from(MAX_FLASHCARDS)) as u32
}

/// Coerce a loosely-typed JSON count (number or numeric string) into the
/// effective count. Fractions are truncated. An explicit `null` or a
/// blank string counts as zero and so clamps to [`MIN_FLASHCARDS`]; an
/// absent field and other non-numeric input use [`DEFAULT_FLASHCARDS`].
pub fn coerce_flashcard_count(raw: Option<&Value>) -> u32 {
    let numeric = match raw {
        Some(Value::Null) => Some(0.0),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => Some(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
        _ => None,
    };

    match numeric {
        Some(n) if n.is_finite() => {
            // saturating float-to-int cast, then clamp
            clamp_flashcard_count(n.trunc() as i64)
        }
        Some(n) if n.is_infinite() => {
            if n.is_sign_positive() {
                MAX_FLASHCARDS
            } else {
                MIN_FLASHCARDS
            }
        }
        _ => DEFAULT_FLASHCARDS,
    }
}
