//! Form values collected before a generation starts

use crate::errors::ValidationError;
use crate::models::clamp_flashcard_count;
use crate::models::GenerationRequest;
use crate::models::GradeLevel;
use crate::models::DEFAULT_FLASHCARDS;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationForm {
    pub topic: String,
    num_flashcards: u32,
    pub grade_level: GradeLevel,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            topic: String::new(),
            num_flashcards: DEFAULT_FLASHCARDS,
            grade_level: GradeLevel::default(),
        }
    }
}

impl GenerationForm {
    pub fn new(topic: impl Into<String>, num_flashcards: i64, grade_level: GradeLevel) -> Self {
        Self {
            topic: topic.into(),
            num_flashcards: clamp_flashcard_count(num_flashcards),
            grade_level,
        }
    }

    pub fn num_flashcards(&self) -> u32 {
        self.num_flashcards
    }

    /// Values outside 1..=30 are clamped, like the number input does
    pub fn set_num_flashcards(&mut self, requested: i64) {
        self.num_flashcards = clamp_flashcard_count(requested);
    }

    /// Check required fields and assemble the request. The topic is
    /// checked first; blank values count as missing.
    pub fn build_request(&self, settings: &Settings) -> Result<GenerationRequest, ValidationError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::MissingTopic);
        }
        if !settings.has_api_key() {
            return Err(ValidationError::MissingApiKey);
        }

        Ok(GenerationRequest {
            topic: topic.to_string(),
            api_key: settings.api_key.trim().to_string(),
            num_flashcards: self.num_flashcards,
            grade_level: self.grade_level,
        })
    }
}
