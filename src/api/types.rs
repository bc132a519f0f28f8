//! API request and response types

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::models::coerce_flashcard_count;
use crate::models::GradeLevel;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
}

/// Body of a failed generation request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Generation request as received. Fields are loosely typed: the count
/// may be a number or a numeric string, and the grade may be anything.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFlashcardsRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub api_key: String,
    /// `None` when absent; an explicit `null` is kept as `Some(Value::Null)`
    #[serde(default, deserialize_with = "present_value")]
    pub num_flashcards: Option<Value>,
    #[serde(default)]
    pub grade_level: Option<String>,
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl GenerateFlashcardsRequest {
    /// Count after defaulting and clamping
    pub fn effective_count(&self) -> u32 {
        coerce_flashcard_count(self.num_flashcards.as_ref())
    }

    /// Grade after defaulting; unknown values read as middle school
    pub fn effective_grade(&self) -> GradeLevel {
        self.grade_level
            .as_deref()
            .map(GradeLevel::from_str_lenient)
            .unwrap_or_default()
    }
}
