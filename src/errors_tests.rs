//! Unit tests for error handling
//!
//! Tests error types, conversions, and error message formatting.

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::FlashgenError;
    use crate::errors::ValidationError;

    // ====== Error Type Tests ======

    #[test]
    fn test_custom_error() {
        let error = FlashgenError::Custom("Test error message".to_string());
        assert_eq!(format!("{error}"), "Test error message");
    }

    #[test]
    fn test_config_error() {
        let error = FlashgenError::ConfigError("Invalid configuration".to_string());
        assert!(matches!(error, FlashgenError::ConfigError(_)));
        assert!(format!("{error}").contains("configuration"));
    }

    #[test]
    fn test_api_error_display() {
        let error = FlashgenError::Api {
            status: 500,
            message: "Failed to generate flashcards".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "API error (500): Failed to generate flashcards"
        );
    }

    // ====== Validation Messages ======

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::MissingTopic.to_string(),
            "Please enter a topic"
        );
        assert_eq!(
            ValidationError::MissingApiKey.to_string(),
            "Please enter your Gemini API key"
        );
    }

    #[test]
    fn test_validation_is_transparent() {
        let error: FlashgenError = ValidationError::MissingTopic.into();
        assert!(matches!(
            error,
            FlashgenError::Validation(ValidationError::MissingTopic)
        ));
        assert_eq!(error.to_string(), "Please enter a topic");
    }

    // ====== Error Conversion Tests ======

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: FlashgenError = io_err.into();
        assert!(matches!(err, FlashgenError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_result: Result<serde_json::Value, _> = serde_json::from_str("{invalid json}");
        let json_err = parse_result.unwrap_err();
        let err: FlashgenError = json_err.into();
        assert!(matches!(err, FlashgenError::Serialization(_)));
    }

    #[test]
    fn test_error_from_toml() {
        let parse_result: Result<toml::Value, _> = toml::from_str("not = [valid");
        let err: FlashgenError = parse_result.unwrap_err().into();
        assert!(matches!(err, FlashgenError::TomlParsing(_)));
    }

    #[test]
    fn test_error_from_url() {
        let err: FlashgenError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, FlashgenError::Url(_)));
    }

    // ====== Error Chain Tests ======

    #[test]
    fn test_error_source_chain() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "Root cause");
        match FlashgenError::from(io_err) {
            FlashgenError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    // ====== Result Type Tests ======

    #[test]
    fn test_result_and_then() {
        let result: crate::Result<i32> = Ok(42);
        let chained = result.and_then(|v| {
            if v > 40 {
                Ok(v + 10)
            } else {
                Err(FlashgenError::Custom("Too small".to_string()))
            }
        });
        assert_eq!(chained.unwrap(), 52);
    }
}
