//! Unit tests for configuration module
//!
//! These tests validate configuration parsing, defaults, and validation.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::*;

    // ====== Default Value Tests ======

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(config.max_duration(), Duration::from_secs(60));
        assert_eq!(config.llm_model(), "gemini-2.0-flash-001");
        assert!(config.llm.search_grounding);
        assert_eq!(config.client_endpoint(), "http://127.0.0.1:3000");
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = LoggingConfig::default();

        assert_eq!(config.level, "info");
        assert_eq!(config.event_log_path.to_str(), Some("app.log"));
    }

    // ====== Parsing Tests ======

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml_str(
            r#"
[server]
port = 8080
enable_cors = true

[llm]
llm_model = "gemini-2.5-flash"
search_grounding = false
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.enable_cors);
        assert_eq!(config.server.max_duration_secs, 60);
        assert_eq!(config.llm_model(), "gemini-2.5-flash");
        assert!(!config.llm.search_grounding);
        assert!(config.llm_endpoint().starts_with("https://"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\nendpoint = \"http://10.0.0.2:9000\"\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.client_endpoint(), "http://10.0.0.2:9000");
    }

    // ====== Validation Tests ======

    #[test]
    fn test_zero_max_duration_rejected() {
        let result = AppConfig::from_toml_str("[server]\nmax_duration_secs = 0\n");
        assert!(matches!(result, Err(crate::FlashgenError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let result = AppConfig::from_toml_str("[client]\nendpoint = \"not a url\"\n");
        assert!(matches!(result, Err(crate::FlashgenError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = AppConfig::from_toml_str("[server\nport = 1");
        assert!(matches!(result, Err(crate::FlashgenError::TomlParsing(_))));
    }
}
