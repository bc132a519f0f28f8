//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `flashgen` CLI

use crate::generation::Notice;
use crate::AppConfig;

/// Safely truncate a string at character boundary (not byte boundary)
///
/// This prevents panics when truncating strings with multi-byte UTF-8 characters (emojis, etc.)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Show all but the last four characters as `*`
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let visible: String = secret.chars().skip(count - 4).collect();
    format!("{}{visible}", "*".repeat(count - 4))
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 flashgen Configuration:");
    println!();

    println!("🌐 Server:");
    println!("  Bind address: {}", config.bind_address());
    println!("  CORS: {}", config.server.enable_cors);
    println!("  Max generation duration: {}s", config.server.max_duration_secs);
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Directory: {}", config.logging.directory.display());
    println!("  Event log: {}", config.logging.event_log_path.display());
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Search grounding: {}", config.llm.search_grounding);
    println!();

    println!("💻 Client:");
    println!("  Server endpoint: {}", config.client_endpoint());
    println!("  Settings file: {}", config.client.settings_path.display());
}

pub fn print_notice(notice: &Notice) {
    match notice {
        Notice::Success(message) => print_success(message),
        Notice::Error(message) => print_error(message),
    }
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    println!("❌ {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("héllo", 10), "héllo");
        assert_eq!(truncate_str("héllo", 2), "hé...");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("AIzaSyABCDEF"), "********CDEF");
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }
}
