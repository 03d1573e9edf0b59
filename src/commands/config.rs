//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print a single value
//! - `config set`: Validate and store a single value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{API_TOKEN_ENV, API_URL_ENV, Config};
use crate::error::{InventoryError, Result};

const SECRET_KEYS: &[&str] = &["api.token"];

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let token = config.api_token();
    let url_from_env = env_override(API_URL_ENV).is_some();
    let token_from_env = env_override(API_TOKEN_ENV).is_some();

    let json_output = json!({
        "api": {
            "base_url": config.base_url(),
            "base_url_from_env": url_from_env,
            "token_configured": token.is_some(),
            "token_from_env": token_from_env,
            "timeout_secs": config.api.timeout_secs,
        },
        "list": {
            "page_size": config.list.page_size,
            "debounce_ms": config.list.debounce_ms,
            "sort": config.list.sort,
        },
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "api".cyan()));
    let env_note = |from_env: bool| {
        if from_env {
            format!(" {}", "(from environment)".dimmed())
        } else {
            String::new()
        }
    };
    text_output.push_str(&format!(
        "  base_url: {}{}\n",
        config.base_url(),
        env_note(url_from_env)
    ));
    let token_status = match &token {
        Some(token) => mask_sensitive_value(token).green().to_string(),
        None => "not configured".dimmed().to_string(),
    };
    text_output.push_str(&format!("  token: {token_status}{}\n", env_note(token_from_env)));
    text_output.push_str(&format!("  timeout_secs: {}\n", config.api.timeout_secs));

    text_output.push('\n');
    text_output.push_str(&format!("{}:\n", "list".cyan()));
    text_output.push_str(&format!("  page_size: {}\n", config.list.page_size));
    text_output.push_str(&format!("  debounce_ms: {}\n", config.list.debounce_ms));
    text_output.push_str(&format!("  sort: {}\n", config.list.sort));

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    let secret = SECRET_KEYS.contains(&key);
    let json_output = if secret {
        json!({
            "action": "config_set",
            "key": key,
            "success": true,
        })
    } else {
        json!({
            "action": "config_set",
            "key": key,
            "value": value,
            "success": true,
        })
    };
    let text_output = if secret {
        format!("Set {}", key.cyan())
    } else {
        format!("Set {} to {}", key.cyan(), value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let Some(value) = config.get(key)? else {
        return Err(InventoryError::Config(format!("{key} not set")));
    };

    let (json_output, text_output) = if SECRET_KEYS.contains(&key) {
        let masked = mask_sensitive_value(&value);
        let json = json!({
            "key": key,
            "value": masked,
            "configured": true,
            "masked": true,
        });
        let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
        (json, text)
    } else {
        let json = json!({
            "key": key,
            "value": value,
            "configured": true,
        });
        (json, value)
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_value_ascii() {
        assert_eq!(mask_sensitive_value("abcdef"), "ab...ef");
        assert_eq!(mask_sensitive_value("12345678"), "12...78");
    }

    #[test]
    fn test_mask_sensitive_value_short() {
        assert_eq!(mask_sensitive_value("abcd"), "****");
        assert_eq!(mask_sensitive_value(""), "****");
    }

    #[test]
    fn test_mask_sensitive_value_multibyte_utf8() {
        assert_eq!(mask_sensitive_value("aé🔑cd"), "aé...cd");
        assert_eq!(mask_sensitive_value("éàöü"), "****");
    }
}
