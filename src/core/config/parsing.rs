use std::env;
use std::str::FromStr;

use super::types::ConfigError;

const DEFAULT_CORS_ORIGINS: &[&str] = &["http://localhost:5173", "http://localhost:3000"];

/// The trimmed value of `key`, treating blank as unset.
pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn env_flag(key: &str) -> bool {
    env_optional(key).is_some_and(|value| {
        matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
    })
}

pub(super) fn parse_number<T: FromStr>(field: &'static str, value: String) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue { field, value })
}

/// Minute counts are stored as `INTEGER`, so they must fit `i32` and be at least one.
pub(super) fn parse_minutes(field: &'static str, value: String) -> Result<i32, ConfigError> {
    match value.parse::<i32>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

/// Accepts a JSON array or a comma-separated list.
pub(super) fn parse_cors_origins(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let raw = value.unwrap_or_default();
    let origins: Vec<String> = if raw.trim_start().starts_with('[') {
        serde_json::from_str(&raw).map_err(|_| ConfigError::InvalidCors(raw.clone()))?
    } else {
        raw.split(',').map(|item| item.trim().to_string()).filter(|item| !item.is_empty()).collect()
    };

    if origins.is_empty() {
        return Ok(DEFAULT_CORS_ORIGINS.iter().map(|origin| origin.to_string()).collect());
    }
    Ok(origins)
}
