//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with [`PublicFormsSettings::default`].
//! 2. Merge a TOML or JSON document over the defaults.
//! 3. Apply `PUBLIC_FORMS_*` environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `PUBLIC_FORMS_CAPTCHA_FIELD_NAME` | `captcha_field_name` |
//! | `PUBLIC_FORMS_DEFAULT_ENABLE_CAPTCHA_ONCE` | `default_enable_captcha_once` |
//! | `PUBLIC_FORMS_DEFAULT_ENABLE_CAPTCHA_ALWAYS` | `default_enable_captcha_always` |
//! | `PUBLIC_FORMS_DEFAULT_ENABLE_AJAX` | `default_enable_ajax` |
//! | `PUBLIC_FORMS_LANGUAGE_CODE` | `language_code` |
//! | `PUBLIC_FORMS_LANGUAGES` | `languages` (comma-separated) |
//! | `PUBLIC_FORMS_STATIC_URL` | `static_url` |
//! | `PUBLIC_FORMS_EXCLUDE_CONTENT_TYPES` | `exclude_content_types` (comma-separated) |
//! | `PUBLIC_FORMS_DEBUG` | `debug` |
//! | `PUBLIC_FORMS_LOG_LEVEL` | `log_level` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use public_forms_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/public_forms.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::PublicFormsError;
use crate::settings::PublicFormsSettings;

/// Loads settings from a TOML string, keeping defaults for absent keys.
///
/// # Errors
///
/// Returns [`PublicFormsError::ConfigurationError`] if the TOML is malformed
/// or a value has the wrong type.
pub fn from_toml_str(toml_str: &str) -> Result<PublicFormsSettings, PublicFormsError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| PublicFormsError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<PublicFormsSettings, PublicFormsError> {
    let content = read_config(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(
    path: impl AsRef<Path>,
) -> Result<PublicFormsSettings, PublicFormsError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string, keeping defaults for absent keys.
///
/// # Errors
///
/// Returns [`PublicFormsError::ConfigurationError`] if the JSON is malformed
/// or a value has the wrong type.
pub fn from_json_str(json_str: &str) -> Result<PublicFormsSettings, PublicFormsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| PublicFormsError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<PublicFormsSettings, PublicFormsError> {
    let content = read_config(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from environment variables only, starting from defaults.
pub fn from_env() -> PublicFormsSettings {
    let mut settings = PublicFormsSettings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `PUBLIC_FORMS_*` environment variable overrides.
pub fn apply_env_overrides(settings: &mut PublicFormsSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Applies overrides from an arbitrary variable source.
///
/// [`apply_env_overrides`] is this function over `std::env::var`; tests use
/// it with a map so they do not race on the process environment.
pub fn apply_overrides(
    settings: &mut PublicFormsSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(val) = lookup("PUBLIC_FORMS_CAPTCHA_FIELD_NAME") {
        settings.captcha_field_name = val;
    }
    if let Some(val) = lookup("PUBLIC_FORMS_DEFAULT_ENABLE_CAPTCHA_ONCE") {
        settings.default_enable_captcha_once = parse_bool(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_DEFAULT_ENABLE_CAPTCHA_ALWAYS") {
        settings.default_enable_captcha_always = parse_bool(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_DEFAULT_ENABLE_AJAX") {
        settings.default_enable_ajax = parse_bool(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_LANGUAGE_CODE") {
        settings.language_code = val;
    }
    if let Some(val) = lookup("PUBLIC_FORMS_LANGUAGES") {
        settings.languages = split_list(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_STATIC_URL") {
        settings.static_url = val;
    }
    if let Some(val) = lookup("PUBLIC_FORMS_EXCLUDE_CONTENT_TYPES") {
        settings.exclude_content_types = split_list(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_DEBUG") {
        settings.debug = parse_bool(&val);
    }
    if let Some(val) = lookup("PUBLIC_FORMS_LOG_LEVEL") {
        settings.log_level = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, kind: &str) -> Result<String, PublicFormsError> {
    std::fs::read_to_string(path).map_err(|e| {
        PublicFormsError::ConfigurationError(format!(
            "Failed to read {kind} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(
    overrides: serde_json::Value,
    kind: &str,
) -> Result<PublicFormsSettings, PublicFormsError> {
    let defaults = serde_json::to_value(PublicFormsSettings::default()).map_err(|e| {
        PublicFormsError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;
    let merged = merge_json(defaults, overrides);
    serde_json::from_value(merged).map_err(|e| {
        PublicFormsError::ConfigurationError(format!("Failed to deserialize settings from {kind}: {e}"))
    })
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values; `override_val` wins.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = match base_map.remove(&key) {
                    Some(base_v) => merge_json(base_v, override_v),
                    None => override_v,
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
