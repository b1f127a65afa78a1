//! Session data attached to a request.
//!
//! The host's session middleware loads a [`SessionData`] before content
//! blocks run. Values are JSON so any session backend can store them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// The data stored in a single session.
#[derive(Debug, Clone)]
pub struct SessionData {
    /// The key identifying this session.
    pub session_key: String,
    /// Session values keyed by name.
    pub data: HashMap<String, serde_json::Value>,
    /// When this session expires.
    pub expire_date: DateTime<Utc>,
    /// Whether the data changed since it was loaded.
    pub modified: bool,
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl SessionData {
    /// Creates an empty session with a two week lifetime.
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            data: HashMap::new(),
            expire_date: Utc::now() + Duration::weeks(2),
            modified: false,
        }
    }

    /// Gets a value by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Returns `true` only when `key` holds the JSON boolean `true`.
    pub fn get_flag(&self, key: &str) -> bool {
        matches!(self.data.get(key), Some(serde_json::Value::Bool(true)))
    }

    /// Sets a value and marks the session modified.
    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
        self.modified = true;
    }

    /// Removes a value, marking the session modified if it existed.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        let result = self.data.remove(key);
        if result.is_some() {
            self.modified = true;
        }
        result
    }

    /// Returns `true` if the session has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expire_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut s = SessionData::new("abc");
        assert!(!s.modified);
        s.set("captcha_passed", serde_json::Value::Bool(true));
        assert!(s.modified);
        assert_eq!(s.get("captcha_passed"), Some(&serde_json::Value::Bool(true)));
        assert!(s.remove("captcha_passed").is_some());
        assert!(s.get("captcha_passed").is_none());
    }

    #[test]
    fn test_get_flag_requires_true() {
        let mut s = SessionData::default();
        assert!(!s.get_flag("captcha_passed"));
        s.set("captcha_passed", serde_json::json!("true"));
        assert!(!s.get_flag("captcha_passed"));
        s.set("captcha_passed", serde_json::json!(false));
        assert!(!s.get_flag("captcha_passed"));
        s.set("captcha_passed", serde_json::json!(true));
        assert!(s.get_flag("captcha_passed"));
    }

    #[test]
    fn test_new_session_not_expired() {
        assert!(!SessionData::new("k").is_expired());
    }
}
