//! Query string dictionary for request parameters.
//!
//! [`QueryDict`] wraps [`MultiValueDict`] with form-urlencoded parsing and
//! encoding. Like Django's `QueryDict` it is immutable unless created with
//! [`new_mutable`](QueryDict::new_mutable) or [`copy`](QueryDict::copy).
//! A bare key (`?home_main_0_create`) is stored with an empty value, so
//! key presence can be tested independently of the value.

use public_forms_core::utils::MultiValueDict;
use public_forms_core::{PublicFormsError, PublicFormsResult};

/// An immutable-by-default dictionary for query string and form data.
///
/// # Examples
///
/// ```
/// use public_forms_http::QueryDict;
///
/// let qd = QueryDict::parse("home_main_0_create&title=Hello+World&tag=a&tag=b");
/// assert!(qd.contains_key("home_main_0_create"));
/// assert_eq!(qd.get("title"), Some("Hello World"));
/// assert_eq!(qd.get("tag"), Some("b"));
///
/// let mut mutable = qd.copy();
/// mutable.set("title", "Changed").unwrap();
/// assert_eq!(mutable.get("title"), Some("Changed"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    data: MultiValueDict<String, String>,
    mutable: bool,
}

impl QueryDict {
    /// Creates a new, empty, immutable `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty, mutable `QueryDict`.
    pub fn new_mutable() -> Self {
        Self {
            data: MultiValueDict::new(),
            mutable: true,
        }
    }

    /// Parses a form-urlencoded string into an immutable `QueryDict`.
    ///
    /// `+` decodes to a space and percent escapes are decoded as UTF-8
    /// (lossily). Empty pairs (`a=1&&b=2`) are skipped.
    pub fn parse(query_string: &str) -> Self {
        let data = query_string
            .trim_start_matches('?')
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (percent_decode(key), percent_decode(value))
            })
            .collect();
        Self {
            data,
            mutable: false,
        }
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(&key.to_string()).map(String::as_str)
    }

    /// Returns all values for the given key.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get_list(&key.to_string())
    }

    /// Sets a single value for the given key, replacing any existing values.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::SuspiciousOperation`] if this `QueryDict` is immutable.
    pub fn set(&mut self, key: &str, value: &str) -> PublicFormsResult<()> {
        self.ensure_mutable()?;
        self.data.set(key.to_string(), value.to_string());
        Ok(())
    }

    /// Appends a value to the list for the given key.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::SuspiciousOperation`] if this `QueryDict` is immutable.
    pub fn append(&mut self, key: &str, value: &str) -> PublicFormsResult<()> {
        self.ensure_mutable()?;
        self.data.append(key.to_string(), value.to_string());
        Ok(())
    }

    /// Returns a mutable copy of this `QueryDict`.
    #[must_use]
    pub fn copy(&self) -> Self {
        Self {
            data: self.data.clone(),
            mutable: true,
        }
    }

    /// Encodes this `QueryDict` as a form-urlencoded string, keys in
    /// insertion order. Keys with a single empty value encode bare.
    pub fn urlencode(&self) -> String {
        let mut parts = Vec::new();
        for (key, values) in &self.data {
            let encoded_key = percent_encode(key);
            for value in values {
                if value.is_empty() && values.len() == 1 {
                    parts.push(encoded_key.clone());
                } else {
                    parts.push(format!("{encoded_key}={}", percent_encode(value)));
                }
            }
        }
        parts.join("&")
    }

    /// Returns `true` if this `QueryDict` is mutable.
    pub const fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present, with or without a value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(&key.to_string())
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Returns a reference to the underlying `MultiValueDict`.
    pub const fn data(&self) -> &MultiValueDict<String, String> {
        &self.data
    }

    fn ensure_mutable(&self) -> PublicFormsResult<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(PublicFormsError::SuspiciousOperation(
                "This QueryDict instance is immutable".to_string(),
            ))
        }
    }
}

fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}
