//! Submission ownership.
//!
//! Each block on a page names its submit button with a token built from
//! the page slug, the block's region and ordering, and the action. A request
//! "owns" a block when that token is one of its GET or POST keys. Only the
//! key's presence counts, never its value, and the method is irrelevant, so
//! a page re-rendered after a failed POST still knows which block spoke.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use public_forms_core::PublicFormsError;
use public_forms_http::HttpRequest;

/// Unreserved URL characters stay readable in the form's `action`.
const QUERY_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

/// What a block does to its target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitAction {
    /// Inserts a new row.
    Create,
    /// Edits an existing row.
    Update,
    /// Deletes an existing row.
    Delete,
}

impl SubmitAction {
    /// The token suffix: `create`, `update` or `delete`.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Label of the submit button.
    pub const fn submit_label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Save",
            Self::Delete => "Delete",
        }
    }

    /// Whether the block edits an existing row.
    pub const fn needs_target(self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

impl fmt::Display for SubmitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for SubmitAction {
    type Err = PublicFormsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(PublicFormsError::ConfigurationError(format!(
                "unknown submit action '{other}'"
            ))),
        }
    }
}

/// The ownership token of one block: `{page_slug}_{region}_{ordering}_{action}`.
///
/// The token doubles as the HTML name prefix of every field the block
/// renders. The part before the action is the block's container id.
///
/// # Examples
///
/// ```
/// use public_forms_renderers::ownership::{SubmitAction, SubmitToken};
///
/// let token = SubmitToken::new("home", "first_col", 0, SubmitAction::Create);
/// assert_eq!(token.as_str(), "home_first_col_0_create");
/// assert_eq!(token.container_id(), "home_first_col_0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmitToken {
    container: String,
    action: SubmitAction,
    token: String,
}

impl SubmitToken {
    /// Builds the token for a block.
    pub fn new(page_slug: &str, region: &str, ordering: u32, action: SubmitAction) -> Self {
        let container = format!("{page_slug}_{region}_{ordering}");
        let token = format!("{container}_{action}");
        Self {
            container,
            action,
            token,
        }
    }

    /// The full token.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The token without its action suffix.
    pub fn container_id(&self) -> &str {
        &self.container
    }

    /// The action.
    pub const fn action(&self) -> SubmitAction {
        self.action
    }

    /// The token percent-encoded for use as a bare query-string key.
    pub fn query_key(&self) -> String {
        utf8_percent_encode(&self.token, QUERY_KEY).to_string()
    }

    /// Returns `true` if the token is a GET or POST key of `request`.
    pub fn is_owner(&self, request: &HttpRequest) -> bool {
        request.has_param(&self.token)
    }
}

impl fmt::Display for SubmitToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;

    fn token() -> SubmitToken {
        SubmitToken::new("home", "first_col", 0, SubmitAction::Create)
    }

    #[test]
    fn test_bare_query_key_owns() {
        let request = HttpRequest::builder()
            .query_string("home_first_col_0_create")
            .build();
        assert!(token().is_owner(&request));
    }

    #[test]
    fn test_absent_key_does_not_own() {
        let request = HttpRequest::builder().query_string("other=1").build();
        assert!(!token().is_owner(&request));
    }

    #[test]
    fn test_other_action_does_not_own() {
        let request = HttpRequest::builder()
            .query_string("home_first_col_0_update")
            .build();
        assert!(!token().is_owner(&request));
    }

    #[test]
    fn test_method_is_irrelevant() {
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            let request = HttpRequest::builder()
                .method(method.clone())
                .query_string("home_first_col_0_create=")
                .build();
            assert!(token().is_owner(&request), "{method}");
        }
    }

    #[test]
    fn test_body_key_owns() {
        let request = HttpRequest::builder()
            .method(Method::POST)
            .content_type("application/x-www-form-urlencoded")
            .body(b"home_first_col_0_create=Create".to_vec())
            .build();
        assert!(token().is_owner(&request));
    }

    #[test]
    fn test_blocks_in_different_slots_never_collide() {
        let a = SubmitToken::new("home", "main", 1, SubmitAction::Update);
        let b = SubmitToken::new("home", "main", 10, SubmitAction::Update);
        let request = HttpRequest::builder().query_string(a.as_str()).build();
        assert!(a.is_owner(&request));
        assert!(!b.is_owner(&request));
    }

    #[test]
    fn test_action_parse_and_display() {
        assert_eq!("delete".parse::<SubmitAction>().unwrap(), SubmitAction::Delete);
        assert!("remove".parse::<SubmitAction>().is_err());
        assert_eq!(SubmitAction::Update.to_string(), "update");
        assert!(SubmitAction::Update.needs_target());
        assert!(!SubmitAction::Create.needs_target());
    }

    #[test]
    fn test_query_key_survives_reserved_characters() {
        assert_eq!(token().query_key(), "home_first_col_0_create");

        let token = SubmitToken::new("q&a+faq#top", "main", 2, SubmitAction::Update);
        assert_eq!(token.query_key(), "q%26a%2Bfaq%23top_main_2_update");
        let request = HttpRequest::builder()
            .query_string(&token.query_key())
            .build();
        assert!(token.is_owner(&request));

        let raw = HttpRequest::builder().query_string(token.as_str()).build();
        assert!(!token.is_owner(&raw));
    }
}
