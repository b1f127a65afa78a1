//! The user attached to a request.

/// The authentication state of the user making a request.
///
/// The host's authentication middleware resolves this before any content
/// block sees the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestUser {
    /// No user is logged in.
    #[default]
    Anonymous,
    /// A logged-in user.
    Authenticated {
        /// Primary key of the user row.
        id: i64,
        /// The username.
        username: String,
    },
}

impl RequestUser {
    /// Creates an authenticated user.
    pub fn authenticated(id: i64, username: impl Into<String>) -> Self {
        Self::Authenticated {
            id,
            username: username.into(),
        }
    }

    /// Returns `true` for a logged-in user.
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// Returns `true` for an anonymous user.
    pub const fn is_anonymous(&self) -> bool {
        !self.is_authenticated()
    }

    /// Returns the username, or an empty string for anonymous users.
    pub fn get_username(&self) -> &str {
        match self {
            Self::Anonymous => "",
            Self::Authenticated { username, .. } => username,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_default() {
        let user = RequestUser::default();
        assert!(user.is_anonymous());
        assert!(!user.is_authenticated());
        assert_eq!(user.get_username(), "");
    }

    #[test]
    fn test_authenticated() {
        let user = RequestUser::authenticated(7, "editor");
        assert!(user.is_authenticated());
        assert_eq!(user.get_username(), "editor");
    }
}
