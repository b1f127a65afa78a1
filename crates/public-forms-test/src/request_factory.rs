//! Request factory for building [`HttpRequest`] objects in tests.
//!
//! [`RequestFactory`] builds requests directly, the way the host would hand
//! them to a content block after its middleware ran.
//!
//! ## Example
//!
//! ```
//! use public_forms_test::request_factory::RequestFactory;
//!
//! let factory = RequestFactory::new();
//! let request = factory.post("/", "home_main_0_create", &[("home_main_0_create-title", "Hi")]);
//! assert_eq!(request.method(), &http::Method::POST);
//! assert!(request.has_param("home_main_0_create"));
//! assert_eq!(request.post().get("home_main_0_create-title"), Some("Hi"));
//! ```

use http::Method;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

use public_forms_http::{HttpRequest, RequestUser, SessionData};

/// A factory for [`HttpRequest`] objects.
///
/// Every request built by one factory carries the same user, session and
/// default headers.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    default_headers: Vec<(String, String)>,
    user: RequestUser,
    session: SessionData,
}

impl RequestFactory {
    /// Creates a factory for anonymous requests with an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header to every request.
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Marks every request as an `XMLHttpRequest` that accepts HTML.
    #[must_use]
    pub fn ajax(self) -> Self {
        self.with_default_header("x-requested-with", "XMLHttpRequest")
            .with_default_header("accept", "text/html, */*; q=0.01")
    }

    /// Sets the `Accept-Language` header.
    #[must_use]
    pub fn with_language(self, accept_language: &str) -> Self {
        self.with_default_header("accept-language", accept_language)
    }

    /// Makes every request come from a logged-in user.
    #[must_use]
    pub fn with_user(mut self, id: i64, username: &str) -> Self {
        self.user = RequestUser::authenticated(id, username);
        self
    }

    /// Sets a boolean session flag.
    #[must_use]
    pub fn with_session_flag(mut self, key: &str, value: bool) -> Self {
        self.session.set(key, serde_json::Value::Bool(value));
        self
    }

    /// A plain GET.
    pub fn get(&self, path: &str) -> HttpRequest {
        self.build_request(Method::GET, path, "", None)
    }

    /// A GET carrying `token` as a bare query key.
    pub fn get_owned(&self, path: &str, token: &str) -> HttpRequest {
        self.build_request(Method::GET, path, &encode_key(token), None)
    }

    /// A form-encoded POST to `?{token}`.
    pub fn post(&self, path: &str, token: &str, data: &[(&str, &str)]) -> HttpRequest {
        self.submit(Method::POST, path, token, data)
    }

    /// A form-encoded POST without any token.
    pub fn post_anonymous(&self, path: &str, data: &[(&str, &str)]) -> HttpRequest {
        self.build_request(Method::POST, path, "", Some(encode_form_data(data)))
    }

    /// A form-encoded PUT to `?{token}`.
    pub fn put(&self, path: &str, token: &str, data: &[(&str, &str)]) -> HttpRequest {
        self.submit(Method::PUT, path, token, data)
    }

    /// A DELETE to `?{token}` with an empty body.
    pub fn delete(&self, path: &str, token: &str) -> HttpRequest {
        self.build_request(Method::DELETE, path, &encode_key(token), None)
    }

    /// A form-encoded submission with `method` to `?{token}`.
    pub fn submit(
        &self,
        method: Method,
        path: &str,
        token: &str,
        data: &[(&str, &str)],
    ) -> HttpRequest {
        self.build_request(method, path, &encode_key(token), Some(encode_form_data(data)))
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query_string: &str,
        body: Option<String>,
    ) -> HttpRequest {
        let mut builder = HttpRequest::builder()
            .method(method)
            .path(path)
            .query_string(query_string)
            .meta("SERVER_NAME", "testserver")
            .session(self.session.clone())
            .user(self.user.clone());

        for (name, value) in &self.default_headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = body {
            builder = builder
                .content_type("application/x-www-form-urlencoded")
                .body(body.into_bytes());
        }

        builder.build()
    }
}

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, NON_ALPHANUMERIC).to_string()
}

/// URL-encodes form data as `key=value&key=value`.
pub fn encode_form_data(data: &[(&str, &str)]) -> String {
    data.iter()
        .map(|(k, v)| format!("{}={}", encode_key(k), encode_key(v)))
        .collect::<Vec<_>>()
        .join("&")
}
