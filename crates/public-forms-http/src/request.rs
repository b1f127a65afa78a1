//! HTTP request type.
//!
//! [`HttpRequest`] carries what a content block may read: method, path,
//! headers, GET and POST parameters, plus the session and user that the
//! host's middleware attached. Requests are built with [`HttpRequestBuilder`].

use std::collections::HashMap;

use http::{HeaderMap, Method};

use crate::querydict::QueryDict;
use crate::session::SessionData;
use crate::user::RequestUser;

/// MIME types that mark a client as wanting an HTML fragment back.
const HTML_MIME_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

/// An incoming HTTP request.
///
/// # Examples
///
/// ```
/// use public_forms_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::POST)
///     .path("/contact/")
///     .query_string("contact_main_0_create")
///     .content_type("application/x-www-form-urlencoded")
///     .body(b"contact_main_0_create-name=Ada".to_vec())
///     .build();
///
/// assert!(request.has_param("contact_main_0_create"));
/// assert_eq!(request.post().get("contact_main_0_create-name"), Some("Ada"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    get: QueryDict,
    post: QueryDict,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    session: SessionData,
    user: RequestUser,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the query parameters.
    pub const fn get(&self) -> &QueryDict {
        &self.get
    }

    /// Returns the form-encoded body parameters.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns server-level metadata (`REQUEST_METHOD`, `PATH_INFO`, ...).
    pub const fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the session loaded by the host.
    pub const fn session(&self) -> &SessionData {
        &self.session
    }

    /// Returns the session for modification.
    pub fn session_mut(&mut self) -> &mut SessionData {
        &mut self.session
    }

    /// Returns the user resolved by the host.
    pub const fn user(&self) -> &RequestUser {
        &self.user
    }

    /// Returns `true` if `key` is present among the combined GET and POST
    /// parameters. Only presence matters, not the value.
    pub fn has_param(&self, key: &str) -> bool {
        self.get.contains_key(key) || self.post.contains_key(key)
    }

    /// Returns `true` for methods that carry a submission (anything other
    /// than `GET`, `HEAD`, `OPTIONS` and `TRACE`).
    pub fn is_submission(&self) -> bool {
        !matches!(
            self.method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
        )
    }

    /// Returns the data a form should bind to, or `None` when this request
    /// does not submit anything.
    pub fn form_data(&self) -> Option<&QueryDict> {
        self.is_submission().then_some(&self.post)
    }

    /// Returns `true` if the request was made via `XMLHttpRequest`.
    pub fn is_ajax(&self) -> bool {
        self.headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    /// Returns `true` if the `Accept` header lists an HTML-family MIME type.
    pub fn accepts_html_fragment(&self) -> bool {
        self.headers
            .get_all(http::header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|item| item.split(';').next().unwrap_or_default().trim())
            .any(|mime| {
                HTML_MIME_TYPES
                    .iter()
                    .any(|html| mime.eq_ignore_ascii_case(html))
            })
    }

    /// Returns the `Accept-Language` entries ordered by quality, highest
    /// first. Entries with equal quality keep header order; `q=0` entries
    /// and `*` are dropped.
    pub fn accept_languages(&self) -> Vec<String> {
        let mut entries: Vec<(String, f32)> = self
            .headers
            .get_all(http::header::ACCEPT_LANGUAGE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|item| {
                let mut parts = item.split(';');
                let tag = parts.next()?.trim();
                if tag.is_empty() || tag == "*" {
                    return None;
                }
                let quality = parts
                    .filter_map(|p| p.trim().strip_prefix("q="))
                    .find_map(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                (quality > 0.0).then(|| (tag.to_string(), quality))
            })
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.into_iter().map(|(tag, _)| tag).collect()
    }

    /// Returns the path followed by `?query` when a query string is present.
    pub fn get_full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    session: SessionData,
    user: RequestUser,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            content_type: None,
            headers: HeaderMap::new(),
            meta: HashMap::new(),
            body: Vec::new(),
            session: SessionData::default(),
            user: RequestUser::Anonymous,
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Adds a META entry.
    #[must_use]
    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Attaches a session.
    #[must_use]
    pub fn session(mut self, session: SessionData) -> Self {
        self.session = session;
        self
    }

    /// Attaches a user.
    #[must_use]
    pub fn user(mut self, user: RequestUser) -> Self {
        self.user = user;
        self
    }

    /// Builds the [`HttpRequest`], parsing the query string and, for
    /// form-urlencoded bodies, the POST data.
    pub fn build(self) -> HttpRequest {
        let get = QueryDict::parse(&self.query_string);

        let post = if self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        {
            QueryDict::parse(&String::from_utf8_lossy(&self.body))
        } else {
            QueryDict::new()
        };

        let mut meta = self.meta;
        meta.entry("REQUEST_METHOD".to_string())
            .or_insert_with(|| self.method.to_string());
        meta.entry("PATH_INFO".to_string())
            .or_insert_with(|| self.path.clone());
        meta.entry("QUERY_STRING".to_string())
            .or_insert_with(|| self.query_string.clone());

        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            content_type: self.content_type,
            get,
            post,
            headers: self.headers,
            meta,
            body: self.body,
            session: self.session,
            user: self.user,
        }
    }
}
