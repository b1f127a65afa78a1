//! HTTP response types.
//!
//! Content blocks hand back at most two kinds of response: a 200 HTML page
//! or fragment, and a 302 redirect after a successful submission.

use http::{HeaderMap, HeaderValue, StatusCode};

/// An HTTP response with a text body.
///
/// # Examples
///
/// ```
/// use public_forms_http::HttpResponse;
///
/// let response = HttpResponse::ok("<p>saved</p>");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.text(), "<p>saved</p>");
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    content: String,
    content_type: String,
}

impl HttpResponse {
    /// Creates a response with the given status and `text/html` body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: body.into(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the headers for modification.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the content type (without charset).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body text.
    pub fn text(&self) -> &str {
        &self.content
    }

    /// Returns the body as bytes.
    pub fn content_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Returns `true` for 3xx responses.
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    /// Returns the `Location` header, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// A 302 Found redirect.
pub struct HttpResponseRedirect;

impl HttpResponseRedirect {
    /// Creates a 302 Found redirect to `url`. A URL that is not a valid
    /// header value yields a redirect without `Location`.
    pub fn new(url: &str) -> HttpResponse {
        let mut response = HttpResponse::new(StatusCode::FOUND, "");
        if let Ok(value) = HeaderValue::from_str(url) {
            response.headers.insert(http::header::LOCATION, value);
        }
        response
    }
}
