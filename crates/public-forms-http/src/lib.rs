//! # public-forms-http
//!
//! The slice of the host framework's HTTP layer that content blocks read:
//! the request (with its parameters, headers, session and user) and the
//! response types a block may hand back.

pub mod querydict;
pub mod request;
pub mod response;
pub mod session;
pub mod user;

pub use querydict::QueryDict;
pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{HttpResponse, HttpResponseRedirect};
pub use session::SessionData;
pub use user::RequestUser;
