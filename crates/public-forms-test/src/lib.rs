//! # public-forms-test
//!
//! Test support for public-forms: a [`RequestFactory`] that builds
//! owning and non-owning requests, and [`fixtures`] with sample models and a
//! ready-made site backed by an in-memory store.

pub mod fixtures;
pub mod request_factory;

pub use fixtures::TestSite;
pub use request_factory::RequestFactory;
