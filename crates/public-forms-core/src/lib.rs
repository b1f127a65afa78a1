//! # public-forms-core
//!
//! Core types shared by every public-forms crate: the error taxonomy, the
//! plugin settings and their loaders, logging setup, and small utilities.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Plugin settings with defaults
//! - [`settings_loader`] - TOML/JSON loading and environment overrides
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Utility types (`MultiValueDict`)

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

pub use error::{PublicFormsError, PublicFormsResult, ValidationError};
pub use settings::PublicFormsSettings;
