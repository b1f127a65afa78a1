//! # public-forms-db
//!
//! The model layer content blocks operate on: field and model metadata, a
//! dynamic [`Record`](model::Record) for any model's row, a registry that
//! resolves `app.model` labels, and the async [`ModelStore`](store::ModelStore)
//! through which target rows are read and written.

pub mod fields;
pub mod model;
pub mod registry;
pub mod store;
pub mod value;

pub use fields::{FieldDef, FieldType, OnDelete};
pub use model::{ModelMeta, Record};
pub use registry::ContentTypeRegistry;
pub use store::{InMemoryStore, ModelStore};
pub use value::Value;
