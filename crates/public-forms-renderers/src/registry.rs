//! Variation name to renderer configuration.
//!
//! A content block names its renderer by variation (`"UpdatePublicForm"`).
//! The registry is built by the host and passed in explicitly; looking a
//! variation up yields a fresh [`RendererConfig`] for one request.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use public_forms_core::{PublicFormsError, PublicFormsResult};

use crate::renderer::RendererConfig;

/// Builds the configuration for one variation.
pub type VariationFactory = Arc<dyn Fn() -> RendererConfig + Send + Sync>;

/// Maps variation names to configuration factories.
///
/// # Examples
///
/// ```
/// use public_forms_renderers::{RendererConfig, SubmitAction, VariationRegistry};
///
/// let mut registry = VariationRegistry::with_defaults();
/// registry.register("ContactForm", || {
///     RendererConfig::create().fields(&["email", "message"])
/// });
///
/// let config = registry.resolve("ContactForm").unwrap();
/// assert_eq!(config.action, SubmitAction::Create);
/// assert!(registry.resolve("Nope").is_err());
/// ```
#[derive(Clone, Default)]
pub struct VariationRegistry {
    factories: IndexMap<String, VariationFactory>,
}

impl VariationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the three stock variations:
    /// `CreatePublicForm`, `UpdatePublicForm` and `DeletePublicForm`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("CreatePublicForm", RendererConfig::create);
        registry.register("UpdatePublicForm", RendererConfig::update);
        registry.register("DeletePublicForm", RendererConfig::delete);
        registry
    }

    /// Registers (or replaces) a variation.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> RendererConfig + Send + Sync + 'static,
    ) {
        let name = name.into();
        tracing::debug!(variation = %name, "registered renderer variation");
        self.factories.insert(name, Arc::new(factory));
    }

    /// Builds the configuration for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::UnknownVariation`] for unregistered names.
    pub fn resolve(&self, name: &str) -> PublicFormsResult<RendererConfig> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| PublicFormsError::UnknownVariation(name.to_string()))
    }

    /// Returns `true` if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for VariationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariationRegistry")
            .field("variations", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
