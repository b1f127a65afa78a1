//! Content-type registry.
//!
//! Content blocks reference their target model by label (`"app.model"`).
//! The [`ContentTypeRegistry`] resolves those labels to `'static` metadata
//! and refuses models the site excluded from public forms.

use indexmap::IndexMap;

use public_forms_core::{PublicFormsError, PublicFormsResult, PublicFormsSettings};

use crate::model::ModelMeta;

/// Resolves model labels to their metadata.
#[derive(Debug, Default)]
pub struct ContentTypeRegistry {
    models: IndexMap<String, &'static ModelMeta>,
    excluded: Vec<String>,
}

impl ContentTypeRegistry {
    /// Creates an empty registry honoring `settings.exclude_content_types`.
    pub fn new(settings: &PublicFormsSettings) -> Self {
        Self {
            models: IndexMap::new(),
            excluded: settings
                .exclude_content_types
                .iter()
                .map(|l| l.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Registers a model.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::ImproperlyConfigured`] if the model's label
    /// is excluded in the settings.
    pub fn register(&mut self, meta: &'static ModelMeta) -> PublicFormsResult<()> {
        let label = meta.label().to_ascii_lowercase();
        if self.excluded.contains(&label) {
            return Err(PublicFormsError::ImproperlyConfigured(format!(
                "Content type '{label}' is excluded from public forms"
            )));
        }
        tracing::debug!(label = %label, "registered content type");
        self.models.insert(label, meta);
        Ok(())
    }

    /// Resolves a label (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::UnknownContentType`] for unregistered labels.
    pub fn get(&self, label: &str) -> PublicFormsResult<&'static ModelMeta> {
        self.models
            .get(&label.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| PublicFormsError::UnknownContentType(label.to_string()))
    }

    /// Returns `true` if `label` is registered.
    pub fn contains(&self, label: &str) -> bool {
        self.models.contains_key(&label.to_ascii_lowercase())
    }

    /// Returns the registered labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// Returns the registered models in registration order.
    pub fn models(&self) -> impl Iterator<Item = &'static ModelMeta> + '_ {
        self.models.values().copied()
    }
}
