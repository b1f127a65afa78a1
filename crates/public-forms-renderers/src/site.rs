//! The services every block renders against.

use std::fmt;
use std::sync::Arc;

use public_forms_core::{PublicFormsError, PublicFormsResult, PublicFormsSettings};
use public_forms_db::{ContentTypeRegistry, ModelStore};
use public_forms_forms::{CaptchaBackend, TemplateCaptcha};

/// Settings, storage, the content-type registry and the CAPTCHA backend.
///
/// Cloning is cheap; every handle is reference counted.
#[derive(Clone)]
pub struct Site {
    /// Plugin settings.
    pub settings: Arc<PublicFormsSettings>,
    /// Row storage.
    pub store: Arc<dyn ModelStore>,
    /// Resolves target labels to model metadata.
    pub content_types: Arc<ContentTypeRegistry>,
    /// Builds challenge fields.
    pub captcha: Arc<dyn CaptchaBackend>,
}

impl Site {
    /// Creates a site using [`TemplateCaptcha`].
    pub fn new(
        settings: Arc<PublicFormsSettings>,
        store: Arc<dyn ModelStore>,
        content_types: Arc<ContentTypeRegistry>,
    ) -> Self {
        let captcha = Arc::new(TemplateCaptcha::from_settings(&settings));
        Self {
            settings,
            store,
            content_types,
            captcha,
        }
    }

    /// Replaces the CAPTCHA backend.
    #[must_use]
    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaBackend>) -> Self {
        self.captcha = captcha;
        self
    }

    /// Verifies that every middleware in `settings.required_middleware` is
    /// among `installed`.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::ImproperlyConfigured`] naming the
    /// missing entries.
    pub fn check_middleware(&self, installed: &[&str]) -> PublicFormsResult<()> {
        let missing: Vec<&str> = self
            .settings
            .required_middleware
            .iter()
            .map(String::as_str)
            .filter(|required| !installed.contains(required))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(PublicFormsError::ImproperlyConfigured(format!(
            "public forms need the following middleware: {}",
            missing.join(", ")
        )))
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("settings", &self.settings)
            .field("content_types", &self.content_types)
            .field("captcha", &self.captcha)
            .finish_non_exhaustive()
    }
}
