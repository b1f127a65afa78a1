//! The host page and the content blocks placed on it.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use public_forms_core::PublicFormsSettings;

/// A CMS page as seen by its public-form blocks.
///
/// Shared with the host behind an `Arc`. Preparing any block flips
/// [`Page::contains_forms`], which hosts use to disable page caching.
#[derive(Debug, Default)]
pub struct Page {
    /// URL slug; the first part of every block token.
    pub slug: String,
    /// Page title.
    pub title: String,
    /// The page's canonical URL.
    pub url: String,
    /// Region keys in template order.
    pub regions: Vec<String>,
    contains_forms: AtomicBool,
}

impl Page {
    /// Creates a page.
    pub fn new(slug: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the regions.
    #[must_use]
    pub fn with_regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| (*r).to_string()).collect();
        self
    }

    /// Returns `true` once a public-form block was prepared on this page.
    pub fn contains_forms(&self) -> bool {
        self.contains_forms.load(Ordering::Acquire)
    }

    pub(crate) fn mark_contains_forms(&self) {
        self.contains_forms.store(true, Ordering::Release);
    }
}

/// A reference to the row a block acts on: a model label plus an optional
/// primary key (create blocks have none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    /// Model label, `"app.model"`.
    pub content_type: String,
    /// Primary key of the target row.
    pub object_id: Option<i64>,
}

impl TargetRef {
    /// Creates a reference.
    pub fn new(content_type: impl Into<String>, object_id: Option<i64>) -> Self {
        Self {
            content_type: content_type.into(),
            object_id,
        }
    }
}

/// One public-form block placed in a page region.
///
/// Blocks are authored in the CMS and never changed by form submissions;
/// only their target row is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Region key.
    pub region: String,
    /// Position within the region.
    pub ordering: u32,
    /// Renderer variation name, e.g. `"UpdatePublicForm"`.
    pub variation: String,
    /// Ask anonymous users for a CAPTCHA until they solve one.
    pub enable_captcha_once: bool,
    /// Ask anonymous users for a CAPTCHA on every render.
    pub enable_captcha_always: bool,
    /// Submit the block's form over XHR.
    pub enable_ajax: bool,
    /// The row acted on.
    pub target: TargetRef,
}

impl ContentBlock {
    /// Creates a block with the built-in flag defaults.
    pub fn new(
        region: impl Into<String>,
        ordering: u32,
        variation: impl Into<String>,
        target: TargetRef,
    ) -> Self {
        Self::with_settings(region, ordering, variation, target, &PublicFormsSettings::default())
    }

    /// Creates a block whose flags default from `settings`.
    pub fn with_settings(
        region: impl Into<String>,
        ordering: u32,
        variation: impl Into<String>,
        target: TargetRef,
        settings: &PublicFormsSettings,
    ) -> Self {
        Self {
            region: region.into(),
            ordering,
            variation: variation.into(),
            enable_captcha_once: settings.default_enable_captcha_once,
            enable_captcha_always: settings.default_enable_captcha_always,
            enable_ajax: settings.default_enable_ajax,
            target,
        }
    }

    /// Sets `enable_captcha_once`.
    #[must_use]
    pub fn captcha_once(mut self, enabled: bool) -> Self {
        self.enable_captcha_once = enabled;
        self
    }

    /// Sets `enable_captcha_always`.
    #[must_use]
    pub fn captcha_always(mut self, enabled: bool) -> Self {
        self.enable_captcha_always = enabled;
        self
    }

    /// Sets `enable_ajax`.
    #[must_use]
    pub fn ajax(mut self, enabled: bool) -> Self {
        self.enable_ajax = enabled;
        self
    }
}
