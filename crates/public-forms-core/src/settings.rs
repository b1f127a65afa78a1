//! Plugin settings.
//!
//! [`PublicFormsSettings`] holds every knob the public-forms plugin reads:
//! the CAPTCHA field name, per-block flag defaults, the supported CAPTCHA
//! languages, static asset paths for the AJAX and CAPTCHA widgets, and the
//! logging configuration. Settings are plain data; callers share them with
//! `Arc` rather than through a global.

use serde::{Deserialize, Serialize};

/// Configuration for the public-forms plugin.
///
/// All fields have defaults, so a settings file only needs to name what it
/// changes (see [`settings_loader`](crate::settings_loader)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicFormsSettings {
    /// Name of the CAPTCHA field injected into challenged forms.
    pub captcha_field_name: String,
    /// Default for a block's `enable_captcha_once` flag.
    pub default_enable_captcha_once: bool,
    /// Default for a block's `enable_captcha_always` flag.
    pub default_enable_captcha_always: bool,
    /// Default for a block's `enable_ajax` flag.
    pub default_enable_ajax: bool,
    /// Site-wide language code, the CAPTCHA language fallback.
    pub language_code: String,
    /// Languages the CAPTCHA widget can be shown in (primary subtags).
    pub languages: Vec<String>,
    /// Prefix for relative static asset paths.
    pub static_url: String,
    /// Scripts declared by the AJAX init widget.
    pub ajax_js: Vec<String>,
    /// Scripts declared by the CAPTCHA widget.
    pub captcha_js: Vec<String>,
    /// Stylesheets declared by the CAPTCHA widget (media type "all").
    pub captcha_css: Vec<String>,
    /// Model labels (`app.model`) that blocks may not target.
    pub exclude_content_types: Vec<String>,
    /// Middleware the plugin depends on being installed by the host.
    pub required_middleware: Vec<String>,
    /// Debug mode; selects the pretty log format.
    pub debug: bool,
    /// Log filter directive (e.g. "info", "public_forms_renderers=debug").
    pub log_level: String,
}

impl Default for PublicFormsSettings {
    fn default() -> Self {
        Self {
            captcha_field_name: "captcha".to_string(),
            default_enable_captcha_once: true,
            default_enable_captcha_always: false,
            default_enable_ajax: false,
            language_code: "en-us".to_string(),
            languages: ["en", "de", "es", "fr", "nl", "pt", "ru", "tr"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            static_url: "/static/".to_string(),
            ajax_js: vec![
                "js/mootools-core.js".to_string(),
                "js/mootools-more-forms.js".to_string(),
                "js/form_ajax_init.js".to_string(),
            ],
            captcha_js: vec!["js/captcha.js".to_string()],
            captcha_css: vec!["css/captcha.css".to_string()],
            exclude_content_types: Vec::new(),
            required_middleware: vec!["sessions.SessionMiddleware".to_string()],
            debug: false,
            log_level: "info".to_string(),
        }
    }
}

impl PublicFormsSettings {
    /// Resolves an asset path against `static_url`.
    ///
    /// Absolute paths (`/...`) and full URLs (`http://`, `https://`, `//`)
    /// are returned unchanged.
    ///
    /// ```
    /// use public_forms_core::PublicFormsSettings;
    ///
    /// let settings = PublicFormsSettings::default();
    /// assert_eq!(settings.static_path("js/a.js"), "/static/js/a.js");
    /// assert_eq!(settings.static_path("/cdn/a.js"), "/cdn/a.js");
    /// ```
    pub fn static_path(&self, path: &str) -> String {
        if path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.static_url.trim_end_matches('/');
        format!("{base}/{path}")
    }

    /// Returns the primary subtag of `language_code` (`"en-us"` -> `"en"`).
    pub fn fallback_language(&self) -> String {
        primary_subtag(&self.language_code)
    }
}

/// Lowercased primary subtag of a language tag (`"pt-BR"` -> `"pt"`).
pub fn primary_subtag(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
