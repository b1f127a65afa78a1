//! The CAPTCHA challenge field.
//!
//! A [`CaptchaBackend`] turns a [`ChallengeContext`] into one extra form
//! field. The context carries everything the client-side challenge needs:
//! the UI language, the id of the block's container, the names of the
//! required fields (JSON) and a [`ValidationFlag`] the composition pipeline
//! flips after validating, which the widget reads at render time to show
//! its retry state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use public_forms_core::PublicFormsSettings;
use public_forms_http::HttpRequest;

use crate::fields::{FieldValidator, FormFieldDef, FormFieldType};
use crate::html::{escape_html, render_attrs};
use crate::media::Media;
use crate::widgets::Widget;

/// A shared "did validation fail" cell.
///
/// Clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct ValidationFlag(Arc<AtomicBool>);

impl ValidationFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of validation.
    pub fn set_failed(&self, failed: bool) {
        self.0.store(failed, Ordering::Release);
    }

    /// Returns `true` once a validation attempt has failed.
    pub fn has_failed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Inputs for building a challenge field.
#[derive(Debug, Clone)]
pub struct ChallengeContext {
    /// UI language for the challenge.
    pub language: String,
    /// Block container id (the submission token without its action).
    pub container_id: String,
    /// Required field names as a JSON array.
    pub required_fields_json: String,
    /// Set when the form failed validation.
    pub failure: ValidationFlag,
}

/// Builds the challenge field appended to public forms.
pub trait CaptchaBackend: Send + Sync + fmt::Debug {
    /// Returns the field definition named `name`.
    fn build_field(&self, request: &HttpRequest, name: &str, context: ChallengeContext)
        -> FormFieldDef;
}

/// Renders the challenge container.
#[derive(Debug, Clone)]
pub struct ChallengeWidget {
    context: ChallengeContext,
    js: Vec<String>,
    css: Vec<String>,
}

impl ChallengeWidget {
    /// The context this widget was built with.
    pub const fn context(&self) -> &ChallengeContext {
        &self.context
    }
}

impl Widget for ChallengeWidget {
    fn render(&self, name: &str, _value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let ctx = &self.context;
        format!(
            concat!(
                r#"<div class="captcha" id="{container}_captcha" data-language="{language}" "#,
                r#"data-container="{container}" data-required-fields="{required}" data-retry="{retry}">"#,
                r#"<input type="text" name="{name}" autocomplete="off"{attrs} /></div>"#
            ),
            container = escape_html(&ctx.container_id),
            language = escape_html(&ctx.language),
            required = escape_html(&ctx.required_fields_json),
            retry = ctx.failure.has_failed(),
            name = escape_html(name),
            attrs = render_attrs(attrs),
        )
    }

    fn media(&self) -> Media {
        let mut media = Media::new();
        for path in &self.css {
            media.add_css("all", path.clone());
        }
        for path in &self.js {
            media.add_js(path.clone());
        }
        media
    }
}

/// The default backend: a required text challenge rendered into a
/// container the client script fills in.
///
/// Answers are checked by the optional verifier. Without one any non-empty
/// answer passes, and the real check is left to whatever sets the
/// session's `captcha_passed` flag.
#[derive(Debug, Clone)]
pub struct TemplateCaptcha {
    js: Vec<String>,
    css: Vec<String>,
    verifier: Option<Arc<dyn FieldValidator>>,
}

impl TemplateCaptcha {
    /// Uses the CAPTCHA assets from `settings`.
    pub fn from_settings(settings: &PublicFormsSettings) -> Self {
        Self {
            js: settings
                .captcha_js
                .iter()
                .map(|p| settings.static_path(p))
                .collect(),
            css: settings
                .captcha_css
                .iter()
                .map(|p| settings.static_path(p))
                .collect(),
            verifier: None,
        }
    }

    /// Checks answers with `verifier`.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn FieldValidator>) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

impl CaptchaBackend for TemplateCaptcha {
    fn build_field(
        &self,
        _request: &HttpRequest,
        name: &str,
        context: ChallengeContext,
    ) -> FormFieldDef {
        let widget = ChallengeWidget {
            context,
            js: self.js.clone(),
            css: self.css.clone(),
        };
        let mut field = FormFieldDef::new(name, FormFieldType::Challenge)
            .label("Verification")
            .widget(Arc::new(widget));
        if let Some(verifier) = &self.verifier {
            field = field.validator(Arc::clone(verifier));
        }
        field
    }
}

#[cfg(test)]
mod tests {
    use public_forms_db::Value;

    use super::*;
    use crate::fields::clean_field_value;

    #[derive(Debug)]
    struct Answer(&'static str);

    impl FieldValidator for Answer {
        fn validate(&self, value: &Value) -> Result<(), String> {
            if value == &Value::from(self.0) {
                Ok(())
            } else {
                Err("Wrong answer.".to_string())
            }
        }
    }

    fn context(flag: &ValidationFlag) -> ChallengeContext {
        ChallengeContext {
            language: "de".to_string(),
            container_id: "home_main_0".to_string(),
            required_fields_json: r#"["home_main_0_create-title"]"#.to_string(),
            failure: flag.clone(),
        }
    }

    #[test]
    fn test_flag_is_shared() {
        let flag = ValidationFlag::new();
        let clone = flag.clone();
        assert!(!clone.has_failed());
        flag.set_failed(true);
        assert!(clone.has_failed());
    }

    #[test]
    fn test_widget_renders_context_and_retry_state() {
        let settings = PublicFormsSettings::default();
        let flag = ValidationFlag::new();
        let request = HttpRequest::builder().build();
        let field = TemplateCaptcha::from_settings(&settings).build_field(
            &request,
            "captcha",
            context(&flag),
        );
        assert!(field.required);

        let html = field.widget.render("p-captcha", None, &BTreeMap::new());
        assert!(html.contains(r#"id="home_main_0_captcha""#));
        assert!(html.contains(r#"data-language="de""#));
        assert!(html.contains("data-required-fields=\"[&quot;home_main_0_create-title&quot;]\""));
        assert!(html.contains(r#"data-retry="false""#));
        assert!(html.contains(r#"name="p-captcha""#));

        flag.set_failed(true);
        let html = field.widget.render("p-captcha", None, &BTreeMap::new());
        assert!(html.contains(r#"data-retry="true""#));
    }

    #[test]
    fn test_widget_media_from_settings() {
        let settings = PublicFormsSettings::default();
        let request = HttpRequest::builder().build();
        let field = TemplateCaptcha::from_settings(&settings).build_field(
            &request,
            "captcha",
            context(&ValidationFlag::new()),
        );
        let media = field.widget.media();
        assert_eq!(media.js_files(), ["/static/js/captcha.js"]);
        assert_eq!(
            media.css_files(),
            vec![("all".to_string(), "/static/css/captcha.css".to_string())]
        );
    }

    #[test]
    fn test_verifier() {
        let request = HttpRequest::builder().build();
        let backend = TemplateCaptcha::from_settings(&PublicFormsSettings::default())
            .with_verifier(Arc::new(Answer("42")));
        let field = backend.build_field(&request, "captcha", context(&ValidationFlag::new()));
        assert!(clean_field_value(&field, Some("42")).is_ok());
        assert_eq!(
            clean_field_value(&field, Some("41")).unwrap_err(),
            vec!["Wrong answer."]
        );
        assert!(clean_field_value(&field, None).is_err());
    }
}
