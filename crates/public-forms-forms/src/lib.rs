//! # public-forms-forms
//!
//! The form machinery content blocks compose: typed form fields with
//! validation, widgets that render HTML and declare static assets, model
//! forms bound to a [`Record`](public_forms_db::Record), inline formsets for
//! child rows, and the two special fields a public form may gain at runtime
//! (the CAPTCHA challenge and the AJAX init script).

pub mod ajax;
pub mod challenge;
pub mod fields;
pub mod form;
pub mod formset;
pub mod html;
pub mod media;
pub mod model_form;
pub mod validation;
pub mod widgets;

pub use challenge::{CaptchaBackend, ChallengeContext, TemplateCaptcha, ValidationFlag};
pub use fields::{FieldValidator, FormFieldDef, FormFieldType};
pub use form::{BaseForm, Form};
pub use formset::{InlineFormSet, InlineFormSetConfig};
pub use media::Media;
pub use model_form::{ModelForm, ModelFormClass, ModelFormConfig, ModelFormKind};
pub use widgets::Widget;
