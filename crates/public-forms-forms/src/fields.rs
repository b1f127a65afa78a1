//! Form field definitions and value cleaning.
//!
//! A [`FormFieldDef`] pairs a [`FormFieldType`] (which decides how raw input
//! is parsed) with a widget, a required flag, an optional initial value and
//! any number of extra [`FieldValidator`]s.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use public_forms_db::Value;

use crate::widgets::{CheckboxInput, Input, Select, Widget};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid regex"));
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));

/// How raw input for a field is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum FormFieldType {
    /// Free text.
    Char {
        /// Minimum length in characters.
        min_length: Option<usize>,
        /// Maximum length in characters.
        max_length: Option<usize>,
        /// Whether surrounding whitespace is stripped.
        strip: bool,
    },
    /// Whole number.
    Integer {
        /// Inclusive lower bound.
        min_value: Option<i64>,
        /// Inclusive upper bound.
        max_value: Option<i64>,
    },
    /// Floating-point number.
    Float {
        /// Inclusive lower bound.
        min_value: Option<f64>,
        /// Inclusive upper bound.
        max_value: Option<f64>,
    },
    /// Checkbox.
    Boolean,
    /// `YYYY-MM-DD`.
    Date,
    /// `YYYY-MM-DDTHH:MM[:SS]` or with a space separator.
    DateTime,
    /// Email address.
    Email,
    /// `http(s)` URL.
    Url,
    /// Letters, digits, hyphens and underscores.
    Slug,
    /// One of a fixed set of string values.
    Choice {
        /// `(value, label)` pairs.
        choices: Vec<(String, String)>,
    },
    /// A CAPTCHA response. Cleaned like text; verification is done by the
    /// field's validators.
    Challenge,
    /// Renders markup only. Never required, never validated and never part
    /// of the cleaned data.
    Markup,
}

impl FormFieldType {
    /// Plain text with whitespace stripping.
    pub const fn char() -> Self {
        Self::Char {
            min_length: None,
            max_length: None,
            strip: true,
        }
    }

    /// What an empty optional submission cleans to.
    pub fn empty_value(&self) -> Value {
        match self {
            Self::Char { .. }
            | Self::Email
            | Self::Url
            | Self::Slug
            | Self::Choice { .. }
            | Self::Challenge => Value::String(String::new()),
            _ => Value::Null,
        }
    }

    /// Returns the widget a field of this type uses unless told otherwise.
    pub fn default_widget(&self) -> Arc<dyn Widget> {
        match self {
            Self::Char { .. } | Self::Challenge => Arc::new(Input::text()),
            Self::Integer { .. } | Self::Float { .. } => Arc::new(Input::number()),
            Self::Boolean => Arc::new(CheckboxInput),
            Self::Date => Arc::new(Input::date()),
            Self::DateTime => Arc::new(Input::datetime()),
            Self::Email => Arc::new(Input::email()),
            Self::Url => Arc::new(Input::url()),
            Self::Slug => Arc::new(Input::text()),
            Self::Choice { choices } => Arc::new(Select::new(choices.clone())),
            Self::Markup => Arc::new(Input::hidden()),
        }
    }
}

/// An extra check run on a cleaned value.
pub trait FieldValidator: Send + Sync + fmt::Debug {
    /// Returns an error message if `value` is not acceptable.
    fn validate(&self, value: &Value) -> Result<(), String>;
}

/// Definition of one form field.
///
/// # Examples
///
/// ```
/// use public_forms_forms::fields::{FormFieldDef, FormFieldType};
///
/// let email = FormFieldDef::new("email", FormFieldType::Email)
///     .label("Your email")
///     .help_text("We never share it.");
/// assert!(email.required);
/// assert_eq!(email.label, "Your email");
/// ```
#[derive(Debug, Clone)]
pub struct FormFieldDef {
    /// Field name (the form prefix is added when rendering and binding).
    pub name: String,
    /// How raw input is parsed.
    pub field_type: FormFieldType,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Value shown when the form is unbound.
    pub initial: Option<Value>,
    /// Label text.
    pub label: String,
    /// Help text shown under the widget.
    pub help_text: String,
    /// The widget that renders this field.
    pub widget: Arc<dyn Widget>,
    /// Extra checks run after parsing.
    pub validators: Vec<Arc<dyn FieldValidator>>,
    /// Overrides for built-in messages, keyed by code (`"required"`).
    pub error_messages: HashMap<String, String>,
    /// Disabled fields ignore submitted data and keep their initial value.
    pub disabled: bool,
}

impl FormFieldDef {
    /// Creates a required field with the type's default widget.
    pub fn new(name: impl Into<String>, field_type: FormFieldType) -> Self {
        let name = name.into();
        let label = capitalize(&name.replace('_', " "));
        let required = !matches!(field_type, FormFieldType::Boolean | FormFieldType::Markup);
        Self {
            widget: field_type.default_widget(),
            name,
            field_type,
            required,
            initial: None,
            label,
            help_text: String::new(),
            validators: Vec::new(),
            error_messages: HashMap::new(),
            disabled: false,
        }
    }

    /// Sets whether the field is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the initial value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Replaces the widget.
    #[must_use]
    pub fn widget(mut self, widget: Arc<dyn Widget>) -> Self {
        self.widget = widget;
        self
    }

    /// Adds a validator.
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Overrides a built-in error message.
    #[must_use]
    pub fn error_message(mut self, code: &str, message: impl Into<String>) -> Self {
        self.error_messages.insert(code.to_string(), message.into());
        self
    }

    /// Sets whether the field is disabled.
    #[must_use]
    pub const fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn message(&self, code: &str, default: &str) -> String {
        self.error_messages
            .get(code)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Parses and validates a raw submitted value.
///
/// Empty optional fields clean to the type's empty value: `""` for
/// text-like fields, `Null` otherwise. The initial value only seeds the
/// unbound form.
pub fn clean_field_value(field: &FormFieldDef, raw: Option<&str>) -> Result<Value, Vec<String>> {
    if field.field_type == FormFieldType::Markup {
        return Ok(Value::Null);
    }
    let raw_str = raw.unwrap_or("");

    if matches!(field.field_type, FormFieldType::Boolean) {
        let checked = matches!(
            raw_str.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        );
        if field.required && !checked {
            return Err(vec![field.message("required", "This field is required.")]);
        }
        return Ok(Value::Bool(checked));
    }

    let is_empty = raw_str.trim().is_empty();
    if is_empty {
        if field.required {
            return Err(vec![field.message("required", "This field is required.")]);
        }
        return Ok(field.field_type.empty_value());
    }

    let mut errors = Vec::new();
    let value = match &field.field_type {
        FormFieldType::Char {
            min_length,
            max_length,
            strip,
        } => {
            let s = if *strip { raw_str.trim() } else { raw_str };
            let len = s.chars().count();
            if let Some(min) = min_length.filter(|min| len < *min) {
                errors.push(format!(
                    "Ensure this value has at least {min} characters (it has {len})."
                ));
            }
            if let Some(max) = max_length.filter(|max| len > *max) {
                errors.push(format!(
                    "Ensure this value has at most {max} characters (it has {len})."
                ));
            }
            Value::String(s.to_string())
        }
        FormFieldType::Integer {
            min_value,
            max_value,
        } => match raw_str.trim().parse::<i64>() {
            Ok(n) => {
                if let Some(min) = min_value.filter(|min| n < *min) {
                    errors.push(format!("Ensure this value is greater than or equal to {min}."));
                }
                if let Some(max) = max_value.filter(|max| n > *max) {
                    errors.push(format!("Ensure this value is less than or equal to {max}."));
                }
                Value::Int(n)
            }
            Err(_) => {
                errors.push(field.message("invalid", "Enter a whole number."));
                Value::Null
            }
        },
        FormFieldType::Float {
            min_value,
            max_value,
        } => match raw_str.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => {
                if let Some(min) = min_value.filter(|min| n < *min) {
                    errors.push(format!("Ensure this value is greater than or equal to {min}."));
                }
                if let Some(max) = max_value.filter(|max| n > *max) {
                    errors.push(format!("Ensure this value is less than or equal to {max}."));
                }
                Value::Float(n)
            }
            _ => {
                errors.push(field.message("invalid", "Enter a number."));
                Value::Null
            }
        },
        FormFieldType::Date => {
            match chrono::NaiveDate::parse_from_str(raw_str.trim(), "%Y-%m-%d") {
                Ok(d) => Value::Date(d),
                Err(_) => {
                    errors.push(field.message("invalid", "Enter a valid date (YYYY-MM-DD)."));
                    Value::Null
                }
            }
        }
        FormFieldType::DateTime => match parse_datetime(raw_str.trim()) {
            Some(dt) => Value::DateTime(dt),
            None => {
                errors.push(field.message("invalid", "Enter a valid date/time."));
                Value::Null
            }
        },
        FormFieldType::Email => {
            let s = raw_str.trim();
            if !EMAIL_RE.is_match(s) {
                errors.push(field.message("invalid", "Enter a valid email address."));
            }
            Value::String(s.to_string())
        }
        FormFieldType::Url => {
            let s = raw_str.trim();
            if !URL_RE.is_match(s) {
                errors.push(field.message("invalid", "Enter a valid URL."));
            }
            Value::String(s.to_string())
        }
        FormFieldType::Slug => {
            let s = raw_str.trim();
            if !SLUG_RE.is_match(s) {
                errors.push(field.message(
                    "invalid",
                    "Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.",
                ));
            }
            Value::String(s.to_string())
        }
        FormFieldType::Choice { choices } => {
            if !choices.iter().any(|(v, _)| v == raw_str) {
                errors.push(format!(
                    "Select a valid choice. {raw_str} is not one of the available choices."
                ));
            }
            Value::String(raw_str.to_string())
        }
        FormFieldType::Challenge => Value::String(raw_str.trim().to_string()),
        FormFieldType::Boolean | FormFieldType::Markup => Value::Null,
    };

    if errors.is_empty() {
        errors.extend(
            field
                .validators
                .iter()
                .filter_map(|validator| validator.validate(&value).err()),
        );
    }

    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn parse_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(s, fmt).ok())
}
