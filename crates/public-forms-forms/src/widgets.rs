//! Widgets render a single form field as HTML.
//!
//! A widget knows three things: how to draw itself given a name and the
//! current value, how to pull its value back out of submitted data, and
//! which static assets it needs ([`Widget::media`]). Fields hold their widget
//! behind an `Arc<dyn Widget>` so runtime-added fields (the CAPTCHA challenge,
//! the AJAX init script) can bring their own.

use std::collections::BTreeMap;
use std::fmt;

use public_forms_http::QueryDict;

use crate::html::{escape_html, render_attrs};
use crate::media::Media;

/// Renders a form field as HTML.
pub trait Widget: Send + Sync + fmt::Debug {
    /// Renders the widget.
    ///
    /// `value` is the current value as the browser would send it back, or
    /// `None` when the field has neither data nor an initial value.
    fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String;

    /// Extracts the widget's value from submitted data.
    fn value_from_data(&self, data: &QueryDict, name: &str) -> Option<String> {
        data.get(name).map(str::to_string)
    }

    /// Hidden widgets render without a label.
    fn is_hidden(&self) -> bool {
        false
    }

    /// Static assets this widget depends on.
    fn media(&self) -> Media {
        Media::new()
    }
}

/// An `<input>` of a given type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    input_type: &'static str,
}

impl Input {
    /// `<input type="text">`
    pub const fn text() -> Self {
        Self { input_type: "text" }
    }

    /// `<input type="number">`
    pub const fn number() -> Self {
        Self {
            input_type: "number",
        }
    }

    /// `<input type="email">`
    pub const fn email() -> Self {
        Self {
            input_type: "email",
        }
    }

    /// `<input type="url">`
    pub const fn url() -> Self {
        Self { input_type: "url" }
    }

    /// `<input type="date">`
    pub const fn date() -> Self {
        Self { input_type: "date" }
    }

    /// `<input type="datetime-local">`
    pub const fn datetime() -> Self {
        Self {
            input_type: "datetime-local",
        }
    }

    /// `<input type="hidden">`
    pub const fn hidden() -> Self {
        Self {
            input_type: "hidden",
        }
    }

    /// Returns the `type` attribute.
    pub const fn input_type(&self) -> &'static str {
        self.input_type
    }
}

impl Widget for Input {
    fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let value_attr = value
            .filter(|v| !v.is_empty())
            .map(|v| format!(r#" value="{}""#, escape_html(v)))
            .unwrap_or_default();
        format!(
            r#"<input type="{}" name="{}"{value_attr}{} />"#,
            self.input_type,
            escape_html(name),
            render_attrs(attrs)
        )
    }

    fn is_hidden(&self) -> bool {
        self.input_type == "hidden"
    }
}

/// A `<textarea>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Textarea;

impl Widget for Textarea {
    fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        format!(
            r#"<textarea name="{}" cols="40" rows="10"{}>{}</textarea>"#,
            escape_html(name),
            render_attrs(attrs),
            escape_html(value.unwrap_or(""))
        )
    }
}

/// A checkbox. Unchecked boxes are absent from submitted data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckboxInput;

impl CheckboxInput {
    fn is_checked(value: Option<&str>) -> bool {
        value.is_some_and(|v| {
            !matches!(v.to_ascii_lowercase().as_str(), "" | "false" | "0" | "off" | "no")
        })
    }
}

impl Widget for CheckboxInput {
    fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let checked = if Self::is_checked(value) { " checked" } else { "" };
        format!(
            r#"<input type="checkbox" name="{}"{}{checked} />"#,
            escape_html(name),
            render_attrs(attrs)
        )
    }
}

/// A `<select>` over `(value, label)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Select {
    choices: Vec<(String, String)>,
}

impl Select {
    /// Creates a select with the given choices.
    pub const fn new(choices: Vec<(String, String)>) -> Self {
        Self { choices }
    }
}

impl Widget for Select {
    fn render(&self, name: &str, value: Option<&str>, attrs: &BTreeMap<String, String>) -> String {
        let mut html = format!(r#"<select name="{}"{}>"#, escape_html(name), render_attrs(attrs));
        for (choice_value, label) in &self.choices {
            let selected = if value == Some(choice_value.as_str()) {
                " selected"
            } else {
                ""
            };
            html.push_str(&format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                escape_html(choice_value),
                escape_html(label)
            ));
        }
        html.push_str("</select>");
        html
    }
}
