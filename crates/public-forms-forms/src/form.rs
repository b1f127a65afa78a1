//! The [`Form`] trait and its default implementation, [`BaseForm`].
//!
//! Forms follow a bind / validate / read lifecycle:
//!
//! 1. Build the form with its field definitions and optional prefix.
//! 2. [`Form::bind`] submitted data (or leave it unbound to show initial values).
//! 3. Call [`Form::is_valid`]. Validation runs once; later calls return the
//!    cached outcome until the form is bound again.
//! 4. Read [`Form::cleaned_data`] or [`Form::errors`].
//!
//! With a prefix, every field's HTML name becomes `{prefix}-{name}`, which
//! is what lets several forms share one page without their inputs colliding.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use public_forms_db::Value;
use public_forms_http::QueryDict;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::html::{error_list, escape_html};
use crate::media::Media;
use crate::validation::{clean_fields, NON_FIELD_ERRORS};

/// A form: fields, bound data, validation and rendering.
#[async_trait]
pub trait Form: Send + Sync {
    /// The field definitions in display order.
    fn fields(&self) -> &[FormFieldDef];

    /// The HTML name prefix, if any.
    fn prefix(&self) -> Option<&str>;

    /// Binds submitted data, discarding any earlier validation result.
    fn bind(&mut self, data: &QueryDict);

    /// Returns `true` once data has been bound.
    fn is_bound(&self) -> bool;

    /// Validates the bound data. Unbound forms are never valid.
    async fn is_valid(&mut self) -> bool;

    /// Field errors, plus form-wide errors under `"__all__"`.
    fn errors(&self) -> &HashMap<String, Vec<String>>;

    /// Cleaned values of a valid form, keyed by field name.
    fn cleaned_data(&self) -> &HashMap<String, Value>;

    /// Renders all fields as HTML.
    fn render(&self) -> String;

    /// The union of the widgets' media.
    fn media(&self) -> Media;
}

/// A form assembled from field definitions at runtime.
///
/// # Examples
///
/// ```
/// use public_forms_forms::fields::{FormFieldDef, FormFieldType};
/// use public_forms_forms::form::{BaseForm, Form};
/// use public_forms_http::QueryDict;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut form = BaseForm::new(vec![FormFieldDef::new("name", FormFieldType::char())])
///     .with_prefix("home_main_0_create");
/// form.bind(&QueryDict::parse("home_main_0_create-name=Ada"));
/// assert!(form.is_valid().await);
/// assert_eq!(form.cleaned_data()["name"].to_string(), "Ada");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaseForm {
    fields: Vec<FormFieldDef>,
    initial: HashMap<String, Value>,
    prefix: Option<String>,
    bound: bool,
    raw_data: HashMap<String, Option<String>>,
    errors: HashMap<String, Vec<String>>,
    cleaned_data: HashMap<String, Value>,
    validated: Option<bool>,
}

impl BaseForm {
    /// Creates an unbound form.
    pub fn new(fields: Vec<FormFieldDef>) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Sets the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Sets form-level initial values (these win over field initials).
    #[must_use]
    pub fn with_initial(mut self, initial: HashMap<String, Value>) -> Self {
        self.initial = initial;
        self
    }

    /// Appends a field. Bound data for it is picked up on the next bind.
    pub fn add_field(&mut self, field: FormFieldDef) {
        self.fields.push(field);
        self.validated = None;
    }

    /// Returns the HTML name of `field_name`.
    pub fn add_prefix(&self, field_name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}-{field_name}"),
            None => field_name.to_string(),
        }
    }

    /// Returns the `id` attribute of `field_name`'s widget.
    pub fn auto_id(&self, field_name: &str) -> String {
        format!("id_{}", self.add_prefix(field_name))
    }

    /// Returns the form-level initial values.
    pub const fn initial(&self) -> &HashMap<String, Value> {
        &self.initial
    }

    /// Records an error against `field` (or `"__all__"`) and marks the form
    /// invalid. A bound form that has not been validated yet is validated
    /// first so the error survives.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        if self.validated.is_none() {
            self.full_clean();
        }
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
        self.cleaned_data.remove(field);
        if self.bound {
            self.validated = Some(false);
        }
    }

    /// Returns form-wide errors.
    pub fn non_field_errors(&self) -> &[String] {
        self.errors
            .get(NON_FIELD_ERRORS)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// HTML names of the required fields, in display order.
    pub fn required_field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.required)
            .map(|f| self.add_prefix(&f.name))
            .collect()
    }

    /// The initial value of `field` as the widget expects it.
    fn initial_for(&self, field: &FormFieldDef) -> Option<String> {
        self.initial
            .get(&field.name)
            .or(field.initial.as_ref())
            .map(Value::to_form_string)
    }

    /// The value the widget should display.
    fn display_value(&self, field: &FormFieldDef) -> Option<String> {
        if self.bound && !field.disabled {
            self.raw_data.get(&field.name).cloned().flatten()
        } else {
            self.initial_for(field)
        }
    }

    /// Returns `true` if bound data differs from the initial values. Markup
    /// fields and disabled fields never count.
    pub fn has_changed(&self) -> bool {
        self.bound
            && self
                .fields
                .iter()
                .filter(|f| !f.disabled && f.field_type != FormFieldType::Markup)
                .any(|f| {
                    let submitted = self
                        .raw_data
                        .get(&f.name)
                        .cloned()
                        .flatten()
                        .unwrap_or_default();
                    let initial = self.initial_for(f).unwrap_or_default();
                    submitted.trim() != initial.trim()
                })
    }

    /// Validates the bound data synchronously. See [`Form::is_valid`].
    pub fn full_clean(&mut self) -> bool {
        if !self.bound {
            return false;
        }
        if let Some(valid) = self.validated {
            return valid;
        }
        self.errors.clear();
        self.cleaned_data.clear();
        clean_fields(
            &self.fields,
            &self.raw_data,
            &self.initial,
            &mut self.cleaned_data,
            &mut self.errors,
        );
        let valid = self.errors.is_empty();
        self.validated = Some(valid);
        valid
    }

    /// Renders one field: its errors, label, widget and help text. Hidden
    /// widgets render bare.
    pub fn render_field(&self, field: &FormFieldDef) -> String {
        let html_name = self.add_prefix(&field.name);
        let id = self.auto_id(&field.name);
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), id.clone());
        if field.disabled {
            attrs.insert("disabled".to_string(), "disabled".to_string());
        }
        let value = self.display_value(field);
        let widget = field.widget.render(&html_name, value.as_deref(), &attrs);
        let errors = error_list(
            self.errors
                .get(&field.name)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        );

        if field.widget.is_hidden() {
            return format!("{errors}{widget}");
        }

        let label_class = if field.required { r#" class="required""# } else { "" };
        let help = if field.help_text.is_empty() {
            String::new()
        } else {
            format!(
                r#" <span class="helptext">{}</span>"#,
                escape_html(&field.help_text)
            )
        };
        format!(
            r#"<p>{errors}<label for="{id}"{label_class}>{}:</label> {widget}{help}</p>"#,
            escape_html(&field.label)
        )
    }
}

#[async_trait]
impl Form for BaseForm {
    fn fields(&self) -> &[FormFieldDef] {
        &self.fields
    }

    fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.raw_data = self
            .fields
            .iter()
            .map(|f| {
                let value = f.widget.value_from_data(data, &self.add_prefix(&f.name));
                (f.name.clone(), value)
            })
            .collect();
        self.bound = true;
        self.validated = None;
        self.errors.clear();
        self.cleaned_data.clear();
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    async fn is_valid(&mut self) -> bool {
        self.full_clean()
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        &self.errors
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        &self.cleaned_data
    }

    fn render(&self) -> String {
        let mut html = error_list(self.non_field_errors());
        for field in &self.fields {
            html.push_str(&self.render_field(field));
            html.push('\n');
        }
        html
    }

    fn media(&self) -> Media {
        let mut media = Media::new();
        for field in &self.fields {
            media.merge(&field.widget.media());
        }
        media
    }
}
