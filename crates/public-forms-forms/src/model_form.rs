//! Forms generated from model metadata.
//!
//! A [`ModelFormClass`] is the reusable description (which model, which
//! fields, edit or confirm-delete); [`ModelFormClass::build`] produces a
//! [`ModelForm`] around one [`Record`]. Classes are cheap to clone, and
//! [`ModelFormClass::with_field`] returns an augmented copy, which is how a
//! CAPTCHA or AJAX field gets attached for one request without touching
//! the original.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use public_forms_core::{PublicFormsError, PublicFormsResult, ValidationError};
use public_forms_db::{FieldDef, FieldType, ModelMeta, ModelStore, Record, Value};
use public_forms_http::QueryDict;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::{BaseForm, Form};
use crate::media::Media;
use crate::widgets::Textarea;

/// Which fields of a model a generated form includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFormConfig {
    /// Only these fields, in this order. `None` means every editable field.
    pub fields: Option<Vec<String>>,
    /// Fields to leave out.
    pub exclude: Vec<String>,
}

impl ModelFormConfig {
    /// Includes exactly `fields`.
    pub fn only(fields: &[&str]) -> Self {
        Self {
            fields: Some(fields.iter().map(|f| (*f).to_string()).collect()),
            exclude: Vec::new(),
        }
    }

    /// Excludes `fields`.
    #[must_use]
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.exclude
            .extend(fields.iter().map(|f| (*f).to_string()));
        self
    }
}

/// What a model form does with its instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormKind {
    /// Edits field values and saves the instance.
    Edit,
    /// Confirms deletion. Carries no model fields and is always valid.
    ConfirmDelete,
}

/// Maps model field types onto form field types.
fn form_field_for(field: &FieldDef) -> Option<FormFieldDef> {
    if field.primary_key || !field.editable || field.field_type.is_relation() {
        return None;
    }
    let field_type = match (&field.choices, &field.field_type) {
        (Some(choices), _) => FormFieldType::Choice {
            choices: choices
                .iter()
                .map(|(v, label)| (v.to_form_string(), label.clone()))
                .collect(),
        },
        (None, FieldType::CharField | FieldType::TextField) => FormFieldType::Char {
            min_length: None,
            max_length: field.max_length,
            strip: true,
        },
        (None, FieldType::IntegerField | FieldType::BigIntegerField) => FormFieldType::Integer {
            min_value: None,
            max_value: None,
        },
        (None, FieldType::FloatField) => FormFieldType::Float {
            min_value: None,
            max_value: None,
        },
        (None, FieldType::BooleanField) => FormFieldType::Boolean,
        (None, FieldType::DateField) => FormFieldType::Date,
        (None, FieldType::DateTimeField) => FormFieldType::DateTime,
        (None, FieldType::EmailField) => FormFieldType::Email,
        (None, FieldType::UrlField) => FormFieldType::Url,
        (None, FieldType::SlugField) => FormFieldType::Slug,
        (None, _) => return None,
    };
    let mut form_field = FormFieldDef::new(field.name, field_type)
        .required(field.is_required_in_forms())
        .label(capitalize(&field.verbose_name))
        .help_text(field.help_text.clone());
    if let Some(default) = &field.default {
        form_field = form_field.initial(default.clone());
    }
    if matches!(field.field_type, FieldType::TextField) && field.choices.is_none() {
        form_field = form_field.widget(std::sync::Arc::new(Textarea));
    }
    Some(form_field)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Generates form fields for `meta` honoring `config`.
pub fn generate_form_fields(meta: &ModelMeta, config: &ModelFormConfig) -> Vec<FormFieldDef> {
    let allowed = |name: &str| !config.exclude.iter().any(|e| e == name);
    match &config.fields {
        Some(names) => names
            .iter()
            .filter(|n| allowed(n.as_str()))
            .filter_map(|n| meta.get_field(n.as_str()))
            .filter_map(form_field_for)
            .collect(),
        None => meta
            .fields
            .iter()
            .filter(|f| allowed(f.name))
            .filter_map(form_field_for)
            .collect(),
    }
}

/// A reusable model form description.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use public_forms_db::{FieldDef, FieldType, ModelMeta};
/// use public_forms_forms::fields::{FormFieldDef, FormFieldType};
/// use public_forms_forms::model_form::{ModelFormClass, ModelFormConfig};
///
/// static ENTRY: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new("blog", "entry")
///         .field(FieldDef::auto_pk())
///         .field(FieldDef::new("title", FieldType::CharField).max_length(100))
/// });
///
/// let class = ModelFormClass::for_model(&ENTRY, &ModelFormConfig::default());
/// let extended = class.with_field(FormFieldDef::new("captcha", FormFieldType::Challenge));
/// assert_eq!(class.fields().len(), 1);
/// assert_eq!(extended.fields().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ModelFormClass {
    meta: &'static ModelMeta,
    fields: Vec<FormFieldDef>,
    kind: ModelFormKind,
}

impl ModelFormClass {
    /// An editing form over `meta`'s editable fields.
    pub fn for_model(meta: &'static ModelMeta, config: &ModelFormConfig) -> Self {
        Self {
            meta,
            fields: generate_form_fields(meta, config),
            kind: ModelFormKind::Edit,
        }
    }

    /// A confirm-delete form for `meta`.
    pub const fn confirm_delete(meta: &'static ModelMeta) -> Self {
        Self {
            meta,
            fields: Vec::new(),
            kind: ModelFormKind::ConfirmDelete,
        }
    }

    /// Returns a copy with `field` appended.
    #[must_use]
    pub fn with_field(&self, field: FormFieldDef) -> Self {
        let mut class = self.clone();
        class.fields.push(field);
        class
    }

    /// The model this class edits.
    pub const fn meta(&self) -> &'static ModelMeta {
        self.meta
    }

    /// The field definitions.
    pub fn fields(&self) -> &[FormFieldDef] {
        &self.fields
    }

    /// Edit or confirm-delete.
    pub const fn kind(&self) -> ModelFormKind {
        self.kind
    }

    /// Builds a form around `instance`, bound to `data` if given.
    pub fn build(&self, instance: Record, prefix: &str, data: Option<&QueryDict>) -> ModelForm {
        let initial: HashMap<String, Value> = self
            .fields
            .iter()
            .filter(|f| self.meta.get_field(&f.name).is_some())
            .filter_map(|f| {
                let value = instance.get(&f.name);
                (!value.is_null()).then(|| (f.name.clone(), value.clone()))
            })
            .collect();
        let mut base = BaseForm::new(self.fields.clone())
            .with_prefix(prefix)
            .with_initial(initial);
        if let Some(data) = data {
            base.bind(data);
        }
        ModelForm {
            base,
            instance,
            kind: self.kind,
        }
    }
}

/// A form bound to one model instance.
#[derive(Debug, Clone)]
pub struct ModelForm {
    base: BaseForm,
    instance: Record,
    kind: ModelFormKind,
}

impl ModelForm {
    /// The instance. After a successful [`Form::is_valid`] it carries the
    /// cleaned values.
    pub const fn instance(&self) -> &Record {
        &self.instance
    }

    /// Mutable access to the instance.
    pub fn instance_mut(&mut self) -> &mut Record {
        &mut self.instance
    }

    /// Edit or confirm-delete.
    pub const fn kind(&self) -> ModelFormKind {
        self.kind
    }

    /// The underlying form.
    pub const fn base(&self) -> &BaseForm {
        &self.base
    }

    /// Returns `true` if bound data differs from the instance.
    pub fn has_changed(&self) -> bool {
        self.base.has_changed()
    }

    /// HTML names of the required fields.
    pub fn required_field_names(&self) -> Vec<String> {
        self.base.required_field_names()
    }

    /// Records a form-wide error.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.base.add_error(field, message);
    }

    fn construct_instance(&mut self) {
        for (name, value) in self.base.cleaned_data() {
            if self.instance.meta.get_field(name).is_some() {
                self.instance.set(name, value.clone());
            }
        }
    }

    fn ensure_valid(&self) -> PublicFormsResult<()> {
        let valid = match self.kind {
            ModelFormKind::ConfirmDelete => true,
            ModelFormKind::Edit => self.base.is_bound() && self.base.errors().is_empty(),
        };
        if valid {
            Ok(())
        } else {
            let field_errors: BTreeMap<String, Vec<String>> = self
                .base
                .errors()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Err(PublicFormsError::ValidationError(
                ValidationError::with_field_errors(field_errors),
            ))
        }
    }

    /// Inserts or updates the instance and returns it.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the form has not validated, or any
    /// error from the store.
    pub async fn save(&mut self, store: &dyn ModelStore) -> PublicFormsResult<Record> {
        self.ensure_valid()?;
        if self.instance.is_saved() {
            store.update(&self.instance).await?;
        } else {
            store.insert(&mut self.instance).await?;
        }
        tracing::debug!(model = %self.instance.label(), pk = ?self.instance.pk, "saved instance");
        Ok(self.instance.clone())
    }

    /// Deletes the instance. Unsaved instances delete nothing.
    ///
    /// # Errors
    ///
    /// Returns any error from the store.
    pub async fn delete(&mut self, store: &dyn ModelStore) -> PublicFormsResult<usize> {
        let Some(pk) = self.instance.pk else {
            return Ok(0);
        };
        let removed = store.delete(self.instance.meta, pk).await?;
        tracing::debug!(model = %self.instance.label(), pk, removed, "deleted instance");
        self.instance.pk = None;
        Ok(removed)
    }
}

#[async_trait]
impl Form for ModelForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.base.fields()
    }

    fn prefix(&self) -> Option<&str> {
        self.base.prefix()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.base.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.base.is_bound()
    }

    async fn is_valid(&mut self) -> bool {
        match self.kind {
            ModelFormKind::ConfirmDelete => true,
            ModelFormKind::Edit => {
                let valid = self.base.full_clean();
                if valid {
                    self.construct_instance();
                }
                valid
            }
        }
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.base.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.base.cleaned_data()
    }

    fn render(&self) -> String {
        self.base.render()
    }

    fn media(&self) -> Media {
        self.base.media()
    }
}
