//! Model metadata and dynamic records.
//!
//! [`ModelMeta`] is the equivalent of a Django model's `class Meta` plus its
//! field list. Metas are `'static` (usually built once in a `LazyLock`), so
//! every [`Record`] can point at its model without reference counting.

use std::collections::HashMap;
use std::fmt;
use std::ptr;

use crate::fields::{FieldDef, FieldType};
use crate::value::Value;

/// Computes the canonical URL of a row, like `get_absolute_url()`.
pub type AbsoluteUrlFn = fn(&Record) -> String;

/// Metadata about a model.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
/// use public_forms_db::fields::{FieldDef, FieldType};
/// use public_forms_db::model::ModelMeta;
///
/// static ENTRY: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new("blog", "entry")
///         .verbose_names("entry", "entries")
///         .field(FieldDef::auto_pk())
///         .field(FieldDef::new("title", FieldType::CharField).max_length(100))
/// });
///
/// assert_eq!(ENTRY.label(), "blog.entry");
/// assert_eq!(ENTRY.pk_name(), "id");
/// ```
pub struct ModelMeta {
    /// The application label (e.g. "blog").
    pub app_label: &'static str,
    /// The model name in lowercase (e.g. "entry").
    pub model_name: &'static str,
    /// Human-readable singular name.
    pub verbose_name: String,
    /// Human-readable plural name.
    pub verbose_name_plural: String,
    /// Field definitions in declaration order.
    pub fields: Vec<FieldDef>,
    /// Whether this model was generated for a many-to-many relation.
    pub auto_created: bool,
    /// Canonical URL of a row, if the model has one.
    pub absolute_url: Option<AbsoluteUrlFn>,
}

impl ModelMeta {
    /// Creates metadata with default verbose names and no fields.
    pub fn new(app_label: &'static str, model_name: &'static str) -> Self {
        Self {
            app_label,
            model_name,
            verbose_name: model_name.to_string(),
            verbose_name_plural: format!("{model_name}s"),
            fields: Vec::new(),
            auto_created: false,
            absolute_url: None,
        }
    }

    /// Sets the singular and plural verbose names.
    #[must_use]
    pub fn verbose_names(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.verbose_name = singular.into();
        self.verbose_name_plural = plural.into();
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Marks the model as auto-created.
    #[must_use]
    pub const fn auto_created(mut self) -> Self {
        self.auto_created = true;
        self
    }

    /// Sets the canonical URL function.
    #[must_use]
    pub fn absolute_url(mut self, f: AbsoluteUrlFn) -> Self {
        self.absolute_url = Some(f);
        self
    }

    /// Returns the `app.model` label.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }

    /// Returns `true` if `label` names this model (case-insensitive).
    pub fn has_label(&self, label: &str) -> bool {
        label
            .split_once('.')
            .is_some_and(|(app, model)| {
                app.eq_ignore_ascii_case(self.app_label)
                    && model.eq_ignore_ascii_case(self.model_name)
            })
    }

    /// Looks up a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key field name, defaulting to `"id"`.
    pub fn pk_name(&self) -> &'static str {
        self.fields
            .iter()
            .find(|f| f.primary_key)
            .map_or("id", |f| f.name)
    }

    /// Returns the foreign keys in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| matches!(f.field_type, FieldType::ForeignKey { .. }))
    }

    /// Returns the many-to-many fields in declaration order.
    pub fn many_to_many(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| matches!(f.field_type, FieldType::ManyToManyField { .. }))
    }

    /// Returns the first foreign key pointing at `label`.
    pub fn foreign_key_to(&self, label: &str) -> Option<&FieldDef> {
        self.foreign_keys().find(|f| {
            f.field_type
                .related_label()
                .is_some_and(|to| to.eq_ignore_ascii_case(label))
        })
    }
}

impl fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelMeta")
            .field("label", &self.label())
            .field("verbose_name", &self.verbose_name)
            .field("fields", &self.fields.len())
            .field("auto_created", &self.auto_created)
            .finish_non_exhaustive()
    }
}

/// One row of any model.
///
/// Unset fields read as [`Value::Null`]. A record with `pk == None` has not
/// been saved yet.
#[derive(Clone)]
pub struct Record {
    /// The model this row belongs to.
    pub meta: &'static ModelMeta,
    /// Primary key, once saved.
    pub pk: Option<i64>,
    /// Field values keyed by field name (the primary key is not stored here).
    pub values: HashMap<String, Value>,
}

impl Record {
    /// Creates an unsaved record with every field at its default.
    pub fn new(meta: &'static ModelMeta) -> Self {
        let values = meta
            .fields
            .iter()
            .filter(|f| !f.primary_key)
            .filter_map(|f| f.default.clone().map(|v| (f.name.to_string(), v)))
            .collect();
        Self {
            meta,
            pk: None,
            values,
        }
    }

    /// Sets a value, builder style.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the value of `name`, or `Null` when unset. The primary key
    /// lives in [`Record::pk`], not here.
    pub fn get(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.values.get(name).unwrap_or(&NULL)
    }

    /// Sets a value. Setting the primary key field updates [`Record::pk`].
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        if name == self.meta.pk_name() {
            self.pk = value.as_i64();
            return;
        }
        self.values.insert(name.to_string(), value);
    }

    /// Returns the model label of this record.
    pub fn label(&self) -> String {
        self.meta.label()
    }

    /// Returns `true` once the record has a primary key.
    pub const fn is_saved(&self) -> bool {
        self.pk.is_some()
    }

    /// Returns the canonical URL, if the model defines one.
    pub fn get_absolute_url(&self) -> Option<String> {
        self.meta.absolute_url.map(|f| f(self))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.meta, other.meta) && self.pk == other.pk && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("model", &self.meta.label())
            .field("pk", &self.pk)
            .field("values", &self.values)
            .finish()
    }
}
