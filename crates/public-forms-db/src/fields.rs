//! Model field definitions.
//!
//! A [`FieldDef`] describes one column of a model: its [`FieldType`], nullability,
//! whether forms may edit it, and the human-readable names used in labels.
//! Relational field types carry the `app.model` label of their target.

use crate::value::Value;

/// The type of a model field.
///
/// Relational variants (`ForeignKey`, `ManyToManyField`) name their target
/// model by label (`"app.model"`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum FieldType {
    /// Auto-incrementing 32-bit integer primary key.
    AutoField,
    /// Auto-incrementing 64-bit integer primary key.
    BigAutoField,
    /// Variable-length string with a max length.
    CharField,
    /// Unlimited-length text.
    TextField,
    /// 32-bit signed integer.
    IntegerField,
    /// 64-bit signed integer.
    BigIntegerField,
    /// 64-bit floating-point number.
    FloatField,
    /// Boolean (true/false).
    BooleanField,
    /// Date without time.
    DateField,
    /// Date and time.
    DateTimeField,
    /// Email address.
    EmailField,
    /// URL.
    UrlField,
    /// Slug (letters, numbers, hyphens, underscores).
    SlugField,
    /// Many-to-one relationship.
    ForeignKey {
        /// The target model label (e.g. "blog.entry").
        to: String,
        /// Behavior when the referenced row is deleted.
        on_delete: OnDelete,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
    /// Many-to-many relationship through an intermediate model.
    ManyToManyField {
        /// The target model label.
        to: String,
        /// Explicit intermediate ("through") model label.
        through: Option<String>,
        /// The name used for the reverse relation.
        related_name: Option<String>,
    },
}

/// Behavior when a referenced row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OnDelete {
    /// Delete all referencing rows.
    Cascade,
    /// Refuse to delete while referencing rows exist.
    Protect,
    /// Set the referencing column to NULL.
    SetNull,
    /// Leave referencing rows untouched.
    DoNothing,
}

impl FieldType {
    /// Returns `true` for `ForeignKey` and `ManyToManyField`.
    pub const fn is_relation(&self) -> bool {
        matches!(self, Self::ForeignKey { .. } | Self::ManyToManyField { .. })
    }

    /// Returns `true` for auto-incrementing key types.
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::AutoField | Self::BigAutoField)
    }

    /// Returns the target label of a relational field.
    pub fn related_label(&self) -> Option<&str> {
        match self {
            Self::ForeignKey { to, .. } | Self::ManyToManyField { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// Definition of one model field.
///
/// # Examples
///
/// ```
/// use public_forms_db::fields::{FieldDef, FieldType};
///
/// let title = FieldDef::new("title", FieldType::CharField)
///     .max_length(200)
///     .verbose_name("headline");
/// assert_eq!(title.verbose_name, "headline");
/// assert!(title.editable);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// The attribute name of this field.
    pub name: &'static str,
    /// The type of this field.
    pub field_type: FieldType,
    /// Whether this field is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Whether the field may be left blank in forms.
    pub blank: bool,
    /// Default value for new instances.
    pub default: Option<Value>,
    /// Maximum character length.
    pub max_length: Option<usize>,
    /// Human-readable help text.
    pub help_text: String,
    /// Human-readable name for the field.
    pub verbose_name: String,
    /// Allowed values as (value, display label) pairs.
    pub choices: Option<Vec<(Value, String)>>,
    /// Whether the field is editable in forms.
    pub editable: bool,
}

impl FieldDef {
    /// Creates a new `FieldDef`: non-null, required in forms, editable.
    pub fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            primary_key: false,
            null: false,
            blank: false,
            default: None,
            max_length: None,
            help_text: String::new(),
            verbose_name: name.replace('_', " "),
            choices: None,
            editable: true,
        }
    }

    /// Creates an auto-incrementing `id` primary key.
    pub fn auto_pk() -> Self {
        Self::new("id", FieldType::BigAutoField).primary_key()
    }

    /// Creates a cascading foreign key to `to`.
    pub fn foreign_key(name: &'static str, to: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::ForeignKey {
                to: to.into(),
                on_delete: OnDelete::Cascade,
                related_name: None,
            },
        )
    }

    /// Marks this field as the primary key (which also makes it non-editable).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.editable = false;
        self
    }

    /// Allows NULL.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Allows blank form input.
    #[must_use]
    pub const fn blank(mut self) -> Self {
        self.blank = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Sets the verbose name.
    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = name.into();
        self
    }

    /// Sets the allowed choices.
    #[must_use]
    pub fn choices(mut self, choices: Vec<(Value, String)>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Sets whether forms may edit this field.
    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Returns `true` if a form must supply a value for this field.
    pub const fn is_required_in_forms(&self) -> bool {
        !self.blank && !matches!(self.field_type, FieldType::BooleanField)
    }
}
