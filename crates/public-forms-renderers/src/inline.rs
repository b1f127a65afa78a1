//! Inline formset declarations and their section titles.
//!
//! An [`InlineSpec`] names a child model whose rows are edited alongside
//! the block's target row. The title shown above each formset comes from
//! the relation's shape:
//!
//! - a plain foreign-key child uses its own plural name;
//! - a many-to-many "through" model declared on the parent uses the plural
//!   name of the field's target;
//! - a "through" model of a many-to-many declared on another model pointing
//!   at the parent uses that other model's plural name;
//! - an auto-created through model, or any self-referential relation, uses
//!   the target of the through model's first foreign key (in declaration
//!   order) other than the one pointing back at the parent.

use public_forms_db::{ContentTypeRegistry, FieldType, ModelMeta};
use public_forms_forms::{InlineFormSetConfig, ModelFormConfig};

/// One inline formset on a renderer.
#[derive(Debug, Clone)]
pub struct InlineSpec {
    /// The child model.
    pub model: &'static ModelMeta,
    /// Formset options.
    pub config: InlineFormSetConfig,
    prefix: Option<String>,
}

impl InlineSpec {
    /// Declares an inline over `model` with default options.
    pub fn new(model: &'static ModelMeta) -> Self {
        Self {
            model,
            config: InlineFormSetConfig::default(),
            prefix: None,
        }
    }

    /// Uses `fk_name` as the child's key to the parent.
    #[must_use]
    pub fn fk_name(mut self, fk_name: &'static str) -> Self {
        self.config.fk_name = Some(fk_name);
        self
    }

    /// Sets the number of blank forms.
    #[must_use]
    pub fn extra(mut self, extra: usize) -> Self {
        self.config.extra = extra;
        self
    }

    /// Sets whether rows can be deleted.
    #[must_use]
    pub fn can_delete(mut self, can_delete: bool) -> Self {
        self.config.can_delete = can_delete;
        self
    }

    /// Sets the minimum and maximum number of forms.
    #[must_use]
    pub fn bounds(mut self, min_num: usize, max_num: usize) -> Self {
        self.config.min_num = min_num;
        self.config.max_num = max_num;
        self
    }

    /// Restricts the child form to `fields`.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.config.form = ModelFormConfig::only(fields);
        self
    }

    /// Overrides the formset prefix (default `{model_name}_set`).
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The formset prefix below the block token.
    pub fn formset_prefix(&self) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| format!("{}_set", self.model.model_name))
    }
}

fn plural_of(label: &str, content_types: &ContentTypeRegistry) -> Option<String> {
    content_types
        .get(label)
        .ok()
        .map(|meta| meta.verbose_name_plural.clone())
}

/// The title of the "other side" of a through model: the target of its
/// first foreign key that is not `fk_name`.
fn other_side_title(
    through: &ModelMeta,
    fk_name: &str,
    content_types: &ContentTypeRegistry,
) -> Option<String> {
    through
        .foreign_keys()
        .find(|f| f.name != fk_name)
        .and_then(|f| f.field_type.related_label())
        .and_then(|label| plural_of(label, content_types))
}

fn through_matches(through: Option<&String>, child: &ModelMeta) -> bool {
    through.is_some_and(|t| child.has_label(t))
}

/// Computes the section title of an inline formset.
///
/// `fk_name` is the child's resolved foreign key to `parent`. Labels that
/// are not registered fall back to the child's own plural name.
pub fn inline_title(
    parent: &ModelMeta,
    child: &ModelMeta,
    fk_name: &str,
    content_types: &ContentTypeRegistry,
) -> String {
    let own = || child.verbose_name_plural.clone();
    let parent_label = parent.label();

    if child.auto_created {
        return other_side_title(child, fk_name, content_types).unwrap_or_else(own);
    }

    // Forward: the parent declares the many-to-many.
    let forward = parent.many_to_many().find_map(|f| match &f.field_type {
        FieldType::ManyToManyField { to, through, .. } if through_matches(through.as_ref(), child) => {
            Some(to.clone())
        }
        _ => None,
    });
    if let Some(to) = forward {
        if parent.has_label(&to) {
            return other_side_title(child, fk_name, content_types).unwrap_or_else(own);
        }
        return plural_of(&to, content_types).unwrap_or_else(own);
    }

    // Reverse: another model declares a many-to-many to the parent.
    let reverse = content_types.models().find(|m| {
        m.many_to_many().any(|f| match &f.field_type {
            FieldType::ManyToManyField { to, through, .. } => {
                to.eq_ignore_ascii_case(&parent_label) && through_matches(through.as_ref(), child)
            }
            _ => false,
        })
    });
    if let Some(declaring) = reverse {
        if declaring.has_label(&parent_label) {
            return other_side_title(child, fk_name, content_types).unwrap_or_else(own);
        }
        return declaring.verbose_name_plural.clone();
    }

    own()
}
