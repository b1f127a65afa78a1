//! Inline formsets: one model form per child row of a parent instance.
//!
//! The formset is keyed by a foreign key on the child model pointing at the
//! parent. Unbound, it shows every existing child row plus `extra` blank
//! forms. Bound, it reads the management fields (`{prefix}-TOTAL_FORMS`,
//! `{prefix}-INITIAL_FORMS`, ...) to know how many forms were submitted,
//! ignores blank extra forms, and skips validation of forms marked for
//! deletion.

use std::collections::{BTreeMap, HashMap};

use public_forms_core::{PublicFormsError, PublicFormsResult, ValidationError};
use public_forms_db::{ModelMeta, ModelStore, Record, Value};
use public_forms_http::QueryDict;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::form::Form;
use crate::html::error_list;
use crate::media::Media;
use crate::model_form::{ModelForm, ModelFormClass, ModelFormConfig};
use crate::widgets::{Input, Widget};

const TOTAL_FORM_COUNT: &str = "TOTAL_FORMS";
const INITIAL_FORM_COUNT: &str = "INITIAL_FORMS";
const MIN_NUM_FORM_COUNT: &str = "MIN_NUM_FORMS";
const MAX_NUM_FORM_COUNT: &str = "MAX_NUM_FORMS";
const DELETION_FIELD_NAME: &str = "DELETE";

/// Default upper bound on the number of forms.
pub const DEFAULT_MAX_NUM: usize = 1000;

/// Options for an inline formset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineFormSetConfig {
    /// The child's foreign key to the parent. Required only when the child
    /// has more than one foreign key to the parent model.
    pub fk_name: Option<&'static str>,
    /// Blank forms shown in addition to existing rows.
    pub extra: usize,
    /// Whether rows can be marked for deletion.
    pub can_delete: bool,
    /// Minimum number of filled forms.
    pub min_num: usize,
    /// Maximum number of forms.
    pub max_num: usize,
    /// Which child fields to include.
    pub form: ModelFormConfig,
}

impl Default for InlineFormSetConfig {
    fn default() -> Self {
        Self {
            fk_name: None,
            extra: 3,
            can_delete: true,
            min_num: 0,
            max_num: DEFAULT_MAX_NUM,
            form: ModelFormConfig::default(),
        }
    }
}

/// Finds the child's foreign key to `parent`.
///
/// # Errors
///
/// Returns [`PublicFormsError::ImproperlyConfigured`] if there is no such
/// key, if `fk_name` names a field that is not one, or if there are several
/// candidates and no `fk_name`.
pub fn resolve_fk(
    parent: &ModelMeta,
    child: &'static ModelMeta,
    fk_name: Option<&str>,
) -> PublicFormsResult<&'static str> {
    let parent_label = parent.label();
    let candidates: Vec<&'static str> = child
        .foreign_keys()
        .filter(|f| {
            f.field_type
                .related_label()
                .is_some_and(|to| to.eq_ignore_ascii_case(&parent_label))
        })
        .map(|f| f.name)
        .collect();
    match fk_name {
        Some(name) => candidates.into_iter().find(|c| *c == name).ok_or_else(|| {
            PublicFormsError::ImproperlyConfigured(format!(
                "fk_name '{name}' is not a ForeignKey from '{}' to '{parent_label}'",
                child.label()
            ))
        }),
        None => match candidates.as_slice() {
            [only] => Ok(*only),
            [] => Err(PublicFormsError::ImproperlyConfigured(format!(
                "'{}' has no ForeignKey to '{parent_label}'",
                child.label()
            ))),
            _ => Err(PublicFormsError::ImproperlyConfigured(format!(
                "'{}' has more than one ForeignKey to '{parent_label}'; set fk_name",
                child.label()
            ))),
        },
    }
}

/// A formset over the child rows of one parent instance.
#[derive(Debug, Clone)]
pub struct InlineFormSet {
    child_meta: &'static ModelMeta,
    fk_name: &'static str,
    prefix: String,
    config: InlineFormSetConfig,
    form_class: ModelFormClass,
    forms: Vec<ModelForm>,
    deleted: Vec<bool>,
    initial_count: usize,
    bound: bool,
    management_missing: bool,
    non_form_errors: Vec<String>,
    validated: Option<bool>,
}

impl InlineFormSet {
    /// Builds the formset for `parent`'s children, bound to `data` if given.
    ///
    /// Existing children are loaded only when the parent is saved.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from [`resolve_fk`] or a store error.
    pub async fn new(
        store: &dyn ModelStore,
        parent: &Record,
        child_meta: &'static ModelMeta,
        prefix: impl Into<String>,
        config: InlineFormSetConfig,
        data: Option<&QueryDict>,
    ) -> PublicFormsResult<Self> {
        let prefix = prefix.into();
        let fk_name = resolve_fk(parent.meta, child_meta, config.fk_name)?;
        let existing = match parent.pk {
            Some(pk) => store.filter_eq(child_meta, fk_name, &Value::Int(pk)).await?,
            None => Vec::new(),
        };
        let initial_count = existing.len();

        let mut form_class = ModelFormClass::for_model(child_meta, &config.form);
        if config.can_delete {
            form_class = form_class.with_field(
                FormFieldDef::new(DELETION_FIELD_NAME, FormFieldType::Boolean).label("Delete"),
            );
        }

        let mut management_missing = false;
        let total = match data {
            Some(data) => {
                match data
                    .get(&format!("{prefix}-{TOTAL_FORM_COUNT}"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                {
                    Some(total) => total.min(config.max_num.max(initial_count)),
                    None => {
                        management_missing = true;
                        initial_count
                    }
                }
            }
            None => {
                let wanted = initial_count.max(config.min_num) + config.extra;
                if initial_count > config.max_num {
                    initial_count
                } else {
                    wanted.min(config.max_num)
                }
            }
        };

        let mut existing = existing.into_iter();
        let mut forms = Vec::with_capacity(total);
        let mut deleted = Vec::with_capacity(total);
        for i in 0..total {
            let instance = existing
                .next()
                .unwrap_or_else(|| Record::new(child_meta));
            let form_prefix = format!("{prefix}-{i}");
            let marked = config.can_delete
                && data
                    .and_then(|d| d.get(&format!("{form_prefix}-{DELETION_FIELD_NAME}")))
                    .is_some_and(|v| {
                        matches!(v.to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
                    });
            forms.push(form_class.build(instance, &form_prefix, data));
            deleted.push(marked);
        }

        Ok(Self {
            child_meta,
            fk_name,
            prefix,
            config,
            form_class,
            forms,
            deleted,
            initial_count,
            bound: data.is_some(),
            management_missing,
            non_form_errors: Vec::new(),
            validated: None,
        })
    }

    /// The HTML name prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The child model.
    pub const fn child_meta(&self) -> &'static ModelMeta {
        self.child_meta
    }

    /// The child's foreign key to the parent.
    pub const fn fk_name(&self) -> &'static str {
        self.fk_name
    }

    /// The forms, existing rows first.
    pub fn forms(&self) -> &[ModelForm] {
        &self.forms
    }

    /// Number of forms.
    pub fn total_form_count(&self) -> usize {
        self.forms.len()
    }

    /// Number of forms backed by existing rows.
    pub const fn initial_form_count(&self) -> usize {
        self.initial_count
    }

    /// Returns `true` if bound to submitted data.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Errors that belong to the formset as a whole.
    pub fn non_form_errors(&self) -> &[String] {
        &self.non_form_errors
    }

    /// Per-form errors, in form order.
    pub fn errors(&self) -> Vec<&HashMap<String, Vec<String>>> {
        self.forms.iter().map(Form::errors).collect()
    }

    fn is_blank_extra(&self, i: usize) -> bool {
        i >= self.initial_count && !self.forms[i].has_changed()
    }

    /// Validates every submitted form. Blank extra forms and forms marked
    /// for deletion are not validated. The result is cached.
    pub async fn is_valid(&mut self) -> bool {
        if !self.bound {
            return false;
        }
        if let Some(valid) = self.validated {
            return valid;
        }
        self.non_form_errors.clear();
        if self.management_missing {
            self.non_form_errors.push(
                "ManagementForm data is missing or has been tampered with.".to_string(),
            );
        }

        let mut valid = !self.management_missing;
        let mut filled = 0;
        for i in 0..self.forms.len() {
            if self.deleted[i] || self.is_blank_extra(i) {
                continue;
            }
            filled += 1;
            if !self.forms[i].is_valid().await {
                valid = false;
            }
        }
        if filled < self.config.min_num {
            self.non_form_errors.push(format!(
                "Please submit at least {} forms.",
                self.config.min_num
            ));
            valid = false;
        }
        if filled > self.config.max_num {
            self.non_form_errors.push(format!(
                "Please submit at most {} forms.",
                self.config.max_num
            ));
            valid = false;
        }
        self.validated = Some(valid);
        valid
    }

    /// Writes the formset: deletes marked rows, then inserts or updates every
    /// changed form with its foreign key pointing at `parent_pk`. Returns
    /// the saved rows.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the formset has not validated, or any
    /// store error.
    pub async fn save(
        &mut self,
        store: &dyn ModelStore,
        parent_pk: i64,
    ) -> PublicFormsResult<Vec<Record>> {
        if self.validated != Some(true) {
            let mut field_errors = BTreeMap::new();
            if !self.non_form_errors.is_empty() {
                field_errors.insert(self.prefix.clone(), self.non_form_errors.clone());
            }
            return Err(PublicFormsError::ValidationError(
                ValidationError::with_field_errors(field_errors),
            ));
        }
        let mut saved = Vec::new();
        for i in 0..self.forms.len() {
            if self.deleted[i] {
                if i < self.initial_count {
                    self.forms[i].delete(store).await?;
                }
                continue;
            }
            if !self.forms[i].has_changed() {
                continue;
            }
            let form = &mut self.forms[i];
            form.instance_mut().set(self.fk_name, Value::Int(parent_pk));
            saved.push(form.save(store).await?);
        }
        tracing::debug!(
            prefix = %self.prefix,
            saved = saved.len(),
            "saved inline formset"
        );
        Ok(saved)
    }

    /// Renders the hidden management inputs.
    pub fn management_form(&self) -> String {
        let hidden = Input::hidden();
        [
            (TOTAL_FORM_COUNT, self.forms.len()),
            (INITIAL_FORM_COUNT, self.initial_count),
            (MIN_NUM_FORM_COUNT, self.config.min_num),
            (MAX_NUM_FORM_COUNT, self.config.max_num),
        ]
        .iter()
        .map(|(key, value)| {
            let name = format!("{}-{key}", self.prefix);
            let attrs = BTreeMap::from([("id".to_string(), format!("id_{name}"))]);
            hidden.render(&name, Some(&value.to_string()), &attrs)
        })
        .collect()
    }

    /// Renders the management inputs followed by one fieldset per form.
    pub fn render(&self) -> String {
        let mut html = self.management_form();
        html.push('\n');
        html.push_str(&error_list(&self.non_form_errors));
        for (i, form) in self.forms.iter().enumerate() {
            html.push_str(&format!(
                "<fieldset class=\"inline-related\">\n<legend>{} #{}</legend>\n{}</fieldset>\n",
                crate::html::escape_html(&self.child_meta.verbose_name),
                i + 1,
                form.render()
            ));
        }
        html
    }

    /// The union of the child form's widget media.
    pub fn media(&self) -> Media {
        let mut media = Media::new();
        for field in self.form_class.fields() {
            media.merge(&field.widget.media());
        }
        media
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use public_forms_db::{FieldDef, FieldType, InMemoryStore};

    use super::*;

    static ALBUM: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new("music", "album")
            .field(FieldDef::auto_pk())
            .field(FieldDef::new("title", FieldType::CharField))
    });
    static TRACK: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new("music", "track")
            .field(FieldDef::auto_pk())
            .field(FieldDef::foreign_key("album", "music.album"))
            .field(FieldDef::new("name", FieldType::CharField))
    });
    static DUET: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new("music", "duet")
            .field(FieldDef::auto_pk())
            .field(FieldDef::foreign_key("first", "music.album"))
            .field(FieldDef::foreign_key("second", "music.album"))
    });

    async fn album_with_tracks(store: &InMemoryStore, names: &[&str]) -> Record {
        let mut album = Record::new(&ALBUM).with("title", "Blue");
        store.insert(&mut album).await.unwrap();
        for name in names {
            let mut track = Record::new(&TRACK)
                .with("album", album.pk.unwrap())
                .with("name", *name);
            store.insert(&mut track).await.unwrap();
        }
        album
    }

    #[test]
    fn test_resolve_fk() {
        assert_eq!(resolve_fk(&ALBUM, &TRACK, None).unwrap(), "album");
        assert!(resolve_fk(&TRACK, &ALBUM, None).is_err());
        assert!(resolve_fk(&ALBUM, &DUET, None).is_err());
        assert_eq!(resolve_fk(&ALBUM, &DUET, Some("second")).unwrap(), "second");
        assert!(resolve_fk(&ALBUM, &DUET, Some("name")).is_err());
    }

    #[tokio::test]
    async fn test_unbound_shows_rows_plus_extra() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &["One", "Two"]).await;
        let config = InlineFormSetConfig {
            extra: 1,
            ..InlineFormSetConfig::default()
        };
        let fs = InlineFormSet::new(&store, &album, &TRACK, "t", config, None)
            .await
            .unwrap();
        assert_eq!(fs.total_form_count(), 3);
        assert_eq!(fs.initial_form_count(), 2);
        let html = fs.render();
        assert!(html.contains(r#"name="t-TOTAL_FORMS" value="3""#));
        assert!(html.contains(r#"name="t-INITIAL_FORMS" value="2""#));
        assert!(html.contains(r#"name="t-0-name" value="One""#));
        assert!(html.contains(r#"name="t-2-DELETE""#));
    }

    #[tokio::test]
    async fn test_unsaved_parent_has_only_extra_forms() {
        let store = InMemoryStore::new();
        let fs = InlineFormSet::new(
            &store,
            &Record::new(&ALBUM),
            &TRACK,
            "t",
            InlineFormSetConfig::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(fs.total_form_count(), 3);
        assert_eq!(fs.initial_form_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_management_form_is_invalid() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &[]).await;
        let data = QueryDict::parse("t-0-name=x");
        let mut fs = InlineFormSet::new(
            &store,
            &album,
            &TRACK,
            "t",
            InlineFormSetConfig::default(),
            Some(&data),
        )
        .await
        .unwrap();
        assert!(!fs.is_valid().await);
        assert_eq!(fs.non_form_errors().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_extra_forms_are_ignored() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &[]).await;
        let data = QueryDict::parse("t-TOTAL_FORMS=2&t-INITIAL_FORMS=0&t-0-name=&t-1-name=");
        let mut fs = InlineFormSet::new(
            &store,
            &album,
            &TRACK,
            "t",
            InlineFormSetConfig::default(),
            Some(&data),
        )
        .await
        .unwrap();
        assert!(fs.is_valid().await);
        assert!(fs.save(&store, album.pk.unwrap()).await.unwrap().is_empty());
        assert_eq!(store.count(&TRACK).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_save_updates_adds_and_deletes() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &["One", "Two"]).await;
        let data = QueryDict::parse(
            "t-TOTAL_FORMS=3&t-INITIAL_FORMS=2\
             &t-0-name=Uno\
             &t-1-name=Two&t-1-DELETE=on\
             &t-2-name=Three",
        );
        let mut fs = InlineFormSet::new(
            &store,
            &album,
            &TRACK,
            "t",
            InlineFormSetConfig::default(),
            Some(&data),
        )
        .await
        .unwrap();
        assert!(fs.is_valid().await);
        let saved = fs.save(&store, album.pk.unwrap()).await.unwrap();
        assert_eq!(saved.len(), 2);

        let rows = store
            .filter_eq(&TRACK, "album", &Value::Int(album.pk.unwrap()))
            .await
            .unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.get("name").to_string()).collect();
        assert_eq!(names, vec!["Uno", "Three"]);
    }

    #[tokio::test]
    async fn test_invalid_row_blocks_save() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &["One"]).await;
        let data = QueryDict::parse("t-TOTAL_FORMS=1&t-INITIAL_FORMS=1&t-0-name=");
        let mut fs = InlineFormSet::new(
            &store,
            &album,
            &TRACK,
            "t",
            InlineFormSetConfig::default(),
            Some(&data),
        )
        .await
        .unwrap();
        assert!(!fs.is_valid().await);
        assert!(fs.errors()[0].contains_key("name"));
        let writes = store.write_count();
        assert!(fs.save(&store, album.pk.unwrap()).await.is_err());
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn test_min_num() {
        let store = InMemoryStore::new();
        let album = album_with_tracks(&store, &[]).await;
        let config = InlineFormSetConfig {
            min_num: 1,
            ..InlineFormSetConfig::default()
        };
        let data = QueryDict::parse("t-TOTAL_FORMS=1&t-INITIAL_FORMS=0&t-0-name=");
        let mut fs = InlineFormSet::new(&store, &album, &TRACK, "t", config, Some(&data))
            .await
            .unwrap();
        assert!(!fs.is_valid().await);
        assert_eq!(fs.non_form_errors(), ["Please submit at least 1 forms."]);
    }
}
