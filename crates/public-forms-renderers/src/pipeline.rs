//! Form and formset composition.
//!
//! A [`FormPipeline`] belongs to one renderer for one request. It builds,
//! at most once each:
//!
//! 1. the form class: the configured model form, plus the CAPTCHA field
//!    when the policy asks for one and the AJAX init field when the block
//!    enables AJAX;
//! 2. the form, bound to the submitted data only when the pipeline binds
//!    data and the request owns the block;
//! 3. the inline formsets, keyed by title in declaration order, bound the
//!    same way as the form.
//!
//! Every later access returns the same instances, so rendering, validation
//! and saving all see one consistent set of objects.

use std::sync::Arc;

use indexmap::IndexMap;

use public_forms_core::{PublicFormsError, PublicFormsResult, ValidationError};
use public_forms_db::{ModelMeta, Record};
use public_forms_forms::ajax::ajax_init_field;
use public_forms_forms::html::escape_html;
use public_forms_forms::{
    ChallengeContext, Form, InlineFormSet, Media, ModelForm, ModelFormClass, ValidationFlag,
};
use public_forms_http::{HttpRequest, QueryDict};

use crate::captcha;
use crate::inline::inline_title;
use crate::ownership::{SubmitAction, SubmitToken};
use crate::page::ContentBlock;
use crate::renderer::RendererConfig;
use crate::site::Site;

/// Memoized form, formsets and target object of one renderer.
#[derive(Debug)]
pub struct FormPipeline {
    site: Site,
    config: Arc<RendererConfig>,
    block: Arc<ContentBlock>,
    token: SubmitToken,
    meta: &'static ModelMeta,
    object: Option<Record>,
    binds_data: bool,
    form_class: Option<ModelFormClass>,
    form: Option<ModelForm>,
    formsets: Option<IndexMap<String, InlineFormSet>>,
    failure: ValidationFlag,
    validity: Option<bool>,
}

impl FormPipeline {
    /// Creates a pipeline. `object` is the loaded target row (none for
    /// create blocks). With `binds_data` false the pipeline never binds.
    pub fn new(
        site: Site,
        config: Arc<RendererConfig>,
        block: Arc<ContentBlock>,
        token: SubmitToken,
        meta: &'static ModelMeta,
        object: Option<Record>,
        binds_data: bool,
    ) -> Self {
        Self {
            site,
            config,
            block,
            token,
            meta,
            object,
            binds_data,
            form_class: None,
            form: None,
            formsets: None,
            failure: ValidationFlag::new(),
            validity: None,
        }
    }

    /// The block's submission token (also the field name prefix).
    pub const fn token(&self) -> &SubmitToken {
        &self.token
    }

    /// The target model.
    pub const fn meta(&self) -> &'static ModelMeta {
        self.meta
    }

    /// The target object: the loaded row, or after validation the form's
    /// in-memory instance, or after saving the persisted row.
    pub const fn object(&self) -> Option<&Record> {
        self.object.as_ref()
    }

    /// The flag shared with the challenge widget.
    pub const fn failure(&self) -> &ValidationFlag {
        &self.failure
    }

    /// The cached outcome of [`FormPipeline::is_valid`].
    pub const fn validity(&self) -> Option<bool> {
        self.validity
    }

    fn bound_data<'r>(&self, request: &'r HttpRequest) -> Option<&'r QueryDict> {
        if self.binds_data && self.token.is_owner(request) {
            request.form_data()
        } else {
            None
        }
    }

    fn build_form_class(&self, request: &HttpRequest) -> ModelFormClass {
        let settings = &self.site.settings;
        let action = self.token.action();
        let mut class = match (&self.config.form_class, action) {
            (_, SubmitAction::Delete) => ModelFormClass::confirm_delete(self.meta),
            (Some(class), _) => class.clone(),
            (None, _) => ModelFormClass::for_model(self.meta, &self.config.form),
        };

        if action != SubmitAction::Delete && captcha::is_required(request, &self.block) {
            let required: Vec<String> = class
                .fields()
                .iter()
                .filter(|f| f.required)
                .map(|f| format!("{}-{}", self.token, f.name))
                .collect();
            let context = ChallengeContext {
                language: captcha::choose_language(request, settings),
                container_id: self.token.container_id().to_string(),
                required_fields_json: serde_json::to_string(&required)
                    .unwrap_or_else(|_| "[]".to_string()),
                failure: self.failure.clone(),
            };
            let field = self
                .site
                .captcha
                .build_field(request, &settings.captcha_field_name, context);
            class = class.with_field(field);
            tracing::debug!(token = %self.token, "captcha field added");
        }

        if self.block.enable_ajax {
            class = class.with_field(ajax_init_field(self.token.container_id(), settings));
        }
        class
    }

    /// The form class, built on first use.
    pub fn form_class(&mut self, request: &HttpRequest) -> &ModelFormClass {
        let class = match self.form_class.take() {
            Some(class) => class,
            None => self.build_form_class(request),
        };
        self.form_class.insert(class)
    }

    /// The form, built on first use.
    pub fn form(&mut self, request: &HttpRequest) -> &mut ModelForm {
        let form = match self.form.take() {
            Some(form) => form,
            None => {
                let class = self.form_class(request).clone();
                let instance = self
                    .object
                    .clone()
                    .unwrap_or_else(|| Record::new(self.meta));
                class.build(instance, self.token.as_str(), self.bound_data(request))
            }
        };
        self.form.insert(form)
    }

    async fn build_formsets(
        &self,
        parent: &Record,
        data: Option<&QueryDict>,
    ) -> PublicFormsResult<IndexMap<String, InlineFormSet>> {
        let mut formsets = IndexMap::new();
        if self.token.action() == SubmitAction::Delete {
            return Ok(formsets);
        }
        for inline in &self.config.inlines {
            let prefix = format!("{}-{}", self.token, inline.formset_prefix());
            let formset = InlineFormSet::new(
                self.site.store.as_ref(),
                parent,
                inline.model,
                prefix,
                inline.config.clone(),
                data,
            )
            .await?;
            let title = inline_title(
                self.meta,
                inline.model,
                formset.fk_name(),
                &self.site.content_types,
            );
            formsets.insert(title, formset);
        }
        Ok(formsets)
    }

    /// The inline formsets keyed by title, built on first use.
    ///
    /// Delete blocks have none.
    pub async fn formsets(
        &mut self,
        request: &HttpRequest,
    ) -> PublicFormsResult<&mut IndexMap<String, InlineFormSet>> {
        if let Some(formsets) = self.formsets.take() {
            return Ok(self.formsets.insert(formsets));
        }
        let parent = self.form(request).instance().clone();
        let formsets = self
            .build_formsets(&parent, self.bound_data(request))
            .await?;
        Ok(self.formsets.insert(formsets))
    }

    /// Validates the form and every formset together.
    ///
    /// Valid only if all of them are. The outcome is cached, the target
    /// object becomes the form's instance, and a failed bound validation
    /// raises the challenge widget's retry flag.
    pub async fn is_valid(&mut self, request: &HttpRequest) -> PublicFormsResult<bool> {
        if let Some(valid) = self.validity {
            return Ok(valid);
        }
        let form = self.form(request);
        let bound = form.is_bound();
        let mut valid = form.is_valid().await;
        for formset in self.formsets(request).await?.values_mut() {
            if !formset.is_valid().await {
                valid = false;
            }
        }
        self.object = Some(self.form(request).instance().clone());
        if bound {
            self.failure.set_failed(!valid);
        }
        self.validity = Some(valid);
        Ok(valid)
    }

    /// Saves the parent form, then every formset against the parent's key.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless [`FormPipeline::is_valid`]
    /// succeeded, or any store error.
    pub async fn save(&mut self, request: &HttpRequest) -> PublicFormsResult<Record> {
        if self.validity != Some(true) {
            return Err(PublicFormsError::ValidationError(ValidationError::new(
                "the submission has not been validated",
                "invalid",
            )));
        }
        let store = Arc::clone(&self.site.store);
        let record = self.form(request).save(store.as_ref()).await?;
        let pk = record.pk.ok_or_else(|| {
            PublicFormsError::DatabaseError(format!("saved {} has no primary key", record.label()))
        })?;
        for formset in self.formsets(request).await?.values_mut() {
            formset.save(store.as_ref(), pk).await?;
        }
        self.object = Some(record.clone());
        Ok(record)
    }

    /// Deletes the target row (and whatever the store cascades to).
    ///
    /// # Errors
    ///
    /// Returns any store error.
    pub async fn delete(&mut self, request: &HttpRequest) -> PublicFormsResult<usize> {
        let store = Arc::clone(&self.site.store);
        let removed = self.form(request).delete(store.as_ref()).await?;
        self.object = None;
        Ok(removed)
    }

    /// Rebuilds the form and formsets unbound after a mutation, so the
    /// block re-renders without the submitted (now stale) rows and delete
    /// boxes. Create blocks start over from a fresh instance; update blocks
    /// show the persisted row.
    pub async fn rebuild_unbound(&mut self, request: &HttpRequest) -> PublicFormsResult<()> {
        let class = self.form_class(request).clone();
        let instance = match (self.token.action(), &self.object) {
            (SubmitAction::Update, Some(object)) => object.clone(),
            _ => Record::new(self.meta),
        };
        let formsets = self.build_formsets(&instance, None).await?;
        self.form = Some(class.build(instance, self.token.as_str(), None));
        self.formsets = Some(formsets);
        self.validity = None;
        Ok(())
    }

    /// Renders the `<form>` element: fields, formsets and submit button.
    pub async fn render(&mut self, request: &HttpRequest) -> PublicFormsResult<String> {
        let token = escape_html(self.token.as_str());
        let query_key = escape_html(&self.token.query_key());
        let submit_label = self.token.action().submit_label();
        let form_html = self.form(request).render();
        let mut html = format!("<form method=\"post\" action=\"?{query_key}\">\n{form_html}");
        for (title, formset) in self.formsets(request).await?.iter() {
            html.push_str(&format!(
                "<fieldset class=\"public-form-inline\">\n<legend>{}</legend>\n{}</fieldset>\n",
                escape_html(title),
                formset.render()
            ));
        }
        html.push_str(&format!(
            "<input type=\"submit\" name=\"{token}\" value=\"{submit_label}\" />\n</form>"
        ));
        Ok(html)
    }

    /// The form's media followed by the formsets' media.
    pub async fn media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media> {
        let mut media = self.form(request).media();
        for formset in self.formsets(request).await?.values() {
            media.merge(&formset.media());
        }
        Ok(media)
    }
}
