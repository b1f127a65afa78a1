//! The two renderer personalities.
//!
//! Both wrap a [`FormPipeline`] over the same [`RendererConfig`]:
//!
//! - [`PresentationRenderer`] never binds data and never writes. It serves
//!   every block the current request does not own.
//! - [`ModificationRenderer`] binds the owning submission, validates it and
//!   applies the create, update or delete. With a success redirect and a
//!   plain (non-AJAX) request the write happens in `on_response` and yields
//!   a redirect. Otherwise it happens during `render`, after which the form
//!   is rebuilt unbound and shown again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;

use public_forms_core::PublicFormsResult;
use public_forms_db::Record;
use public_forms_forms::{Media, ModelFormClass, ModelFormConfig};
use public_forms_http::{HttpRequest, HttpResponse, HttpResponseRedirect};

use crate::inline::InlineSpec;
use crate::media::aggregate;
use crate::ownership::SubmitAction;
use crate::page::Page;
use crate::pipeline::FormPipeline;

/// A callback run by the modification renderer for one HTTP method.
pub type MethodHook = Arc<dyn Fn(&HttpRequest) + Send + Sync>;

/// Returns `true` for XHR requests that accept an HTML fragment.
pub fn wants_fragment(request: &HttpRequest) -> bool {
    request.is_ajax() && request.accepts_html_fragment()
}

/// What a renderer variation does and how.
///
/// # Examples
///
/// ```
/// use public_forms_renderers::renderer::RendererConfig;
/// use public_forms_renderers::ownership::SubmitAction;
///
/// let config = RendererConfig::update()
///     .fields(&["title", "body"])
///     .success_redirect(Some("/thanks/"));
/// assert_eq!(config.action, SubmitAction::Update);
/// assert!(config.success_action);
/// ```
#[derive(Clone)]
pub struct RendererConfig {
    /// Create, update or delete.
    pub action: SubmitAction,
    /// Field selection for the generated model form.
    pub form: ModelFormConfig,
    /// An explicit form class, used instead of the generated one.
    pub form_class: Option<ModelFormClass>,
    /// Inline formsets in display order.
    pub inlines: Vec<InlineSpec>,
    /// Redirect after a successful submission.
    pub success_action: bool,
    /// Redirect target. Falls back to the page URL, then the object's URL.
    pub success_url: Option<String>,
    /// Per-method callbacks run before rendering.
    pub method_hooks: HashMap<Method, MethodHook>,
    /// Assets the renderer itself declares.
    pub media: Media,
}

impl RendererConfig {
    /// A configuration for `action` with no inlines and no redirect.
    pub fn new(action: SubmitAction) -> Self {
        Self {
            action,
            form: ModelFormConfig::default(),
            form_class: None,
            inlines: Vec::new(),
            success_action: false,
            success_url: None,
            method_hooks: HashMap::new(),
            media: Media::new(),
        }
    }

    /// `CreatePublicForm`.
    pub fn create() -> Self {
        Self::new(SubmitAction::Create)
    }

    /// `UpdatePublicForm`.
    pub fn update() -> Self {
        Self::new(SubmitAction::Update)
    }

    /// `DeletePublicForm`.
    pub fn delete() -> Self {
        Self::new(SubmitAction::Delete)
    }

    /// Restricts the generated form to `fields`.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.form = ModelFormConfig::only(fields);
        self
    }

    /// Leaves `fields` out of the generated form.
    #[must_use]
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.form = self.form.exclude(fields);
        self
    }

    /// Uses `class` instead of a generated form.
    #[must_use]
    pub fn form_class(mut self, class: ModelFormClass) -> Self {
        self.form_class = Some(class);
        self
    }

    /// Appends an inline formset.
    #[must_use]
    pub fn inline(mut self, inline: InlineSpec) -> Self {
        self.inlines.push(inline);
        self
    }

    /// Redirects after success, to `url` if given.
    #[must_use]
    pub fn success_redirect(mut self, url: Option<&str>) -> Self {
        self.success_action = true;
        self.success_url = url.map(str::to_string);
        self
    }

    /// Registers a callback for `method`.
    #[must_use]
    pub fn method_hook(
        mut self,
        method: Method,
        hook: impl Fn(&HttpRequest) + Send + Sync + 'static,
    ) -> Self {
        self.method_hooks.insert(method, Arc::new(hook));
        self
    }

    /// Sets the renderer's own assets.
    #[must_use]
    pub fn media(mut self, media: Media) -> Self {
        self.media = media;
        self
    }
}

impl fmt::Debug for RendererConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hooks: Vec<&str> = self.method_hooks.keys().map(Method::as_str).collect();
        hooks.sort_unstable();
        f.debug_struct("RendererConfig")
            .field("action", &self.action)
            .field("form", &self.form)
            .field("form_class", &self.form_class.is_some())
            .field("inlines", &self.inlines)
            .field("success_action", &self.success_action)
            .field("success_url", &self.success_url)
            .field("method_hooks", &hooks)
            .field("media", &self.media)
            .finish()
    }
}

/// The capability set the dispatcher drives.
#[async_trait]
pub trait Renderer: Send {
    /// Prepare phase. Reads the request, never writes.
    async fn on_prepare(&mut self, request: &HttpRequest) -> PublicFormsResult<()>;

    /// Renders the inner `<form>` fragment.
    async fn render(&mut self, request: &HttpRequest) -> PublicFormsResult<String>;

    /// Finalize phase. May return a redirect.
    async fn on_response(&mut self, request: &HttpRequest)
        -> PublicFormsResult<Option<HttpResponse>>;

    /// Renderer assets followed by form assets.
    async fn media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media>;

    /// The composition pipeline.
    fn pipeline(&mut self) -> &mut FormPipeline;
}

/// Shows the form unbound. Never writes.
#[derive(Debug)]
pub struct PresentationRenderer {
    pipeline: FormPipeline,
    config: Arc<RendererConfig>,
}

impl PresentationRenderer {
    /// Wraps a non-binding pipeline.
    pub const fn new(pipeline: FormPipeline, config: Arc<RendererConfig>) -> Self {
        Self { pipeline, config }
    }
}

#[async_trait]
impl Renderer for PresentationRenderer {
    async fn on_prepare(&mut self, request: &HttpRequest) -> PublicFormsResult<()> {
        self.pipeline.form_class(request);
        Ok(())
    }

    async fn render(&mut self, request: &HttpRequest) -> PublicFormsResult<String> {
        self.pipeline.render(request).await
    }

    async fn on_response(
        &mut self,
        _request: &HttpRequest,
    ) -> PublicFormsResult<Option<HttpResponse>> {
        Ok(None)
    }

    async fn media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media> {
        let form = self.pipeline.media(request).await?;
        Ok(aggregate(&self.config.media, &form))
    }

    fn pipeline(&mut self) -> &mut FormPipeline {
        &mut self.pipeline
    }
}

/// Binds, validates and applies the owning submission.
#[derive(Debug)]
pub struct ModificationRenderer {
    pipeline: FormPipeline,
    config: Arc<RendererConfig>,
    page: Arc<Page>,
    success_url: Option<Option<String>>,
    applied: bool,
}

impl ModificationRenderer {
    /// Wraps a binding pipeline.
    pub const fn new(pipeline: FormPipeline, config: Arc<RendererConfig>, page: Arc<Page>) -> Self {
        Self {
            pipeline,
            config,
            page,
            success_url: None,
            applied: false,
        }
    }

    /// Returns `true` once the mutation was applied.
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Returns `true` if a successful submission ends in a redirect.
    pub fn redirects(&self) -> bool {
        self.config.success_action
            && (self.config.success_url.is_some()
                || !self.page.url.is_empty()
                || self.pipeline.meta().absolute_url.is_some())
    }

    /// Where to go after a successful submission, or `None` to re-render in
    /// place. Resolved once: the configured URL, else the page URL, else
    /// the target object's own URL.
    pub fn success_url(&mut self) -> Option<String> {
        if let Some(url) = &self.success_url {
            return url.clone();
        }
        let url = if self.config.success_action {
            self.config
                .success_url
                .clone()
                .or_else(|| (!self.page.url.is_empty()).then(|| self.page.url.clone()))
                .or_else(|| self.pipeline.object().and_then(Record::get_absolute_url))
        } else {
            None
        };
        self.success_url = Some(url.clone());
        url
    }

    /// Validates the owning submission and, if valid, applies it. Runs the
    /// mutation at most once; returns whether it has been applied.
    async fn apply(&mut self, request: &HttpRequest) -> PublicFormsResult<bool> {
        if self.applied {
            return Ok(true);
        }
        let token = self.pipeline.token().clone();
        if !(token.is_owner(request) && request.is_submission()) {
            return Ok(false);
        }
        if !self.pipeline.is_valid(request).await? {
            tracing::debug!(token = %token, "submission rejected");
            return Ok(false);
        }
        let label = self.pipeline.meta().label();
        match token.action() {
            SubmitAction::Delete => {
                let pk = self.pipeline.object().and_then(|o| o.pk);
                let removed = self.pipeline.delete(request).await?;
                tracing::info!(model = %label, pk = ?pk, removed, "deleted target row");
            }
            action => {
                let record = self.pipeline.save(request).await?;
                tracing::info!(model = %label, pk = ?record.pk, action = %action, "saved target row");
            }
        }
        self.applied = true;
        Ok(true)
    }
}

#[async_trait]
impl Renderer for ModificationRenderer {
    async fn on_prepare(&mut self, request: &HttpRequest) -> PublicFormsResult<()> {
        self.pipeline.form_class(request);
        Ok(())
    }

    async fn render(&mut self, request: &HttpRequest) -> PublicFormsResult<String> {
        if let Some(hook) = self.config.method_hooks.get(request.method()) {
            hook(request);
        }
        let owning_submission = self.pipeline.token().is_owner(request) && request.is_submission();
        if owning_submission {
            let deferred = self.redirects() && !wants_fragment(request);
            if deferred {
                // Validate now so a rejected submission renders its errors;
                // the write itself waits for on_response.
                self.pipeline.is_valid(request).await?;
            } else if self.apply(request).await? {
                self.pipeline.rebuild_unbound(request).await?;
            }
        }
        self.pipeline.render(request).await
    }

    async fn on_response(
        &mut self,
        request: &HttpRequest,
    ) -> PublicFormsResult<Option<HttpResponse>> {
        if !self.redirects() || !self.pipeline.token().is_owner(request) {
            return Ok(None);
        }
        if self.pipeline.token().action() == SubmitAction::Delete {
            // The row and its URL are gone once deleted.
            self.success_url();
        }
        if !self.apply(request).await? {
            return Ok(None);
        }
        Ok(self.success_url().map(|url| {
            tracing::debug!(location = %url, "redirecting after success");
            HttpResponseRedirect::new(&url)
        }))
    }

    async fn media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media> {
        let form = self.pipeline.media(request).await?;
        Ok(aggregate(&self.config.media, &form))
    }

    fn pipeline(&mut self) -> &mut FormPipeline {
        &mut self.pipeline
    }
}
