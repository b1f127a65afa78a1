//! The three-phase lifecycle of one content block.
//!
//! The host calls [`PublicFormContent::process`],
//! [`PublicFormContent::render`] and [`PublicFormContent::finalize`] in
//! that order for every placed block on every request. The first call
//! prepares the block (resolves the variation, loads the target row and
//! builds both renderers); later calls reuse that state.
//!
//! Routing is decided once per request: if the request carries the
//! block's token it goes to the [`ModificationRenderer`], otherwise to the
//! [`PresentationRenderer`] and finalize does nothing. Owning XHR requests
//! that accept HTML get the bare form fragment and skip finalize.

use std::fmt;
use std::sync::Arc;

use tracing::Instrument;

use public_forms_core::logging::block_span;
use public_forms_core::{PublicFormsError, PublicFormsResult};
use public_forms_forms::html::escape_html;
use public_forms_forms::Media;
use public_forms_http::{HttpRequest, HttpResponse};

use crate::inline::InlineSpec;
use crate::ownership::SubmitToken;
use crate::page::{ContentBlock, Page};
use crate::pipeline::FormPipeline;
use crate::registry::VariationRegistry;
use crate::renderer::{wants_fragment, ModificationRenderer, PresentationRenderer, Renderer};
use crate::site::Site;

/// The output of the render phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The wrapped block, to be embedded in the page template.
    Embedded(String),
    /// The bare form, to be returned as the whole XHR response.
    Fragment(String),
}

impl Rendered {
    /// The markup.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Embedded(html) | Self::Fragment(html) => html,
        }
    }

    /// Returns `true` for the AJAX fragment.
    pub const fn is_fragment(&self) -> bool {
        matches!(self, Self::Fragment(_))
    }

    /// Wraps the markup in a `200 OK` response.
    pub fn into_response(self) -> HttpResponse {
        match self {
            Self::Embedded(html) | Self::Fragment(html) => HttpResponse::ok(html),
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Prepared {
    token: SubmitToken,
    owner: bool,
    fragment: bool,
    modification: ModificationRenderer,
    presentation: PresentationRenderer,
}

impl Prepared {
    fn active(&mut self) -> &mut dyn Renderer {
        if self.owner {
            &mut self.modification
        } else {
            &mut self.presentation
        }
    }
}

/// One placed public-form block, driven for one request.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, LazyLock};
///
/// use public_forms_core::PublicFormsSettings;
/// use public_forms_db::{ContentTypeRegistry, FieldDef, FieldType, InMemoryStore, ModelMeta};
/// use public_forms_http::HttpRequest;
/// use public_forms_renderers::{
///     ContentBlock, Page, PublicFormContent, Site, TargetRef, VariationRegistry,
/// };
///
/// static NOTE: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new("app", "note")
///         .field(FieldDef::auto_pk())
///         .field(FieldDef::new("text", FieldType::CharField).max_length(50))
/// });
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let settings = Arc::new(PublicFormsSettings::default());
/// let mut types = ContentTypeRegistry::new(&settings);
/// types.register(&NOTE).unwrap();
/// let site = Site::new(settings, Arc::new(InMemoryStore::new()), Arc::new(types));
///
/// let page = Arc::new(Page::new("home", "/"));
/// let block = ContentBlock::new("main", 0, "CreatePublicForm", TargetRef::new("app.note", None))
///     .captcha_once(false);
/// let mut content = PublicFormContent::new(
///     site,
///     Arc::new(VariationRegistry::with_defaults()),
///     Arc::clone(&page),
///     block,
/// );
///
/// let request = HttpRequest::builder().path("/").build();
/// content.process(&request).await.unwrap();
/// let html = content.render(&request).await.unwrap();
/// assert!(html.as_str().starts_with("<div id=\"home_main_0_public_form\""));
/// assert!(content.finalize(&request, &html.into_response()).await.unwrap().is_none());
/// assert!(page.contains_forms());
/// # });
/// ```
pub struct PublicFormContent {
    site: Site,
    variations: Arc<VariationRegistry>,
    page: Arc<Page>,
    block: Arc<ContentBlock>,
    extra_inlines: Vec<InlineSpec>,
    state: Option<Prepared>,
}

impl PublicFormContent {
    /// Creates the driver for `block` on `page`.
    pub fn new(
        site: Site,
        variations: Arc<VariationRegistry>,
        page: Arc<Page>,
        block: ContentBlock,
    ) -> Self {
        Self {
            site,
            variations,
            page,
            block: Arc::new(block),
            extra_inlines: Vec::new(),
            state: None,
        }
    }

    /// The placed block.
    pub fn block(&self) -> &ContentBlock {
        &self.block
    }

    /// Adds an inline formset on top of the variation's own.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::ImproperlyConfigured`] once the block
    /// has been prepared.
    pub fn add_inline(&mut self, inline: InlineSpec) -> PublicFormsResult<()> {
        if self.state.is_some() {
            return Err(PublicFormsError::ImproperlyConfigured(format!(
                "cannot add inline {} after the block was processed",
                inline.model.label()
            )));
        }
        self.extra_inlines.push(inline);
        Ok(())
    }

    /// The block's token, once prepared.
    pub fn token(&self) -> Option<&SubmitToken> {
        self.state.as_ref().map(|s| &s.token)
    }

    /// Returns `true` if the prepared request owns this block.
    pub fn is_owner(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.owner)
    }

    /// The renderer serving this request, once prepared.
    pub fn renderer_mut(&mut self) -> Option<&mut dyn Renderer> {
        self.state.as_mut().map(Prepared::active)
    }

    fn container_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.page.slug, self.block.region, self.block.ordering
        )
    }

    async fn build(&self, request: &HttpRequest) -> PublicFormsResult<Prepared> {
        let mut config = self.variations.resolve(&self.block.variation)?;
        config.inlines.extend(self.extra_inlines.iter().cloned());
        let config = Arc::new(config);

        let meta = self.site.content_types.get(&self.block.target.content_type)?;
        let token = SubmitToken::new(
            &self.page.slug,
            &self.block.region,
            self.block.ordering,
            config.action,
        );
        let object = if config.action.needs_target() {
            let pk = self.block.target.object_id.ok_or_else(|| {
                PublicFormsError::ImproperlyConfigured(format!(
                    "{} block {token} has no target object",
                    self.block.variation
                ))
            })?;
            Some(self.site.store.get(meta, pk).await?)
        } else {
            None
        };
        self.page.mark_contains_forms();

        let owner = token.is_owner(request);
        let pipeline = |binds_data| {
            FormPipeline::new(
                self.site.clone(),
                Arc::clone(&config),
                Arc::clone(&self.block),
                token.clone(),
                meta,
                object.clone(),
                binds_data,
            )
        };
        let modification =
            ModificationRenderer::new(pipeline(true), Arc::clone(&config), Arc::clone(&self.page));
        let presentation = PresentationRenderer::new(pipeline(false), Arc::clone(&config));

        Ok(Prepared {
            fragment: owner && wants_fragment(request),
            token,
            owner,
            modification,
            presentation,
        })
    }

    async fn prepare(&mut self, request: &HttpRequest) -> PublicFormsResult<&mut Prepared> {
        let prepared = match self.state.take() {
            Some(prepared) => prepared,
            None => {
                let mut prepared = self.build(request).await?;
                tracing::debug!(
                    owner = prepared.owner,
                    fragment = prepared.fragment,
                    "prepared block"
                );
                prepared.active().on_prepare(request).await?;
                prepared
            }
        };
        Ok(self.state.insert(prepared))
    }

    /// Prepare phase. Runs its setup once; later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PublicFormsError::UnknownVariation`],
    /// [`PublicFormsError::UnknownContentType`],
    /// [`PublicFormsError::ImproperlyConfigured`] for update and delete
    /// blocks without a target, or [`PublicFormsError::DoesNotExist`] when
    /// the target row is gone.
    pub async fn process(&mut self, request: &HttpRequest) -> PublicFormsResult<()> {
        let span = block_span(&self.container_id(), "process");
        self.prepare(request).instrument(span).await.map(|_| ())
    }

    /// Render phase.
    ///
    /// Returns the wrapped block, or the bare fragment for owning XHR
    /// requests.
    ///
    /// # Errors
    ///
    /// Returns preparation errors and store errors raised while applying
    /// the submission.
    pub async fn render(&mut self, request: &HttpRequest) -> PublicFormsResult<Rendered> {
        let span = block_span(&self.container_id(), "render");
        self.render_block(request).instrument(span).await
    }

    async fn render_block(&mut self, request: &HttpRequest) -> PublicFormsResult<Rendered> {
        let prepared = self.prepare(request).await?;
        let container = prepared.token.container_id().to_string();
        let fragment = prepared.fragment;
        if prepared.owner {
            tracing::debug!(fragment, "routing to modification renderer");
        } else {
            tracing::debug!("routing to presentation renderer");
        }
        let html = prepared.active().render(request).await?;
        if fragment {
            tracing::debug!("returning bare fragment to xhr request");
            return Ok(Rendered::Fragment(html));
        }
        Ok(Rendered::Embedded(format!(
            "<div id=\"{}_public_form\" class=\"public-form\">\n{html}\n</div>",
            escape_html(&container)
        )))
    }

    /// Finalize phase. Returns a redirect when an owning submission
    /// succeeded and the variation redirects on success.
    ///
    /// `response` is the page response built so far. Non-owning requests
    /// and XHR fragments always get `None`.
    ///
    /// # Errors
    ///
    /// Returns preparation errors and store errors raised while applying
    /// the submission.
    pub async fn finalize(
        &mut self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> PublicFormsResult<Option<HttpResponse>> {
        let span = block_span(&self.container_id(), "finalize");
        self.finalize_block(request, response).instrument(span).await
    }

    async fn finalize_block(
        &mut self,
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> PublicFormsResult<Option<HttpResponse>> {
        let prepared = self.prepare(request).await?;
        if !prepared.owner {
            return Ok(None);
        }
        if prepared.fragment {
            tracing::debug!("xhr fragment, skipping finalize");
            return Ok(None);
        }
        tracing::debug!(status = %response.status(), "finalizing owning submission");
        prepared.modification.on_response(request).await
    }

    /// The active renderer's assets followed by its form's.
    ///
    /// # Errors
    ///
    /// Returns preparation errors.
    pub async fn media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media> {
        let span = block_span(&self.container_id(), "media");
        self.block_media(request).instrument(span).await
    }

    async fn block_media(&mut self, request: &HttpRequest) -> PublicFormsResult<Media> {
        self.prepare(request).await?.active().media(request).await
    }
}

impl fmt::Debug for PublicFormContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicFormContent")
            .field("page", &self.page.slug)
            .field("block", &self.block)
            .field("token", &self.token())
            .field("owner", &self.is_owner())
            .finish_non_exhaustive()
    }
}
