//! # public-forms-renderers
//!
//! Create, update and delete forms embedded in CMS page regions.
//!
//! Every placed [`ContentBlock`] is driven through three phases per request
//! by a [`PublicFormContent`]: `process`, `render` and `finalize`. The
//! dispatcher first decides whether the request is the block's own
//! submission (its [`SubmitToken`] is among the request parameters). Owning
//! requests go to the [`ModificationRenderer`], which binds the submitted
//! data, validates the form and its inline formsets together and applies
//! the mutation. Everything else goes to the [`PresentationRenderer`],
//! which only ever shows unbound forms and never writes.
//!
//! ## Modules
//!
//! - [`ownership`] - submission tokens and the owner test
//! - [`captcha`] - when a CAPTCHA challenge is required, and in which language
//! - [`page`] - the host page and placed content blocks
//! - [`inline`] - inline formset declarations and their titles
//! - [`pipeline`] - memoized form / formset composition
//! - [`renderer`] - the presentation and modification renderers
//! - [`registry`] - variation name to renderer configuration
//! - [`dispatch`] - the three-phase lifecycle shim
//! - [`media`] - page-level asset aggregation
//! - [`site`] - the services every block renders against

pub mod captcha;
pub mod dispatch;
pub mod inline;
pub mod media;
pub mod ownership;
pub mod page;
pub mod pipeline;
pub mod registry;
pub mod renderer;
pub mod site;

pub use dispatch::{PublicFormContent, Rendered};
pub use inline::InlineSpec;
pub use ownership::{SubmitAction, SubmitToken};
pub use page::{ContentBlock, Page, TargetRef};
pub use pipeline::FormPipeline;
pub use registry::VariationRegistry;
pub use renderer::{
    MethodHook, ModificationRenderer, PresentationRenderer, Renderer, RendererConfig,
};
pub use site::Site;
