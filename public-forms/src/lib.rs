//! # public-forms
//!
//! Create, update and delete forms that editors place into CMS page
//! regions as content blocks.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `public-forms` for everything, or on individual crates for finer
//! control.
//!
//! ## Example
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//!
//! use public_forms::prelude::*;
//!
//! static NOTE: LazyLock<ModelMeta> = LazyLock::new(|| {
//!     ModelMeta::new("app", "note")
//!         .field(FieldDef::auto_pk())
//!         .field(FieldDef::new("text", FieldType::CharField).max_length(80))
//! });
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let settings = Arc::new(PublicFormsSettings::default());
//! let mut types = ContentTypeRegistry::new(&settings);
//! types.register(&NOTE).unwrap();
//! let store = Arc::new(InMemoryStore::new());
//! let site = Site::new(settings, store.clone(), Arc::new(types));
//! let variations = Arc::new(VariationRegistry::with_defaults());
//! let page = Arc::new(Page::new("notes", "/notes/"));
//!
//! let block = ContentBlock::new("main", 0, "CreatePublicForm", TargetRef::new("app.note", None))
//!     .captcha_once(false);
//! let request = HttpRequest::builder()
//!     .method(http::Method::POST)
//!     .query_string("notes_main_0_create")
//!     .content_type("application/x-www-form-urlencoded")
//!     .body(b"notes_main_0_create-text=hello".to_vec())
//!     .build();
//!
//! let mut content = PublicFormContent::new(site, variations, page, block);
//! content.process(&request).await.unwrap();
//! let rendered = content.render(&request).await.unwrap();
//! let response = rendered.into_response();
//! assert!(content.finalize(&request, &response).await.unwrap().is_none());
//! assert_eq!(store.count(&NOTE).await.unwrap(), 1);
//! # });
//! ```

/// Errors, settings, settings loading and logging.
pub use public_forms_core as core;

/// Requests, responses, sessions and users.
#[cfg(feature = "http")]
pub use public_forms_http as http;

/// Model metadata, records, the content-type registry and stores.
#[cfg(feature = "db")]
pub use public_forms_db as db;

/// Fields, widgets, media, model forms, inline formsets and the challenge field.
#[cfg(feature = "forms")]
pub use public_forms_forms as forms;

/// Ownership, CAPTCHA policy, composition, renderers and the dispatcher.
#[cfg(feature = "renderers")]
pub use public_forms_renderers as renderers;

/// Request factory and fixtures.
#[cfg(feature = "testing")]
pub use public_forms_test as test;

/// The names most hosts need.
pub mod prelude {
    pub use public_forms_core::logging::setup_logging;
    pub use public_forms_core::{PublicFormsError, PublicFormsResult, PublicFormsSettings};

    #[cfg(feature = "http")]
    pub use public_forms_http::{HttpRequest, HttpResponse, HttpResponseRedirect};

    #[cfg(feature = "db")]
    pub use public_forms_db::{
        ContentTypeRegistry, FieldDef, FieldType, InMemoryStore, ModelMeta, ModelStore, Record,
        Value,
    };

    #[cfg(feature = "forms")]
    pub use public_forms_forms::{CaptchaBackend, Media, ModelFormClass, ModelFormConfig};

    #[cfg(feature = "renderers")]
    pub use public_forms_renderers::{
        ContentBlock, InlineSpec, Page, PublicFormContent, Rendered, RendererConfig, Site,
        SubmitAction, TargetRef, VariationRegistry,
    };
}
