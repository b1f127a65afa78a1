//! Sample models and a ready-made site.
//!
//! Two models with a parent/child relation cover every block variation:
//!
//! - `lib.author` (`name`, optional `email`), the block target;
//! - `lib.book` (`title`, `pages`, foreign key `author`), edited inline.
//!
//! `lib.note` adds an optional column with a model default.
//!
//! [`TestSite`] registers them against an [`InMemoryStore`] and keeps a
//! typed handle on the store so tests can count rows and writes.

use std::sync::{Arc, LazyLock};

use public_forms_core::{PublicFormsResult, PublicFormsSettings};
use public_forms_db::{
    ContentTypeRegistry, FieldDef, FieldType, InMemoryStore, ModelMeta, ModelStore, Record,
};
use public_forms_renderers::{
    ContentBlock, Page, PublicFormContent, Site, TargetRef, VariationRegistry,
};

/// Slug of the fixture page.
pub const PAGE_SLUG: &str = "home";

/// Canonical URL of the fixture page.
pub const PAGE_URL: &str = "/home/";

/// Region every fixture block is placed in.
pub const REGION: &str = "main";

/// `lib.author`.
pub static AUTHOR: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("lib", "author")
        .verbose_names("author", "authors")
        .field(FieldDef::auto_pk())
        .field(FieldDef::new("name", FieldType::CharField).max_length(50))
        .field(FieldDef::new("email", FieldType::EmailField).blank())
        .absolute_url(|r| format!("/authors/{}/", r.pk.unwrap_or_default()))
});

/// `lib.book`, a child of `lib.author`.
pub static BOOK: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("lib", "book")
        .verbose_names("book", "books")
        .field(FieldDef::auto_pk())
        .field(FieldDef::new("title", FieldType::CharField).max_length(100))
        .field(FieldDef::new("pages", FieldType::IntegerField))
        .field(FieldDef::foreign_key("author", "lib.author"))
});

/// `lib.note`, whose optional `tag` defaults to `"misc"`.
pub static NOTE: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("lib", "note")
        .verbose_names("note", "notes")
        .field(FieldDef::auto_pk())
        .field(FieldDef::new("text", FieldType::CharField).max_length(200))
        .field(
            FieldDef::new("tag", FieldType::CharField)
                .max_length(20)
                .blank()
                .default_value("misc"),
        )
});

/// A block in [`REGION`] at `ordering` with the CAPTCHA switched off.
pub fn block(variation: &str, ordering: u32, target: TargetRef) -> ContentBlock {
    ContentBlock::new(REGION, ordering, variation, target)
        .captcha_once(false)
        .captcha_always(false)
}

/// A block targeting the author `pk` (or a new author).
pub fn author_block(variation: &str, pk: Option<i64>) -> ContentBlock {
    block(variation, 0, TargetRef::new("lib.author", pk))
}

/// The services, page and variations one test runs against.
#[derive(Debug, Clone)]
pub struct TestSite {
    /// The site handed to content blocks.
    pub site: Site,
    /// The same store, typed.
    pub store: Arc<InMemoryStore>,
    /// The page every block is placed on.
    pub page: Arc<Page>,
    /// Variation registry.
    pub variations: Arc<VariationRegistry>,
}

impl TestSite {
    /// A site with default settings and the stock variations.
    pub fn new() -> PublicFormsResult<Self> {
        Self::with_settings(PublicFormsSettings::default())
    }

    /// A site with `settings` and the stock variations.
    pub fn with_settings(settings: PublicFormsSettings) -> PublicFormsResult<Self> {
        let mut content_types = ContentTypeRegistry::new(&settings);
        content_types.register(&AUTHOR)?;
        content_types.register(&BOOK)?;
        content_types.register(&NOTE)?;
        let store = Arc::new(InMemoryStore::new());
        let dyn_store: Arc<dyn ModelStore> = store.clone();
        let site = Site::new(Arc::new(settings), dyn_store, Arc::new(content_types));
        Ok(Self {
            site,
            store,
            page: Arc::new(
                Page::new(PAGE_SLUG, PAGE_URL)
                    .with_title("Home")
                    .with_regions(&[REGION, "sidebar"]),
            ),
            variations: Arc::new(VariationRegistry::with_defaults()),
        })
    }

    /// Replaces the variation registry.
    #[must_use]
    pub fn with_variations(mut self, variations: VariationRegistry) -> Self {
        self.variations = Arc::new(variations);
        self
    }

    /// A fresh driver for `block`, as the host builds one per request.
    pub fn content(&self, block: ContentBlock) -> PublicFormContent {
        PublicFormContent::new(
            self.site.clone(),
            Arc::clone(&self.variations),
            Arc::clone(&self.page),
            block,
        )
    }

    /// Inserts an author.
    pub async fn seed_author(&self, name: &str, email: &str) -> PublicFormsResult<Record> {
        let mut author = Record::new(&AUTHOR).with("name", name).with("email", email);
        self.store.insert(&mut author).await?;
        Ok(author)
    }

    /// Inserts a book by `author`.
    pub async fn seed_book(&self, author: i64, title: &str, pages: i64) -> PublicFormsResult<Record> {
        let mut book = Record::new(&BOOK)
            .with("title", title)
            .with("pages", pages)
            .with("author", author);
        self.store.insert(&mut book).await?;
        Ok(book)
    }

    /// Inserts a note.
    pub async fn seed_note(&self, text: &str, tag: &str) -> PublicFormsResult<Record> {
        let mut note = Record::new(&NOTE).with("text", text).with("tag", tag);
        self.store.insert(&mut note).await?;
        Ok(note)
    }

    /// Fetches an author, `None` once deleted.
    pub async fn author(&self, pk: i64) -> Option<Record> {
        self.store.get(&AUTHOR, pk).await.ok()
    }
}
