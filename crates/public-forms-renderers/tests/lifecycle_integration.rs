//! Integration tests for the process -> render -> finalize lifecycle.
//!
//! Every test drives a fresh `PublicFormContent` per request against the
//! in-memory store, the way a host drives each placed block:
//! 1. Ownership routing and memoization
//! 2. Validation composition with inline formsets
//! 3. Create, update and delete scenarios
//! 4. Non-owning requests
//! 5. AJAX fragments
//! 6. Configuration errors

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http::Method;

use public_forms_core::PublicFormsError;
use public_forms_db::{ModelStore, Value};
use public_forms_http::{HttpRequest, HttpResponse};
use public_forms_renderers::{
    InlineSpec, PublicFormContent, Rendered, RendererConfig, TargetRef, VariationRegistry,
};
use public_forms_test::fixtures::{author_block, block, AUTHOR, BOOK, NOTE, PAGE_URL};
use public_forms_test::{RequestFactory, TestSite};

const CREATE: &str = "home_main_0_create";
const UPDATE: &str = "home_main_0_update";
const DELETE: &str = "home_main_0_delete";

// ============================================================================
// Shared helpers
// ============================================================================

/// Runs all three phases and returns the rendered block and the redirect.
async fn run(
    content: &mut PublicFormContent,
    request: &HttpRequest,
) -> (Rendered, Option<HttpResponse>) {
    content.process(request).await.unwrap();
    let rendered = content.render(request).await.unwrap();
    let page = HttpResponse::ok(rendered.to_string());
    let redirect = content.finalize(request, &page).await.unwrap();
    (rendered, redirect)
}

/// The stock variations plus an author create form with books inline.
fn variations_with_books() -> VariationRegistry {
    let mut registry = VariationRegistry::with_defaults();
    registry.register("AuthorWithBooks", || {
        RendererConfig::create().inline(InlineSpec::new(&BOOK).extra(1))
    });
    registry
}

fn field(name: &str) -> String {
    format!("{CREATE}-{name}")
}

// ============================================================================
// 1. Ownership routing and memoization
// ============================================================================

#[tokio::test]
async fn test_token_presence_decides_ownership_for_every_method() {
    let site = TestSite::new().unwrap();
    let factory = RequestFactory::new();

    let cases = [
        (factory.get_owned(PAGE_URL, CREATE), true),
        (factory.put(PAGE_URL, CREATE, &[]), true),
        (factory.post(PAGE_URL, CREATE, &[]), true),
        (factory.get(PAGE_URL), false),
        (factory.post_anonymous(PAGE_URL, &[(CREATE, "")]), true),
        (factory.get_owned(PAGE_URL, "home_main_1_create"), false),
    ];
    for (request, owner) in cases {
        let mut content = site.content(author_block("CreatePublicForm", None));
        content.process(&request).await.unwrap();
        assert_eq!(content.is_owner(), owner, "{}", request.get_full_path());
        assert_eq!(content.token().map(|t| t.as_str()), Some(CREATE));
    }
}

#[tokio::test]
async fn test_owning_get_never_mutates() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().get_owned(PAGE_URL, CREATE);
    let mut content = site.content(author_block("CreatePublicForm", None));

    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(rendered.as_str().contains(&format!(r#"name="{CREATE}""#)));
    assert!(redirect.is_none());
    assert_eq!(site.store.write_count(), 0);
}

#[tokio::test]
async fn test_form_and_formsets_are_memoized() {
    let site = TestSite::new().unwrap().with_variations(variations_with_books());
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&field("name"), "Frank")]);
    let mut content = site.content(author_block("AuthorWithBooks", None));
    content.process(&request).await.unwrap();

    let pipeline = content.renderer_mut().unwrap().pipeline();
    let first_form: *const _ = pipeline.form(&request);
    let second_form: *const _ = pipeline.form(&request);
    assert!(std::ptr::eq(first_form, second_form));

    let first_sets: *const _ = pipeline.formsets(&request).await.unwrap();
    let second_sets: *const _ = pipeline.formsets(&request).await.unwrap();
    assert!(std::ptr::eq(first_sets, second_sets));

    let valid = pipeline.is_valid(&request).await.unwrap();
    assert_eq!(pipeline.is_valid(&request).await.unwrap(), valid);
    assert_eq!(pipeline.validity(), Some(valid));
}

#[tokio::test]
async fn test_processing_marks_page() {
    let site = TestSite::new().unwrap();
    assert!(!site.page.contains_forms());
    let mut content = site.content(author_block("CreatePublicForm", None));
    content.process(&RequestFactory::new().get(PAGE_URL)).await.unwrap();
    assert!(site.page.contains_forms());
}

// ============================================================================
// 2. Validation composition
// ============================================================================

fn author_with_book(name: &str, title: &str, pages: &str) -> Vec<(String, String)> {
    vec![
        (field("name"), name.to_string()),
        (field("book_set-TOTAL_FORMS"), "1".to_string()),
        (field("book_set-INITIAL_FORMS"), "0".to_string()),
        (field("book_set-0-title"), title.to_string()),
        (field("book_set-0-pages"), pages.to_string()),
    ]
}

fn pairs(data: &[(String, String)]) -> Vec<(&str, &str)> {
    data.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

#[tokio::test]
async fn test_invalid_inline_row_blocks_every_write() {
    let site = TestSite::new().unwrap().with_variations(variations_with_books());
    let data = author_with_book("Frank", "Dune", "many");
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &pairs(&data));
    let mut content = site.content(author_block("AuthorWithBooks", None));

    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(redirect.is_none());
    assert_eq!(site.store.write_count(), 0);
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 0);
    assert_eq!(site.store.count(&BOOK).await.unwrap(), 0);

    let html = rendered.as_str();
    assert!(html.contains("Enter a whole number."));
    assert!(html.contains(r#"value="Frank""#));
    assert!(html.contains(r#"value="Dune""#));
}

#[tokio::test]
async fn test_valid_inline_rows_are_saved_against_new_parent() {
    let site = TestSite::new().unwrap().with_variations(variations_with_books());
    let data = author_with_book("Frank", "Dune", "412");
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &pairs(&data));
    let mut content = site.content(author_block("AuthorWithBooks", None));

    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(redirect.is_none());
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);

    let author = site.author(1).await.unwrap();
    assert_eq!(author.get("name"), &Value::from("Frank"));
    let books = site
        .store
        .filter_eq(&BOOK, "author", &Value::Int(1))
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].get("pages"), &Value::Int(412));

    // Re-rendered unbound for the next entry.
    let html = rendered.as_str();
    assert!(!html.contains(r#"value="Frank""#));
    assert!(!html.contains("errorlist"));
    assert!(html.contains("<legend>books</legend>"));
}

#[tokio::test]
async fn test_blank_extra_rows_are_ignored() {
    let site = TestSite::new().unwrap().with_variations(variations_with_books());
    let data = author_with_book("Frank", "", "");
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &pairs(&data));
    let mut content = site.content(author_block("AuthorWithBooks", None));

    run(&mut content, &request).await;
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);
    assert_eq!(site.store.count(&BOOK).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_management_form_is_invalid() {
    let site = TestSite::new().unwrap().with_variations(variations_with_books());
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&field("name"), "Frank")]);
    let mut content = site.content(author_block("AuthorWithBooks", None));

    let (rendered, _) = run(&mut content, &request).await;
    assert_eq!(site.store.write_count(), 0);
    assert!(rendered
        .as_str()
        .contains("ManagementForm data is missing or has been tampered with."));
}

#[tokio::test]
async fn test_dynamic_inline_added_before_processing() {
    let site = TestSite::new().unwrap();
    let author = site.seed_author("Ursula", "").await.unwrap();
    let pk = author.pk.unwrap();
    site.seed_book(pk, "The Dispossessed", 387).await.unwrap();

    let request = RequestFactory::new().get(PAGE_URL);
    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    content.add_inline(InlineSpec::new(&BOOK).extra(0)).unwrap();
    let (rendered, _) = run(&mut content, &request).await;

    let html = rendered.as_str();
    assert!(html.contains("<legend>books</legend>"));
    assert!(html.contains(r#"value="The Dispossessed""#));
    assert!(html.contains(&format!(r#"name="{UPDATE}-book_set-INITIAL_FORMS" value="1""#)));

    assert!(matches!(
        content.add_inline(InlineSpec::new(&BOOK)),
        Err(PublicFormsError::ImproperlyConfigured(_))
    ));
}

#[tokio::test]
async fn test_inline_rows_updated_and_deleted() {
    let site = TestSite::new().unwrap();
    let pk = site.seed_author("Ursula", "").await.unwrap().pk.unwrap();
    site.seed_book(pk, "The Dispossessed", 387).await.unwrap();
    site.seed_book(pk, "Lathe of Heaven", 184).await.unwrap();

    let data = [
        (format!("{UPDATE}-name"), "Ursula K. Le Guin"),
        (format!("{UPDATE}-book_set-TOTAL_FORMS"), "2"),
        (format!("{UPDATE}-book_set-INITIAL_FORMS"), "2"),
        (format!("{UPDATE}-book_set-0-title"), "The Dispossessed"),
        (format!("{UPDATE}-book_set-0-pages"), "400"),
        (format!("{UPDATE}-book_set-1-title"), "Lathe of Heaven"),
        (format!("{UPDATE}-book_set-1-pages"), "184"),
        (format!("{UPDATE}-book_set-1-DELETE"), "on"),
    ];
    let data: Vec<(&str, &str)> = data.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let request = RequestFactory::new().post(PAGE_URL, UPDATE, &data);
    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    content.add_inline(InlineSpec::new(&BOOK).extra(0)).unwrap();
    let (rendered, _) = run(&mut content, &request).await;

    // Re-rendered from the saved rows, not from the submitted formset.
    let html = rendered.as_str();
    assert!(!html.contains("Lathe of Heaven"));
    assert!(!html.contains("checked"));
    assert!(html.contains(r#"value="400""#));
    assert!(html.contains(&format!(r#"name="{UPDATE}-book_set-INITIAL_FORMS" value="1""#)));

    let books = site
        .store
        .filter_eq(&BOOK, "author", &Value::Int(pk))
        .await
        .unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].get("pages"), &Value::Int(400));
    assert_eq!(
        site.author(pk).await.unwrap().get("name"),
        &Value::from("Ursula K. Le Guin")
    );
}

// ============================================================================
// 3. Create, update and delete
// ============================================================================

fn redirecting(factory: fn() -> RendererConfig, name: &'static str) -> VariationRegistry {
    let mut registry = VariationRegistry::with_defaults();
    registry.register(name, move || factory().success_redirect(None));
    registry
}

#[tokio::test]
async fn test_create_redirects_to_page_url() {
    let site = TestSite::new()
        .unwrap()
        .with_variations(redirecting(RendererConfig::create, "CreatePublicForm"));
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&field("name"), "Ada")]);
    let mut content = site.content(author_block("CreatePublicForm", None));

    content.process(&request).await.unwrap();
    let rendered = content.render(&request).await.unwrap();
    assert_eq!(site.store.write_count(), 0, "mutation waits for finalize");

    let page = HttpResponse::ok(rendered.to_string());
    let redirect = content.finalize(&request, &page).await.unwrap().unwrap();
    assert!(redirect.is_redirect());
    assert!(redirect.location().unwrap().contains(PAGE_URL));
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);

    // A second finalize must not create another row.
    content.finalize(&request, &page).await.unwrap();
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_redirects_to_configured_url() {
    let mut registry = VariationRegistry::with_defaults();
    registry.register("CreatePublicForm", || {
        RendererConfig::create().success_redirect(Some("/thanks/"))
    });
    let site = TestSite::new().unwrap().with_variations(registry);
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&field("name"), "Ada")]);
    let mut content = site.content(author_block("CreatePublicForm", None));

    let (_, redirect) = run(&mut content, &request).await;
    assert_eq!(redirect.unwrap().location(), Some("/thanks/"));
}

#[tokio::test]
async fn test_invalid_create_with_redirect_re_renders() {
    let site = TestSite::new()
        .unwrap()
        .with_variations(redirecting(RendererConfig::create, "CreatePublicForm"));
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&field("email"), "nope")]);
    let mut content = site.content(author_block("CreatePublicForm", None));

    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(redirect.is_none());
    assert_eq!(site.store.write_count(), 0);
    assert!(rendered.as_str().contains("This field is required."));
    assert!(rendered.as_str().contains("Enter a valid email address."));
}

#[tokio::test]
async fn test_update_round_trip() {
    let site = TestSite::new().unwrap();
    let pk = site
        .seed_author("Octavia", "ob@example.com")
        .await
        .unwrap()
        .pk
        .unwrap();
    let factory = RequestFactory::new();

    let rejected = factory.post(
        PAGE_URL,
        UPDATE,
        &[
            (&format!("{UPDATE}-name"), ""),
            (&format!("{UPDATE}-email"), "new@example.com"),
        ],
    );
    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    let (rendered, _) = run(&mut content, &rejected).await;
    let html = rendered.as_str();
    assert!(html.contains("This field is required."));
    assert!(html.contains(r#"value="new@example.com""#));
    let row = site.author(pk).await.unwrap();
    assert_eq!(row.get("name"), &Value::from("Octavia"));
    assert_eq!(row.get("email"), &Value::from("ob@example.com"));
    assert_eq!(site.store.write_count(), 1);

    let corrected = factory.post(
        PAGE_URL,
        UPDATE,
        &[
            (&format!("{UPDATE}-name"), "Octavia E. Butler"),
            (&format!("{UPDATE}-email"), "new@example.com"),
        ],
    );
    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    let (rendered, _) = run(&mut content, &corrected).await;
    let html = rendered.as_str();
    assert!(!html.contains("errorlist"));
    assert!(html.contains(r#"value="Octavia E. Butler""#));
    let row = site.author(pk).await.unwrap();
    assert_eq!(row.get("name"), &Value::from("Octavia E. Butler"));
    assert_eq!(row.get("email"), &Value::from("new@example.com"));
}

#[tokio::test]
async fn test_update_clearing_optional_field_stores_empty_value() {
    let site = TestSite::new().unwrap();
    let pk = site.seed_note("Oil the lathe", "urgent").await.unwrap().pk.unwrap();
    let request = RequestFactory::new().post(
        PAGE_URL,
        UPDATE,
        &[
            (&format!("{UPDATE}-text"), "Oil the lathe"),
            (&format!("{UPDATE}-tag"), ""),
        ],
    );

    let mut content = site.content(block(
        "UpdatePublicForm",
        0,
        TargetRef::new("lib.note", Some(pk)),
    ));
    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(redirect.is_none());
    assert!(!rendered.as_str().contains("errorlist"));

    let row = site.store.get(&NOTE, pk).await.unwrap();
    assert_eq!(row.get("tag"), &Value::from(""));
    assert_eq!(row.get("text"), &Value::from("Oil the lathe"));
}

#[tokio::test]
async fn test_update_redirect_falls_back_to_object_url() {
    let site = TestSite::new()
        .unwrap()
        .with_variations(redirecting(RendererConfig::update, "UpdatePublicForm"));
    let pk = site.seed_author("Octavia", "").await.unwrap().pk.unwrap();
    let request = RequestFactory::new().post(PAGE_URL, UPDATE, &[(&format!("{UPDATE}-name"), "O.")]);

    let mut content = PublicFormContent::new(
        site.site.clone(),
        Arc::clone(&site.variations),
        Arc::new(public_forms_renderers::Page::new("home", "")),
        author_block("UpdatePublicForm", Some(pk)),
    );
    let (_, redirect) = run(&mut content, &request).await;
    assert_eq!(
        redirect.unwrap().location(),
        Some(format!("/authors/{pk}/").as_str())
    );
}

#[tokio::test]
async fn test_delete_with_any_body() {
    let site = TestSite::new().unwrap();
    let factory = RequestFactory::new();

    let first = site.seed_author("Gone", "").await.unwrap().pk.unwrap();
    site.seed_book(first, "Orphan", 10).await.unwrap();
    let second = site.seed_author("Kept", "").await.unwrap().pk.unwrap();
    let third = site.seed_author("Also gone", "").await.unwrap().pk.unwrap();

    let mut content = site.content(author_block("DeletePublicForm", Some(first)));
    let (rendered, redirect) = run(&mut content, &factory.delete(PAGE_URL, DELETE)).await;
    assert!(redirect.is_none());
    assert!(site.author(first).await.is_none());
    assert_eq!(site.store.count(&BOOK).await.unwrap(), 0);
    assert!(rendered.as_str().contains(r#"value="Delete""#));

    let junk = factory.post(PAGE_URL, DELETE, &[("whatever", "x"), (&format!("{DELETE}-name"), "")]);
    let mut content = site.content(author_block("DeletePublicForm", Some(third)));
    run(&mut content, &junk).await;
    assert!(site.author(third).await.is_none());
    assert!(site.author(second).await.is_some());
}

#[tokio::test]
async fn test_delete_redirects_when_configured() {
    let site = TestSite::new()
        .unwrap()
        .with_variations(redirecting(RendererConfig::delete, "DeletePublicForm"));
    let pk = site.seed_author("Gone", "").await.unwrap().pk.unwrap();
    let writes = site.store.write_count();

    let request = RequestFactory::new().post(PAGE_URL, DELETE, &[]);
    let mut content = site.content(author_block("DeletePublicForm", Some(pk)));
    let (_, redirect) = run(&mut content, &request).await;
    assert_eq!(redirect.unwrap().location(), Some(PAGE_URL));
    assert!(site.author(pk).await.is_none());
    assert_eq!(site.store.write_count(), writes + 1);
}

#[tokio::test]
async fn test_method_hook_runs_for_owner_only() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = VariationRegistry::with_defaults();
    let hook_calls = Arc::clone(&calls);
    registry.register("UpdatePublicForm", move || {
        let calls = Arc::clone(&hook_calls);
        RendererConfig::update().method_hook(Method::PUT, move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    });
    let site = TestSite::new().unwrap().with_variations(registry);
    let pk = site.seed_author("Octavia", "").await.unwrap().pk.unwrap();
    let factory = RequestFactory::new();

    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    run(&mut content, &factory.put(PAGE_URL, UPDATE, &[(&format!("{UPDATE}-name"), "O.")])).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(site.author(pk).await.unwrap().get("name"), &Value::from("O."));

    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));
    run(&mut content, &factory.submit(Method::PUT, PAGE_URL, "other_token", &[])).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// 4. Non-owning requests
// ============================================================================

#[tokio::test]
async fn test_non_owner_never_mutates() {
    let site = TestSite::new().unwrap();
    let pk = site.seed_author("Octavia", "").await.unwrap().pk.unwrap();
    let factory = RequestFactory::new();
    let body = [(format!("{UPDATE}-name"), "Hacked")];
    let body: Vec<(&str, &str)> = body.iter().map(|(k, v)| (k.as_str(), *v)).collect();

    let requests = [
        factory.post_anonymous(PAGE_URL, &body),
        factory.post(PAGE_URL, "home_main_1_update", &body),
        factory.delete(PAGE_URL, "home_main_1_delete"),
    ];
    for request in &requests {
        for variation in ["UpdatePublicForm", "DeletePublicForm"] {
            let mut content = site.content(author_block(variation, Some(pk)));
            let (rendered, redirect) = run(&mut content, request).await;
            assert!(!content.is_owner());
            assert!(redirect.is_none());
            assert!(!rendered.as_str().contains("Hacked"));
        }
    }
    assert_eq!(site.store.write_count(), 1);
    assert_eq!(
        site.author(pk).await.unwrap().get("name"),
        &Value::from("Octavia")
    );
}

#[tokio::test]
async fn test_non_owner_sees_wrapped_unbound_form() {
    let site = TestSite::new().unwrap();
    let pk = site.seed_author("Octavia", "").await.unwrap().pk.unwrap();
    let request = RequestFactory::new().get(PAGE_URL);
    let mut content = site.content(author_block("UpdatePublicForm", Some(pk)));

    let (rendered, _) = run(&mut content, &request).await;
    let html = rendered.as_str();
    assert!(html.starts_with(r#"<div id="home_main_0_public_form" class="public-form">"#));
    assert!(html.contains(&format!(r#"<form method="post" action="?{UPDATE}">"#)));
    assert!(html.contains(r#"value="Octavia""#));
    assert!(html.contains(&format!(r#"<input type="submit" name="{UPDATE}" value="Save" />"#)));
}

// ============================================================================
// 5. AJAX fragments
// ============================================================================

#[tokio::test]
async fn test_ajax_owner_gets_fragment_and_skips_finalize() {
    let site = TestSite::new()
        .unwrap()
        .with_variations(redirecting(RendererConfig::create, "CreatePublicForm"));
    let request = RequestFactory::new()
        .ajax()
        .post(PAGE_URL, CREATE, &[(&field("name"), "Ada")]);
    let mut content = site.content(author_block("CreatePublicForm", None).ajax(true));

    let (rendered, redirect) = run(&mut content, &request).await;
    assert!(rendered.is_fragment());
    assert!(rendered.as_str().starts_with("<form"));
    assert!(redirect.is_none());
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ajax_non_owner_is_embedded() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().ajax().get(PAGE_URL);
    let mut content = site.content(author_block("CreatePublicForm", None));

    let (rendered, _) = run(&mut content, &request).await;
    assert!(!rendered.is_fragment());
}

#[tokio::test]
async fn test_xhr_without_html_accept_is_not_a_fragment() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new()
        .with_default_header("x-requested-with", "XMLHttpRequest")
        .with_default_header("accept", "application/json")
        .post(PAGE_URL, CREATE, &[(&field("name"), "Ada")]);
    let mut content = site.content(author_block("CreatePublicForm", None));

    let (rendered, _) = run(&mut content, &request).await;
    assert!(!rendered.is_fragment());
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);
}

// ============================================================================
// 6. Configuration errors
// ============================================================================

#[tokio::test]
async fn test_update_without_target_id() {
    let site = TestSite::new().unwrap();
    let mut content = site.content(author_block("UpdatePublicForm", None));
    let err = content
        .process(&RequestFactory::new().get(PAGE_URL))
        .await
        .unwrap_err();
    assert!(matches!(err, PublicFormsError::ImproperlyConfigured(_)));
}

#[tokio::test]
async fn test_missing_target_row_propagates() {
    let site = TestSite::new().unwrap();
    let mut content = site.content(author_block("DeletePublicForm", Some(99)));
    let err = content
        .process(&RequestFactory::new().get(PAGE_URL))
        .await
        .unwrap_err();
    assert!(matches!(err, PublicFormsError::DoesNotExist(_)));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_unknown_variation_and_content_type() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().get(PAGE_URL);

    let mut content = site.content(author_block("ArchivePublicForm", None));
    assert!(matches!(
        content.render(&request).await,
        Err(PublicFormsError::UnknownVariation(_))
    ));

    let mut block = author_block("CreatePublicForm", None);
    block.target.content_type = "lib.publisher".to_string();
    let mut content = site.content(block);
    assert!(matches!(
        content.process(&request).await,
        Err(PublicFormsError::UnknownContentType(_))
    ));
}
