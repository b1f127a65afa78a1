//! Integration tests for CAPTCHA placement and media aggregation.
//!
//! 1. When the challenge field is added, and what it is built with
//! 2. Which assets a block declares

use public_forms_db::ModelStore;
use public_forms_forms::Media;
use public_forms_http::HttpRequest;
use public_forms_renderers::captcha::CAPTCHA_PASSED_KEY;
use public_forms_renderers::media::collect;
use public_forms_renderers::{ContentBlock, RendererConfig, TargetRef, VariationRegistry};
use public_forms_test::fixtures::{author_block, block, AUTHOR, PAGE_URL};
use public_forms_test::{RequestFactory, TestSite};

const CREATE: &str = "home_main_0_create";
const CAPTCHA_JS: &str = "/static/js/captcha.js";
const CAPTCHA_CSS: &str = "/static/css/captcha.css";

// ============================================================================
// Shared helpers
// ============================================================================

fn captcha_block() -> ContentBlock {
    author_block("CreatePublicForm", None).captcha_once(true)
}

/// Renders `block` and returns its markup and media.
async fn render(site: &TestSite, block: ContentBlock, request: &HttpRequest) -> (String, Media) {
    let mut content = site.content(block);
    content.process(request).await.unwrap();
    let html = content.render(request).await.unwrap().to_string();
    let media = content.media(request).await.unwrap();
    (html, media)
}

fn has_captcha(html: &str) -> bool {
    html.contains(r#"class="captcha""#)
}

// ============================================================================
// 1. Challenge field
// ============================================================================

#[tokio::test]
async fn test_anonymous_user_gets_challenge() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new()
        .with_language("de-DE,en;q=0.8")
        .get(PAGE_URL);

    let (html, _) = render(&site, captcha_block(), &request).await;
    assert!(has_captcha(&html));
    assert!(html.contains(&format!(r#"name="{CREATE}-captcha""#)));
    assert!(html.contains(r#"data-language="de""#));
    assert!(html.contains(r#"data-container="home_main_0""#));
    assert!(html.contains(&format!("{CREATE}-name")));
    assert!(html.contains(r#"data-retry="false""#));
}

#[tokio::test]
async fn test_unsupported_language_falls_back() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().with_language("ja").get(PAGE_URL);

    let (html, _) = render(&site, captcha_block(), &request).await;
    assert!(html.contains(r#"data-language="en""#));
}

#[tokio::test]
async fn test_authenticated_user_never_gets_challenge() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().with_user(1, "editor").get(PAGE_URL);

    let (html, media) = render(&site, captcha_block().captcha_always(true), &request).await;
    assert!(!has_captcha(&html));
    assert!(media.is_empty());
}

#[tokio::test]
async fn test_passed_session_flag_skips_challenge_once() {
    let site = TestSite::new().unwrap();
    let factory = RequestFactory::new().with_session_flag(CAPTCHA_PASSED_KEY, true);

    let (html, _) = render(&site, captcha_block(), &factory.get(PAGE_URL)).await;
    assert!(!has_captcha(&html));

    let always = captcha_block().captcha_always(true);
    let (html, _) = render(&site, always, &factory.get(PAGE_URL)).await;
    assert!(has_captcha(&html));
}

#[tokio::test]
async fn test_failed_submission_sets_retry_state() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().post(PAGE_URL, CREATE, &[(&format!("{CREATE}-name"), "Ada")]);

    let (html, _) = render(&site, captcha_block(), &request).await;
    assert!(html.contains(r#"data-retry="true""#));
    assert!(html.contains("This field is required."));
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 0);
}

#[tokio::test]
async fn test_answered_challenge_allows_save() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().post(
        PAGE_URL,
        CREATE,
        &[
            (&format!("{CREATE}-name"), "Ada"),
            (&format!("{CREATE}-captcha"), "x7k2"),
        ],
    );

    render(&site, captcha_block(), &request).await;
    assert_eq!(site.store.count(&AUTHOR).await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_form_has_no_challenge() {
    let site = TestSite::new().unwrap();
    let pk = site.seed_author("Gone", "").await.unwrap().pk.unwrap();
    let block = author_block("DeletePublicForm", Some(pk)).captcha_always(true);

    let request = RequestFactory::new().post(PAGE_URL, "home_main_0_delete", &[]);
    let (html, media) = render(&site, block, &request).await;
    assert!(!has_captcha(&html));
    assert!(media.is_empty());
    assert!(site.author(pk).await.is_none());
}

// ============================================================================
// 2. Media
// ============================================================================

#[tokio::test]
async fn test_challenge_assets_in_media() {
    let site = TestSite::new().unwrap();
    let (_, media) = render(&site, captcha_block(), &RequestFactory::new().get(PAGE_URL)).await;
    assert_eq!(media.js_files(), [CAPTCHA_JS]);
    assert_eq!(
        media.css_files(),
        vec![("all".to_string(), CAPTCHA_CSS.to_string())]
    );
}

#[tokio::test]
async fn test_renderer_assets_come_first() {
    let mut registry = VariationRegistry::with_defaults();
    registry.register("CreatePublicForm", || {
        let mut media = Media::new();
        media.add_js("/static/js/public_forms.js");
        media.add_js(CAPTCHA_JS);
        RendererConfig::create().media(media)
    });
    let site = TestSite::new().unwrap().with_variations(registry);

    let (_, media) = render(&site, captcha_block(), &RequestFactory::new().get(PAGE_URL)).await;
    assert_eq!(media.js_files(), ["/static/js/public_forms.js", CAPTCHA_JS]);
}

#[tokio::test]
async fn test_owner_and_non_owner_media_agree() {
    let site = TestSite::new().unwrap();
    let factory = RequestFactory::new();

    let (_, presentation) = render(&site, captcha_block(), &factory.get(PAGE_URL)).await;
    let (_, modification) = render(&site, captcha_block(), &factory.get_owned(PAGE_URL, CREATE)).await;
    assert_eq!(presentation, modification);
}

#[tokio::test]
async fn test_ajax_block_declares_init_script() {
    let site = TestSite::new().unwrap();
    let (html, media) = render(
        &site,
        author_block("CreatePublicForm", None).ajax(true),
        &RequestFactory::new().get(PAGE_URL),
    )
    .await;

    assert!(html.contains("ajax_init('home_main_0');"));
    assert_eq!(
        media.js_files(),
        [
            "/static/js/mootools-core.js",
            "/static/js/mootools-more-forms.js",
            "/static/js/form_ajax_init.js",
        ]
    );
}

#[tokio::test]
async fn test_page_media_is_union_of_blocks() {
    let site = TestSite::new().unwrap();
    let request = RequestFactory::new().get(PAGE_URL);

    let (_, first) = render(&site, captcha_block(), &request).await;
    let second_block = block("CreatePublicForm", 1, TargetRef::new("lib.author", None))
        .captcha_once(true)
        .ajax(true);
    let (_, second) = render(&site, second_block, &request).await;

    let page = collect([&first, &second]);
    assert_eq!(page.js_files().len(), 4);
    assert_eq!(page.js_files()[0], CAPTCHA_JS);
    assert_eq!(page.css_files().len(), 1);
}
