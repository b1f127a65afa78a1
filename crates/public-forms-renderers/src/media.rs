//! Asset aggregation.
//!
//! A block's media is the renderer's own assets followed by the active
//! form's (which include every widget's, the challenge widget's among
//! them). A page's media is the union over its blocks in placement order.

use public_forms_forms::Media;

/// Unions renderer-declared assets with form assets, renderer first.
///
/// # Examples
///
/// ```
/// use public_forms_forms::Media;
/// use public_forms_renderers::media::aggregate;
///
/// let mut renderer = Media::new();
/// renderer.add_js("js/plugin.js");
/// let mut form = Media::new();
/// form.add_js("js/captcha.js");
/// form.add_js("js/plugin.js");
///
/// let media = aggregate(&renderer, &form);
/// assert_eq!(media.js_files(), ["js/plugin.js", "js/captcha.js"]);
/// ```
pub fn aggregate(renderer: &Media, form: &Media) -> Media {
    let mut media = renderer.clone();
    media.merge(form);
    media
}

/// Unions several blocks' media in iteration order.
pub fn collect<'a>(blocks: impl IntoIterator<Item = &'a Media>) -> Media {
    blocks.into_iter().fold(Media::new(), |mut page, block| {
        page.merge(block);
        page
    })
}
