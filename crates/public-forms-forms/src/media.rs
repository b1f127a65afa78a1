//! Form media: the CSS and JavaScript a widget or form depends on.
//!
//! Merging is a de-duplicating union that keeps first-seen order, so the
//! assets of whoever merges first come first in the rendered output.

use indexmap::IndexMap;

use crate::html::escape_html;

/// CSS and JavaScript assets.
///
/// # Example
///
/// ```
/// use public_forms_forms::media::Media;
///
/// let mut renderer = Media::new();
/// renderer.add_js("/static/js/forms.js");
///
/// let mut form = Media::new();
/// form.add_js("/static/js/forms.js");
/// form.add_js("/static/js/captcha.js");
/// form.add_css("all", "/static/css/captcha.css");
///
/// renderer.merge(&form);
/// assert_eq!(renderer.js_files(), ["/static/js/forms.js", "/static/js/captcha.js"]);
/// assert!(renderer.render_css().contains("captcha.css"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Media {
    css: IndexMap<String, Vec<String>>,
    js: Vec<String>,
}

impl Media {
    /// Creates an empty `Media`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stylesheet for `media_type` ("all", "screen", "print"...).
    pub fn add_css(&mut self, media_type: impl Into<String>, path: impl Into<String>) {
        let entry = self.css.entry(media_type.into()).or_default();
        let path = path.into();
        if !entry.contains(&path) {
            entry.push(path);
        }
    }

    /// Adds a script.
    pub fn add_js(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !self.js.contains(&path) {
            self.js.push(path);
        }
    }

    /// Unions `other` into `self`, skipping assets already present.
    pub fn merge(&mut self, other: &Self) {
        for (media_type, files) in &other.css {
            for file in files {
                self.add_css(media_type.clone(), file.clone());
            }
        }
        for file in &other.js {
            self.add_js(file.clone());
        }
    }

    /// Returns `true` when no assets are declared.
    pub fn is_empty(&self) -> bool {
        self.js.is_empty() && self.css.values().all(Vec::is_empty)
    }

    /// Returns `(media_type, path)` pairs in declaration order.
    pub fn css_files(&self) -> Vec<(String, String)> {
        self.css
            .iter()
            .flat_map(|(media_type, paths)| {
                paths.iter().map(move |p| (media_type.clone(), p.clone()))
            })
            .collect()
    }

    /// Returns script paths in declaration order.
    pub fn js_files(&self) -> &[String] {
        &self.js
    }

    /// Renders `<link>` tags.
    pub fn render_css(&self) -> String {
        self.css_files()
            .iter()
            .map(|(media_type, path)| {
                format!(
                    "<link rel=\"stylesheet\" href=\"{}\" media=\"{}\">\n",
                    escape_html(path),
                    escape_html(media_type)
                )
            })
            .collect()
    }

    /// Renders `<script>` tags.
    pub fn render_js(&self) -> String {
        self.js
            .iter()
            .map(|path| format!("<script src=\"{}\"></script>\n", escape_html(path)))
            .collect()
    }

    /// Renders stylesheets followed by scripts.
    pub fn render(&self) -> String {
        format!("{}{}", self.render_css(), self.render_js())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_dedups() {
        let mut m = Media::new();
        m.add_js("a.js");
        m.add_js("a.js");
        m.add_css("all", "a.css");
        m.add_css("all", "a.css");
        assert_eq!(m.js_files().len(), 1);
        assert_eq!(m.css_files().len(), 1);
    }

    #[test]
    fn test_merge_keeps_first_seen_order() {
        let mut first = Media::new();
        first.add_js("b.js");
        first.add_css("print", "p.css");
        let mut second = Media::new();
        second.add_js("a.js");
        second.add_js("b.js");
        second.add_css("all", "x.css");
        second.add_css("print", "p.css");

        first.merge(&second);
        assert_eq!(first.js_files(), ["b.js", "a.js"]);
        assert_eq!(
            first.css_files(),
            vec![
                ("print".to_string(), "p.css".to_string()),
                ("all".to_string(), "x.css".to_string()),
            ]
        );
    }

    #[test]
    fn test_render() {
        let mut m = Media::new();
        m.add_css("all", "/s/a.css");
        m.add_js("/s/a.js");
        assert_eq!(
            m.render(),
            "<link rel=\"stylesheet\" href=\"/s/a.css\" media=\"all\">\n<script src=\"/s/a.js\"></script>\n"
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(Media::new().is_empty());
        let mut m = Media::new();
        m.add_js("x.js");
        assert!(!m.is_empty());
    }
}
