//! Small HTML helpers shared by widgets and forms.

use std::collections::BTreeMap;

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Formats attributes as ` key="value"`, sorted by key, values escaped.
pub fn render_attrs(attrs: &BTreeMap<String, String>) -> String {
    attrs
        .iter()
        .map(|(k, v)| format!(r#" {k}="{}""#, escape_html(v)))
        .collect()
}

/// Renders messages as `<ul class="errorlist">`, or nothing when empty.
pub fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape_html(e)))
        .collect();
    format!(r#"<ul class="errorlist">{items}</ul>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_attrs_sorted() {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), "id_title".to_string());
        attrs.insert("class".to_string(), "a\"b".to_string());
        assert_eq!(render_attrs(&attrs), r#" class="a&quot;b" id="id_title""#);
    }

    #[test]
    fn test_error_list() {
        assert_eq!(error_list(&[]), "");
        assert_eq!(
            error_list(&["Bad <input>".to_string()]),
            r#"<ul class="errorlist"><li>Bad &lt;input&gt;</li></ul>"#
        );
    }
}
