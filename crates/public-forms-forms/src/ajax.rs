//! The AJAX init field.
//!
//! AJAX-enabled blocks get one extra hidden field whose widget emits the
//! script call that wires the block's form to an XHR submit, and whose
//! media brings the client scripts into the page.

use std::collections::BTreeMap;
use std::sync::Arc;

use public_forms_core::PublicFormsSettings;

use crate::fields::{FormFieldDef, FormFieldType};
use crate::html::escape_html;
use crate::media::Media;
use crate::widgets::Widget;

/// Field name of the AJAX init field.
pub const AJAX_INIT_FIELD_NAME: &str = "ajax_init";

/// Emits `ajax_init('<container>')`.
#[derive(Debug, Clone)]
pub struct AjaxInitWidget {
    container_id: String,
    js: Vec<String>,
}

impl AjaxInitWidget {
    /// Creates the widget for `container_id` with the settings' scripts.
    pub fn new(container_id: impl Into<String>, settings: &PublicFormsSettings) -> Self {
        Self {
            container_id: container_id.into(),
            js: settings
                .ajax_js
                .iter()
                .map(|p| settings.static_path(p))
                .collect(),
        }
    }
}

impl Widget for AjaxInitWidget {
    fn render(&self, _name: &str, _value: Option<&str>, _attrs: &BTreeMap<String, String>) -> String {
        format!(
            "<script type=\"text/javascript\">ajax_init('{}');</script>",
            escape_html(&self.container_id)
        )
    }

    fn is_hidden(&self) -> bool {
        true
    }

    fn media(&self) -> Media {
        let mut media = Media::new();
        for path in &self.js {
            media.add_js(path.clone());
        }
        media
    }
}

/// Builds the markup-only field carrying an [`AjaxInitWidget`].
pub fn ajax_init_field(container_id: &str, settings: &PublicFormsSettings) -> FormFieldDef {
    FormFieldDef::new(AJAX_INIT_FIELD_NAME, FormFieldType::Markup)
        .widget(Arc::new(AjaxInitWidget::new(container_id, settings)))
}
