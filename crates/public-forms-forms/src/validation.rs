//! Field-by-field cleaning shared by every form type.

use std::collections::HashMap;

use public_forms_db::Value;

use crate::fields::{clean_field_value, FormFieldDef, FormFieldType};

/// Key under which errors that belong to no single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Cleans every field from `raw_data` into `cleaned_data`, collecting
/// messages into `errors`.
///
/// Disabled fields keep their initial value. Markup-only fields are skipped.
pub fn clean_fields(
    fields: &[FormFieldDef],
    raw_data: &HashMap<String, Option<String>>,
    initial: &HashMap<String, Value>,
    cleaned_data: &mut HashMap<String, Value>,
    errors: &mut HashMap<String, Vec<String>>,
) {
    for field in fields {
        if field.field_type == FormFieldType::Markup {
            continue;
        }
        if field.disabled {
            let value = initial
                .get(&field.name)
                .or(field.initial.as_ref())
                .cloned()
                .unwrap_or_default();
            cleaned_data.insert(field.name.clone(), value);
            continue;
        }
        let raw = raw_data.get(&field.name).and_then(Option::as_deref);
        match clean_field_value(field, raw) {
            Ok(value) => {
                cleaned_data.insert(field.name.clone(), value);
            }
            Err(messages) => {
                errors.entry(field.name.clone()).or_default().extend(messages);
            }
        }
    }
}
