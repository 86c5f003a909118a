//! Placeholder substitution for SOS request templates.
//!
//! A template is an immutable blueprint: `render` never mutates it, so the
//! same template string can be rendered once per event without any state
//! carrying over between requests.

pub mod placeholders;

use crate::model::ParameterMap;

/// Replace every occurrence of each placeholder in `parameters` with its
/// value, in the map's order.
///
/// Placeholders present in the template but absent from the map are left
/// untouched. That is intentional: templates may carry tokens a given
/// document does not populate (e.g. output properties for parameter codes
/// the document has no series for).
pub fn render(template: &str, parameters: &ParameterMap) -> String {
    let mut request = template.to_string();
    for (placeholder, value) in parameters.iter() {
        if request.contains(placeholder) {
            request = request.replace(placeholder, value);
        }
    }
    request
}

/// Placeholder tokens from `known` that still appear in `rendered`.
///
/// Diagnostic helper; leftovers are not an error.
pub fn unresolved<'a>(rendered: &str, known: &[&'a str]) -> Vec<&'a str> {
    known
        .iter()
        .copied()
        .filter(|token| rendered.contains(token))
        .collect()
}
