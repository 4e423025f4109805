pub mod vite_config;

/// Quote a string as a JavaScript string literal.
///
/// JSON string syntax is a subset of JavaScript's, so serde_json's escaping is
/// enough for module specifiers and paths.
pub fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
