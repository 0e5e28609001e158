use url::Url;

/// True for empty or whitespace-only strings.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// True when `value` parses as a URI carrying a scheme.
///
/// Relative references such as `/api` or `not-a-uri` are rejected because
/// `Url::parse` requires a base for them.
pub fn is_absolute_uri(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// True for a literal, non-root route path such as `/signin-oidc`.
///
/// Query strings, fragments, whitespace and anything the router would read
/// as a parameter (`{id}`, `:id`, `*rest`) are rejected.
pub fn is_static_route_path(value: &str) -> bool {
    value.len() > 1
        && value.starts_with('/')
        && !value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '?' | '#'))
        && !value
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
}
