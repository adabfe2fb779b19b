//! Address building: base address resolution and query-string encoding.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::{Params, ParamsSerializer};

/// Characters escaped in query components.
///
/// Everything except the unreserved marks, plus `@ : $ , [ ]` which stay readable.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',')
    .remove(b'[')
    .remove(b']');

fn encode(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT)
        .to_string()
        .replace("%20", "+")
}

/// Returns `true` for `scheme://...` and protocol-relative `//...` addresses.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    let rest = match url.find("//") {
        Some(index) => url.get(..index).unwrap_or_default(),
        None => return false,
    };
    if rest.is_empty() {
        return true;
    }
    let Some(scheme) = rest.strip_suffix(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join a base address and a relative address with exactly one `/`.
#[must_use]
pub fn combine_url(base_url: &str, relative_url: &str) -> String {
    if relative_url.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        relative_url.trim_start_matches('/')
    )
}

/// Resolve `url` against `base_url` unless it is already absolute.
#[must_use]
pub fn resolve_url(base_url: Option<&str>, url: &str) -> String {
    match base_url {
        Some(base) if !is_absolute_url(url) => combine_url(base, url),
        _ => url.to_string(),
    }
}

/// Serialize parameters with the built-in encoding.
///
/// - `null` values are skipped,
/// - arrays repeat the key with a `[]` suffix,
/// - nested objects are JSON-encoded,
/// - components keep `@ : $ , [ ]` literal and encode spaces as `+`.
#[must_use]
pub fn serialize_params(params: &Params) -> String {
    let mut parts = Vec::new();
    for (key, value) in params {
        let (key, values) = match value {
            Value::Null => continue,
            Value::Array(items) => (format!("{key}[]"), items.iter().collect::<Vec<_>>()),
            other => (key.clone(), vec![other]),
        };
        for value in values {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            parts.push(format!("{}={}", encode(&key), encode(&value)));
        }
    }
    parts.join("&")
}

/// Append parameters to `url`.
///
/// A hash fragment is dropped when parameters are appended, and `?` or `&` is chosen
/// depending on whether `url` already carries a query.
///
/// # Example
///
/// ```
/// use courier_core::{Params, build_url};
/// use serde_json::json;
///
/// let mut params = Params::new();
/// params.insert("foo".to_string(), json!(["bar", "baz"]));
/// params.insert("q".to_string(), json!("a b@c"));
///
/// let url = build_url("/search#top", Some(&params), None);
/// assert_eq!(url, "/search?foo[]=bar&foo[]=baz&q=a+b@c");
/// ```
#[must_use]
pub fn build_url(
    url: &str,
    params: Option<&Params>,
    serializer: Option<&ParamsSerializer>,
) -> String {
    let Some(params) = params else {
        return url.to_string();
    };
    let serialized = match serializer {
        Some(serializer) => serializer.serialize(params),
        None => serialize_params(params),
    };
    if serialized.is_empty() {
        return url.to_string();
    }

    let base = url.split_once('#').map_or(url, |(before, _)| before);
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{serialized}")
}
