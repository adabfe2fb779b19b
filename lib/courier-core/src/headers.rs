//! Header normalization.
//!
//! Headers are configured as a JSON-like map so that method groups can be expressed and
//! deep-merged. Before a request hits the wire, [`flatten_headers`] collapses the groups
//! for the request's method and [`process_headers`] fixes up `Content-Type`.

use std::collections::HashMap;

use base64::Engine;
use serde_json::Value;

use crate::config::COMMON_HEADERS;
use crate::{BasicAuth, Body, Headers, Method};

/// Canonical `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// Canonical `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";

/// Collapse header groups for `method`.
///
/// The `common` group is applied first, then the group named after the method, then the
/// plain top-level headers. All group keys are dropped from the result.
#[must_use]
pub fn flatten_headers(headers: &Headers, method: Method) -> Headers {
    let mut flat = Headers::new();
    for group in [COMMON_HEADERS, method.lowercase()] {
        if let Some(Value::Object(values)) = headers.get(group) {
            for (name, value) in values {
                insert_header(&mut flat, name, value.clone());
            }
        }
    }
    for (name, value) in headers {
        if !is_group_key(name) {
            insert_header(&mut flat, name, value.clone());
        }
    }
    flat
}

/// Remove every header named `name`, ignoring ASCII case.
///
/// Returns the value of the last removed entry.
pub fn take_header(headers: &mut Headers, name: &str) -> Option<Value> {
    let matching: Vec<String> = headers
        .keys()
        .filter(|key| key.eq_ignore_ascii_case(name))
        .cloned()
        .collect();
    matching
        .into_iter()
        .filter_map(|key| headers.remove(&key))
        .last()
}

/// Set `name` to `value`, replacing a header spelled with a different case.
pub fn insert_header(headers: &mut Headers, name: &str, value: Value) -> Option<Value> {
    let previous = take_header(headers, name);
    headers.insert(name.to_string(), value);
    previous
}

fn is_group_key(name: &str) -> bool {
    name == COMMON_HEADERS || Method::ALL.iter().any(|m| m.lowercase() == name)
}

/// Rename any header matching `canonical` case-insensitively to `canonical`.
pub fn normalize_header_name(headers: &mut Headers, canonical: &str) {
    let aliases: Vec<String> = headers
        .keys()
        .filter(|name| name.as_str() != canonical && name.eq_ignore_ascii_case(canonical))
        .cloned()
        .collect();
    for alias in aliases {
        if let Some(value) = headers.remove(&alias) {
            headers.insert(canonical.to_string(), value);
        }
    }
}

/// Adjust flattened headers for the outgoing body.
///
/// `Content-Type` is normalized; a JSON body gets a JSON content type unless one is set;
/// without a body the header is dropped.
#[must_use]
pub fn process_headers(mut headers: Headers, body: Option<&Body>) -> Headers {
    normalize_header_name(&mut headers, CONTENT_TYPE);
    match body {
        None => {
            headers.remove(CONTENT_TYPE);
        }
        Some(body @ Body::Json(_)) => {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(
                    CONTENT_TYPE.to_string(),
                    Value::from(body.content_type().as_str()),
                );
            }
        }
        Some(_) => {}
    }
    headers
}

/// Set the `Authorization: Basic` header from credentials.
pub fn apply_basic_auth(headers: &mut Headers, auth: &BasicAuth) {
    let credentials = format!("{}:{}", auth.username, auth.password);
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    normalize_header_name(headers, AUTHORIZATION);
    headers.insert(AUTHORIZATION.to_string(), Value::from(format!("Basic {encoded}")));
}

/// Convert flattened headers into wire pairs.
///
/// Strings are used verbatim, numbers and booleans are stringified, `null` and nested
/// values are skipped.
#[must_use]
pub fn to_header_pairs(headers: &Headers) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null | Value::Array(_) | Value::Object(_) => return None,
            };
            Some((name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn headers(value: Value) -> Headers {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn flatten_applies_common_then_method_then_own() {
        let config = headers(json!({
            "common": {"Accept": "*/*", "X-Level": "common"},
            "post": {"X-Level": "post"},
            "get": {"X-Only-Get": "yes"},
            "X-Own": "own",
        }));

        let flat = flatten_headers(&config, Method::Post);
        assert_eq!(
            flat,
            headers(json!({"Accept": "*/*", "X-Level": "post", "X-Own": "own"}))
        );
    }

    #[test]
    fn own_header_beats_group() {
        let config = headers(json!({
            "common": {"Accept": "*/*"},
            "Accept": "text/html",
        }));

        let flat = flatten_headers(&config, Method::Get);
        assert_eq!(flat.get("Accept"), Some(&json!("text/html")));
    }

    #[test]
    fn header_names_collide_ignoring_case() {
        let config = headers(json!({
            "common": {"Accept": "*/*", "X-Trace": "common"},
            "delete": {"x-trace": "delete"},
            "accept": "text/html",
        }));

        let flat = flatten_headers(&config, Method::Delete);
        assert_eq!(
            flat,
            headers(json!({"accept": "text/html", "x-trace": "delete"}))
        );
    }

    #[test]
    fn insert_header_replaces_other_spelling() {
        let mut flat = headers(json!({"X-Token": "old"}));

        let previous = insert_header(&mut flat, "x-token", json!("new"));
        assert_eq!(previous, Some(json!("old")));
        assert_eq!(flat, headers(json!({"x-token": "new"})));
        assert_eq!(take_header(&mut flat, "X-TOKEN"), Some(json!("new")));
        assert!(flat.is_empty());
    }

    #[test]
    fn content_type_is_normalized_and_dropped_without_body() {
        let flat = headers(json!({"content-type": "text/plain"}));

        let processed = process_headers(flat.clone(), Some(&Body::from("hi")));
        assert_eq!(processed, headers(json!({"Content-Type": "text/plain"})));

        let processed = process_headers(flat, None);
        assert!(processed.is_empty());
    }

    #[test]
    fn json_body_gets_json_content_type() {
        let processed = process_headers(Headers::new(), Some(&Body::from(json!({"a": 1}))));
        assert_eq!(
            processed.get(CONTENT_TYPE),
            Some(&json!("application/json;charset=utf-8"))
        );

        let custom = headers(json!({"CONTENT-TYPE": "application/vnd.api+json"}));
        let processed = process_headers(custom, Some(&Body::from(json!({"a": 1}))));
        assert_eq!(
            processed,
            headers(json!({"Content-Type": "application/vnd.api+json"}))
        );
    }

    #[test]
    fn basic_auth_header() {
        let mut flat = headers(json!({"authorization": "Bearer old"}));
        apply_basic_auth(
            &mut flat,
            &BasicAuth {
                username: "user".to_string(),
                password: "pass".to_string(),
            },
        );
        assert_eq!(flat, headers(json!({"Authorization": "Basic dXNlcjpwYXNz"})));
    }

    #[test]
    fn header_pairs_stringify_scalars() {
        let pairs = to_header_pairs(&headers(json!({
            "X-Str": "a",
            "X-Num": 42,
            "X-Bool": false,
            "X-Null": null,
            "X-Obj": {"nested": true},
        })));

        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get("X-Num").map(String::as_str), Some("42"));
        assert_eq!(pairs.get("X-Bool").map(String::as_str), Some("false"));
    }
}
