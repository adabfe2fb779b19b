//! Combining instance defaults with call-site configuration.
//!
//! Each field is merged with one of three strategies:
//!
//! | Strategy | Fields | Result |
//! |----------|--------|--------|
//! | call-site only | `url`, `params`, `data` | the override's value, never the base's |
//! | deep merge | `headers` | nested objects merged key by key, override leaves win |
//! | last defined | everything else, `extra` included | the override's value if defined |
//!
//! "Defined" means present (`Some`, or a key present in `extra`), so `0`, `false`, an
//! empty string or a zero duration in the override all win over the base.

use serde_json::{Map, Value};

use crate::{Headers, RequestConfig, take_header};

/// Merge `base` with `overrides` into a fresh configuration.
///
/// Neither input is modified, and the result shares no mutable state with them.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use courier_core::{RequestConfig, merge_config};
///
/// let base = RequestConfig::new().with_url("/a").with_timeout(Duration::from_secs(1));
/// let call = RequestConfig::new().with_timeout(Duration::ZERO);
///
/// let merged = merge_config(&base, &call);
/// assert_eq!(merged.url, None);
/// assert_eq!(merged.timeout, Some(Duration::ZERO));
/// ```
#[must_use]
pub fn merge_config(base: &RequestConfig, overrides: &RequestConfig) -> RequestConfig {
    RequestConfig {
        url: overrides.url.clone(),
        params: overrides.params.clone(),
        data: overrides.data.clone(),
        headers: merge_headers(base.headers.as_ref(), overrides.headers.as_ref()),
        method: last_defined(&base.method, &overrides.method),
        base_url: last_defined(&base.base_url, &overrides.base_url),
        params_serializer: last_defined(&base.params_serializer, &overrides.params_serializer),
        response_type: last_defined(&base.response_type, &overrides.response_type),
        timeout: last_defined(&base.timeout, &overrides.timeout),
        cancel_token: last_defined(&base.cancel_token, &overrides.cancel_token),
        with_credentials: last_defined(&base.with_credentials, &overrides.with_credentials),
        auth: last_defined(&base.auth, &overrides.auth),
        validate_status: last_defined(&base.validate_status, &overrides.validate_status),
        on_upload_progress: last_defined(&base.on_upload_progress, &overrides.on_upload_progress),
        on_download_progress: last_defined(
            &base.on_download_progress,
            &overrides.on_download_progress,
        ),
        extra: merge_extra(&base.extra, &overrides.extra),
    }
}

fn last_defined<T: Clone>(base: &Option<T>, overrides: &Option<T>) -> Option<T> {
    overrides.as_ref().or(base.as_ref()).cloned()
}

fn merge_headers(base: Option<&Headers>, overrides: Option<&Headers>) -> Option<Headers> {
    match (base, overrides) {
        (Some(base), Some(overrides)) => Some(deep_merge(&[base, overrides])),
        (None, Some(only)) | (Some(only), None) => Some(deep_merge(&[only])),
        (None, None) => None,
    }
}

fn merge_extra(base: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = overrides.clone();
    for (key, value) in base {
        if !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Merge objects left to right into a new object.
///
/// Keys are header names and match ignoring ASCII case; the later spelling is kept.
/// When both sides hold an object under the same key the two are merged recursively;
/// otherwise the later value replaces the earlier one.
#[must_use]
pub fn deep_merge(objects: &[&Map<String, Value>]) -> Map<String, Value> {
    let mut merged = Map::new();
    for object in objects {
        for (key, value) in *object {
            let next = match (take_header(&mut merged, key), value) {
                (Some(Value::Object(current)), Value::Object(incoming)) => {
                    Value::Object(deep_merge(&[&current, incoming]))
                }
                (_, value) => value.clone(),
            };
            merged.insert(key.clone(), next);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::{CancelToken, Method};

    fn headers(value: Value) -> Headers {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn url_comes_from_override_only() {
        let base = RequestConfig::new().with_url("/a");

        let merged = merge_config(&base, &RequestConfig::new().with_url("/b"));
        assert_eq!(merged.url.as_deref(), Some("/b"));

        let merged = merge_config(&base, &RequestConfig::new());
        assert_eq!(merged.url, None);
    }

    #[test]
    fn params_and_data_are_not_inherited() {
        let base = RequestConfig::new()
            .with_param("page", 1)
            .with_data(json!({"name": "base"}));

        let merged = merge_config(&base, &RequestConfig::new());
        assert!(merged.params.is_none());
        assert!(merged.data.is_none());

        let merged = merge_config(&base, &RequestConfig::new().with_data(""));
        assert_eq!(merged.data, Some(crate::Body::Text(String::new())));
    }

    #[test]
    fn headers_are_deep_merged() {
        let base = RequestConfig::new().with_header("A", "1");
        let call = RequestConfig::new().with_header("B", "2");

        let merged = merge_config(&base, &call);
        assert_eq!(merged.headers, Some(headers(json!({"A": "1", "B": "2"}))));
    }

    #[test]
    fn nested_header_groups_merge_and_override_leaves_win() {
        let base = RequestConfig::new()
            .with_group_header("common", "Accept", "*/*")
            .with_group_header("common", "X-Base", "yes");
        let call = RequestConfig::new()
            .with_group_header("common", "Accept", "application/json")
            .with_header("X-Call", "yes");

        let merged = merge_config(&base, &call);
        assert_eq!(
            merged.headers,
            Some(headers(json!({
                "common": {"Accept": "application/json", "X-Base": "yes"},
                "X-Call": "yes",
            })))
        );
    }

    #[test]
    fn header_override_matches_any_case() {
        let base = RequestConfig::new()
            .with_header("X-Token", "base")
            .with_group_header("common", "Accept", "*/*");
        let call = RequestConfig::new()
            .with_header("x-token", "call")
            .with_group_header("common", "ACCEPT", "text/html");

        let merged = merge_config(&base, &call);
        assert_eq!(
            merged.headers,
            Some(headers(json!({
                "common": {"ACCEPT": "text/html"},
                "x-token": "call",
            })))
        );
    }

    #[test]
    fn non_object_header_value_replaces_group() {
        let base = RequestConfig::new().with_group_header("post", "Content-Type", "text/plain");
        let call = RequestConfig::new().with_header("post", Value::Null);

        let merged = merge_config(&base, &call);
        assert_eq!(merged.headers, Some(headers(json!({"post": null}))));
    }

    #[test]
    fn merged_headers_do_not_alias_inputs() {
        let base = RequestConfig::new().with_header("A", "1");
        let call = RequestConfig::new().with_header("B", "2");

        let mut merged = merge_config(&base, &call);
        merged
            .headers
            .as_mut()
            .expect("headers")
            .insert("A".to_string(), json!("changed"));

        assert_eq!(base.headers, Some(headers(json!({"A": "1"}))));
        assert_eq!(call.headers, Some(headers(json!({"B": "2"}))));

        let inherited = merge_config(&base, &RequestConfig::new());
        assert_eq!(inherited.headers, base.headers);
    }

    #[test]
    fn falsy_override_wins() {
        let base = RequestConfig::new()
            .with_timeout(Duration::from_millis(1000))
            .with_credentials(true)
            .with_base_url("https://api.test");
        let call = RequestConfig::new()
            .with_timeout(Duration::ZERO)
            .with_credentials(false)
            .with_base_url("");

        let merged = merge_config(&base, &call);
        assert_eq!(merged.timeout, Some(Duration::ZERO));
        assert_eq!(merged.with_credentials, Some(false));
        assert_eq!(merged.base_url.as_deref(), Some(""));
    }

    #[test]
    fn default_strategy_falls_back_to_base() {
        let source = CancelToken::source();
        let base = RequestConfig::new()
            .with_method(Method::Post)
            .with_timeout(Duration::from_secs(2))
            .with_cancel_token(source.token);

        let merged = merge_config(&base, &RequestConfig::new());
        assert_eq!(merged.method, Some(Method::Post));
        assert_eq!(merged.timeout, Some(Duration::from_secs(2)));
        assert!(merged.cancel_token.is_some());
    }

    #[test]
    fn extra_fields_survive_merge() {
        let base = RequestConfig::new()
            .with_extra("trace", true)
            .with_extra("region", "eu");
        let call = RequestConfig::new()
            .with_extra("region", Value::Null)
            .with_extra("priority", 0);

        let merged = merge_config(&base, &call);
        assert_eq!(merged.extra.get("trace"), Some(&json!(true)));
        assert_eq!(merged.extra.get("region"), Some(&Value::Null));
        assert_eq!(merged.extra.get("priority"), Some(&json!(0)));
        assert_eq!(merged.extra.len(), 3);
    }
}
