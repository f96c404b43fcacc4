//! Query string and form body parsing.
//!
//! # Design Decisions
//! - Query pairs first, body pairs second, last value wins per key
//! - Bodies are read only for POST/PUT/PATCH with a urlencoded content type
//! - Never fails: unreadable or oversized bodies contribute nothing

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, request::Parts, Method};
use url::form_urlencoded;

/// Flattened request parameters, one value per key.
pub type FormValues = HashMap<String, String>;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Merge `input` (an `a=1&b=2` string) into `values`, last wins.
pub fn merge_urlencoded(values: &mut FormValues, input: &[u8]) {
    for (key, value) in form_urlencoded::parse(input) {
        values.insert(key.into_owned(), value.into_owned());
    }
}

/// Parameters from the URL query alone.
pub fn query_values(parts: &Parts) -> FormValues {
    let mut values = FormValues::new();
    if let Some(query) = parts.uri.query() {
        merge_urlencoded(&mut values, query.as_bytes());
    }
    values
}

fn has_form_body(parts: &Parts) -> bool {
    let method_allows_body =
        parts.method == Method::POST || parts.method == Method::PUT || parts.method == Method::PATCH;
    if !method_allows_body {
        return false;
    }

    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}

/// Query parameters plus, when present, the urlencoded form body.
///
/// The body is consumed; at most `limit` bytes are read.
pub async fn form_values(parts: &Parts, body: Body, limit: usize) -> FormValues {
    let mut values = query_values(parts);

    if has_form_body(parts) {
        match axum::body::to_bytes(body, limit).await {
            Ok(bytes) => merge_urlencoded(&mut values, &bytes),
            Err(e) => {
                tracing::debug!(error = %e, limit, "Ignoring unreadable form body");
            }
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn split(request: Request<Body>) -> (Parts, Body) {
        request.into_parts()
    }

    #[tokio::test]
    async fn test_query_only() {
        let (parts, body) = split(Request::get("/p?a=1&b=2").body(Body::empty()).unwrap());
        let values = form_values(&parts, body, 1024).await;

        assert_eq!(values.len(), 2);
        assert_eq!(values["a"], "1");
        assert_eq!(values["b"], "2");
    }

    #[tokio::test]
    async fn test_no_form_data_is_empty() {
        let (parts, body) = split(Request::get("/p").body(Body::empty()).unwrap());
        assert!(form_values(&parts, body, 1024).await.is_empty());
    }

    #[tokio::test]
    async fn test_body_overrides_query_and_last_wins() {
        let request = Request::post("/p?name=query&x=1&x=2")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded; charset=utf-8")
            .body(Body::from("name=body+value&y=%2Fslash"))
            .unwrap();
        let (parts, body) = split(request);
        let values = form_values(&parts, body, 1024).await;

        assert_eq!(values["name"], "body value");
        assert_eq!(values["x"], "2");
        assert_eq!(values["y"], "/slash");
    }

    #[tokio::test]
    async fn test_body_ignored_without_form_content_type() {
        let request = Request::post("/p")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("a=1"))
            .unwrap();
        let (parts, body) = split(request);
        assert!(form_values(&parts, body, 1024).await.is_empty());
    }

    #[tokio::test]
    async fn test_body_ignored_for_get() {
        let request = Request::get("/p?q=1")
            .header(header::CONTENT_TYPE, FORM_URLENCODED)
            .body(Body::from("a=1"))
            .unwrap();
        let (parts, body) = split(request);
        let values = form_values(&parts, body, 1024).await;
        assert_eq!(values.len(), 1);
        assert_eq!(values["q"], "1");
    }

    #[tokio::test]
    async fn test_oversized_body_is_dropped() {
        let request = Request::post("/p?q=1")
            .header(header::CONTENT_TYPE, FORM_URLENCODED)
            .body(Body::from("a=".to_string() + &"x".repeat(64)))
            .unwrap();
        let (parts, body) = split(request);
        let values = form_values(&parts, body, 8).await;
        assert_eq!(values.len(), 1);
        assert!(!values.contains_key("a"));
    }
}
