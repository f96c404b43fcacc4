//! Response construction.
//!
//! # Responsibilities
//! - Carry the per-request status and headers an action may change
//! - Turn a rendered buffer or a dispatch failure into an HTTP response
//!
//! # Design Decisions
//! - The head lives inside each request's `Outcome`; nothing is shared
//! - Failures are plain text `Error: <message>` with status 500
//! - Bodies are fully buffered; there is no streaming

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

const HTML_UTF8: &str = "text/html; charset=utf-8";
const TEXT_UTF8: &str = "text/plain; charset=utf-8";

/// Status line and headers of the response being built for one request.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
}

impl Default for ResponseHead {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

impl ResponseHead {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the client to `url` with `302 Found`.
    ///
    /// A URL that is not a valid header value is logged and ignored.
    pub fn redirect(&mut self, url: &str) {
        match HeaderValue::from_str(url) {
            Ok(location) => {
                self.headers.append(header::LOCATION, location);
                self.status = StatusCode::FOUND;
            }
            Err(_) => {
                tracing::warn!(url = %url, "Ignoring redirect to invalid location");
            }
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Finish the response with a buffered body.
    ///
    /// An empty buffer produces an empty body. A non-empty one defaults to
    /// HTML unless a content type was set explicitly.
    pub fn into_response(self, body: Vec<u8>) -> Response {
        let mut headers = self.headers;
        if !body.is_empty() && !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_UTF8));
        }

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

/// Plain-text 500 response for any dispatch failure.
pub fn error_response(message: &str) -> Response {
    let mut response = Response::new(Body::from(format!("Error: {}", message)));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_UTF8));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_sets_location_and_302() {
        let mut head = ResponseHead::new();
        head.redirect("/login");

        let response = head.into_response(Vec::new());
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_invalid_redirect_is_ignored() {
        let mut head = ResponseHead::new();
        head.redirect("/bad\nvalue");
        assert_eq!(head.status(), StatusCode::OK);
        assert!(head.headers().is_empty());
    }

    #[test]
    fn test_body_defaults_to_html() {
        let response = ResponseHead::new().into_response(b"<p>hi</p>".to_vec());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_UTF8);
    }

    #[test]
    fn test_explicit_content_type_kept() {
        let mut head = ResponseHead::new();
        head.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = head.into_response(b"{}".to_vec());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_error_response_is_plain_text_500() {
        let response = error_response("Route not matched: /x");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], TEXT_UTF8);
    }
}
