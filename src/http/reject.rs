//! Client-facing rejection responses.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;

/// Build the 403 sent when a gate rejects or overrides a request.
///
/// The body is a small HTML page naming the reason category; no
/// machine-readable error code is exposed to the offender.
pub fn forbidden(message: &str) -> Response {
    let body = format!("<h1>403 Forbidden</h1>\n<p>{}</p>\n", message);
    Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| {
            let mut response = Response::new(Body::from("Forbidden"));
            *response.status_mut() = StatusCode::FORBIDDEN;
            response
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_403_with_the_message() {
        let response = forbidden("Rate limit exceeded. Your IP is blocked.");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
