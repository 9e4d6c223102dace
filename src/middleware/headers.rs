// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Response header middleware: security headers and cache hints.

use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Paths whose responses are static per deployment.
const CACHEABLE_PATHS: &[&str] = &["/soil/providers", "/soil/wms-config"];

/// Add security and cache-control headers to all responses.
pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let cacheable = CACHEABLE_PATHS.contains(&req.uri().path());
    let mut response = next.run(req).await;
    let is_success = response.status().is_success();
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    let cache_control = if cacheable && is_success {
        "public, max-age=3600"
    } else {
        "no-store"
    };
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::{routing::get, Router};
    use tower::ServiceExt; // for oneshot

    fn app() -> Router {
        Router::new()
            .route("/soil/providers", get(|| async { "[]" }))
            .route("/soil/summary", get(|| async { "{}" }))
            .layer(axum::middleware::from_fn(add_response_headers))
    }

    #[tokio::test]
    async fn test_security_headers() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/soil/summary")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
        assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
        assert_eq!(headers.get("Referrer-Policy").unwrap(), "no-referrer");
        assert_eq!(headers.get("Cache-Control").unwrap(), "no-store");
    }

    #[tokio::test]
    async fn test_provider_metadata_is_cacheable() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/soil/providers")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("Cache-Control").unwrap(),
            "public, max-age=3600"
        );
    }
}
