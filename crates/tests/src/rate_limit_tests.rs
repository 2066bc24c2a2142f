use axum::http::{header, StatusCode};

use crate::common::{get_from, test_app_rate_limited};

#[tokio::test]
async fn rate_limit_returns_429_when_exceeded() {
    let app = test_app_rate_limited(2);

    let (s1, _, _) = get_from(&app, "/health", "10.0.0.1").await;
    assert_eq!(s1, StatusCode::OK, "First request should pass");

    let (s2, _, _) = get_from(&app, "/health", "10.0.0.1").await;
    assert_eq!(s2, StatusCode::OK, "Second request should pass");

    let (s3, headers, body) = get_from(&app, "/health", "10.0.0.1").await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS, "Third request should be rate limited");
    assert_eq!(body["kind"], "RateLimited");
    let reset = body["resetTime"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(reset).is_ok());

    let retry_after: i64 = headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn rate_limit_is_per_client() {
    let app = test_app_rate_limited(1);

    let (s1, _, _) = get_from(&app, "/health", "10.0.0.1").await;
    assert_eq!(s1, StatusCode::OK);

    // Only the first forwarded hop identifies the client.
    let (s2, _, _) = get_from(&app, "/health", "10.0.0.2, 10.0.0.1").await;
    assert_eq!(s2, StatusCode::OK);

    let (s3, _, _) = get_from(&app, "/health", "10.0.0.1").await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS);
}
