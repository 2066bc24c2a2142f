use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use server::auth::AuthConfig;
use server::db::AppState;
use server::rate_limit::{rate_limit_middleware, RateLimitState};

/// Default request body cap. A full 5000-row bulk upload fits well inside.
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    server::telemetry::init_logging();

    let config = server::config::load_config();
    if config.features.telemetry {
        server::telemetry::init_telemetry();
    }
    server::health::record_start_time();

    let pool = server::db::create_pool()?;
    server::db::run_migrations(&pool).await?;

    let state = AppState::postgres(pool, config.grading.clone());
    let auth = AuthConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "JWT_SECRET must be set");
        e
    })?;

    let mut router = server::openapi::api_router(state);

    if config.features.rate_limit {
        let limits = &config.rate_limit;
        tracing::info!(
            max_requests = limits.max_requests,
            window_seconds = limits.window_seconds,
            "rate limiting enabled"
        );
        router = router.layer(middleware::from_fn_with_state(
            RateLimitState::in_memory(limits.max_requests, limits.window_seconds),
            rate_limit_middleware,
        ));
    }

    // Sits inside the auth layer so Claims are already in the extensions.
    if config.features.telemetry {
        router = router.layer(server::telemetry::OtelTraceLayer);
    }

    let max_body: usize = std::env::var("MAX_BODY_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_BODY_BYTES);

    let router = router
        .layer(DefaultBodyLimit::max(max_body))
        .layer(middleware::from_fn_with_state(
            auth,
            server::auth::middleware::auth_middleware,
        ))
        .layer(tower_http::request_id::PropagateRequestIdLayer::x_request_id())
        .layer(tower_http::request_id::SetRequestIdLayer::x_request_id(
            tower_http::request_id::MakeRequestUuid,
        ));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "results server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    server::telemetry::shutdown_telemetry();
    Ok(())
}
