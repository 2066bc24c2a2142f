use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use shared_types::AppError;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Verdict for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// When the oldest counted request leaves the window.
    pub reset_at: DateTime<Utc>,
}

/// Counter backend for the rate limiter. Swap the in-memory store for a
/// shared one when running more than one instance.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a request from `key` at `now` and decide whether it may pass.
    async fn hit(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitDecision, AppError>;
}

/// Hits between sweeps of idle clients.
const SWEEP_EVERY: u32 = 1024;

#[derive(Default)]
struct Windows {
    by_key: HashMap<String, VecDeque<DateTime<Utc>>>,
    hits_since_sweep: u32,
}

/// Sliding-window counter held in process memory.
///
/// Clients with no request inside the window are dropped, so rotating keys
/// cannot grow the map past the set of recently active clients.
pub struct InMemoryRateLimitStore {
    windows: Mutex<Windows>,
    max_requests: u32,
    window: Duration,
}

impl InMemoryRateLimitStore {
    /// Allow `max_requests` per `window_seconds` for each key.
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            windows: Mutex::new(Windows::default()),
            max_requests,
            window: Duration::seconds(i64::try_from(window_seconds).unwrap_or(i64::MAX / 1000)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Windows> {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().by_key.len()
    }

    /// Drop every client whose newest request is at or before `cutoff`.
    fn sweep(windows: &mut Windows, cutoff: DateTime<Utc>) {
        let before = windows.by_key.len();
        windows
            .by_key
            .retain(|_, timestamps| timestamps.back().is_some_and(|t| *t > cutoff));
        windows.hits_since_sweep = 0;
        tracing::debug!(
            dropped = before - windows.by_key.len(),
            tracked = windows.by_key.len(),
            "rate limit sweep"
        );
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(&self, key: &str, now: DateTime<Utc>) -> Result<RateLimitDecision, AppError> {
        let mut windows = self.lock();
        let cutoff = now - self.window;

        windows.hits_since_sweep += 1;
        if windows.hits_since_sweep >= SWEEP_EVERY {
            Self::sweep(&mut windows, cutoff);
        }

        let timestamps = windows.by_key.entry(key.to_string()).or_default();
        while timestamps.front().is_some_and(|t| *t <= cutoff) {
            timestamps.pop_front();
        }

        let allowed = (timestamps.len() as u32) < self.max_requests;
        if allowed {
            timestamps.push_back(now);
        }
        let reset_at = timestamps.front().copied().unwrap_or(now) + self.window;
        let remaining = self.max_requests.saturating_sub(timestamps.len() as u32);
        if timestamps.is_empty() {
            windows.by_key.remove(key);
        }

        Ok(RateLimitDecision {
            allowed,
            remaining,
            reset_at,
        })
    }
}

/// State handed to `rate_limit_middleware`.
#[derive(Clone)]
pub struct RateLimitState {
    store: Arc<dyn RateLimitStore>,
}

impl RateLimitState {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    pub fn in_memory(max_requests: u32, window_seconds: u64) -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new(max_requests, window_seconds)))
    }
}

/// Client key: first `x-forwarded-for` hop, then `x-real-ip`, then the
/// socket address, else `"unknown"`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header_ip = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware enforcing the per-client request budget.
///
/// Over-budget requests get 429 with `resetTime` in the body and a
/// `Retry-After` header. A failing store lets the request through.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);
    let now = Utc::now();

    let decision = match state.store.hit(&key, now).await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(client = %key, error = %e, "rate limit store failed, allowing request");
            return next.run(request).await;
        }
    };

    if decision.allowed {
        return next.run(request).await;
    }

    tracing::warn!(client = %key, reset_at = %decision.reset_at, "rate limit exceeded");
    let retry_after = (decision.reset_at - now).num_seconds().max(1);
    let mut response = AppError::rate_limited(
        "Too many requests. Please try again later.",
        decision.reset_at.to_rfc3339(),
    )
    .into_response();
    if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}
