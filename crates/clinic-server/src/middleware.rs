use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, header::RETRY_AFTER},
    middleware::Next,
    response::Response,
};
use clinic_api::ApiError;
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::RateLimitConfig;

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

// Request ID middleware: ensures every request has an x-request-id and propagates to response
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let header_name = HeaderName::from_static(REQUEST_ID_HEADER);

    // Preserve an incoming request id, otherwise generate one
    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        });

    // Downstream layers (trace spans) read it from extensions
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

// =============================================================================
// Rate limiting
// =============================================================================

/// Upper bound on tracked clients before expired windows are swept.
const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

struct ClientWindow {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client address.
///
/// Each client gets `limit` requests per `window`. The window starts with
/// the client's first request and resets once it has fully elapsed.
pub struct RateLimiter {
    clients: DashMap<String, ClientWindow>,
    limit: u32,
    window: Duration,
    max_clients: usize,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            limit,
            window,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.requests_per_window, cfg.window())
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of clients with a tracked window.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn check(&self, client: &str) -> RateDecision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        if !self.clients.contains_key(client) && self.clients.len() >= self.max_clients {
            let removed = self.evict_expired(now);
            tracing::debug!(removed, "swept expired rate-limit windows");
            if self.clients.len() >= self.max_clients {
                tracing::warn!(
                    max_clients = self.max_clients,
                    "rate limiter at capacity, admitting untracked client"
                );
                return RateDecision::Allowed {
                    remaining: self.limit.saturating_sub(1),
                };
            }
        }

        let mut entry = self
            .clients
            .entry(client.to_string())
            .or_insert(ClientWindow {
                started: now,
                count: 0,
            });
        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            let retry_after = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }
        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.limit - entry.count,
        }
    }

    fn evict_expired(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.clients.len())
    }
}

/// Client key for rate limiting: the peer IP when the server exposes it.
fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&req);
    match limiter.check(&client) {
        RateDecision::Allowed { remaining } => {
            let mut res = next.run(req).await;
            let headers = res.headers_mut();
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
                HeaderValue::from(limiter.limit()),
            );
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
                HeaderValue::from(remaining),
            );
            res
        }
        RateDecision::Limited { retry_after } => {
            tracing::warn!(client = %client, path = %req.uri().path(), "rate limit exceeded");
            let mut res = ApiError::too_many_requests(
                "Too many requests from this IP, please try again later.",
            )
            .into_response();
            // Round up so clients never retry early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            res.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
            res
        }
    }
}
