// src/rate_limit.rs

//! Per-client fixed-window request limiting.
//!
//! State is local to the process; instances behind a load balancer each
//! keep their own counters.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use rand::Rng;

use crate::error::AppError;

/// Characters of `User-Agent` folded into a fingerprint.
const USER_AGENT_PREFIX: usize = 50;

/// Paths that are never limited.
const EXEMPT_PATHS: [&str; 2] = ["/api/health", "/api/status"];

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_ms: i64,
    pub max_requests: u32,

    /// Chance that a request triggers a sweep of expired records.
    pub cleanup_probability: f64,

    /// Only paths starting with one of these prefixes are limited.
    pub paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 60_000,
            max_requests: 30,
            cleanup_probability: 0.1,
            paths: vec![
                "/api/quizzes/submit".to_string(),
                "/api/fc/profile".to_string(),
                "/api/quizzes/list".to_string(),
                "/api/quizzes/".to_string(),
            ],
        }
    }
}

impl RateLimitConfig {
    pub fn window_secs(&self) -> i64 {
        self.window_ms / 1000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at_ms: i64,
}

/// Outcome of one `check_and_consume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,

    /// Whole seconds until the window resets, rounded up.
    pub retry_after_secs: i64,
}

/// Snapshot of a fingerprint's window, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub count: u32,
    pub remaining: u32,
    pub reset_at_ms: i64,
    pub reset_in_ms: i64,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        // A panic while holding the lock cannot leave a record half-written.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether requests to `path` go through the limiter.
    pub fn applies_to(&self, path: &str) -> bool {
        if !path.starts_with("/api/") || EXEMPT_PATHS.contains(&path) {
            return false;
        }
        self.config.paths.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Counts one request from `fingerprint` at `now_ms`.
    ///
    /// A missing or expired record starts a new window with count 1.
    /// Otherwise the count is incremented first, and the request is denied
    /// once the new count exceeds `max_requests`.
    pub fn check_and_consume(&self, fingerprint: &str, now_ms: i64) -> Decision {
        let sweep = self.config.cleanup_probability > 0.0
            && rand::thread_rng().gen_bool(self.config.cleanup_probability.min(1.0));

        let mut records = self.records();
        if sweep {
            records.retain(|_, record| now_ms <= record.reset_at_ms);
        }

        let record = records
            .entry(fingerprint.to_string())
            .and_modify(|record| {
                if now_ms > record.reset_at_ms {
                    *record = RateLimitRecord {
                        count: 1,
                        reset_at_ms: now_ms.saturating_add(self.config.window_ms),
                    };
                } else {
                    record.count = record.count.saturating_add(1);
                }
            })
            .or_insert(RateLimitRecord {
                count: 1,
                reset_at_ms: now_ms.saturating_add(self.config.window_ms),
            });

        let limit = self.config.max_requests;
        Decision {
            allowed: record.count <= limit,
            count: record.count,
            limit,
            remaining: limit.saturating_sub(record.count),
            reset_at_ms: record.reset_at_ms,
            retry_after_secs: record.reset_at_ms.saturating_sub(now_ms).max(0).saturating_add(999) / 1000,
        }
    }

    /// Drops every record whose window has ended. Returns how many were removed.
    pub fn purge_expired(&self, now_ms: i64) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| now_ms <= record.reset_at_ms);
        before - records.len()
    }

    pub fn status(&self, fingerprint: &str, now_ms: i64) -> Option<RateLimitStatus> {
        self.records().get(fingerprint).map(|record| RateLimitStatus {
            count: record.count,
            remaining: self.config.max_requests.saturating_sub(record.count),
            reset_at_ms: record.reset_at_ms,
            reset_in_ms: (record.reset_at_ms - now_ms).max(0),
        })
    }

    pub fn tracked_clients(&self) -> usize {
        self.records().len()
    }
}

/// Identifies a client by IP and the start of its user agent.
///
/// The IP is the first `X-Forwarded-For` hop, else `X-Real-IP`, else
/// `CF-Connecting-IP`, else the socket peer, else `unknown`. Clients sharing
/// one address are only told apart by their user agent.
pub fn client_fingerprint(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let ip = header(headers, "x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty())
        .or_else(|| header(headers, "x-real-ip"))
        .or_else(|| header(headers, "cf-connecting-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    let user_agent: String = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .chars()
        .take(USER_AGENT_PREFIX)
        .collect();

    format!("{}_{}", ip, user_agent)
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Axum Middleware: rate limiting.
///
/// Limited paths get `X-RateLimit-*` headers on success, or a 429 once the
/// client's window is exhausted. Other paths pass straight through.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();
    if !limiter.applies_to(&path) {
        return Ok(next.run(req).await);
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let fingerprint = client_fingerprint(req.headers(), peer);
    let now_ms = chrono::Utc::now().timestamp_millis();

    tracing::debug!("Applying rate limit to {} {}", req.method(), path);
    let decision = limiter.check_and_consume(&fingerprint, now_ms);

    if !decision.allowed {
        tracing::warn!(
            "Rate limit exceeded for {}: {}/{}",
            fingerprint,
            decision.count,
            decision.limit
        );
        return Err(AppError::TooManyRequests {
            retry_after: decision.retry_after_secs,
            limit: decision.limit,
            reset_at_ms: decision.reset_at_ms,
            window_secs: limiter.config().window_secs(),
        });
    }

    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("x-ratelimit-reset", HeaderValue::from(decision.reset_at_ms));
    headers.insert("x-ratelimit-window", HeaderValue::from(limiter.config().window_secs()));

    Ok(response)
}
