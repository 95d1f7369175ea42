// src/config.rs

use std::env;
use std::str::FromStr;
use dotenvy::dotenv;

use crate::rate_limit::RateLimitConfig;

/// Number of leaderboard entries returned to clients.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it quizzes are served from memory.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub port: u16,
    pub rate_limit: RateLimitConfig,
    pub allowed_origins: Vec<String>,
    pub leaderboard_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            rust_log: "info".to_string(),
            port: 3000,
            rate_limit: RateLimitConfig::default(),
            allowed_origins: vec![
                "https://warpcast.com".to_string(),
                "https://client.farcaster.xyz".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            leaderboard_limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    parse_value(key, env::var(key).ok().as_deref(), default)
}

fn parse_value<T: FromStr>(key: &str, raw: Option<&str>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

/// Like `parse_value`, but zero and negative values also fall back to `default`.
fn positive_value(key: &str, raw: Option<&str>, default: i64) -> i64 {
    let value = parse_value(key, raw, default);
    if value > 0 {
        value
    } else {
        tracing::warn!("Ignoring non-positive {}={}", key, value);
        default
    }
}

fn list_or(key: &str, default: Vec<String>) -> Vec<String> {
    match env::var(key) {
        Ok(raw) => {
            let items: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
            if items.is_empty() { default } else { items }
        }
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Config::default();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let rate_limit = RateLimitConfig {
            window_ms: positive_value(
                "RATE_LIMIT_WINDOW_MS",
                env::var("RATE_LIMIT_WINDOW_MS").ok().as_deref(),
                defaults.rate_limit.window_ms,
            ),
            max_requests: parse_or("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests),
            cleanup_probability: parse_or(
                "RATE_LIMIT_CLEANUP_PROBABILITY",
                defaults.rate_limit.cleanup_probability,
            )
            .clamp(0.0, 1.0),
            paths: list_or("RATE_LIMITED_PATHS", defaults.rate_limit.paths),
        };

        Self {
            database_url,
            rust_log,
            port: parse_or("PORT", defaults.port),
            rate_limit,
            allowed_origins: list_or("ALLOWED_ORIGINS", defaults.allowed_origins),
            leaderboard_limit: parse_or("LEADERBOARD_LIMIT", defaults.leaderboard_limit),
        }
    }
}
