use std::sync::Arc;

use crate::config::Config;
use crate::rate_limit::RateLimiter;
use crate::store::QuizStore;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    pub limiter: Arc<RateLimiter>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn QuizStore>, config: Config) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            store,
            limiter,
            config,
        }
    }
}

impl FromRef<AppState> for Arc<dyn QuizStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<RateLimiter> {
    fn from_ref(state: &AppState) -> Self {
        state.limiter.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
