use std::sync::Arc;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::clock::Clock;
use crate::config::Config;
use crate::issuer::Issuer;

/// Per-key token bucket for rate limiting.
#[derive(Clone)]
pub struct RateLimitBucket {
    pub remaining: u32,
    pub last_refill: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub issuer: Arc<Issuer>,
    pub clock: Arc<dyn Clock>,
    pub rate_limits: Arc<DashMap<String, RateLimitBucket>>,
}
