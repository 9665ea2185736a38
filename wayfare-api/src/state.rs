use std::sync::Arc;

use wayfare_booking::{BookingOrchestrator, BookingQueries};
use wayfare_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct RateLimiter {
    pub redis: Arc<RedisClient>,
    pub requests_per_window: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BookingOrchestrator>,
    pub queries: Arc<BookingQueries>,
    pub auth: AuthConfig,
    /// `None` disables rate limiting.
    pub rate_limiter: Option<RateLimiter>,
}
