use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use wayfare_core::CallerContext;

use crate::error::AppError;
use crate::state::AppState;

/// Fixed-window rate limiting keyed by caller id, falling back to the peer address.
///
/// Redis outages fail open: the request is served and a warning is logged.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let subject = req
        .extensions()
        .get::<CallerContext>()
        .and_then(|c| c.user_id.clone())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "anonymous".to_string());

    let key = format!("rate-limit:{}", subject);
    match limiter
        .redis
        .check_rate_limit(&key, limiter.requests_per_window, limiter.window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!("Rate limit exceeded for {}", subject);
            let request_id = req
                .headers()
                .get("x-request-id")
                .and_then(|h| h.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            AppError::RateLimitError.into_envelope(&request_id)
        }
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, allowing request: {}", e);
            next.run(req).await
        }
    }
}
