use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use wayfare_core::CallerContext;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

// ============================================================================
// Request id
// ============================================================================

/// The `x-request-id` assigned by `SetRequestIdLayer`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(request_id_of(parts.headers.get("x-request-id")))
    }
}

fn request_id_of(header: Option<&axum::http::HeaderValue>) -> RequestId {
    RequestId(
        header
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string(),
    )
}

// ============================================================================
// Caller Context Middleware
// ============================================================================

/// Resolves the caller from an optional bearer token.
///
/// No `Authorization` header means an anonymous caller; a header that does not
/// carry a valid token is rejected outright.
pub async fn caller_context_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = request_id_of(req.headers().get("x-request-id"));

    let caller = match req.headers().get("Authorization") {
        None => CallerContext::anonymous(),
        Some(header) => {
            let token = header
                .to_str()
                .ok()
                .and_then(|h| h.strip_prefix("Bearer "));

            let Some(token) = token else {
                return AppError::AuthenticationError("Malformed Authorization header".to_string())
                    .into_envelope(&request_id.0);
            };

            match decode::<CustomerClaims>(
                token,
                &DecodingKey::from_secret(state.auth.secret.as_bytes()),
                &Validation::default(),
            ) {
                Ok(token_data) => CallerContext::user(token_data.claims.sub),
                Err(e) => {
                    tracing::debug!("Rejected bearer token: {}", e);
                    return AppError::AuthenticationError("Invalid or expired token".to_string())
                        .into_envelope(&request_id.0);
                }
            }
        }
    };

    req.extensions_mut().insert(caller);
    next.run(req).await
}
