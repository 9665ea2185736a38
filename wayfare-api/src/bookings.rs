use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use wayfare_core::{BookingRequest, CallerContext};

use crate::error::AppError;
use crate::middleware::RequestId;
use crate::state::AppState;

const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_user_bookings))
        .route("/trips/{trip_id}/bookings", get(list_trip_bookings))
}

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Wraps a successful payload as `{ data, requestId }`, or renders the error envelope.
fn respond<T: Serialize>(request_id: &RequestId, status: StatusCode, result: Result<T, AppError>) -> Response {
    match result {
        Ok(data) => (status, Json(json!({ "data": data, "requestId": request_id.0 }))).into_response(),
        Err(e) => e.into_envelope(&request_id.0),
    }
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get("Idempotency-Key") else {
        return Ok(None);
    };

    let key = value
        .to_str()
        .map_err(|_| AppError::validation("Idempotency-Key must be visible ASCII"))?
        .trim();

    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(AppError::validation(format!(
            "Idempotency-Key must be between 1 and {} characters",
            MAX_IDEMPOTENCY_KEY_LEN
        )));
    }

    Ok(Some(key.to_string()))
}

async fn create_booking(
    State(state): State<AppState>,
    request_id: RequestId,
    Extension(caller): Extension<CallerContext>,
    headers: HeaderMap,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Response {
    let result = async {
        let Json(request) = body?;
        let key = idempotency_key(&headers)?;

        info!("Booking requested for itinerary {}", request.itinerary_id);
        let outcome = state
            .orchestrator
            .create_booking(request, &caller, key.as_deref())
            .await?;
        Ok::<_, AppError>(outcome)
    }
    .await;

    respond(&request_id, StatusCode::CREATED, result)
}

async fn list_trip_bookings(
    State(state): State<AppState>,
    request_id: RequestId,
    Extension(caller): Extension<CallerContext>,
    Path(trip_id): Path<String>,
) -> Response {
    let result = state
        .queries
        .trip_bookings(&trip_id, &caller)
        .await
        .map_err(AppError::from);

    respond(&request_id, StatusCode::OK, result)
}

async fn list_user_bookings(
    State(state): State<AppState>,
    request_id: RequestId,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<BookingListQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let Query(query) = query?;
        let page = state
            .queries
            .user_bookings(&caller, query.limit, query.cursor.as_deref())
            .await?;
        Ok::<_, AppError>(page)
    }
    .await;

    respond(&request_id, StatusCode::OK, result)
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_idempotency_key_is_optional() {
        assert_eq!(idempotency_key(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn test_idempotency_key_bounds() {
        let mut headers = HeaderMap::new();
        headers.insert("Idempotency-Key", HeaderValue::from_static("  retry-1 "));
        assert_eq!(idempotency_key(&headers).unwrap().as_deref(), Some("retry-1"));

        headers.insert("Idempotency-Key", HeaderValue::from_static("   "));
        assert!(idempotency_key(&headers).is_err());

        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        headers.insert("Idempotency-Key", HeaderValue::from_str(&long).unwrap());
        assert!(idempotency_key(&headers).is_err());
    }
}
