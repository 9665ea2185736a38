use std::sync::Arc;

use serde::Serialize;
use tracing::error;
use wayfare_core::repository::{BookingRepository, ItineraryStore, UnknownCursor};
use wayfare_core::{BookingConfirmation, BookingError, BookingResult, CallerContext};

#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: usize,
    pub max_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self { default_size: 50, max_size: 100 }
    }
}

impl PageLimits {
    /// Omitted means the default; anything else is clamped into `1..=max_size`.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_size).clamp(1, self.max_size)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripBookings {
    pub trip_id: String,
    pub bookings: Vec<BookingConfirmation>,
    pub total_bookings: usize,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBookings {
    pub bookings: Vec<BookingConfirmation>,
    pub total_bookings: usize,
    pub total_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Read side: bookings per trip and per user
pub struct BookingQueries {
    itineraries: Arc<dyn ItineraryStore>,
    bookings: Arc<dyn BookingRepository>,
    limits: PageLimits,
}

impl BookingQueries {
    pub fn new(
        itineraries: Arc<dyn ItineraryStore>,
        bookings: Arc<dyn BookingRepository>,
        limits: PageLimits,
    ) -> Self {
        Self { itineraries, bookings, limits }
    }

    pub async fn trip_bookings(&self, trip_id: &str, caller: &CallerContext) -> BookingResult<TripBookings> {
        if trip_id.trim().is_empty() {
            return Err(BookingError::InvalidInput("tripId is required".to_string()));
        }

        let itinerary = self.itineraries.get_itinerary(trip_id).await
            .map_err(|e| {
                error!("Failed to fetch itinerary {}: {}", trip_id, e);
                BookingError::Internal("Failed to fetch itinerary".to_string())
            })?
            .ok_or_else(|| BookingError::NotFound(format!("Trip {} not found", trip_id)))?;

        if itinerary.is_owned_by_other(caller.user_id.as_deref()) {
            return Err(BookingError::Unauthorized("Trip does not belong to you".to_string()));
        }

        let bookings = self.bookings.list_by_trip(trip_id).await
            .map_err(|e| {
                error!("Failed to list bookings for trip {}: {}", trip_id, e);
                BookingError::Internal("Failed to list bookings".to_string())
            })?;

        let total_cost = bookings.iter().map(|b| b.cost).sum();

        Ok(TripBookings {
            trip_id: trip_id.to_string(),
            total_bookings: bookings.len(),
            total_cost,
            bookings,
        })
    }

    pub async fn user_bookings(
        &self,
        caller: &CallerContext,
        limit: Option<usize>,
        cursor: Option<&str>,
    ) -> BookingResult<UserBookings> {
        let user_id = caller.user_id.as_deref()
            .ok_or_else(|| BookingError::Unauthenticated("Authentication required".to_string()))?;

        let page = self.bookings.list_by_user(user_id, self.limits.clamp(limit), cursor).await
            .map_err(|e| {
                if let Some(unknown) = e.downcast_ref::<UnknownCursor>() {
                    return BookingError::InvalidInput(unknown.to_string());
                }
                error!("Failed to list bookings for user {}: {}", user_id, e);
                BookingError::Internal("Failed to list bookings".to_string())
            })?;

        let total_value = page.bookings.iter()
            .filter(|b| b.is_confirmed())
            .map(|b| b.cost)
            .sum();

        Ok(UserBookings {
            total_bookings: page.bookings.len(),
            total_value,
            bookings: page.bookings,
            next_cursor: page.next_cursor,
        })
    }
}
