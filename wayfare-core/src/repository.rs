use async_trait::async_trait;

use crate::attempt::BookingAttempt;
use crate::booking::BookingConfirmation;
use crate::itinerary::{Itinerary, ItineraryStatus};

/// One page of a user's bookings, newest first
#[derive(Debug, Clone, Default)]
pub struct BookingPage {
    pub bookings: Vec<BookingConfirmation>,
    /// Id of the last booking on this page when more results exist.
    pub next_cursor: Option<String>,
}

/// Returned by `list_by_user` when the cursor is not one of the user's bookings.
#[derive(Debug, thiserror::Error)]
#[error("Unknown cursor: {0}")]
pub struct UnknownCursor(pub String);

/// Repository trait for itinerary data access
#[async_trait]
pub trait ItineraryStore: Send + Sync {
    async fn get_itinerary(
        &self,
        id: &str,
    ) -> Result<Option<Itinerary>, Box<dyn std::error::Error + Send + Sync>>;

    /// Conditional status write. Returns `false` when the stored status was not `expected`.
    async fn update_status(
        &self,
        id: &str,
        expected: ItineraryStatus,
        status: ItineraryStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Repository trait for booking records
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(
        &self,
        booking: &BookingConfirmation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// All bookings for a trip in creation order.
    async fn list_by_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<BookingConfirmation>, Box<dyn std::error::Error + Send + Sync>>;

    /// Newest first. A cursor that does not name one of the user's bookings fails with
    /// [`UnknownCursor`].
    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<BookingPage, Box<dyn std::error::Error + Send + Sync>>;
}

/// Durable copy of all confirmations issued for a trip
#[async_trait]
pub trait ArchiveWriter: Send + Sync {
    async fn store_confirmations(
        &self,
        user_id: &str,
        itinerary_id: &str,
        bookings: &[BookingConfirmation],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Persistence for in-flight booking attempts
#[async_trait]
pub trait AttemptStore: Send + Sync {
    async fn get_attempt(
        &self,
        key: &str,
    ) -> Result<Option<BookingAttempt>, Box<dyn std::error::Error + Send + Sync>>;

    async fn save_attempt(
        &self,
        attempt: &BookingAttempt,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
