use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use wayfare_core::repository::{
    ArchiveWriter, AttemptStore, BookingPage, BookingRepository, ItineraryStore, UnknownCursor,
};
use wayfare_core::{BookingAttempt, BookingConfirmation, Itinerary, ItineraryStatus};

/// In-memory itinerary store (local runs and tests)
#[derive(Default)]
pub struct MemoryItineraryStore {
    itineraries: RwLock<HashMap<String, Itinerary>>,
}

impl MemoryItineraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_itineraries(itineraries: Vec<Itinerary>) -> Self {
        let map = itineraries.into_iter().map(|i| (i.id.clone(), i)).collect();
        Self { itineraries: RwLock::new(map) }
    }

    pub async fn insert(&self, itinerary: Itinerary) {
        self.itineraries.write().await.insert(itinerary.id.clone(), itinerary);
    }
}

#[async_trait]
impl ItineraryStore for MemoryItineraryStore {
    async fn get_itinerary(
        &self,
        id: &str,
    ) -> Result<Option<Itinerary>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.itineraries.read().await.get(id).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ItineraryStatus,
        status: ItineraryStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut itineraries = self.itineraries.write().await;
        let itinerary = itineraries.get_mut(id)
            .ok_or_else(|| format!("Itinerary not found: {}", id))?;

        if itinerary.status != expected {
            return Ok(false);
        }

        itinerary.status = status;
        itinerary.updated_at = Utc::now();
        Ok(true)
    }
}

/// In-memory booking records, kept in insertion order
#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<Vec<BookingConfirmation>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn create_booking(
        &self,
        booking: &BookingConfirmation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut bookings = self.bookings.write().await;
        if bookings.iter().any(|b| b.id == booking.id) {
            return Err(format!("Duplicate booking id: {}", booking.id).into());
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn list_by_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<BookingConfirmation>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bookings.read().await.iter()
            .filter(|b| b.trip_id == trip_id)
            .cloned()
            .collect())
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<BookingPage, Box<dyn std::error::Error + Send + Sync>> {
        let bookings = self.bookings.read().await;

        // Newest first; the cursor is the id of the last booking already returned
        let mut newest_first = bookings.iter().rev().filter(|b| b.user_id == user_id);
        if let Some(cursor) = cursor {
            if !newest_first.by_ref().any(|b| b.id == cursor) {
                return Err(Box::new(UnknownCursor(cursor.to_string())));
            }
        }

        let mut page: Vec<BookingConfirmation> = newest_first.take(limit + 1).cloned().collect();
        let next_cursor = if page.len() > limit {
            page.truncate(limit);
            page.last().map(|b| b.id.clone())
        } else {
            None
        };

        Ok(BookingPage { bookings: page, next_cursor })
    }
}

/// In-memory archive keyed by (user id, itinerary id)
#[derive(Default)]
pub struct MemoryArchiveWriter {
    archives: RwLock<HashMap<(String, String), Vec<BookingConfirmation>>>,
}

impl MemoryArchiveWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn archived(&self, user_id: &str, itinerary_id: &str) -> Option<Vec<BookingConfirmation>> {
        self.archives.read().await
            .get(&(user_id.to_string(), itinerary_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ArchiveWriter for MemoryArchiveWriter {
    async fn store_confirmations(
        &self,
        user_id: &str,
        itinerary_id: &str,
        bookings: &[BookingConfirmation],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.archives.write().await
            .insert((user_id.to_string(), itinerary_id.to_string()), bookings.to_vec());
        Ok(())
    }
}

/// In-memory attempt ledger. Attempts untouched for longer than the TTL are dropped,
/// mirroring the Redis key expiry.
pub struct MemoryAttemptStore {
    attempts: RwLock<HashMap<String, BookingAttempt>>,
    ttl: Duration,
}

impl MemoryAttemptStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            ttl: i64::try_from(ttl_seconds).ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }

    fn is_live(&self, attempt: &BookingAttempt, now: DateTime<Utc>) -> bool {
        now - attempt.updated_at < self.ttl
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn get_attempt(
        &self,
        key: &str,
    ) -> Result<Option<BookingAttempt>, Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();
        Ok(self.attempts.read().await.get(key)
            .filter(|attempt| self.is_live(attempt, now))
            .cloned())
    }

    async fn save_attempt(
        &self,
        attempt: &BookingAttempt,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let now = Utc::now();
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, stored| self.is_live(stored, now));
        attempts.insert(attempt.key.clone(), attempt.clone());
        Ok(())
    }
}
