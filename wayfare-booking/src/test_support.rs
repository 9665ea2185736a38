//! Shared fixtures for the orchestrator and query tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::sync::Barrier;
use wayfare_core::repository::{ArchiveWriter, BookingPage, BookingRepository, ItineraryStore};
use wayfare_core::{BookingAttempt, BookingConfirmation, BookingRequest, Itinerary, ItineraryStatus};
use wayfare_store::memory::{
    MemoryArchiveWriter, MemoryAttemptStore, MemoryBookingRepository, MemoryItineraryStore,
};

use crate::orchestrator::BookingOrchestrator;
use crate::queries::{BookingQueries, PageLimits};

type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Ready itinerary: outbound F1 600, return F2 550, hotel H1 750, activity A1 25, budget 2000.
pub fn ready_trip(id: &str, owner: Option<&str>) -> Itinerary {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "userId": owner,
        "status": "ready",
        "destination": "Lisbon",
        "budget": 2000.0,
        "flights": {
            "outbound": [{
                "id": "F1", "price": 600.0, "airline": "TAP", "flightNumber": "TP202",
                "origin": "JFK", "destination": "LIS"
            }],
            "return": [{ "id": "F2", "price": 550.0, "airline": "TAP", "flightNumber": "TP201" }]
        },
        "hotels": [
            { "id": "H1", "name": "Alfama Suites", "totalPrice": 750.0, "checkIn": "2026-05-01", "checkOut": "2026-05-04" },
            { "id": "H2", "name": "Baixa Hostel", "totalPrice": 210.0 }
        ],
        "days": [
            { "day": 1, "date": "2026-05-01", "activities": [] },
            { "day": 2, "date": "2026-05-02", "activities": [
                { "id": "A1", "name": "Tram 28 tour", "price": 25.0, "time": "10:00" }
            ]}
        ],
        "createdAt": "2026-04-01T00:00:00Z",
        "updatedAt": "2026-04-01T00:00:00Z"
    }))
    .expect("fixture itinerary")
}

pub fn request(itinerary_id: &str, flights: &[&str], hotel: &str, activities: Option<&[&str]>) -> BookingRequest {
    serde_json::from_value(serde_json::json!({
        "itineraryId": itinerary_id,
        "selectedOptions": {
            "flightIds": flights,
            "hotelId": hotel,
            "activityIds": activities,
        }
    }))
    .expect("fixture request")
}

/// Itinerary store whose next conditional write can be forced to lose.
pub struct RacyItineraries {
    inner: MemoryItineraryStore,
    lose_next_swap: AtomicBool,
}

impl RacyItineraries {
    pub async fn fail_next_swap(&self) {
        self.lose_next_swap.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ItineraryStore for RacyItineraries {
    async fn get_itinerary(&self, id: &str) -> RepoResult<Option<Itinerary>> {
        self.inner.get_itinerary(id).await
    }

    async fn update_status(&self, id: &str, expected: ItineraryStatus, status: ItineraryStatus) -> RepoResult<bool> {
        if self.lose_next_swap.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.update_status(id, expected, status).await
    }
}

/// Booking repository that starts failing after a number of successful writes.
pub struct FlakyBookings {
    inner: MemoryBookingRepository,
    remaining: Mutex<Option<usize>>,
}

impl FlakyBookings {
    pub async fn heal(&self) {
        *self.remaining.lock().await = None;
    }
}

#[async_trait]
impl BookingRepository for FlakyBookings {
    async fn create_booking(&self, booking: &BookingConfirmation) -> RepoResult<()> {
        {
            let mut remaining = self.remaining.lock().await;
            if let Some(left) = remaining.as_mut() {
                if *left == 0 {
                    return Err("booking table unavailable".into());
                }
                *left -= 1;
            }
        }
        self.inner.create_booking(booking).await
    }

    async fn list_by_trip(&self, trip_id: &str) -> RepoResult<Vec<BookingConfirmation>> {
        self.inner.list_by_trip(trip_id).await
    }

    async fn list_by_user(&self, user_id: &str, limit: usize, cursor: Option<&str>) -> RepoResult<BookingPage> {
        self.inner.list_by_user(user_id, limit, cursor).await
    }
}

/// Itinerary store that holds every reader at a barrier until `parties` reads are in
/// flight, so concurrent bookings all see the same status before any of them writes.
pub struct GatedItineraries {
    inner: MemoryItineraryStore,
    barrier: Barrier,
}

impl GatedItineraries {
    pub fn new(itineraries: Vec<Itinerary>, parties: usize) -> Self {
        Self {
            inner: MemoryItineraryStore::with_itineraries(itineraries),
            barrier: Barrier::new(parties),
        }
    }
}

#[async_trait]
impl ItineraryStore for GatedItineraries {
    async fn get_itinerary(&self, id: &str) -> RepoResult<Option<Itinerary>> {
        let itinerary = self.inner.get_itinerary(id).await?;
        self.barrier.wait().await;
        Ok(itinerary)
    }

    async fn update_status(&self, id: &str, expected: ItineraryStatus, status: ItineraryStatus) -> RepoResult<bool> {
        self.inner.update_status(id, expected, status).await
    }
}

/// Archive writer that can be switched into failing.
pub struct FlakyArchive {
    inner: MemoryArchiveWriter,
    failing: AtomicBool,
}

impl FlakyArchive {
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    pub async fn archived(&self, user_id: &str, itinerary_id: &str) -> Option<Vec<BookingConfirmation>> {
        self.inner.archived(user_id, itinerary_id).await
    }
}

#[async_trait]
impl ArchiveWriter for FlakyArchive {
    async fn store_confirmations(
        &self,
        user_id: &str,
        itinerary_id: &str,
        bookings: &[BookingConfirmation],
    ) -> RepoResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("archive bucket unavailable".into());
        }
        self.inner.store_confirmations(user_id, itinerary_id, bookings).await
    }
}

pub const ATTEMPT_TTL_SECONDS: u64 = 3600;

pub struct Fixture {
    pub itineraries: Arc<RacyItineraries>,
    pub bookings: Arc<FlakyBookings>,
    pub archive: Arc<FlakyArchive>,
    pub attempts: Arc<MemoryAttemptStore>,
}

impl Fixture {
    pub fn new(itineraries: Vec<Itinerary>) -> Self {
        Self::build(itineraries, None)
    }

    /// Booking writes fail once `successes` records have been created.
    pub fn with_failing_create(itineraries: Vec<Itinerary>, successes: usize) -> Self {
        Self::build(itineraries, Some(successes))
    }

    fn build(itineraries: Vec<Itinerary>, successes: Option<usize>) -> Self {
        Self {
            itineraries: Arc::new(RacyItineraries {
                inner: MemoryItineraryStore::with_itineraries(itineraries),
                lose_next_swap: AtomicBool::new(false),
            }),
            bookings: Arc::new(FlakyBookings {
                inner: MemoryBookingRepository::new(),
                remaining: Mutex::new(successes),
            }),
            archive: Arc::new(FlakyArchive {
                inner: MemoryArchiveWriter::new(),
                failing: AtomicBool::new(false),
            }),
            attempts: Arc::new(MemoryAttemptStore::new(ATTEMPT_TTL_SECONDS)),
        }
    }

    pub fn orchestrator(&self) -> BookingOrchestrator {
        BookingOrchestrator::new(
            self.itineraries.clone(),
            self.bookings.clone(),
            self.archive.clone(),
            self.attempts.clone(),
        )
    }

    pub fn queries(&self) -> BookingQueries {
        BookingQueries::new(self.itineraries.clone(), self.bookings.clone(), PageLimits::default())
    }

    pub async fn status_of(&self, id: &str) -> ItineraryStatus {
        self.itineraries.get_itinerary(id).await.unwrap().unwrap().status
    }

    pub async fn bookings_for(&self, trip_id: &str) -> Vec<BookingConfirmation> {
        self.bookings.list_by_trip(trip_id).await.unwrap()
    }

    pub async fn attempt(&self, key: &str) -> Option<BookingAttempt> {
        use wayfare_core::repository::AttemptStore;
        self.attempts.get_attempt(key).await.unwrap()
    }
}
