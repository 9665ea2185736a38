use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use wayfare_core::attempt::{AttemptStage, BookingAttempt};
use wayfare_core::repository::{ArchiveWriter, AttemptStore, BookingRepository, ItineraryStore};
use wayfare_core::{
    BookingConfirmation, BookingError, BookingRequest, BookingResult, CallerContext,
    ConfirmationNumber, ItemType, Itinerary, ItineraryStatus, SelectionFingerprint,
};

/// Result of a completed booking transaction
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingOutcome {
    pub confirmation_number: String,
    pub bookings: Vec<BookingConfirmation>,
    pub total_cost: f64,
    pub itinerary_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_remaining: Option<f64>,
}

/// Turns a ready itinerary plus the caller's selections into booking records.
///
/// Writes go out sequentially: flights, hotel, activities, the itinerary status
/// change, then the archive copy. Nothing is rolled back on failure. Instead each
/// step is recorded on a [`BookingAttempt`] so a retry with the same idempotency key
/// resumes where the previous run stopped.
pub struct BookingOrchestrator {
    itineraries: Arc<dyn ItineraryStore>,
    bookings: Arc<dyn BookingRepository>,
    archive: Arc<dyn ArchiveWriter>,
    attempts: Arc<dyn AttemptStore>,
}

/// Items picked out of the itinerary before any write happens
struct ResolvedSelection<'a> {
    flights: Vec<&'a wayfare_core::FlightOption>,
    hotel: &'a wayfare_core::HotelOption,
    activities: Vec<(&'a wayfare_core::DayPlan, &'a wayfare_core::ActivityOption)>,
}

impl BookingOrchestrator {
    pub fn new(
        itineraries: Arc<dyn ItineraryStore>,
        bookings: Arc<dyn BookingRepository>,
        archive: Arc<dyn ArchiveWriter>,
        attempts: Arc<dyn AttemptStore>,
    ) -> Self {
        Self { itineraries, bookings, archive, attempts }
    }

    pub async fn create_booking(
        &self,
        request: BookingRequest,
        caller: &CallerContext,
        idempotency_key: Option<&str>,
    ) -> BookingResult<BookingOutcome> {
        request.validate()?;

        // 1. Load itinerary and resolve who is booking
        let itinerary = self.itineraries.get_itinerary(&request.itinerary_id).await
            .map_err(downstream("fetch itinerary"))?
            .ok_or_else(|| BookingError::NotFound(format!("Itinerary {} not found", request.itinerary_id)))?;

        let user_id = caller.user_id.clone()
            .or_else(|| request.user_id.clone())
            .ok_or_else(|| BookingError::Unauthenticated("No user identity could be resolved".to_string()))?;

        if itinerary.is_owned_by_other(Some(user_id.as_str())) {
            return Err(BookingError::Unauthorized("Itinerary does not belong to you".to_string()));
        }

        // 2. Pick up or start the attempt ledger
        let picked = SelectionFingerprint::of(&request.selected_options);
        let mut attempt = self.load_attempt(idempotency_key, &itinerary.id, &user_id, &picked).await?;

        if attempt.is_complete() {
            info!("Replaying completed booking attempt {} for itinerary {}", attempt.key, itinerary.id);
            return Ok(outcome(attempt, &itinerary));
        }

        // Once this attempt flipped the status itself, `booked` is expected
        if !attempt.reached(AttemptStage::ItineraryUpdated) && itinerary.status != ItineraryStatus::Ready {
            return Err(BookingError::InvalidInput(format!(
                "Itinerary {} is {} and cannot be booked",
                itinerary.id, itinerary.status
            )));
        }

        // 3. Resolve every selection before the first write
        let selection = resolve_selection(&itinerary, &picked)?;

        self.save(&attempt).await?;

        // 4. Sub-bookings
        if !attempt.reached(AttemptStage::FlightsBooked) {
            for flight in &selection.flights {
                self.book_item(&mut attempt, ItemType::Flight, &flight.id, || {
                    BookingConfirmation::for_flight(&itinerary.id, &user_id, flight)
                }).await?;
            }
            self.advance(&mut attempt, AttemptStage::FlightsBooked).await?;
        }

        if !attempt.reached(AttemptStage::HotelBooked) {
            let hotel = selection.hotel;
            self.book_item(&mut attempt, ItemType::Hotel, &hotel.id, || {
                BookingConfirmation::for_hotel(&itinerary.id, &user_id, hotel)
            }).await?;
            self.advance(&mut attempt, AttemptStage::HotelBooked).await?;
        }

        if !attempt.reached(AttemptStage::ActivitiesBooked) {
            for (day, activity) in &selection.activities {
                self.book_item(&mut attempt, ItemType::Activity, &activity.id, || {
                    BookingConfirmation::for_activity(&itinerary.id, &user_id, day, activity)
                }).await?;
            }
            self.advance(&mut attempt, AttemptStage::ActivitiesBooked).await?;
        }

        // 5. ready -> booked, guarded against a concurrent booking of the same trip
        if !attempt.reached(AttemptStage::ItineraryUpdated) {
            let swapped = self.itineraries
                .update_status(&itinerary.id, ItineraryStatus::Ready, ItineraryStatus::Booked)
                .await
                .map_err(downstream("update itinerary status"))?;

            if !swapped {
                warn!("Itinerary {} left `ready` while attempt {} was booking it", itinerary.id, attempt.key);
                return Err(BookingError::Conflict(format!(
                    "Itinerary {} was booked by another request",
                    itinerary.id
                )));
            }
            self.advance(&mut attempt, AttemptStage::ItineraryUpdated).await?;
        }

        // 6. Archive copy
        if !attempt.reached(AttemptStage::Archived) {
            self.archive.store_confirmations(&user_id, &itinerary.id, &attempt.bookings).await
                .map_err(downstream("archive confirmations"))?;
            self.advance(&mut attempt, AttemptStage::Archived).await?;
        }

        // 7. Master confirmation
        if attempt.confirmation_number.is_none() {
            attempt.confirmation_number = Some(ConfirmationNumber::generate().into_inner());
        }
        self.advance(&mut attempt, AttemptStage::Complete).await?;

        info!(
            "Booking confirmed for itinerary {}: {} items, total {:.2}",
            itinerary.id,
            attempt.bookings.len(),
            attempt.total_cost
        );

        if let Some(budget) = itinerary.budget {
            if attempt.total_cost > budget {
                warn!(
                    "Itinerary {} booked over budget: total {:.2} exceeds budget {:.2}",
                    itinerary.id, attempt.total_cost, budget
                );
            }
        }

        Ok(outcome(attempt, &itinerary))
    }

    async fn load_attempt(
        &self,
        idempotency_key: Option<&str>,
        itinerary_id: &str,
        user_id: &str,
        picked: &SelectionFingerprint,
    ) -> BookingResult<BookingAttempt> {
        let Some(key) = idempotency_key else {
            return Ok(BookingAttempt::transient(itinerary_id.to_string(), user_id.to_string(), picked.clone()));
        };

        match self.attempts.get_attempt(key).await.map_err(downstream("load booking attempt"))? {
            Some(existing) => {
                if !existing.matches(itinerary_id, user_id, picked) {
                    return Err(BookingError::InvalidInput(
                        "Idempotency key was already used for a different booking".to_string(),
                    ));
                }
                info!("Resuming booking attempt {} at stage {:?}", key, existing.stage);
                Ok(existing)
            }
            None => Ok(BookingAttempt::new(key.to_string(), itinerary_id.to_string(), user_id.to_string(), picked.clone())),
        }
    }

    /// Creates one booking record unless an earlier run of this attempt already did.
    async fn book_item<F>(
        &self,
        attempt: &mut BookingAttempt,
        item_type: ItemType,
        item_id: &str,
        build: F,
    ) -> BookingResult<()>
    where
        F: FnOnce() -> BookingConfirmation,
    {
        if attempt.booked_item(item_type, item_id).is_some() {
            return Ok(());
        }

        let booking = build();
        self.bookings.create_booking(&booking).await
            .map_err(downstream("create booking record"))?;

        info!("Booked {} {} for trip {}", item_type.as_str(), item_id, booking.trip_id);
        attempt.record_booking(booking);
        self.save(attempt).await
    }

    async fn advance(&self, attempt: &mut BookingAttempt, stage: AttemptStage) -> BookingResult<()> {
        attempt.advance(stage).map_err(|e| BookingError::Internal(e.to_string()))?;
        self.save(attempt).await
    }

    async fn save(&self, attempt: &BookingAttempt) -> BookingResult<()> {
        if attempt.transient {
            return Ok(());
        }
        self.attempts.save_attempt(attempt).await
            .map_err(downstream("save booking attempt"))
    }
}

fn resolve_selection<'a>(itinerary: &'a Itinerary, picked: &SelectionFingerprint) -> BookingResult<ResolvedSelection<'a>> {
    let mut flights = Vec::new();
    for flight_id in &picked.flight_ids {
        let flight = itinerary.find_flight(flight_id)
            .ok_or_else(|| BookingError::InvalidInput(format!("Flight {} not found in itinerary", flight_id)))?;
        flights.push(flight);
    }

    let hotel_id = &picked.hotel_id;
    let hotel = itinerary.find_hotel(hotel_id)
        .ok_or_else(|| BookingError::InvalidInput(format!("Hotel {} not found in itinerary", hotel_id)))?;

    // Unknown activities are skipped, unlike flights and hotels
    let activities = picked.activity_ids
        .iter()
        .filter_map(|activity_id| {
            let found = itinerary.find_activity(activity_id);
            if found.is_none() {
                warn!("Activity {} not found in itinerary {}, skipping", activity_id, itinerary.id);
            }
            found
        })
        .collect();

    Ok(ResolvedSelection { flights, hotel, activities })
}

fn outcome(attempt: BookingAttempt, itinerary: &Itinerary) -> BookingOutcome {
    let budget_remaining = itinerary.budget.map(|budget| budget - attempt.total_cost);
    BookingOutcome {
        confirmation_number: attempt.confirmation_number.unwrap_or_default(),
        total_cost: attempt.total_cost,
        bookings: attempt.bookings,
        itinerary_id: itinerary.id.clone(),
        budget: itinerary.budget,
        budget_remaining,
    }
}

fn downstream(context: &'static str) -> impl FnOnce(Box<dyn std::error::Error + Send + Sync>) -> BookingError {
    move |e| {
        error!("Failed to {}: {}", context, e);
        BookingError::Internal(format!("Failed to {}", context))
    }
}
