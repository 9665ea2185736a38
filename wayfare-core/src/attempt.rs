use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::booking::{BookingConfirmation, ItemType, SelectedOptions};

/// Progress of one booking attempt. Stages only move forward, one step at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStage {
    Pending,
    FlightsBooked,
    HotelBooked,
    ActivitiesBooked,
    ItineraryUpdated,
    Archived,
    Complete,
}

impl AttemptStage {
    pub fn next(&self) -> Option<AttemptStage> {
        match self {
            AttemptStage::Pending => Some(AttemptStage::FlightsBooked),
            AttemptStage::FlightsBooked => Some(AttemptStage::HotelBooked),
            AttemptStage::HotelBooked => Some(AttemptStage::ActivitiesBooked),
            AttemptStage::ActivitiesBooked => Some(AttemptStage::ItineraryUpdated),
            AttemptStage::ItineraryUpdated => Some(AttemptStage::Archived),
            AttemptStage::Archived => Some(AttemptStage::Complete),
            AttemptStage::Complete => None,
        }
    }
}

/// Normalized selection an attempt was started with: ids deduplicated in first-seen order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionFingerprint {
    pub flight_ids: Vec<String>,
    pub hotel_id: String,
    pub activity_ids: Vec<String>,
}

impl SelectionFingerprint {
    pub fn of(options: &SelectedOptions) -> Self {
        Self {
            flight_ids: dedup(&options.flight_ids),
            hotel_id: options.hotel_id.clone(),
            activity_ids: dedup(options.activity_ids.as_deref().unwrap_or(&[])),
        }
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Per-attempt ledger, keyed by idempotency key, used to resume a partially applied booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAttempt {
    pub key: String,
    pub itinerary_id: String,
    pub user_id: String,
    pub selection: SelectionFingerprint,
    pub stage: AttemptStage,
    pub bookings: Vec<BookingConfirmation>,
    pub total_cost: f64,
    pub confirmation_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set for attempts started without an idempotency key; these are never stored.
    #[serde(skip)]
    pub transient: bool,
}

impl BookingAttempt {
    pub fn new(key: String, itinerary_id: String, user_id: String, selection: SelectionFingerprint) -> Self {
        let now = Utc::now();
        Self {
            key,
            itinerary_id,
            user_id,
            selection,
            stage: AttemptStage::Pending,
            bookings: Vec::new(),
            total_cost: 0.0,
            confirmation_number: None,
            created_at: now,
            updated_at: now,
            transient: false,
        }
    }

    /// An attempt nobody can come back to: it lives for a single call only.
    pub fn transient(itinerary_id: String, user_id: String, selection: SelectionFingerprint) -> Self {
        let mut attempt = Self::new(uuid::Uuid::new_v4().to_string(), itinerary_id, user_id, selection);
        attempt.transient = true;
        attempt
    }

    /// Whether a retry under the same key targets what this attempt booked.
    pub fn matches(&self, itinerary_id: &str, user_id: &str, selection: &SelectionFingerprint) -> bool {
        self.itinerary_id == itinerary_id && self.user_id == user_id && &self.selection == selection
    }

    /// The booking already created for this item by an earlier run of the attempt.
    pub fn booked_item(&self, item_type: ItemType, item_id: &str) -> Option<&BookingConfirmation> {
        self.bookings.iter()
            .find(|b| b.item_type == item_type && b.item_id == item_id)
    }

    pub fn record_booking(&mut self, booking: BookingConfirmation) {
        self.total_cost += booking.cost;
        self.bookings.push(booking);
        self.updated_at = Utc::now();
    }

    /// Advance exactly one stage. Re-entering the current stage is a no-op so a resumed
    /// attempt can replay its steps.
    pub fn advance(&mut self, to: AttemptStage) -> Result<(), AttemptError> {
        if self.stage == to {
            return Ok(());
        }
        if self.stage.next() != Some(to) {
            return Err(AttemptError::InvalidTransition { from: self.stage, to });
        }
        self.stage = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn reached(&self, stage: AttemptStage) -> bool {
        self.stage >= stage
    }

    pub fn is_complete(&self) -> bool {
        self.stage == AttemptStage::Complete
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Invalid attempt transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: AttemptStage,
        to: AttemptStage,
    },
}
