use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::itinerary::{ActivityOption, DayPlan, FlightOption, HotelOption};
use crate::BookingError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub itinerary_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub selected_options: SelectedOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOptions {
    pub flight_ids: Vec<String>,
    pub hotel_id: String,
    #[serde(default)]
    pub activity_ids: Option<Vec<String>>,
}

impl BookingRequest {
    /// Shape checks that serde cannot express.
    pub fn validate(&self) -> Result<(), BookingError> {
        if self.itinerary_id.trim().is_empty() {
            return Err(BookingError::InvalidInput("itineraryId is required".to_string()));
        }
        if self.selected_options.hotel_id.trim().is_empty() {
            return Err(BookingError::InvalidInput("selectedOptions.hotelId is required".to_string()));
        }
        if self.selected_options.flight_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(BookingError::InvalidInput("selectedOptions.flightIds contains a blank id".to_string()));
        }
        if self.activity_ids().iter().any(|id| id.trim().is_empty()) {
            return Err(BookingError::InvalidInput("selectedOptions.activityIds contains a blank id".to_string()));
        }
        Ok(())
    }

    pub fn activity_ids(&self) -> &[String] {
        self.selected_options.activity_ids.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Flight,
    Hotel,
    Activity,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Flight => "flight",
            ItemType::Hotel => "hotel",
            ItemType::Activity => "activity",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flight" => Some(ItemType::Flight),
            "hotel" => Some(ItemType::Hotel),
            "activity" => Some(ItemType::Activity),
            _ => None,
        }
    }
}

/// Booking record status. Only `Confirmed` is produced today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "confirmed" => Some(BookingStatus::Confirmed),
            _ => None,
        }
    }
}

/// One persisted booking for a single flight, hotel or activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub id: String,
    pub trip_id: String,
    pub user_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    pub item_name: String,
    pub cost: f64,
    pub details: serde_json::Value,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FlightDetails<'a> {
    airline: Option<&'a str>,
    flight_number: Option<&'a str>,
    origin: Option<&'a str>,
    destination: Option<&'a str>,
    departure_time: Option<&'a str>,
    arrival_time: Option<&'a str>,
    duration: Option<&'a str>,
    stops: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HotelDetails<'a> {
    address: Option<&'a str>,
    check_in: Option<&'a str>,
    check_out: Option<&'a str>,
    nights: Option<u32>,
    price_per_night: Option<f64>,
    rating: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityDetails<'a> {
    day: u32,
    date: Option<&'a str>,
    time: Option<&'a str>,
    location: Option<&'a str>,
    duration: Option<&'a str>,
    category: Option<&'a str>,
}

impl BookingConfirmation {
    fn new(
        trip_id: &str,
        user_id: &str,
        item_type: ItemType,
        item_id: &str,
        item_name: String,
        cost: f64,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trip_id: trip_id.to_string(),
            user_id: user_id.to_string(),
            item_type,
            item_id: item_id.to_string(),
            item_name,
            cost,
            details,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    pub fn for_flight(trip_id: &str, user_id: &str, flight: &FlightOption) -> Self {
        let details = serde_json::to_value(FlightDetails {
            airline: flight.airline.as_deref(),
            flight_number: flight.flight_number.as_deref(),
            origin: flight.origin.as_deref(),
            destination: flight.destination.as_deref(),
            departure_time: flight.departure_time.as_deref(),
            arrival_time: flight.arrival_time.as_deref(),
            duration: flight.duration.as_deref(),
            stops: flight.stops,
        }).unwrap_or_default();

        Self::new(trip_id, user_id, ItemType::Flight, &flight.id, flight.display_name(), flight.price, details)
    }

    pub fn for_hotel(trip_id: &str, user_id: &str, hotel: &HotelOption) -> Self {
        let details = serde_json::to_value(HotelDetails {
            address: hotel.address.as_deref(),
            check_in: hotel.check_in.as_deref(),
            check_out: hotel.check_out.as_deref(),
            nights: hotel.nights,
            price_per_night: hotel.price_per_night,
            rating: hotel.rating,
        }).unwrap_or_default();

        Self::new(trip_id, user_id, ItemType::Hotel, &hotel.id, hotel.name.clone(), hotel.total_price, details)
    }

    pub fn for_activity(trip_id: &str, user_id: &str, day: &DayPlan, activity: &ActivityOption) -> Self {
        let details = serde_json::to_value(ActivityDetails {
            day: day.day,
            date: day.date.as_deref(),
            time: activity.time.as_deref(),
            location: activity.location.as_deref(),
            duration: activity.duration.as_deref(),
            category: activity.category.as_deref(),
        }).unwrap_or_default();

        Self::new(trip_id, user_id, ItemType::Activity, &activity.id, activity.name.clone(), activity.price, details)
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: serde_json::Value) -> BookingRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let req = request(serde_json::json!({
            "itineraryId": "T1",
            "selectedOptions": { "flightIds": ["F1"], "hotelId": "H1" }
        }));
        assert!(req.validate().is_ok());
        assert!(req.activity_ids().is_empty());

        let blank_hotel = request(serde_json::json!({
            "itineraryId": "T1",
            "selectedOptions": { "flightIds": [], "hotelId": " " }
        }));
        assert!(matches!(blank_hotel.validate(), Err(BookingError::InvalidInput(_))));

        let blank_activity = request(serde_json::json!({
            "itineraryId": "T1",
            "selectedOptions": { "flightIds": [], "hotelId": "H1", "activityIds": [""] }
        }));
        assert!(matches!(blank_activity.validate(), Err(BookingError::InvalidInput(_))));
    }

    #[test]
    fn test_missing_hotel_id_does_not_parse() {
        let parsed = serde_json::from_value::<BookingRequest>(serde_json::json!({
            "itineraryId": "T1",
            "selectedOptions": { "flightIds": ["F1"] }
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_flight_snapshot() {
        let flight: FlightOption = serde_json::from_value(serde_json::json!({
            "id": "F1", "price": 600.0, "airline": "Delta", "flightNumber": "DL100"
        })).unwrap();

        let booking = BookingConfirmation::for_flight("T1", "user-1", &flight);

        assert_eq!(booking.item_type, ItemType::Flight);
        assert_eq!(booking.item_name, "Delta DL100");
        assert_eq!(booking.cost, 600.0);
        assert_eq!(booking.details["flightNumber"], "DL100");
        assert!(booking.is_confirmed());

        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["itemType"], "flight");
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["tripId"], "T1");
    }
}
