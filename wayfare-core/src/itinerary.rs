use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Itinerary status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItineraryStatus {
    Draft,
    Ready,
    Booked,
}

impl ItineraryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItineraryStatus::Draft => "draft",
            ItineraryStatus::Ready => "ready",
            ItineraryStatus::Booked => "booked",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ItineraryStatus::Draft),
            "ready" => Some(ItineraryStatus::Ready),
            "booked" => Some(ItineraryStatus::Booked),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItineraryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planned trip produced by the trip-planning workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub status: ItineraryStatus,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub flights: Option<FlightOptions>,
    #[serde(default)]
    pub hotels: Vec<HotelOption>,
    #[serde(default)]
    pub days: Vec<DayPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightOptions {
    #[serde(default)]
    pub outbound: Vec<FlightOption>,
    #[serde(default, rename = "return")]
    pub return_flights: Vec<FlightOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOption {
    pub id: String,
    pub price: f64,
    #[serde(default)]
    pub airline: Option<String>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub stops: Option<u32>,
}

impl FlightOption {
    /// Display name used on the booking record, e.g. "Delta DL123".
    pub fn display_name(&self) -> String {
        match (&self.airline, &self.flight_number) {
            (Some(airline), Some(number)) => format!("{} {}", airline, number),
            (Some(airline), None) => airline.clone(),
            (None, Some(number)) => number.clone(),
            (None, None) => format!("Flight {}", self.id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelOption {
    pub id: String,
    pub name: String,
    pub total_price: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub check_in: Option<String>,
    #[serde(default)]
    pub check_out: Option<String>,
    #[serde(default)]
    pub nights: Option<u32>,
    #[serde(default)]
    pub price_per_night: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub activities: Vec<ActivityOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityOption {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Itinerary {
    /// Searches outbound flights first, then return flights.
    pub fn find_flight(&self, flight_id: &str) -> Option<&FlightOption> {
        let flights = self.flights.as_ref()?;
        flights.outbound.iter()
            .chain(flights.return_flights.iter())
            .find(|f| f.id == flight_id)
    }

    pub fn find_hotel(&self, hotel_id: &str) -> Option<&HotelOption> {
        self.hotels.iter().find(|h| h.id == hotel_id)
    }

    /// Returns the activity together with the day it is planned on.
    pub fn find_activity(&self, activity_id: &str) -> Option<(&DayPlan, &ActivityOption)> {
        self.days.iter().find_map(|day| {
            day.activities.iter()
                .find(|a| a.id == activity_id)
                .map(|a| (day, a))
        })
    }

    pub fn is_owned_by_other(&self, user_id: Option<&str>) -> bool {
        match (&self.user_id, user_id) {
            (Some(owner), Some(caller)) => owner != caller,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Itinerary {
        serde_json::from_value(serde_json::json!({
            "id": "T1",
            "userId": "user-1",
            "status": "ready",
            "flights": {
                "outbound": [{ "id": "F1", "price": 600.0, "airline": "Delta", "flightNumber": "DL100" }],
                "return": [{ "id": "F2", "price": 550.0 }]
            },
            "hotels": [{ "id": "H1", "name": "Harbor Inn", "totalPrice": 750.0 }],
            "days": [
                { "day": 1, "activities": [] },
                { "day": 2, "date": "2026-05-02", "activities": [{ "id": "A1", "name": "Walking tour", "price": 25.0 }] }
            ],
            "createdAt": "2026-04-01T00:00:00Z",
            "updatedAt": "2026-04-01T00:00:00Z"
        })).unwrap()
    }

    #[test]
    fn test_item_lookup() {
        let itinerary = sample();

        assert_eq!(itinerary.find_flight("F1").unwrap().display_name(), "Delta DL100");
        assert_eq!(itinerary.find_flight("F2").unwrap().price, 550.0);
        assert!(itinerary.find_flight("F9").is_none());

        assert_eq!(itinerary.find_hotel("H1").unwrap().name, "Harbor Inn");
        assert!(itinerary.find_hotel("H9").is_none());

        let (day, activity) = itinerary.find_activity("A1").unwrap();
        assert_eq!(day.day, 2);
        assert_eq!(activity.price, 25.0);
        assert!(itinerary.find_activity("A9").is_none());
    }

    #[test]
    fn test_ownership() {
        let mut itinerary = sample();
        assert!(!itinerary.is_owned_by_other(Some("user-1")));
        assert!(itinerary.is_owned_by_other(Some("user-2")));
        assert!(itinerary.is_owned_by_other(None));

        itinerary.user_id = None;
        assert!(!itinerary.is_owned_by_other(None));
        assert!(!itinerary.is_owned_by_other(Some("anyone")));
    }

    #[test]
    fn test_status_round_trip_through_str() {
        for status in [ItineraryStatus::Draft, ItineraryStatus::Ready, ItineraryStatus::Booked] {
            assert_eq!(ItineraryStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ItineraryStatus::parse("cancelled"), None);
    }
}
