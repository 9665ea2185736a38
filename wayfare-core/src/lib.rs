pub mod itinerary;
pub mod booking;
pub mod attempt;
pub mod repository;
pub mod confirmation;

pub use itinerary::{Itinerary, ItineraryStatus, FlightOption, HotelOption, ActivityOption, DayPlan};
pub use booking::{BookingConfirmation, BookingRequest, BookingStatus, ItemType, SelectedOptions};
pub use attempt::{AttemptStage, BookingAttempt, SelectionFingerprint};
pub use confirmation::ConfirmationNumber;

/// Stable error taxonomy shared by the orchestrator, the query handlers and the API.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// The resolved identity does not own the resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// No identity could be resolved for the caller.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal service error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::NotFound(_) => "NOT_FOUND",
            BookingError::Unauthorized(_) | BookingError::Unauthenticated(_) => "UNAUTHORIZED",
            BookingError::Conflict(_) => "CONFLICT",
            BookingError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

/// Identity resolved from the request's credentials, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: Option<String>,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self { user_id: Some(user_id.into()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(BookingError::InvalidInput("x".into()).code(), "INVALID_INPUT");
        assert_eq!(BookingError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(BookingError::Unauthorized("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(BookingError::Unauthenticated("x".into()).code(), "UNAUTHORIZED");
        assert_eq!(BookingError::Conflict("x".into()).code(), "CONFLICT");
        assert_eq!(BookingError::Internal("x".into()).code(), "INTERNAL_ERROR");
    }
}
