pub mod orchestrator;
pub mod queries;

#[cfg(test)]
mod test_support;

pub use orchestrator::{BookingOrchestrator, BookingOutcome};
pub use queries::{BookingQueries, PageLimits, TripBookings, UserBookings};
