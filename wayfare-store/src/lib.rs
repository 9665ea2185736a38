pub mod app_config;
pub mod database;
pub mod memory;
pub mod itinerary_repo;
pub mod booking_repo;
pub mod archive_repo;
pub mod redis_repo;

pub use database::DbClient;
pub use redis_repo::{RedisAttemptStore, RedisClient};
pub use itinerary_repo::PgItineraryStore;
pub use booking_repo::PgBookingRepository;
pub use archive_repo::PgArchiveWriter;
