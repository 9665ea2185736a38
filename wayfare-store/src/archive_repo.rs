use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use wayfare_core::repository::ArchiveWriter;
use wayfare_core::BookingConfirmation;

/// Keeps one JSONB copy of a trip's confirmations per (user, itinerary).
pub struct PgArchiveWriter {
    pool: PgPool,
}

impl PgArchiveWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArchiveWriter for PgArchiveWriter {
    async fn store_confirmations(
        &self,
        user_id: &str,
        itinerary_id: &str,
        bookings: &[BookingConfirmation],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let confirmations = serde_json::to_value(bookings)?;

        sqlx::query(
            r#"
            INSERT INTO booking_archives (user_id, itinerary_id, confirmations, archived_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id, itinerary_id) DO UPDATE
            SET confirmations = EXCLUDED.confirmations,
                archived_at = EXCLUDED.archived_at
            "#,
        )
        .bind(user_id)
        .bind(itinerary_id)
        .bind(confirmations)
        .execute(&self.pool)
        .await?;

        info!("Archived {} confirmations for {}/{}", bookings.len(), user_id, itinerary_id);
        Ok(())
    }
}
