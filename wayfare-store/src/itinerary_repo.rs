use async_trait::async_trait;
use sqlx::PgPool;
use wayfare_core::repository::ItineraryStore;
use wayfare_core::{Itinerary, ItineraryStatus};

/// Itineraries are stored as JSONB documents. The `status` and `user_id`
/// columns are authoritative and override whatever the document says.
pub struct PgItineraryStore {
    pool: PgPool,
}

impl PgItineraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert used by the planning workflow and by seed scripts.
    pub async fn save_itinerary(
        &self,
        itinerary: &Itinerary,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let document = serde_json::to_value(itinerary)?;

        sqlx::query(
            r#"
            INSERT INTO itineraries (id, user_id, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                status = EXCLUDED.status,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&itinerary.id)
        .bind(&itinerary.user_id)
        .bind(itinerary.status.as_str())
        .bind(document)
        .bind(itinerary.created_at)
        .bind(itinerary.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ItineraryRow {
    user_id: Option<String>,
    status: String,
    document: serde_json::Value,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
impl ItineraryStore for PgItineraryStore {
    async fn get_itinerary(
        &self,
        id: &str,
    ) -> Result<Option<Itinerary>, Box<dyn std::error::Error + Send + Sync>> {
        let row: Option<ItineraryRow> = sqlx::query_as(
            "SELECT user_id, status, document, updated_at FROM itineraries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut itinerary: Itinerary = serde_json::from_value(row.document)?;
        itinerary.id = id.to_string();
        itinerary.user_id = row.user_id;
        itinerary.status = ItineraryStatus::parse(&row.status)
            .ok_or_else(|| format!("Unknown itinerary status: {}", row.status))?;
        itinerary.updated_at = row.updated_at;

        Ok(Some(itinerary))
    }

    async fn update_status(
        &self,
        id: &str,
        expected: ItineraryStatus,
        status: ItineraryStatus,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let result = sqlx::query(
            r#"
            UPDATE itineraries
            SET status = $3,
                document = jsonb_set(document, '{status}', to_jsonb($3::text)),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
