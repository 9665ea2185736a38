use async_trait::async_trait;
use sqlx::PgPool;
use wayfare_core::repository::{BookingPage, BookingRepository, UnknownCursor};
use wayfare_core::{BookingConfirmation, BookingStatus, ItemType};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: String,
    trip_id: String,
    user_id: String,
    item_type: String,
    item_id: String,
    item_name: String,
    cost: f64,
    details: serde_json::Value,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl BookingRow {
    fn into_booking(self) -> Result<BookingConfirmation, Box<dyn std::error::Error + Send + Sync>> {
        let item_type = ItemType::parse(&self.item_type)
            .ok_or_else(|| format!("Unknown item type: {}", self.item_type))?;
        let status = BookingStatus::parse(&self.status)
            .ok_or_else(|| format!("Unknown booking status: {}", self.status))?;

        Ok(BookingConfirmation {
            id: self.id,
            trip_id: self.trip_id,
            user_id: self.user_id,
            item_type,
            item_id: self.item_id,
            item_name: self.item_name,
            cost: self.cost,
            details: self.details,
            status,
            created_at: self.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str =
    "id, trip_id, user_id, item_type, item_id, item_name, cost, details, status, created_at";

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create_booking(
        &self,
        booking: &BookingConfirmation,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, trip_id, user_id, item_type, item_id, item_name, cost, details, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&booking.id)
        .bind(&booking.trip_id)
        .bind(&booking.user_id)
        .bind(booking.item_type.as_str())
        .bind(&booking.item_id)
        .bind(&booking.item_name)
        .bind(booking.cost)
        .bind(&booking.details)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_by_trip(
        &self,
        trip_id: &str,
    ) -> Result<Vec<BookingConfirmation>, Box<dyn std::error::Error + Send + Sync>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {} FROM bookings WHERE trip_id = $1 ORDER BY seq ASC",
            BOOKING_COLUMNS
        ))
        .bind(trip_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<BookingPage, Box<dyn std::error::Error + Send + Sync>> {
        // Resolve the cursor to its sequence number; a foreign or unknown id is rejected
        let after_seq: Option<i64> = match cursor {
            Some(cursor) => {
                let seq: Option<i64> = sqlx::query_scalar(
                    "SELECT seq FROM bookings WHERE id = $1 AND user_id = $2",
                )
                .bind(cursor)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
                Some(seq.ok_or_else(|| UnknownCursor(cursor.to_string()))?)
            }
            None => None,
        };

        // One extra row tells us whether another page exists
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM bookings
            WHERE user_id = $1
              AND ($2::bigint IS NULL OR seq < $2)
            ORDER BY seq DESC
            LIMIT $3
            "#,
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .bind(after_seq)
        .bind((limit + 1) as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut bookings = rows.into_iter()
            .map(BookingRow::into_booking)
            .collect::<Result<Vec<_>, _>>()?;

        let next_cursor = if bookings.len() > limit {
            bookings.truncate(limit);
            bookings.last().map(|b| b.id.clone())
        } else {
            None
        };

        Ok(BookingPage { bookings, next_cursor })
    }
}
