use sqlx::PgPool;

use crate::model::{Booking, BookingFields, NewBooking, ValidationError};

/// Errors raised while creating a booking record
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Booking repository trait, implemented for each store used.
/// NOTE: Intended to facilitate easier testing/mocking
#[async_trait::async_trait]
pub trait BookingRepo: Send + Sync {
    /// Insert a validated booking, returning the stored record
    async fn insert(&self, new_booking: &NewBooking) -> RepoResult<Booking>;

    /// Validate raw fields at the storage boundary, then insert them
    async fn create(&self, fields: BookingFields) -> RepoResult<Booking> {
        let new_booking = NewBooking::try_from(fields)?;
        self.insert(&new_booking).await
    }
}

/// Postgres Booking Repository
#[derive(Debug, Clone)]
pub struct PgBookingRepo {
    pool: PgPool,
}

impl PgBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookingRepo for PgBookingRepo {
    #[tracing::instrument(name = "Insert booking", skip(self))]
    async fn insert(&self, new_booking: &NewBooking) -> RepoResult<Booking> {
        let booking = sqlx::query_as::<_, Booking>(
            "insert into bookings(name, email, phone, date, time, topic, message) \
             values ($1, $2, $3, $4, $5, $6, $7) \
             returning id, name, email, phone, date, time, topic, message, created_at, updated_at",
        )
        .bind(new_booking.name.as_ref())
        .bind(new_booking.email.as_ref())
        .bind(new_booking.phone.as_deref())
        .bind(new_booking.date.as_deref())
        .bind(new_booking.time.as_deref())
        .bind(new_booking.topic.as_deref())
        .bind(new_booking.message.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }
}
