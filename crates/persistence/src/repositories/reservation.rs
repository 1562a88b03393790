//! Reservation repository.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::metrics::QueryTimer;

pub struct ReservationRepository;

impl ReservationRepository {
    /// Books a court slot and returns the reservation id.
    pub async fn insert(
        conn: &mut PgConnection,
        court_number: i32,
        address: &str,
        postal_code: &str,
        booking_time: DateTime<Utc>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("insert_reservation");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO reservations (court_number, address, postal_code, booking_time)
            VALUES ($1, $2, $3, $4)
            RETURNING reservation_id
            "#,
        )
        .bind(court_number)
        .bind(address)
        .bind(postal_code)
        .bind(booking_time)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn delete(conn: &mut PgConnection, reservation_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_reservation");
        let result = sqlx::query("DELETE FROM reservations WHERE reservation_id = $1")
            .bind(reservation_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
