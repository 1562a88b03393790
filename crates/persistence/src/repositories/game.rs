//! Game repository for committed reads and maintenance.

use chrono::{DateTime, Utc};
use domain::models::GameFormat;
use sqlx::PgPool;

use super::capacity_record::table_for;
use crate::entities::GameDetailEntity;
use crate::metrics::QueryTimer;

/// Repository for whole-game queries outside the creation/deletion transactions.
#[derive(Clone)]
pub struct GameRepository {
    pool: PgPool,
}

impl GameRepository {
    /// Creates a new GameRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a game by its invitation id, joined with reservation and picture.
    pub async fn find_by_invite(
        &self,
        invite_id: i64,
    ) -> Result<Option<GameDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_game_by_invite");
        let result = sqlx::query_as::<_, GameDetailEntity>(
            r#"
            SELECT
                gi.invite_id, gi.title, gi.description, gi.status, gi.creator,
                g.format, g.capacity, g.currently_enrolled, g.is_active,
                r.reservation_id, r.court_number, r.address, r.postal_code, r.booking_time,
                gi.thumbnail, p.alt_description AS thumbnail_alt
            FROM game_invites gi
            JOIN (
                SELECT 'singles' AS format, reservation_id, game_invite_id,
                       capacity, currently_enrolled, is_active
                FROM singles
                UNION ALL
                SELECT 'doubles' AS format, reservation_id, game_invite_id,
                       capacity, currently_enrolled, is_active
                FROM doubles
            ) g ON g.game_invite_id = gi.invite_id
            JOIN reservations r ON r.reservation_id = g.reservation_id
            LEFT JOIN pictures p ON p.picture_src = gi.thumbnail
            WHERE gi.invite_id = $1
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Marks games whose booking time is at or before `now` as inactive.
    ///
    /// Returns the number of games deactivated across both formats.
    pub async fn deactivate_past_games(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_past_games");
        let mut total = 0;
        for format in GameFormat::ALL {
            let sql = format!(
                r#"
                UPDATE {} g
                SET is_active = FALSE
                FROM reservations r
                WHERE r.reservation_id = g.reservation_id
                  AND g.is_active
                  AND r.booking_time <= $1
                "#,
                table_for(format)
            );
            total += sqlx::query(&sql)
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        timer.record();
        Ok(total)
    }
}
