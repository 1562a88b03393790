//! Capacity record repository.
//!
//! Singles and doubles live in two tables of identical shape; every statement
//! is dispatched on the game format.

use domain::models::GameFormat;
use sqlx::PgConnection;

use crate::entities::CapacityRecordEntity;
use crate::metrics::QueryTimer;

/// Table holding games of the given format.
pub fn table_for(format: GameFormat) -> &'static str {
    match format {
        GameFormat::Singles => "singles",
        GameFormat::Doubles => "doubles",
    }
}

pub struct CapacityRecordRepository;

impl CapacityRecordRepository {
    /// Inserts a game row with the creator already enrolled.
    pub async fn insert(
        conn: &mut PgConnection,
        format: GameFormat,
        reservation_id: i64,
        game_invite_id: i64,
        capacity: i32,
        is_active: bool,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new(format!("insert_{}", table_for(format)));
        let sql = format!(
            r#"
            INSERT INTO {} (reservation_id, game_invite_id, currently_enrolled, capacity, is_active)
            VALUES ($1, $2, 1, $3, $4)
            "#,
            table_for(format)
        );
        let result = sqlx::query(&sql)
            .bind(reservation_id)
            .bind(game_invite_id)
            .bind(capacity)
            .bind(is_active)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn find_by_invite(
        conn: &mut PgConnection,
        format: GameFormat,
        game_invite_id: i64,
    ) -> Result<Option<CapacityRecordEntity>, sqlx::Error> {
        let timer = QueryTimer::new(format!("find_{}_by_invite", table_for(format)));
        let sql = format!(
            r#"
            SELECT game_id, reservation_id, game_invite_id, currently_enrolled, capacity, is_active
            FROM {}
            WHERE game_invite_id = $1
            "#,
            table_for(format)
        );
        let result = sqlx::query_as::<_, CapacityRecordEntity>(&sql)
            .bind(game_invite_id)
            .fetch_optional(&mut *conn)
            .await;
        timer.record();
        result
    }

    pub async fn delete_by_invite(
        conn: &mut PgConnection,
        format: GameFormat,
        game_invite_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new(format!("delete_{}_by_invite", table_for(format)));
        let sql = format!(
            "DELETE FROM {} WHERE game_invite_id = $1",
            table_for(format)
        );
        let result = sqlx::query(&sql)
            .bind(game_invite_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    /// Takes one seat if the game is not yet full.
    pub async fn increment_enrollment(
        conn: &mut PgConnection,
        format: GameFormat,
        game_invite_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new(format!("increment_{}_enrollment", table_for(format)));
        let sql = format!(
            r#"
            UPDATE {}
            SET currently_enrolled = currently_enrolled + 1
            WHERE game_invite_id = $1 AND currently_enrolled < capacity
            "#,
            table_for(format)
        );
        let result = sqlx::query(&sql)
            .bind(game_invite_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_for_each_format() {
        assert_eq!(table_for(GameFormat::Singles), "singles");
        assert_eq!(table_for(GameFormat::Doubles), "doubles");
    }
}
