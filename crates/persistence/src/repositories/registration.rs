//! Registration repository: users signed up for a game.

use sqlx::PgConnection;

use crate::metrics::QueryTimer;

pub struct RegistrationRepository;

impl RegistrationRepository {
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: i64,
        invite_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("insert_registration");
        let result = sqlx::query("INSERT INTO registers (user_id, invite_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(invite_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
