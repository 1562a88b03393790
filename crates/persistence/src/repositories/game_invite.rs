//! Game invite repository.

use sqlx::PgConnection;

use crate::entities::GameInviteEntity;
use crate::metrics::QueryTimer;

pub struct GameInviteRepository;

impl GameInviteRepository {
    /// Inserts an open invitation and returns its id.
    pub async fn insert(
        conn: &mut PgConnection,
        title: &str,
        description: &str,
        thumbnail: Option<&str>,
        creator: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        let timer = QueryTimer::new("insert_game_invite");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO game_invites (title, description, thumbnail, creator, status)
            VALUES ($1, $2, $3, $4, 1)
            RETURNING invite_id
            "#,
        )
        .bind(title)
        .bind(description)
        .bind(thumbnail)
        .bind(creator)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_id(
        conn: &mut PgConnection,
        invite_id: i64,
    ) -> Result<Option<GameInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_game_invite_by_id");
        let result = sqlx::query_as::<_, GameInviteEntity>(
            r#"
            SELECT invite_id, title, description, thumbnail, creator, status, created_at
            FROM game_invites
            WHERE invite_id = $1
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Ids of the comments posted on an invitation.
    pub async fn comment_ids(
        conn: &mut PgConnection,
        invite_id: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        let timer = QueryTimer::new("list_game_invite_comment_ids");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT comment_id
            FROM commented_on
            WHERE invite_id = $1
            ORDER BY comment_id
            "#,
        )
        .bind(invite_id)
        .fetch_all(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn delete(conn: &mut PgConnection, invite_id: i64) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_game_invite");
        let result = sqlx::query("DELETE FROM game_invites WHERE invite_id = $1")
            .bind(invite_id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
