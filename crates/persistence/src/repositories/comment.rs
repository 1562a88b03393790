//! Comment repository.

use sqlx::PgConnection;

use crate::metrics::QueryTimer;

pub struct CommentRepository;

impl CommentRepository {
    /// Posts a comment on an invitation, optionally as a reply.
    pub async fn insert(
        conn: &mut PgConnection,
        invite_id: i64,
        content: &str,
        commented_by: Option<i64>,
        parent_id: Option<i64>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("insert_comment");
        let comment_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO comments (content, commented_by)
            VALUES ($1, $2)
            RETURNING comment_id
            "#,
        )
        .bind(content)
        .bind(commented_by)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query("INSERT INTO commented_on (comment_id, invite_id) VALUES ($1, $2)")
            .bind(comment_id)
            .bind(invite_id)
            .execute(&mut *conn)
            .await?;

        if let Some(parent_id) = parent_id {
            sqlx::query("INSERT INTO reply_to (parent_id, reply_id) VALUES ($1, $2)")
                .bind(parent_id)
                .bind(comment_id)
                .execute(&mut *conn)
                .await?;
        }
        timer.record();
        Ok(comment_id)
    }

    /// Deletes the given comments and every reply to them.
    pub async fn delete_with_replies(
        conn: &mut PgConnection,
        comment_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_comments_with_replies");
        let result = sqlx::query(
            r#"
            WITH doomed AS (
                SELECT UNNEST($1::BIGINT[]) AS comment_id
                UNION
                SELECT reply_id FROM reply_to WHERE parent_id = ANY($1)
            )
            DELETE FROM comments
            WHERE comment_id IN (SELECT comment_id FROM doomed)
            "#,
        )
        .bind(comment_ids)
        .execute(&mut *conn)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
