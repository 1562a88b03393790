//! Picture repository: rows describing stored thumbnails.

use sqlx::PgConnection;

use crate::metrics::QueryTimer;

pub struct PictureRepository;

impl PictureRepository {
    pub async fn insert(
        conn: &mut PgConnection,
        picture_src: &str,
        alt_description: &str,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("insert_picture");
        let result = sqlx::query(
            r#"
            INSERT INTO pictures (picture_src, alt_description)
            VALUES ($1, $2)
            "#,
        )
        .bind(picture_src)
        .bind(alt_description)
        .execute(&mut *conn)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }

    pub async fn delete(conn: &mut PgConnection, picture_src: &str) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_picture");
        let result = sqlx::query("DELETE FROM pictures WHERE picture_src = $1")
            .bind(picture_src)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
