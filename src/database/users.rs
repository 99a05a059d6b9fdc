use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::models::User;

pub struct UserStore;

impl UserStore {
    pub async fn exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn get_by_id(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query("SELECT id, name, team_name, is_active FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }

    /// Set the active flag and return the updated user, or `None` if no such user.
    pub async fn set_active(
        conn: &mut SqliteConnection,
        user_id: &str,
        is_active: bool,
    ) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET is_active = ?
            WHERE id = ?
            RETURNING id, name, team_name, is_active
            "#,
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(|row| user_from_row(&row)).transpose()
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        user_id: row.try_get("id")?,
        username: row.try_get("name")?,
        team_name: row.try_get("team_name")?,
        is_active: row.try_get("is_active")?,
    })
}
