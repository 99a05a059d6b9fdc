use sqlx::{Row, SqliteConnection};

use super::models::{Team, TeamMember};

pub struct TeamStore;

impl TeamStore {
    pub async fn exists(conn: &mut SqliteConnection, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teams WHERE name = ?)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await
    }

    /// Team with its members ordered by name, or `None` if the team is absent.
    pub async fn get_by_name(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<Team>, sqlx::Error> {
        if !Self::exists(conn, name).await? {
            return Ok(None);
        }

        let rows = sqlx::query(
            r#"
            SELECT id, name, is_active
            FROM users
            WHERE team_name = ?
            ORDER BY name, id
            "#,
        )
        .bind(name)
        .fetch_all(&mut *conn)
        .await?;

        let mut members = Vec::with_capacity(rows.len());
        for row in rows {
            members.push(TeamMember {
                user_id: row.try_get("id")?,
                username: row.try_get("name")?,
                is_active: row.try_get("is_active")?,
            });
        }

        Ok(Some(Team {
            team_name: name.to_string(),
            members,
        }))
    }

    /// Insert the team and insert-or-update each member by user ID.
    ///
    /// On conflict the member's name, team and active flag are all overwritten,
    /// which moves an existing user into this team. A duplicate team name
    /// surfaces as a unique-constraint violation.
    pub async fn create(conn: &mut SqliteConnection, team: &Team) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO teams (name) VALUES (?)")
            .bind(&team.team_name)
            .execute(&mut *conn)
            .await?;

        for member in &team.members {
            sqlx::query(
                r#"
                INSERT INTO users (id, name, team_name, is_active)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (id) DO UPDATE SET
                    name = excluded.name,
                    team_name = excluded.team_name,
                    is_active = excluded.is_active
                "#,
            )
            .bind(&member.user_id)
            .bind(&member.username)
            .bind(&team.team_name)
            .bind(member.is_active)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}
