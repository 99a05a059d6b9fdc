use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use super::models::{
    format_timestamp, parse_timestamp, timestamp_now, PrStatus, PullRequest, PullRequestShort,
};

pub struct PullRequestStore;

impl PullRequestStore {
    pub async fn exists(conn: &mut SqliteConnection, pr_id: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pull_requests WHERE id = ?)")
            .bind(pr_id)
            .fetch_one(&mut *conn)
            .await
    }

    pub async fn get_by_id(
        conn: &mut SqliteConnection,
        pr_id: &str,
    ) -> Result<Option<PullRequest>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, title, author_id, status, created_at, merged_at, version
            FROM pull_requests
            WHERE id = ?
            "#,
        )
        .bind(pr_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let assigned_reviewers: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY position",
        )
        .bind(pr_id)
        .fetch_all(&mut *conn)
        .await?;

        let merged_at = row
            .try_get::<Option<String>, _>("merged_at")?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?;

        Ok(Some(PullRequest {
            pull_request_id: row.try_get("id")?,
            pull_request_name: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            status: status_from_row(&row)?,
            assigned_reviewers,
            created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
            merged_at,
            version: row.try_get("version")?,
        }))
    }

    /// Insert the pull request and its reviewers, keeping reviewer order.
    pub async fn create(conn: &mut SqliteConnection, pr: &PullRequest) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO pull_requests (id, title, author_id, status, created_at, merged_at, version)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&pr.pull_request_id)
        .bind(&pr.pull_request_name)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(format_timestamp(&pr.created_at))
        .bind(pr.merged_at.as_ref().map(format_timestamp))
        .bind(pr.version)
        .execute(&mut *conn)
        .await?;

        let assigned_at = format_timestamp(&pr.created_at);
        for (position, reviewer_id) in pr.assigned_reviewers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO pr_reviewers (pr_id, user_id, position, assigned_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&pr.pull_request_id)
            .bind(reviewer_id)
            .bind(position as i64)
            .bind(&assigned_at)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Claim the next version of a PR row.
    ///
    /// Returns `false` when the stored version no longer matches
    /// `expected_version`, meaning another transaction wrote the row first.
    async fn bump_version(
        conn: &mut SqliteConnection,
        pr_id: &str,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE pull_requests SET version = version + 1 WHERE id = ? AND version = ?")
                .bind(pr_id)
                .bind(expected_version)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Returns `false` without writing anything if the version check fails.
    pub async fn update_status(
        conn: &mut SqliteConnection,
        pr_id: &str,
        status: PrStatus,
        merged_at: Option<DateTime<Utc>>,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE pull_requests
            SET status = ?, merged_at = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(status.as_str())
        .bind(merged_at.as_ref().map(format_timestamp))
        .bind(pr_id)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Swap one reviewer for another in place, so the new reviewer keeps the
    /// outgoing reviewer's position.
    ///
    /// Returns `false` without writing anything if the version check fails.
    pub async fn update_reviewer(
        conn: &mut SqliteConnection,
        pr_id: &str,
        old_user_id: &str,
        new_user_id: &str,
        expected_version: i64,
    ) -> Result<bool, sqlx::Error> {
        if !Self::bump_version(conn, pr_id, expected_version).await? {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE pr_reviewers
            SET user_id = ?, assigned_at = ?
            WHERE pr_id = ? AND user_id = ?
            "#,
        )
        .bind(new_user_id)
        .bind(format_timestamp(&timestamp_now()))
        .bind(pr_id)
        .bind(old_user_id)
        .execute(&mut *conn)
        .await?;

        Ok(true)
    }

    /// PRs the user currently reviews, newest first.
    pub async fn list_by_reviewer(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT pr.id, pr.title, pr.author_id, pr.status
            FROM pull_requests pr
                JOIN pr_reviewers prr ON pr.id = prr.pr_id
            WHERE prr.user_id = ?
            ORDER BY pr.created_at DESC, pr.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.iter().map(short_from_row).collect()
    }
}

fn short_from_row(row: &SqliteRow) -> Result<PullRequestShort, sqlx::Error> {
    Ok(PullRequestShort {
        pull_request_id: row.try_get("id")?,
        pull_request_name: row.try_get("title")?,
        author_id: row.try_get("author_id")?,
        status: status_from_row(row)?,
    })
}

fn status_from_row(row: &SqliteRow) -> Result<PrStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    PrStatus::from_str(&raw)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid PR status: {}", raw).into()))
}
