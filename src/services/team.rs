use sqlx::SqliteConnection;
use std::collections::HashSet;
use tracing::{error, info, warn};

use crate::database::models::Team;
use crate::database::{Database, TeamStore};
use crate::error::{is_unique_violation, ServiceError};

#[derive(Clone)]
pub struct TeamService {
    database: Database,
}

impl TeamService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Create a team and upsert its members in one transaction.
    ///
    /// Member IDs must be unique within the request.
    pub async fn create_team(&self, team: Team) -> Result<Team, ServiceError> {
        let mut seen = HashSet::new();
        if !team.members.iter().all(|m| seen.insert(m.user_id.as_str())) {
            warn!(team_name = %team.team_name, "duplicate member IDs");
            return Err(ServiceError::duplicate_members());
        }

        let mut tx = self
            .database
            .begin()
            .await
            .map_err(|e| ServiceError::storage("failed to begin transaction", e))?;

        let exists = TeamStore::exists(&mut tx, &team.team_name)
            .await
            .map_err(|e| {
                error!(team_name = %team.team_name, error = %e, "failed to check team existence");
                ServiceError::storage("failed to check team existence", e)
            })?;
        if exists {
            warn!(team_name = %team.team_name, "team already exists");
            return Err(ServiceError::team_exists());
        }

        if let Err(e) = TeamStore::create(&mut tx, &team).await {
            if is_unique_violation(&e) {
                warn!(team_name = %team.team_name, "team created concurrently");
                return Err(ServiceError::team_exists());
            }
            error!(
                team_name = %team.team_name,
                members_count = team.members.len(),
                error = %e,
                "failed to create team"
            );
            return Err(ServiceError::storage("failed to create team", e));
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::storage("failed to commit team", e))?;

        info!(
            "Created team {} with {} members",
            team.team_name,
            team.members.len()
        );
        Ok(team)
    }

    pub async fn get_team(&self, team_name: &str) -> Result<Team, ServiceError> {
        let mut conn = self
            .database
            .acquire()
            .await
            .map_err(|e| ServiceError::storage("failed to acquire connection", e))?;

        fetch_team(&mut conn, team_name).await
    }
}

/// Load a team or fail with `NotFound`.
pub(crate) async fn fetch_team(
    conn: &mut SqliteConnection,
    team_name: &str,
) -> Result<Team, ServiceError> {
    let team = TeamStore::get_by_name(conn, team_name).await.map_err(|e| {
        error!(team_name = %team_name, error = %e, "failed to get team");
        ServiceError::storage("failed to get team", e)
    })?;

    team.ok_or_else(|| {
        warn!(team_name = %team_name, "team not found");
        ServiceError::team_not_found(team_name)
    })
}
