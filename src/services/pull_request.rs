//! Pull request lifecycle
//!
//! Create, merge and reassign each run in one transaction covering every read
//! and write they perform. An early return drops the transaction, which rolls
//! it back, so a failed or abandoned command never leaves partial writes.
//!
//! Lost updates between concurrent commands on the same PR are prevented by
//! the row version: writes only apply to the version that was read, and a
//! mismatch fails with `CONCURRENT_UPDATE` instead of overwriting.

use serde::Serialize;
use sqlx::SqliteConnection;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::team::fetch_team;
use super::user::fetch_user;
use crate::assignment::{
    select_initial_reviewers, select_replacement, EntropySource, RandomSource,
};
use crate::database::models::{timestamp_now, PrStatus, PullRequest, PullRequestShort};
use crate::database::{Database, PullRequestStore};
use crate::error::{is_unique_violation, is_write_contention, ServiceError};

#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// Result of a reviewer reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    pub pr: PullRequest,
    pub replaced_by: String,
}

#[derive(Clone)]
pub struct PullRequestService {
    database: Database,
    random: Arc<dyn RandomSource>,
}

impl PullRequestService {
    pub fn new(database: Database) -> Self {
        Self::with_random_source(database, Arc::new(EntropySource))
    }

    pub fn with_random_source(database: Database, random: Arc<dyn RandomSource>) -> Self {
        Self { database, random }
    }

    pub async fn get_pr(&self, pr_id: &str) -> Result<PullRequest, ServiceError> {
        let mut conn = self
            .database
            .acquire()
            .await
            .map_err(|e| ServiceError::storage("failed to acquire connection", e))?;

        fetch_pr(&mut conn, pr_id).await
    }

    pub async fn create_pr(&self, request: NewPullRequest) -> Result<PullRequest, ServiceError> {
        let pr_id = request.pull_request_id.as_str();
        let mut tx = self
            .database
            .begin()
            .await
            .map_err(|e| ServiceError::storage("failed to begin transaction", e))?;

        let exists = PullRequestStore::exists(&mut tx, pr_id).await.map_err(|e| {
            error!(pr_id = %pr_id, error = %e, "failed to check PR existence");
            ServiceError::storage("failed to check PR existence", e)
        })?;
        if exists {
            warn!(pr_id = %pr_id, "PR already exists");
            return Err(ServiceError::pr_exists());
        }

        let author = fetch_user(&mut tx, &request.author_id).await?;
        let team = fetch_team(&mut tx, &author.team_name).await?;

        let assigned_reviewers = {
            let mut rng = self.random.rng();
            select_initial_reviewers(&team, &author.user_id, rng.as_mut())
        };

        let pr = PullRequest {
            pull_request_id: request.pull_request_id.clone(),
            pull_request_name: request.pull_request_name,
            author_id: request.author_id,
            status: PrStatus::Open,
            assigned_reviewers,
            created_at: timestamp_now(),
            merged_at: None,
            version: 0,
        };

        if let Err(e) = PullRequestStore::create(&mut tx, &pr).await {
            if is_unique_violation(&e) {
                warn!(pr_id = %pr.pull_request_id, "PR created concurrently");
                return Err(ServiceError::pr_exists());
            }
            if is_write_contention(&e) {
                drop(tx);
                return Err(self.create_race_outcome(&pr.pull_request_id).await);
            }
            error!(
                pr_id = %pr.pull_request_id,
                author_id = %pr.author_id,
                error = %e,
                "failed to create PR"
            );
            return Err(ServiceError::storage("failed to create PR", e));
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::storage("failed to commit PR", e))?;

        info!(
            "Created PR {} by {} with reviewers {:?}",
            pr.pull_request_id, pr.author_id, pr.assigned_reviewers
        );
        Ok(pr)
    }

    /// Classify a create whose insert lost a write race.
    ///
    /// Under WAL the loser sees a stale snapshot instead of the unique key, so
    /// the ID is looked up again outside the failed transaction.
    async fn create_race_outcome(&self, pr_id: &str) -> ServiceError {
        let mut conn = match self.database.acquire().await {
            Ok(conn) => conn,
            Err(e) => return ServiceError::storage("failed to acquire connection", e),
        };

        match PullRequestStore::exists(&mut conn, pr_id).await {
            Ok(true) => {
                warn!(pr_id = %pr_id, "PR created concurrently");
                ServiceError::pr_exists()
            }
            Ok(false) => ServiceError::concurrent_update(),
            Err(e) => ServiceError::storage("failed to check PR existence", e),
        }
    }

    /// Mark a PR merged. Merging an already merged PR returns it unchanged.
    pub async fn merge_pr(&self, pr_id: &str) -> Result<PullRequest, ServiceError> {
        let mut tx = self
            .database
            .begin()
            .await
            .map_err(|e| ServiceError::storage("failed to begin transaction", e))?;

        let mut pr = fetch_pr(&mut tx, pr_id).await?;
        if pr.is_merged() {
            warn!(pr_id = %pr_id, "PR already merged");
            return Ok(pr);
        }

        let merged_at = timestamp_now();
        let updated = PullRequestStore::update_status(
            &mut tx,
            pr_id,
            PrStatus::Merged,
            Some(merged_at),
            pr.version,
        )
        .await
        .map_err(|e| {
            error!(pr_id = %pr_id, error = %e, "failed to update PR status");
            ServiceError::storage("failed to update PR status", e)
        })?;
        if !updated {
            warn!(pr_id = %pr_id, version = pr.version, "PR changed while merging");
            return Err(ServiceError::concurrent_update());
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::storage("failed to commit merge", e))?;

        pr.status = PrStatus::Merged;
        pr.merged_at = Some(merged_at);
        pr.version += 1;

        info!("Merged PR {}", pr_id);
        Ok(pr)
    }

    /// Replace `old_user_id` on the PR with another member of their team.
    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_user_id: &str,
    ) -> Result<Reassignment, ServiceError> {
        let mut tx = self
            .database
            .begin()
            .await
            .map_err(|e| ServiceError::storage("failed to begin transaction", e))?;

        let mut pr = fetch_pr(&mut tx, pr_id).await?;
        if pr.is_merged() {
            warn!(pr_id = %pr_id, "cannot reassign on merged PR");
            return Err(ServiceError::pr_merged());
        }

        let old_reviewer = fetch_user(&mut tx, old_user_id).await?;
        let team = fetch_team(&mut tx, &old_reviewer.team_name).await?;

        if !pr.has_reviewer(old_user_id) {
            warn!(
                pr_id = %pr_id,
                old_user_id = %old_user_id,
                "reviewer is not assigned to this PR"
            );
            return Err(ServiceError::not_assigned());
        }

        let replacement = {
            let mut rng = self.random.rng();
            select_replacement(
                &team,
                &pr.author_id,
                &pr.assigned_reviewers,
                old_user_id,
                rng.as_mut(),
            )
        };
        let Some(replacement) = replacement else {
            warn!(
                team_name = %team.team_name,
                old_user_id = %old_user_id,
                "no active replacement candidate in team"
            );
            return Err(ServiceError::no_candidate());
        };

        let updated =
            PullRequestStore::update_reviewer(&mut tx, pr_id, old_user_id, &replacement, pr.version)
                .await
                .map_err(|e| {
                    error!(
                        pr_id = %pr_id,
                        old_user_id = %old_user_id,
                        new_user_id = %replacement,
                        error = %e,
                        "failed to update reviewer"
                    );
                    ServiceError::storage("failed to update reviewer", e)
                })?;
        if !updated {
            warn!(pr_id = %pr_id, version = pr.version, "PR changed while reassigning");
            return Err(ServiceError::concurrent_update());
        }

        tx.commit()
            .await
            .map_err(|e| ServiceError::storage("failed to commit reassignment", e))?;

        pr.replace_reviewer(old_user_id, &replacement);
        pr.version += 1;

        info!(
            "Reassigned PR {} reviewer {} -> {}",
            pr_id, old_user_id, replacement
        );
        Ok(Reassignment {
            pr,
            replaced_by: replacement,
        })
    }

    /// PRs where the user is currently a reviewer, newest first.
    pub async fn list_by_reviewer(
        &self,
        user_id: &str,
    ) -> Result<Vec<PullRequestShort>, ServiceError> {
        let mut conn = self
            .database
            .acquire()
            .await
            .map_err(|e| ServiceError::storage("failed to acquire connection", e))?;

        PullRequestStore::list_by_reviewer(&mut conn, user_id)
            .await
            .map_err(|e| {
                error!(user_id = %user_id, error = %e, "failed to get PRs by reviewer");
                ServiceError::storage("failed to get PRs by reviewer", e)
            })
    }
}

async fn fetch_pr(conn: &mut SqliteConnection, pr_id: &str) -> Result<PullRequest, ServiceError> {
    let pr = PullRequestStore::get_by_id(conn, pr_id).await.map_err(|e| {
        error!(pr_id = %pr_id, error = %e, "failed to get PR");
        ServiceError::storage("failed to get PR", e)
    })?;

    pr.ok_or_else(|| {
        warn!(pr_id = %pr_id, "PR not found");
        ServiceError::pr_not_found(pr_id)
    })
}
