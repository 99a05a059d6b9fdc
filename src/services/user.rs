use sqlx::SqliteConnection;
use tracing::{error, info, warn};

use crate::database::models::User;
use crate::database::{Database, UserStore};
use crate::error::ServiceError;

#[derive(Clone)]
pub struct UserService {
    database: Database,
}

impl UserService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ServiceError> {
        let mut conn = self
            .database
            .acquire()
            .await
            .map_err(|e| ServiceError::storage("failed to acquire connection", e))?;

        fetch_user(&mut conn, user_id).await
    }

    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> Result<User, ServiceError> {
        let mut tx = self
            .database
            .begin()
            .await
            .map_err(|e| ServiceError::storage("failed to begin transaction", e))?;

        let exists = UserStore::exists(&mut tx, user_id).await.map_err(|e| {
            error!(user_id = %user_id, error = %e, "failed to check user existence");
            ServiceError::storage("failed to check user existence", e)
        })?;
        if !exists {
            warn!(user_id = %user_id, "user not found for activation");
            return Err(ServiceError::user_not_found(user_id));
        }

        let user = UserStore::set_active(&mut tx, user_id, is_active)
            .await
            .map_err(|e| {
                error!(
                    user_id = %user_id,
                    is_active,
                    error = %e,
                    "failed to set user active status"
                );
                ServiceError::storage("failed to set user active status", e)
            })?
            .ok_or_else(|| ServiceError::user_not_found(user_id))?;

        tx.commit()
            .await
            .map_err(|e| ServiceError::storage("failed to commit user update", e))?;

        info!("User {} is_active set to {}", user_id, is_active);
        Ok(user)
    }
}

/// Load a user or fail with `NotFound`.
pub(crate) async fn fetch_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<User, ServiceError> {
    let user = UserStore::get_by_id(conn, user_id).await.map_err(|e| {
        error!(user_id = %user_id, error = %e, "failed to get user");
        ServiceError::storage("failed to get user", e)
    })?;

    user.ok_or_else(|| {
        warn!(user_id = %user_id, "user not found");
        ServiceError::user_not_found(user_id)
    })
}
