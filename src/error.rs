use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Machine-readable error codes returned to API callers.
pub mod codes {
    pub const TEAM_EXISTS: &str = "TEAM_EXISTS";
    pub const PR_EXISTS: &str = "PR_EXISTS";
    pub const PR_MERGED: &str = "PR_MERGED";
    pub const NOT_ASSIGNED: &str = "NOT_ASSIGNED";
    pub const NO_CANDIDATE: &str = "NO_CANDIDATE";
    pub const CONCURRENT_UPDATE: &str = "CONCURRENT_UPDATE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced by the review service.
///
/// Everything except `Internal` is an expected negative outcome of a domain
/// rule. `Internal` means the storage layer or the runtime broke.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("{message}")]
    AlreadyExists { code: &'static str, message: String },

    #[error("{message}")]
    InvalidState { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("{message}: {source}")]
    Internal {
        message: String,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn team_not_found(team_name: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "team",
            id: team_name.into(),
        }
    }

    pub fn user_not_found(user_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "user",
            id: user_id.into(),
        }
    }

    pub fn pr_not_found(pr_id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "PR",
            id: pr_id.into(),
        }
    }

    pub fn team_exists() -> Self {
        Self::AlreadyExists {
            code: codes::TEAM_EXISTS,
            message: "team_name already exists".to_string(),
        }
    }

    pub fn pr_exists() -> Self {
        Self::AlreadyExists {
            code: codes::PR_EXISTS,
            message: "PR id already exists".to_string(),
        }
    }

    pub fn pr_merged() -> Self {
        Self::InvalidState {
            code: codes::PR_MERGED,
            message: "cannot reassign on merged PR".to_string(),
        }
    }

    pub fn not_assigned() -> Self {
        Self::InvalidState {
            code: codes::NOT_ASSIGNED,
            message: "reviewer is not assigned to this PR".to_string(),
        }
    }

    pub fn no_candidate() -> Self {
        Self::Conflict {
            code: codes::NO_CANDIDATE,
            message: "no active replacement candidate in team".to_string(),
        }
    }

    pub fn concurrent_update() -> Self {
        Self::Conflict {
            code: codes::CONCURRENT_UPDATE,
            message: "PR was modified by a concurrent request".to_string(),
        }
    }

    pub fn duplicate_members() -> Self {
        Self::validation("Duplicate users in the members list")
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Wrap a storage failure.
    ///
    /// SQLite reports a lost race between two writers as `SQLITE_BUSY` (or one
    /// of its extended codes), which surfaces as a concurrent update rather
    /// than an infrastructure failure.
    pub fn storage(message: impl Into<String>, err: sqlx::Error) -> Self {
        if is_write_contention(&err) {
            return Self::concurrent_update();
        }
        Self::internal(message, err)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => codes::NOT_FOUND,
            Self::AlreadyExists { code, .. }
            | Self::InvalidState { code, .. }
            | Self::Conflict { code, .. } => *code,
            Self::Validation { .. } => codes::BAD_REQUEST,
            Self::Internal { .. } => codes::INTERNAL_ERROR,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AlreadyExists { code, .. } if *code == codes::TEAM_EXISTS => {
                StatusCode::BAD_REQUEST
            }
            Self::AlreadyExists { .. } | Self::InvalidState { .. } | Self::Conflict { .. } => {
                StatusCode::CONFLICT
            }
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to external callers. Internal causes stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal { .. } => "Internal server error".to_string(),
            Self::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub(crate) fn is_write_contention(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .and_then(|code| code.parse::<i32>().ok())
        // primary result code lives in the low byte
        .map_or(false, |code| code & 0xff == 5)
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation())
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::storage("database error", err)
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        Self::internal("failed to load configuration", err)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        ErrorResponse {
            error: ErrorDetail {
                code: err.code().to_string(),
                message: err.public_message(),
            },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let Self::Internal { message, source } = &self {
            error!(error = %source, "{}", message);
        }
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_kind() {
        assert_eq!(
            ServiceError::pr_not_found("pr-1").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ServiceError::pr_exists().status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::team_exists().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::pr_merged().status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::not_assigned().status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::no_candidate().status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::internal("boom", sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(ServiceError::user_not_found("u1").code(), "NOT_FOUND");
        assert_eq!(ServiceError::no_candidate().code(), "NO_CANDIDATE");
        assert_eq!(ServiceError::concurrent_update().code(), "CONCURRENT_UPDATE");
        assert_eq!(ServiceError::validation("x").code(), "BAD_REQUEST");
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(ServiceError::team_not_found("core").to_string(), "team not found");
        assert_eq!(ServiceError::pr_not_found("pr-1").to_string(), "PR not found");
    }

    #[test]
    fn test_internal_hides_cause() {
        let err = ServiceError::internal("failed to get PR", sqlx::Error::PoolTimedOut);
        assert!(err.to_string().contains("failed to get PR"));

        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "Internal server error");
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::from(&ServiceError::pr_merged())).unwrap();
        assert_eq!(body["error"]["code"], "PR_MERGED");
        assert_eq!(body["error"]["message"], "cannot reassign on merged PR");
    }

    #[test]
    fn test_storage_error_without_database_code_is_internal() {
        let err = ServiceError::storage("failed to update PR", sqlx::Error::RowNotFound);
        assert!(matches!(err, ServiceError::Internal { .. }));
    }
}
