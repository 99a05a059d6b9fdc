//! HTTP request layer
//!
//! Thin axum handlers that validate input, call a service and map
//! [`ServiceError`](crate::error::ServiceError) to a status and JSON body.

pub mod health;
pub mod pull_requests;
pub mod requests;
pub mod teams;
pub mod users;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::database::Database;
use crate::services::{PullRequestService, TeamService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub teams: TeamService,
    pub users: UserService,
    pub pull_requests: PullRequestService,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        Self::with_pull_requests(
            database.clone(),
            PullRequestService::new(database),
        )
    }

    /// State with a custom pull request service, e.g. one with a seeded
    /// random source.
    pub fn with_pull_requests(database: Database, pull_requests: PullRequestService) -> Self {
        Self {
            teams: TeamService::new(database.clone()),
            users: UserService::new(database),
            pull_requests,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/team/add", post(teams::create_team))
        .route("/team/get", get(teams::get_team))
        .route("/users/setIsActive", post(users::set_is_active))
        .route("/users/getReview", get(users::get_review))
        .route("/pullRequest/create", post(pull_requests::create_pr))
        .route("/pullRequest/merge", post(pull_requests::merge_pr))
        .route("/pullRequest/reassign", post(pull_requests::reassign_reviewer))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(state)
}
