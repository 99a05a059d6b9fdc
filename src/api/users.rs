use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Json,
};
use serde::Serialize;

use super::requests::{
    invalid_body, invalid_query, required_param, SetActiveRequest, UserQuery, Validate,
};
use super::AppState;
use crate::database::models::{PullRequestShort, User};
use crate::error::ServiceError;

#[derive(Debug, Serialize)]
pub struct UserReviews {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

pub async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<User>, ServiceError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate()?;

    let user = state
        .users
        .set_is_active(&request.user_id, request.is_active)
        .await?;
    Ok(Json(user))
}

/// Open and merged PRs the user currently reviews. Unknown users get an
/// empty list.
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviews>, ServiceError> {
    let Query(query) = query.map_err(invalid_query)?;
    let user_id = required_param("user_id", query.user_id)?;

    let pull_requests = state.pull_requests.list_by_reviewer(&user_id).await?;
    Ok(Json(UserReviews {
        user_id,
        pull_requests,
    }))
}
