use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
};

use super::requests::{invalid_body, CreatePrRequest, MergePrRequest, ReassignRequest, Validate};
use super::AppState;
use crate::database::models::PullRequest;
use crate::error::ServiceError;
use crate::services::Reassignment;

pub async fn create_pr(
    State(state): State<AppState>,
    payload: Result<Json<CreatePrRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequest>), ServiceError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate()?;

    let pr = state.pull_requests.create_pr(request.into()).await?;
    Ok((StatusCode::CREATED, Json(pr)))
}

pub async fn merge_pr(
    State(state): State<AppState>,
    payload: Result<Json<MergePrRequest>, JsonRejection>,
) -> Result<Json<PullRequest>, ServiceError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate()?;

    let pr = state.pull_requests.merge_pr(&request.pull_request_id).await?;
    Ok(Json(pr))
}

pub async fn reassign_reviewer(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<Reassignment>, ServiceError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate()?;

    let reassignment = state
        .pull_requests
        .reassign_reviewer(&request.pull_request_id, &request.old_reviewer_id)
        .await?;
    Ok(Json(reassignment))
}
