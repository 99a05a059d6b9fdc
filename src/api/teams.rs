use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Json,
};

use super::requests::{
    invalid_body, invalid_query, required_param, CreateTeamRequest, TeamQuery, Validate,
};
use super::AppState;
use crate::database::models::Team;
use crate::error::ServiceError;

pub async fn create_team(
    State(state): State<AppState>,
    payload: Result<Json<CreateTeamRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Team>), ServiceError> {
    let Json(request) = payload.map_err(invalid_body)?;
    request.validate()?;

    let team = state.teams.create_team(request.into()).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ServiceError> {
    let Query(query) = query.map_err(invalid_query)?;
    let team_name = required_param("team_name", query.team_name)?;

    let team = state.teams.get_team(&team_name).await?;
    Ok(Json(team))
}
