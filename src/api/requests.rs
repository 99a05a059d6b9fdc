//! Request bodies and their validation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use serde::Deserialize;
use std::collections::HashSet;

use crate::database::models::{Team, TeamMember};
use crate::error::ServiceError;
use crate::services::NewPullRequest;

const MAX_ID_LEN: usize = 50;
const MAX_TITLE_LEN: usize = 255;
const MAX_TEAM_NAME_LEN: usize = 100;
const MAX_USERNAME_LEN: usize = 100;

pub trait Validate {
    fn validate(&self) -> Result<(), ServiceError>;
}

pub fn invalid_body(rejection: JsonRejection) -> ServiceError {
    ServiceError::validation(format!("Invalid request body: {}", rejection.body_text()))
}

pub fn invalid_query(rejection: QueryRejection) -> ServiceError {
    ServiceError::validation(format!("Invalid query: {}", rejection.body_text()))
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(ServiceError::validation(format!(
            "{} must be between 1 and {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Pull a required query parameter, rejecting missing or empty values.
pub fn required_param(name: &str, value: Option<String>) -> Result<String, ServiceError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ServiceError::validation(format!(
            "{} parameter is required",
            name
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamMemberRequest {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub team_name: String,
    pub members: Vec<TeamMemberRequest>,
}

impl Validate for CreateTeamRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        check_length("team_name", &self.team_name, MAX_TEAM_NAME_LEN)?;

        let mut seen = HashSet::new();
        for member in &self.members {
            check_length("user_id", &member.user_id, MAX_ID_LEN)?;
            check_length("username", &member.username, MAX_USERNAME_LEN)?;
            if !seen.insert(member.user_id.as_str()) {
                return Err(ServiceError::duplicate_members());
            }
        }
        Ok(())
    }
}

impl From<CreateTeamRequest> for Team {
    fn from(request: CreateTeamRequest) -> Self {
        Team {
            team_name: request.team_name,
            members: request
                .members
                .into_iter()
                .map(|member| TeamMember {
                    user_id: member.user_id,
                    username: member.username,
                    is_active: member.is_active,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub user_id: String,
    #[serde(default)]
    pub is_active: bool,
}

impl Validate for SetActiveRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        check_length("user_id", &self.user_id, MAX_ID_LEN)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePrRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

impl Validate for CreatePrRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        check_length("pull_request_id", &self.pull_request_id, MAX_ID_LEN)?;
        check_length("pull_request_name", &self.pull_request_name, MAX_TITLE_LEN)?;
        check_length("author_id", &self.author_id, MAX_ID_LEN)
    }
}

impl From<CreatePrRequest> for NewPullRequest {
    fn from(request: CreatePrRequest) -> Self {
        NewPullRequest {
            pull_request_id: request.pull_request_id,
            pull_request_name: request.pull_request_name,
            author_id: request.author_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MergePrRequest {
    pub pull_request_id: String,
}

impl Validate for MergePrRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        check_length("pull_request_id", &self.pull_request_id, MAX_ID_LEN)
    }
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_reviewer_id: String,
}

impl Validate for ReassignRequest {
    fn validate(&self) -> Result<(), ServiceError> {
        check_length("pull_request_id", &self.pull_request_id, MAX_ID_LEN)?;
        check_length("old_reviewer_id", &self.old_reviewer_id, MAX_ID_LEN)
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}
