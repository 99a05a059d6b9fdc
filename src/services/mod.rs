//! Domain services on top of the store.
//!
//! Each service owns a [`Database`](crate::database::Database) handle and
//! returns [`ServiceError`](crate::error::ServiceError) for every failure.

pub mod pull_request;
pub mod team;
pub mod user;

pub use pull_request::{NewPullRequest, PullRequestService, Reassignment};
pub use team::TeamService;
pub use user::UserService;
