#![allow(dead_code)]

use pr_review_service::assignment::{BoxRng, SeededSource};
use pr_review_service::database::models::{Team, TeamMember};
use pr_review_service::database::Database;
use pr_review_service::services::{NewPullRequest, PullRequestService, TeamService};
use rand::rngs::mock::StepRng;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Setup an in-memory SQLite database for testing
pub async fn setup_test_db() -> Database {
    Database::new_in_memory()
        .await
        .expect("Failed to create test database")
}

/// Build a team from `(user_id, is_active)` pairs. Usernames are derived
/// from the ID.
pub fn team(name: &str, members: &[(&str, bool)]) -> Team {
    Team {
        team_name: name.to_string(),
        members: members
            .iter()
            .map(|(id, active)| TeamMember {
                user_id: id.to_string(),
                username: format!("user {}", id),
                is_active: *active,
            })
            .collect(),
    }
}

pub async fn seed_team(db: &Database, name: &str, members: &[(&str, bool)]) -> Team {
    TeamService::new(db.clone())
        .create_team(team(name, members))
        .await
        .expect("Failed to seed team")
}

/// Service whose generator always draws the first eligible candidate.
pub fn first_pick_service(db: &Database) -> PullRequestService {
    let source = || -> BoxRng { Box::new(StepRng::new(0, 0)) };
    PullRequestService::with_random_source(db.clone(), Arc::new(source))
}

/// Handle for a service whose commands pause when they draw reviewers.
pub struct Gate {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl Gate {
    /// Block until a command has finished its reads and is waiting.
    pub fn wait_entered(&self) {
        self.entered.recv().expect("gated command never started");
    }

    pub fn release(&self) {
        self.release.send(()).expect("gated command is gone");
    }
}

/// Like [`first_pick_service`], but every draw parks the calling command
/// until [`Gate::release`]. Draws happen after a command's reads and before
/// its writes, so the test can interleave another command in between.
pub fn gated_service(db: &Database) -> (PullRequestService, Gate) {
    let (entered_tx, entered_rx) = channel();
    let (release_tx, release_rx) = channel();
    let entered_tx = Mutex::new(entered_tx);
    let release_rx = Mutex::new(release_rx);

    let source = move || -> BoxRng {
        let _ = entered_tx.lock().unwrap().send(());
        let _ = release_rx.lock().unwrap().recv();
        Box::new(StepRng::new(0, 0))
    };
    let service = PullRequestService::with_random_source(db.clone(), Arc::new(source));

    (
        service,
        Gate {
            entered: entered_rx,
            release: release_tx,
        },
    )
}

pub async fn file_db(dir: &tempfile::TempDir) -> Database {
    let url = format!("sqlite://{}", dir.path().join("review.db").display());
    let db = Database::new(&url).await.expect("Failed to open file database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}

pub fn seeded_service(db: &Database, seed: u64) -> PullRequestService {
    PullRequestService::with_random_source(db.clone(), Arc::new(SeededSource(seed)))
}

pub fn new_pr(id: &str, author: &str) -> NewPullRequest {
    NewPullRequest {
        pull_request_id: id.to_string(),
        pull_request_name: format!("Change {}", id),
        author_id: author.to_string(),
    }
}

pub async fn pr_count(db: &Database) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pull_requests")
        .fetch_one(db.pool())
        .await
        .expect("Failed to count PRs");
    count
}
