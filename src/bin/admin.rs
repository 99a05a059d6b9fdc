//! Admin CLI
//!
//! Seeds teams and toggles users directly against the service database,
//! without going through the HTTP layer.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pr_review_service::config::AppConfig;
use pr_review_service::database::models::Team;
use pr_review_service::database::Database;
use pr_review_service::services::{PullRequestService, TeamService, UserService};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pr-review-admin")]
#[command(about = "Administration tool for the PR review service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL (defaults to the service configuration)
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a team from a JSON file ({"team_name": ..., "members": [...]})
    AddTeam {
        /// Path to the team JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show a team and its members
    Team {
        /// Team name
        team_name: String,
    },

    /// Activate or deactivate a user
    SetActive {
        /// User ID
        user_id: String,

        /// New active flag
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },

    /// List pull requests a user is reviewing
    Reviews {
        /// User ID
        user_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let database_url = match cli.database_url {
        Some(url) => url,
        None => {
            AppConfig::load()
                .context("failed to load configuration")?
                .database_url
        }
    };

    let db = Database::new(&database_url)
        .await
        .with_context(|| format!("failed to open {}", database_url))?;
    db.run_migrations()
        .await
        .context("failed to run database migrations")?;

    match cli.command {
        Commands::AddTeam { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let team: Team = serde_json::from_str(&raw).context("invalid team JSON")?;

            let team = TeamService::new(db.clone()).create_team(team).await?;
            println!(
                "Team {} created with {} members",
                team.team_name,
                team.members.len()
            );
        }

        Commands::Team { team_name } => {
            let team = TeamService::new(db.clone()).get_team(&team_name).await?;
            println!("Team {}:", team.team_name);
            for member in &team.members {
                println!(
                    "  {} ({}){}",
                    member.user_id,
                    member.username,
                    if member.is_active { "" } else { " [inactive]" }
                );
            }
        }

        Commands::SetActive { user_id, active } => {
            let user = UserService::new(db.clone())
                .set_is_active(&user_id, active)
                .await?;
            println!("User {} is_active = {}", user.user_id, user.is_active);
        }

        Commands::Reviews { user_id } => {
            let prs = PullRequestService::new(db.clone())
                .list_by_reviewer(&user_id)
                .await?;
            if prs.is_empty() {
                println!("{} has no pull requests to review", user_id);
            } else {
                for pr in prs {
                    println!(
                        "  {} [{}] {} (author {})",
                        pr.pull_request_id,
                        pr.status.as_str(),
                        pr.pull_request_name,
                        pr.author_id
                    );
                }
            }
        }
    }

    db.close().await;
    Ok(())
}
