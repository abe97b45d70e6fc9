//! Report and lock commands.

use clap::Subcommand;
use serde_json::Value;
use tracing::{info, warn};
use voicematch_types::TimestampMs;

use super::AdminEngine;

#[derive(Subcommand)]
pub enum PenaltyCommand {
    /// Show report count and lock flag
    Status { user_id: String },

    /// File a report against a user
    Report {
        reporter_id: String,
        target_id: String,
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// List reports filed against a user, newest first
    Reports { user_id: String },

    /// List locked accounts
    Locked,

    /// Lock an account
    Lock { user_id: String },

    /// Unlock an account. The report count is kept
    Unlock { user_id: String },

    /// Reset the report count. The lock flag is kept
    ResetReports { user_id: String },
}

pub async fn run(engine: &AdminEngine, cmd: PenaltyCommand, now: TimestampMs) -> anyhow::Result<Value> {
    match cmd {
        PenaltyCommand::Status { user_id } => {
            let state = engine.penalty_status(&user_id).await?;
            Ok(serde_json::json!({ "userId": user_id, "penalty": state }))
        }
        PenaltyCommand::Report {
            reporter_id,
            target_id,
            reason,
        } => {
            let outcome = engine
                .submit_report(&reporter_id, &target_id, &reason, now)
                .await?;
            if outcome.locked_now {
                warn!("{target_id} reached the lock threshold");
            }
            Ok(serde_json::to_value(outcome)?)
        }
        PenaltyCommand::Reports { user_id } => {
            Ok(serde_json::to_value(engine.reports_against(&user_id).await?)?)
        }
        PenaltyCommand::Locked => {
            let locked: Vec<Value> = engine
                .locked_accounts()
                .await?
                .into_iter()
                .map(|(user_id, penalty)| serde_json::json!({ "userId": user_id, "penalty": penalty }))
                .collect();
            Ok(Value::Array(locked))
        }
        PenaltyCommand::Lock { user_id } => set_lock(engine, user_id, true).await,
        PenaltyCommand::Unlock { user_id } => set_lock(engine, user_id, false).await,
        PenaltyCommand::ResetReports { user_id } => {
            let state = engine.admin_reset_reports(&user_id).await?;
            info!("Reset report count for {user_id}");
            Ok(serde_json::json!({ "userId": user_id, "penalty": state }))
        }
    }
}

async fn set_lock(engine: &AdminEngine, user_id: String, locked: bool) -> anyhow::Result<Value> {
    let state = engine.admin_set_lock(&user_id, locked).await?;
    info!("Set lock on {user_id} to {locked}");
    Ok(serde_json::json!({ "userId": user_id, "penalty": state }))
}
