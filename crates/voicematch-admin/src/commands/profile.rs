//! Profile commands.

use clap::Subcommand;
use serde_json::Value;
use tracing::info;
use voicematch_types::{Tier, TimestampMs};

use super::AdminEngine;

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Create a profile with fresh quota and penalty documents
    Create {
        user_id: String,
        /// free | plus | premium
        #[arg(short, long, default_value = "free")]
        tier: Tier,
    },

    /// Show a profile
    Show { user_id: String },

    /// Move a user to another tier
    SetTier { user_id: String, tier: Tier },

    /// Delete a profile and everything it owns
    Delete { user_id: String },
}

pub async fn run(engine: &AdminEngine, cmd: ProfileCommand, now: TimestampMs) -> anyhow::Result<Value> {
    match cmd {
        ProfileCommand::Create { user_id, tier } => {
            let profile = engine.create_profile(&user_id, tier, now).await?;
            info!("Created profile {user_id} ({tier})");
            Ok(serde_json::to_value(profile)?)
        }
        ProfileCommand::Show { user_id } => Ok(serde_json::to_value(engine.profile(&user_id).await?)?),
        ProfileCommand::SetTier { user_id, tier } => {
            let profile = engine.set_tier(&user_id, tier).await?;
            info!("Moved {user_id} to {tier}");
            Ok(serde_json::to_value(profile)?)
        }
        ProfileCommand::Delete { user_id } => {
            engine.delete_profile(&user_id).await?;
            info!("Deleted profile {user_id}");
            Ok(serde_json::json!({ "userId": user_id, "deleted": true }))
        }
    }
}
