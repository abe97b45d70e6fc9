//! Voice message commands.

use clap::Subcommand;
use serde_json::Value;
use voicematch_types::TimestampMs;

use super::AdminEngine;

#[derive(Subcommand)]
pub enum MessageCommand {
    /// Register a voice message
    Create {
        message_id: String,
        author_id: String,
        recipient_id: String,
    },

    /// Show a message and its listen count
    Show { message_id: String },

    /// Count one listen
    Listen {
        message_id: String,
        listener_id: String,
    },
}

pub async fn run(engine: &AdminEngine, cmd: MessageCommand, now: TimestampMs) -> anyhow::Result<Value> {
    let message = match cmd {
        MessageCommand::Create {
            message_id,
            author_id,
            recipient_id,
        } => {
            engine
                .create_message(&message_id, &author_id, &recipient_id, now)
                .await?
        }
        MessageCommand::Show { message_id } => engine.message(&message_id).await?,
        MessageCommand::Listen {
            message_id,
            listener_id,
        } => return Ok(serde_json::to_value(engine.record_listen(&message_id, &listener_id).await?)?),
    };
    Ok(serde_json::to_value(message)?)
}
