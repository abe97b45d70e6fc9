//! Quota commands.

use clap::Subcommand;
use serde_json::Value;
use voicematch_engine::EngineError;
use voicematch_types::{QuotaKind, TimestampMs};

use super::AdminEngine;

#[derive(Subcommand)]
pub enum QuotaCommand {
    /// Show quota for one kind, or for every kind when omitted
    Status {
        user_id: String,
        /// approach | match
        kind: Option<QuotaKind>,
    },

    /// Record one metered action if the quota allows it
    Admit { user_id: String, kind: QuotaKind },
}

pub async fn run(engine: &AdminEngine, cmd: QuotaCommand, now: TimestampMs) -> anyhow::Result<Value> {
    match cmd {
        QuotaCommand::Status { user_id, kind } => {
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => QuotaKind::ALL.to_vec(),
            };
            let mut statuses = Vec::with_capacity(kinds.len());
            for kind in kinds {
                statuses.push(engine.quota_status(&user_id, kind, now).await?);
            }
            Ok(serde_json::json!({ "userId": user_id, "quotas": statuses }))
        }
        QuotaCommand::Admit { user_id, kind } => {
            match engine.try_admit(&user_id, kind, now).await {
                Ok(status) => Ok(serde_json::json!({ "admitted": true, "status": status })),
                // Denials are an expected answer, not a CLI failure.
                Err(EngineError::QuotaExceeded { kind, resets_at }) => Ok(serde_json::json!({
                    "admitted": false,
                    "reason": "quotaExceeded",
                    "kind": kind,
                    "resetsAt": resets_at,
                })),
                Err(EngineError::AccountLocked(_)) => Ok(serde_json::json!({
                    "admitted": false,
                    "reason": "accountLocked",
                    "kind": kind,
                })),
                Err(e) => Err(e.into()),
            }
        }
    }
}
