//! Voice messages and listen counts.
//!
//! Listens are counted with the same optimistic read-increment-swap as the
//! other documents, so N concurrent listens always add exactly N.

use serde::{Deserialize, Serialize};
use voicematch_rules::counter;
use voicematch_types::{MessageId, TimestampMs, VoiceMessage};

use crate::error::{EngineError, Result};
use crate::retry::run_optimistic;
use crate::store::DocumentStore;
use crate::Engine;

/// Result of recording one listen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenOutcome {
    pub message_id: MessageId,
    pub listen_count: u64,
    /// False when the author replayed their own message.
    pub counted: bool,
}

impl<S: DocumentStore> Engine<S> {
    /// Register a voice message from `author_id` to `recipient_id`.
    pub async fn create_message(
        &self,
        message_id: &str,
        author_id: &str,
        recipient_id: &str,
        now: TimestampMs,
    ) -> Result<VoiceMessage> {
        if message_id.trim().is_empty() {
            return Err(EngineError::InvalidTarget("empty message id".into()));
        }
        if author_id == recipient_id {
            return Err(EngineError::InvalidTarget(
                "users cannot message themselves".into(),
            ));
        }
        let message = VoiceMessage {
            message_id: message_id.to_string(),
            author_id: author_id.to_string(),
            recipient_id: recipient_id.to_string(),
            created_at: now,
            listen_count: 0,
        };
        run_optimistic(&self.retry, "create_message", || {
            Ok(self.store.insert_message(&message)?)
        })
        .await?;
        tracing::debug!(message_id, author_id, recipient_id, "voice message created");
        Ok(message)
    }

    pub async fn message(&self, message_id: &str) -> Result<VoiceMessage> {
        Ok(self.store.load_message(message_id)?.value)
    }

    /// Count one listen of a message by `listener_id`.
    pub async fn record_listen(&self, message_id: &str, listener_id: &str) -> Result<ListenOutcome> {
        run_optimistic(&self.retry, "listen", || {
            let doc = self.store.load_message(message_id)?;
            if doc.value.author_id == listener_id {
                return Ok(ListenOutcome {
                    message_id: message_id.to_string(),
                    listen_count: doc.value.listen_count,
                    counted: false,
                });
            }

            let next = counter::record_listen(&doc.value.counter());
            self.store
                .swap_listen_count(message_id, doc.version, next.listen_count)?;
            Ok(ListenOutcome {
                message_id: message_id.to_string(),
                listen_count: next.listen_count,
                counted: true,
            })
        })
        .await
    }
}
