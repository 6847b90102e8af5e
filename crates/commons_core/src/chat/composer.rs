//! Message composer
//!
//! Holds the local draft for one conversation view. Sending trims the
//! draft, treats an empty result as a silent no-op, and only clears the
//! draft once the insert succeeded, so a failed send can be retried
//! without retyping.

use chrono::Utc;
use surrealdb::{Connection, RecordId, Surreal};

use super::feed::ChatMessage;
use crate::db::{DatabaseError, DbMessage};
use crate::error::{CoreError, Result};
use crate::id::{ConversationId, MessageId, UserId};

/// What happened to a send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The message was persisted
    Sent(ChatMessage),
    /// The draft was empty after trimming; nothing was sent
    Skipped,
}

/// Local draft state for one conversation view
#[derive(Debug, Default)]
pub struct MessageComposer {
    draft: String,
}

impl MessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Send the current draft as `sender`.
    ///
    /// An all-whitespace draft is skipped silently to match low-friction
    /// chat input. On failure the draft is left in place for retry.
    pub async fn send<C: Connection>(
        &mut self,
        db: &Surreal<C>,
        conversation_id: ConversationId,
        sender: UserId,
    ) -> Result<SendOutcome> {
        let body = self.draft.trim();
        if body.is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let message = send_message(db, conversation_id, sender, body).await?;
        self.draft.clear();
        Ok(SendOutcome::Sent(message))
    }
}

/// Append one message to a conversation.
///
/// The conversation's `updated_at` is deliberately left untouched; the
/// directory orders by it and may lag the true last-activity time.
pub async fn send_message<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
    sender: UserId,
    body: &str,
) -> Result<ChatMessage> {
    let id = MessageId::generate();
    let now = Utc::now();

    let row = DbMessage {
        id: RecordId::from(id),
        conversation_id: RecordId::from(conversation_id),
        sender_id: RecordId::from(sender),
        body: body.to_string(),
        created_at: now.into(),
    };

    let created: Option<DbMessage> = db
        .create(("messages", id.to_record_key()))
        .content(row)
        .await
        .map_err(|e| CoreError::query_failed("messages", e))?;

    let created = created.ok_or_else(|| {
        CoreError::Database(DatabaseError::Other("Failed to create message".into()))
    })?;

    tracing::debug!(message_id = %id, %conversation_id, "message sent");
    Ok(ChatMessage {
        id,
        conversation_id,
        sender_id: sender,
        body: created.body,
        created_at: crate::db::models::from_surreal_datetime(&created.created_at),
        author: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::client::create_test_db;

    #[tokio::test]
    async fn test_empty_draft_is_skipped() {
        let db = create_test_db().await.unwrap();
        let mut composer = MessageComposer::new();
        composer.set_draft("   \n\t ");

        let outcome = composer
            .send(&db, ConversationId::generate(), UserId::generate())
            .await
            .unwrap();
        assert_eq!(outcome, SendOutcome::Skipped);
        // The draft is not cleared by a skip
        assert_eq!(composer.draft(), "   \n\t ");
    }

    #[tokio::test]
    async fn test_send_trims_and_clears_draft() {
        let db = create_test_db().await.unwrap();
        let mut composer = MessageComposer::new();
        composer.set_draft("  hello there \n");

        let outcome = composer
            .send(&db, ConversationId::generate(), UserId::generate())
            .await
            .unwrap();
        match outcome {
            SendOutcome::Sent(message) => assert_eq!(message.body, "hello there"),
            SendOutcome::Skipped => panic!("draft should have been sent"),
        }
        assert_eq!(composer.draft(), "");
    }
}
