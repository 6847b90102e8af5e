//! Conversation directory
//!
//! Lists every conversation the identity participates in, annotated
//! with the counterpart's display identity and the most recent message.
//!
//! The outer ordering key is the conversation's `updated_at`, which is
//! not transactionally bumped when messages are inserted, so the order
//! can lag the true last-activity time. Known limitation, kept as-is.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use surrealdb::{Connection, RecordId, Surreal};

use super::participants::{ParticipantView, pick_other_party};
use crate::db::models::from_surreal_datetime;
use crate::error::{CoreError, Result};
use crate::id::{ConversationId, UserId};

/// One entry in the conversation directory
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub last_message: Option<String>,
    pub last_at: Option<DateTime<Utc>>,
}

/// A conversation row with its nested participations and messages, as
/// fetched in one query
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ConversationRow {
    pub id: RecordId,
    pub participants: Vec<ParticipantView>,
    pub messages: Vec<MessageBrief>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessageBrief {
    pub body: String,
    pub created_at: surrealdb::Datetime,
}

/// List all conversations `self_id` participates in, most recently
/// updated first.
pub async fn list_conversations<C: Connection>(
    db: &Surreal<C>,
    self_id: UserId,
) -> Result<Vec<ConversationSummary>> {
    let mut response = db
        .query("SELECT VALUE conversation_id FROM participants WHERE user_id = $user")
        .bind(("user", RecordId::from(self_id)))
        .await
        .map_err(|e| CoreError::query_failed("participants", e))?;

    let ids: Vec<RecordId> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("participants", e))?;

    // Nothing to list; return before issuing an unbounded `IN []` query
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut response = db
        .query(
            "SELECT id, updated_at, \
             (SELECT user_id, user_id.display_name AS display_name, user_id.email AS email \
              FROM participants WHERE conversation_id = $parent.id) AS participants, \
             (SELECT body, created_at FROM messages WHERE conversation_id = $parent.id) AS messages \
             FROM conversations WHERE id IN $ids ORDER BY updated_at DESC",
        )
        .bind(("ids", ids))
        .await
        .map_err(|e| CoreError::query_failed("conversations", e))?;

    let rows: Vec<ConversationRow> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("conversations", e))?;

    tracing::debug!(count = rows.len(), %self_id, "listed conversations");
    Ok(summarize(self_id, rows))
}

/// Pure post-processing step over the fetched rows: resolve the
/// counterpart's title and pick the newest message by sorting the nested
/// message set, which is not assumed to arrive pre-sorted.
pub(crate) fn summarize(self_id: UserId, rows: Vec<ConversationRow>) -> Vec<ConversationSummary> {
    rows.into_iter()
        .map(|row| {
            let title = pick_other_party(self_id, &row.participants);

            let mut messages: Vec<(String, DateTime<Utc>)> = row
                .messages
                .into_iter()
                .map(|m| (m.body, from_surreal_datetime(&m.created_at)))
                .collect();
            messages.sort_by(|a, b| b.1.cmp(&a.1));

            let (last_message, last_at) = match messages.into_iter().next() {
                Some((body, at)) => (Some(body), Some(at)),
                None => (None, None),
            };

            ConversationSummary {
                id: ConversationId::from_record(row.id),
                title,
                last_message,
                last_at,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn participant(user: UserId, name: &str) -> ParticipantView {
        ParticipantView {
            user_id: RecordId::from(user),
            display_name: Some(name.to_string()),
            email: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_summarize_picks_newest_message_from_unsorted_rows() {
        let me = UserId::generate();
        let other = UserId::generate();
        let conversation = ConversationId::generate();

        let row = ConversationRow {
            id: RecordId::from(conversation),
            participants: vec![participant(me, "Me"), participant(other, "Noor")],
            // deliberately out of order
            messages: vec![
                MessageBrief {
                    body: "middle".into(),
                    created_at: at(200).into(),
                },
                MessageBrief {
                    body: "newest".into(),
                    created_at: at(300).into(),
                },
                MessageBrief {
                    body: "oldest".into(),
                    created_at: at(100).into(),
                },
            ],
        };

        let summaries = summarize(me, vec![row]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, conversation);
        assert_eq!(summaries[0].title, "Noor");
        assert_eq!(summaries[0].last_message.as_deref(), Some("newest"));
        assert_eq!(summaries[0].last_at, Some(at(300)));
    }

    #[test]
    fn test_summarize_without_messages_has_no_last() {
        let me = UserId::generate();
        let other = UserId::generate();

        let row = ConversationRow {
            id: RecordId::from(ConversationId::generate()),
            participants: vec![participant(me, "Me"), participant(other, "Noor")],
            messages: vec![],
        };

        let summaries = summarize(me, vec![row]);
        assert_eq!(summaries[0].last_message, None);
        assert_eq!(summaries[0].last_at, None);
    }

    #[test]
    fn test_summarize_degenerate_conversation_uses_placeholder_title() {
        let me = UserId::generate();

        let row = ConversationRow {
            id: RecordId::from(ConversationId::generate()),
            participants: vec![participant(me, "Me")],
            messages: vec![],
        };

        let summaries = summarize(me, vec![row]);
        assert_eq!(summaries[0].title, "Conversation");
    }
}
