//! Participation records
//!
//! A Participation row marks an identity as a member of a conversation.
//! Rows are keyed deterministically by the (conversation, user) pair, so
//! re-inserting an existing pair is a no-op rather than a conflict: pages
//! self-heal a missing row at read time, and concurrent heals from
//! several views race safely.

use serde::Deserialize;
use surrealdb::{Connection, RecordId, Surreal};

use crate::error::{CoreError, Result};
use crate::id::{ConversationId, UserId};

/// Title shown while a conversation has no resolvable counterpart yet
pub const OTHER_PARTY_PLACEHOLDER: &str = "Conversation";

/// A participation row joined with its profile fields
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantView {
    pub user_id: RecordId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Deterministic record key for a (conversation, user) pair
fn participant_key(conversation_id: ConversationId, user_id: UserId) -> String {
    format!("{}_{}", conversation_id.uuid(), user_id.uuid())
}

/// Idempotently record `user_id` as a participant of `conversation_id`.
/// Inserting an already-existing pair succeeds without touching the
/// original `joined_at`.
pub async fn ensure_participant<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
    user_id: UserId,
) -> Result<()> {
    db.query(
        "UPSERT type::thing('participants', $key) SET \
         conversation_id = $conversation, user_id = $user, \
         joined_at = joined_at OR time::now()",
    )
    .bind(("key", participant_key(conversation_id, user_id)))
    .bind(("conversation", RecordId::from(conversation_id)))
    .bind(("user", RecordId::from(user_id)))
    .await
    .map_err(|e| CoreError::query_failed("participants", e))?
    .check()
    .map_err(|e| CoreError::query_failed("participants", e))?;

    tracing::debug!(%conversation_id, %user_id, "participation ensured");
    Ok(())
}

/// Fetch all participation rows of a conversation with profile fields
pub(crate) async fn fetch_participants<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
) -> Result<Vec<ParticipantView>> {
    let mut response = db
        .query(
            "SELECT user_id, user_id.display_name AS display_name, user_id.email AS email \
             FROM participants WHERE conversation_id = $conversation",
        )
        .bind(("conversation", RecordId::from(conversation_id)))
        .await
        .map_err(|e| CoreError::query_failed("participants", e))?;

    response
        .take(0)
        .map_err(|e| CoreError::query_failed("participants", e))
}

/// Display identity of the conversation's counterpart.
///
/// A conversation may transiently have only one participant while the
/// starter is still inserting the second; "no other party yet" is a
/// normal state and resolves to a placeholder, not an error.
pub async fn resolve_other_party<C: Connection>(
    db: &Surreal<C>,
    conversation_id: ConversationId,
    self_id: UserId,
) -> Result<String> {
    let rows = fetch_participants(db, conversation_id).await?;
    Ok(pick_other_party(self_id, &rows))
}

/// Pure post-processing step: first participant that is not `self_id`,
/// display name before contact address before placeholder.
pub(crate) fn pick_other_party(self_id: UserId, rows: &[ParticipantView]) -> String {
    let self_record = RecordId::from(self_id);
    rows.iter()
        .find(|row| row.user_id != self_record)
        .and_then(|row| {
            row.display_name
                .clone()
                .filter(|name| !name.is_empty())
                .or_else(|| row.email.clone().filter(|email| !email.is_empty()))
        })
        .unwrap_or_else(|| OTHER_PARTY_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn view(user: UserId, name: Option<&str>, email: Option<&str>) -> ParticipantView {
        ParticipantView {
            user_id: RecordId::from(user),
            display_name: name.map(str::to_string),
            email: email.map(str::to_string),
        }
    }

    #[test]
    fn test_other_party_prefers_display_name() {
        let me = UserId::generate();
        let other = UserId::generate();
        let rows = vec![
            view(me, Some("Me"), Some("me@campus.edu")),
            view(other, Some("Robin Li"), Some("robin@campus.edu")),
        ];
        assert_eq!(pick_other_party(me, &rows), "Robin Li");
    }

    #[test]
    fn test_other_party_falls_back_to_email() {
        let me = UserId::generate();
        let other = UserId::generate();
        let rows = vec![view(me, None, None), view(other, Some(""), Some("robin@campus.edu"))];
        assert_eq!(pick_other_party(me, &rows), "robin@campus.edu");
    }

    #[test]
    fn test_no_other_party_is_placeholder() {
        let me = UserId::generate();
        let rows = vec![view(me, Some("Me"), None)];
        assert_eq!(pick_other_party(me, &rows), OTHER_PARTY_PLACEHOLDER);
        assert_eq!(pick_other_party(me, &[]), OTHER_PARTY_PLACEHOLDER);
    }

    #[test]
    fn test_other_party_without_profile_is_placeholder() {
        let me = UserId::generate();
        let other = UserId::generate();
        let rows = vec![view(me, Some("Me"), None), view(other, None, None)];
        assert_eq!(pick_other_party(me, &rows), OTHER_PARTY_PLACEHOLDER);
    }
}
