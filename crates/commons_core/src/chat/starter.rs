//! Find-or-create for pairwise conversations
//!
//! Starting a chat with somebody reuses any conversation the two
//! identities already share instead of creating a fresh one, so
//! repeated starts stay on the same thread.

use chrono::Utc;
use surrealdb::{Connection, RecordId, Surreal};

use super::participants::ensure_participant;
use crate::db::{DatabaseError, DbConversation};
use crate::error::{CoreError, Result};
use crate::id::{ConversationId, UserId};
use crate::profile;

/// Find or create the conversation shared by `self_id` and the identity
/// behind `target_email`.
///
/// The address is trimmed and matched case-insensitively. When the two
/// identities already share more than one conversation the first id as
/// delivered by the store is reused; the selection is arbitrary.
pub async fn start_or_find_conversation<C: Connection>(
    db: &Surreal<C>,
    self_id: UserId,
    target_email: &str,
) -> Result<ConversationId> {
    let normalized = target_email.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(CoreError::EmptyContactAddress);
    }

    let target = profile::find_profile_by_email(db, &normalized)
        .await?
        .ok_or(CoreError::ContactNotFound {
            address: normalized,
        })?;

    if target.id == self_id {
        return Err(CoreError::SelfConversation);
    }

    if let Some(shared) = find_shared_conversation(db, self_id, target.id).await? {
        // Self-heal both sides in case one participation row was dropped
        ensure_participant(db, shared, self_id).await?;
        ensure_participant(db, shared, target.id).await?;
        tracing::debug!(conversation_id = %shared, "reusing existing conversation");
        return Ok(shared);
    }

    let conversation_id = create_conversation(db, self_id).await?;
    ensure_participant(db, conversation_id, self_id).await?;
    ensure_participant(db, conversation_id, target.id).await?;
    tracing::info!(%conversation_id, target = %target.id, "started new conversation");
    Ok(conversation_id)
}

/// First conversation id both identities participate in, if any
async fn find_shared_conversation<C: Connection>(
    db: &Surreal<C>,
    self_id: UserId,
    target_id: UserId,
) -> Result<Option<ConversationId>> {
    let mut response = db
        .query("SELECT VALUE conversation_id FROM participants WHERE user_id = $user")
        .bind(("user", RecordId::from(self_id)))
        .await
        .map_err(|e| CoreError::query_failed("participants", e))?;

    let mine: Vec<RecordId> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("participants", e))?;

    if mine.is_empty() {
        return Ok(None);
    }

    let mut response = db
        .query(
            "SELECT VALUE conversation_id FROM participants \
             WHERE conversation_id IN $ids AND user_id = $target",
        )
        .bind(("ids", mine))
        .bind(("target", RecordId::from(target_id)))
        .await
        .map_err(|e| CoreError::query_failed("participants", e))?;

    let shared: Vec<RecordId> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("participants", e))?;

    Ok(shared.into_iter().next().map(ConversationId::from_record))
}

async fn create_conversation<C: Connection>(
    db: &Surreal<C>,
    started_by: UserId,
) -> Result<ConversationId> {
    let id = ConversationId::generate();
    let now = Utc::now();

    let row = DbConversation {
        id: RecordId::from(id),
        started_by: RecordId::from(started_by),
        created_at: now.into(),
        updated_at: now.into(),
    };

    let created: Option<DbConversation> = db
        .create(("conversations", id.to_record_key()))
        .content(row)
        .await
        .map_err(|e| CoreError::query_failed("conversations", e))?;

    created.map(|_| id).ok_or_else(|| {
        CoreError::Database(DatabaseError::Other("Failed to create conversation".into()))
    })
}
