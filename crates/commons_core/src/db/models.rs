//! Database model wrappers
//!
//! These types mirror the domain types but use RecordId for database
//! operations. This keeps type safety in the domain while working with
//! SurrealDB's record ID format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use crate::id::{ConversationId, MessageId, UserId};
use crate::profile::Profile;

/// Database representation of a Profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbProfile {
    pub id: RecordId,
    pub display_name: String,
    pub email: String,
    pub created_at: surrealdb::Datetime,
}

/// Database representation of a Conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConversation {
    pub id: RecordId,
    pub started_by: RecordId,
    pub created_at: surrealdb::Datetime,
    pub updated_at: surrealdb::Datetime,
}

/// Database representation of a Participation row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbParticipant {
    pub id: RecordId,
    pub conversation_id: RecordId,
    pub user_id: RecordId,
    pub joined_at: surrealdb::Datetime,
}

/// Database representation of a Message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbMessage {
    pub id: RecordId,
    pub conversation_id: RecordId,
    pub sender_id: RecordId,
    pub body: String,
    pub created_at: surrealdb::Datetime,
}

pub fn strip_brackets(s: &str) -> &str {
    s.strip_prefix('⟨')
        .and_then(|s| s.strip_suffix('⟩'))
        .unwrap_or(s)
}

pub(crate) fn from_surreal_datetime(dt: &surrealdb::Datetime) -> DateTime<Utc> {
    let raw = dt.to_string();
    let trimmed = raw
        .strip_prefix("d'")
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(&raw);
    DateTime::parse_from_rfc3339(trimmed)
        .expect("surreal datetime should be valid ISO-8601")
        .with_timezone(&Utc)
}

// Conversion implementations

impl From<Profile> for DbProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: RecordId::from(profile.id),
            display_name: profile.display_name,
            email: profile.email,
            created_at: profile.created_at.into(),
        }
    }
}

impl From<DbProfile> for Profile {
    fn from(db_profile: DbProfile) -> Self {
        Self {
            id: UserId::from_record(db_profile.id),
            display_name: db_profile.display_name,
            email: db_profile.email,
            created_at: from_surreal_datetime(&db_profile.created_at),
        }
    }
}

impl DbMessage {
    pub fn message_id(&self) -> MessageId {
        MessageId::from_record(self.id.clone())
    }

    pub fn conversation(&self) -> ConversationId {
        ConversationId::from_record(self.conversation_id.clone())
    }

    pub fn sender(&self) -> UserId {
        UserId::from_record(self.sender_id.clone())
    }
}
