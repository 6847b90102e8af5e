//! Identity profiles
//!
//! Profiles are created by the auth collaborator (or the CLI seeder) and
//! read-only from the messaging core's perspective: everything here either
//! looks one up or creates one on behalf of that collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{Connection, RecordId, Surreal};

use crate::UserId;
use crate::error::{CoreError, Result};

/// A user account: uniquely addressable, with a display name and
/// contact address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier for this profile
    pub id: UserId,

    /// Name shown to other users
    pub display_name: String,

    /// Contact address used for starting conversations; matched
    /// case-insensitively
    pub email: String,

    /// When this profile was created
    pub created_at: DateTime<Utc>,
}

/// Create a new profile row
pub async fn create_profile<C: Connection>(
    db: &Surreal<C>,
    display_name: impl Into<String>,
    email: impl Into<String>,
) -> Result<Profile> {
    use crate::db::DbProfile;

    let id = UserId::generate();
    let now = Utc::now();

    let db_profile = DbProfile {
        id: RecordId::from(id),
        display_name: display_name.into(),
        email: email.into(),
        created_at: now.into(),
    };

    let created: Option<DbProfile> = db
        .create(("profiles", id.to_record_key()))
        .content(db_profile)
        .await
        .map_err(|e| CoreError::query_failed("profiles", e))?;

    created
        .map(Profile::from)
        .ok_or_else(|| CoreError::Database(crate::db::DatabaseError::Other(
            "Failed to create profile".into(),
        )))
}

/// Look up a profile by contact address, case-insensitively.
/// The address is expected to be trimmed already.
pub async fn find_profile_by_email<C: Connection>(
    db: &Surreal<C>,
    email: &str,
) -> Result<Option<Profile>> {
    use crate::db::DbProfile;

    let normalized = email.to_lowercase();
    let mut response = db
        .query("SELECT * FROM profiles WHERE string::lowercase(email) = $email LIMIT 1")
        .bind(("email", normalized))
        .await
        .map_err(|e| CoreError::query_failed("profiles", e))?;

    let rows: Vec<DbProfile> = response
        .take(0)
        .map_err(|e| CoreError::query_failed("profiles", e))?;

    Ok(rows.into_iter().next().map(Profile::from))
}

/// Get a profile by ID
pub async fn get_profile<C: Connection>(db: &Surreal<C>, id: UserId) -> Result<Option<Profile>> {
    use crate::db::DbProfile;

    let row: Option<DbProfile> = db
        .select(("profiles", id.to_record_key()))
        .await
        .map_err(|e| CoreError::query_failed("profiles", e))?;

    Ok(row.map(Profile::from))
}
