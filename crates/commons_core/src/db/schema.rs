//! Database schema definitions for Commons

/// A table with its schema statement and index statements
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}

/// SQL schema definitions for the database
pub struct Schema;

impl Schema {
    /// Get all table definitions
    pub fn tables() -> Vec<TableDefinition> {
        vec![
            Self::system_metadata(),
            Self::profiles(),
            Self::conversations(),
            Self::participants(),
            Self::messages(),
        ]
    }

    /// System metadata table
    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: "system_metadata".to_string(),
            schema: r#"
                DEFINE TABLE system_metadata SCHEMAFULL;
                DEFINE FIELD schema_version ON system_metadata TYPE int;
                DEFINE FIELD created_at ON system_metadata TYPE datetime;
                DEFINE FIELD updated_at ON system_metadata TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Profiles table: one row per identity, created by the auth collaborator
    pub fn profiles() -> TableDefinition {
        TableDefinition {
            name: "profiles".to_string(),
            schema: r#"
                DEFINE TABLE profiles SCHEMAFULL;
                DEFINE FIELD display_name ON profiles TYPE string;
                DEFINE FIELD email ON profiles TYPE string;
                DEFINE FIELD created_at ON profiles TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX profile_email ON profiles FIELDS email UNIQUE".to_string(),
            ],
        }
    }

    /// Conversations table
    pub fn conversations() -> TableDefinition {
        TableDefinition {
            name: "conversations".to_string(),
            schema: r#"
                DEFINE TABLE conversations SCHEMAFULL;
                DEFINE FIELD started_by ON conversations TYPE record;
                DEFINE FIELD created_at ON conversations TYPE datetime;
                DEFINE FIELD updated_at ON conversations TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX conv_started ON conversations FIELDS started_by".to_string(),
            ],
        }
    }

    /// Participants join table; at most one row per (conversation, user) pair
    pub fn participants() -> TableDefinition {
        TableDefinition {
            name: "participants".to_string(),
            schema: r#"
                DEFINE TABLE participants SCHEMAFULL;
                DEFINE FIELD conversation_id ON participants TYPE record;
                DEFINE FIELD user_id ON participants TYPE record;
                DEFINE FIELD joined_at ON participants TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX participant_conversation ON participants FIELDS conversation_id"
                    .to_string(),
                "DEFINE INDEX participant_user ON participants FIELDS user_id".to_string(),
                "DEFINE INDEX participant_pair ON participants FIELDS conversation_id, user_id UNIQUE"
                    .to_string(),
            ],
        }
    }

    /// Messages table: append-only, ordered by created_at
    pub fn messages() -> TableDefinition {
        TableDefinition {
            name: "messages".to_string(),
            schema: r#"
                DEFINE TABLE messages SCHEMAFULL;
                DEFINE FIELD conversation_id ON messages TYPE record;
                DEFINE FIELD sender_id ON messages TYPE record;
                DEFINE FIELD body ON messages TYPE string;
                DEFINE FIELD created_at ON messages TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX msg_conversation ON messages FIELDS conversation_id".to_string(),
                "DEFINE INDEX msg_created ON messages FIELDS conversation_id, created_at"
                    .to_string(),
            ],
        }
    }
}
