use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Contact address is empty")]
    #[diagnostic(
        code(commons_core::empty_contact_address),
        help("Enter the email address of the person you want to message")
    )]
    EmptyContactAddress,

    #[error("No profile found for '{address}'")]
    #[diagnostic(
        code(commons_core::contact_not_found),
        help("Check the spelling of the address; the other person must have signed up already")
    )]
    ContactNotFound { address: String },

    #[error("Cannot start a conversation with yourself")]
    #[diagnostic(
        code(commons_core::self_conversation),
        help("Enter somebody else's contact address")
    )]
    SelfConversation,

    #[error("Not signed in")]
    #[diagnostic(
        code(commons_core::auth_required),
        help("Sign in first, or pass --as <email> to pick an identity")
    )]
    AuthRequired,

    #[error("Database connection failed")]
    #[diagnostic(
        code(commons_core::database_connection_failed),
        help("Ensure the database at {connection_string} is reachable")
    )]
    DatabaseConnectionFailed {
        connection_string: String,
        #[source]
        cause: surrealdb::Error,
    },

    #[error("Database query failed")]
    #[diagnostic(code(commons_core::database_query_failed), help("Table: {table}"))]
    DatabaseQueryFailed {
        table: String,
        #[source]
        cause: surrealdb::Error,
    },

    #[error("Live subscription failed for conversation {conversation}")]
    #[diagnostic(
        code(commons_core::live_query_failed),
        help("The message feed will stay on history only until reopened")
    )]
    LiveQueryFailed {
        conversation: String,
        #[source]
        cause: surrealdb::Error,
    },

    #[error("Failed to load configuration from {path:?}")]
    #[diagnostic(
        code(commons_core::config_load_failed),
        help("Check that the file exists and is valid TOML")
    )]
    ConfigLoadFailed {
        path: PathBuf,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),
}

impl CoreError {
    /// Shorthand for wrapping a store failure at a call site
    pub fn query_failed(table: impl Into<String>, cause: surrealdb::Error) -> Self {
        CoreError::DatabaseQueryFailed {
            table: table.into(),
            cause,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
