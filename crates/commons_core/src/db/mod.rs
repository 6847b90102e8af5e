//! Database backend for Commons
//!
//! This module provides connectivity (embedded and remote), schema
//! management with versioned migrations, and the record wrapper types
//! used to move rows in and out of SurrealDB.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
pub mod migration;
pub mod models;
pub mod schema;

pub use models::{DbConversation, DbMessage, DbParticipant, DbProfile, strip_brackets};

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(help("Check your database configuration and ensure the database is running"))]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(help("Check the query syntax and table schema"))]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Schema version mismatch: database is at v{db_version}, code expects v{code_version}")]
    #[diagnostic(help("Run migrations to update the database schema"))]
    SchemaVersionMismatch { db_version: u32, code_version: u32 },

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Configuration for database backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    Embedded {
        #[serde(default = "default_db_path")]
        path: String,
    },
    Remote {
        url: String,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
        namespace: String,
        database: String,
    },
}

fn default_db_path() -> String {
    "./commons.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Embedded {
            path: default_db_path(),
        }
    }
}
