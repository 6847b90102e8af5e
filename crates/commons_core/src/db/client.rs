//! Direct SurrealDB client implementation

use crate::db::{DatabaseConfig, DatabaseError, Result};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};

const NAMESPACE: &str = "commons";
const DATABASE: &str = "commons";

/// Create a new in-memory database instance for testing
pub async fn create_test_db() -> Result<Surreal<Any>> {
    let db = any::connect("memory")
        .await
        .map_err(DatabaseError::ConnectionFailed)?;
    // For embedded mode, we need to select a namespace and database
    db.use_ns(NAMESPACE)
        .use_db(DATABASE)
        .await
        .map_err(DatabaseError::ConnectionFailed)?;

    // Run migrations
    use crate::db::migration::MigrationRunner;
    MigrationRunner::run(&db).await?;
    Ok(db)
}

/// Connect to the configured database and bring the schema up to date
pub async fn connect(config: &DatabaseConfig) -> Result<Surreal<Any>> {
    match config {
        DatabaseConfig::Embedded { path } => {
            let endpoint = if path.is_empty() {
                "memory".to_string()
            } else {
                // Ensure parent directory exists for file-based storage
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            DatabaseError::Other(format!(
                                "Failed to create database directory: {}",
                                e
                            ))
                        })?;
                    }
                }
                format!("surrealkv://{}", path)
            };

            tracing::info!("Connecting to embedded database at: {}", endpoint);
            let db = any::connect(endpoint)
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            db.use_ns(NAMESPACE)
                .use_db(DATABASE)
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            use crate::db::migration::MigrationRunner;
            MigrationRunner::run(&db).await?;

            Ok(db)
        }
        DatabaseConfig::Remote {
            url,
            username,
            password,
            namespace,
            database,
        } => {
            use surrealdb::opt::auth::Root;

            tracing::info!("Connecting to remote database at: {}", url);
            let db = any::connect(url.clone())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            // Authenticate if credentials provided
            if let (Some(user), Some(pass)) = (username, password) {
                db.signin(Root {
                    username: user,
                    password: pass,
                })
                .await
                .map_err(DatabaseError::ConnectionFailed)?;
            }

            db.use_ns(namespace.clone())
                .use_db(database.clone())
                .await
                .map_err(DatabaseError::ConnectionFailed)?;

            use crate::db::migration::MigrationRunner;
            MigrationRunner::run(&db).await?;

            Ok(db)
        }
    }
}

/// Check if the database is healthy
pub async fn health_check(db: &Surreal<Any>) -> Result<()> {
    db.health().await.map_err(DatabaseError::ConnectionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_db_is_healthy() {
        let db = create_test_db().await.unwrap();
        health_check(&db).await.unwrap();
    }
}
