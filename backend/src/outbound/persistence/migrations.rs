//! Embedded schema migrations.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

/// Migrations compiled from `backend/migrations`.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while applying migrations.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Could not open a connection.
    #[error("failed to connect for migrations: {message}")]
    Connect {
        /// Underlying error text.
        message: String,
    },
    /// A migration failed to apply.
    #[error("failed to apply migrations: {message}")]
    Apply {
        /// Underlying error text.
        message: String,
    },
    /// The blocking migration task panicked or was cancelled.
    #[error("migration task aborted: {message}")]
    Aborted {
        /// Underlying error text.
        message: String,
    },
}

/// Apply pending migrations against `database_url`.
///
/// Migrations run on a blocking thread with a synchronous connection.
pub async fn run_migrations(database_url: &str) -> Result<usize, MigrationError> {
    let url = database_url.to_owned();
    let applied = tokio::task::spawn_blocking(move || -> Result<usize, MigrationError> {
        let mut connection =
            PgConnection::establish(&url).map_err(|err| MigrationError::Connect {
                message: err.to_string(),
            })?;
        let versions = connection
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| MigrationError::Apply {
                message: err.to_string(),
            })?;
        Ok(versions.len())
    })
    .await
    .map_err(|err| MigrationError::Aborted {
        message: err.to_string(),
    })??;
    info!(applied, "database migrations complete");
    Ok(applied)
}
