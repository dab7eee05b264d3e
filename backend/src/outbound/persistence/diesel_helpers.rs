//! Shared error mapping for Diesel repository implementations.

use tracing::debug;

use crate::domain::ports::EmojiRepositoryError;

use super::pool::PoolError;

/// Map pool errors to emoji repository connection errors.
pub fn map_pool_error(error: PoolError) -> EmojiRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            EmojiRepositoryError::connection(message)
        }
    }
}

/// Map Diesel errors to emoji repository errors, logging the raw cause.
pub fn map_diesel_error(error: diesel::result::Error) -> EmojiRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => EmojiRepositoryError::query("record not found"),
        DieselError::QueryBuilderError(_) => EmojiRepositoryError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            EmojiRepositoryError::conflict(
                info.constraint_name()
                    .map_or_else(|| "unique constraint".to_owned(), str::to_owned),
            )
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            EmojiRepositoryError::connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => EmojiRepositoryError::query("database error"),
        _ => EmojiRepositoryError::query("database error"),
    }
}
