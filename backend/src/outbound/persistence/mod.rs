//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories translate between Diesel rows and domain types and hold no
//! business rules. Row structs (`models`) and table definitions (`schema`)
//! stay private to this module. Connections come from a `bb8` pool through
//! `diesel-async`; migrations are embedded and applied with a synchronous
//! connection on a blocking thread.

mod diesel_emoji_repository;
pub(crate) mod diesel_helpers;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_emoji_repository::DieselEmojiRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
