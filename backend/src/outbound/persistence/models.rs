//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{Bool, Int4};
use uuid::Uuid;

use super::schema::emojis;

/// Row struct for reading from the emojis table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = emojis)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EmojiRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub storage_path: String,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub likes_count: i32,
}

/// Insertable struct for new emoji rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = emojis)]
pub(crate) struct NewEmojiRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: &'a str,
    pub storage_path: &'a str,
    pub visibility: &'a str,
    pub created_at: DateTime<Utc>,
    pub likes_count: i32,
}

/// Row returned by `toggle_emoji_like`.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ToggleLikeRow {
    #[diesel(sql_type = Bool)]
    pub liked_state: bool,
    #[diesel(sql_type = Int4)]
    pub total_likes: i32,
}
