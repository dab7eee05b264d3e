//! PostgreSQL-backed `EmojiRepository` implementation using Diesel ORM.
//!
//! Listing joins the caller's like rows onto their emojis; toggling delegates
//! to the `toggle_emoji_like` procedure so the like row and the counter change
//! under one row lock.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use pagination::{Page, PageRequest};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{EmojiRepository, EmojiRepositoryError};
use crate::domain::{
    Emoji, EmojiId, EmojiListing, LikeToggle, StoragePath, UserId, Visibility,
};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{EmojiRow, NewEmojiRow, ToggleLikeRow};
use super::pool::DbPool;
use super::schema::{emoji_likes, emojis};

const TOGGLE_LIKE_SQL: &str = "SELECT liked_state, total_likes FROM toggle_emoji_like($1, $2)";

/// Diesel-backed implementation of the `EmojiRepository` port.
#[derive(Clone)]
pub struct DieselEmojiRepository {
    pool: DbPool,
}

impl DieselEmojiRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or_default()
}

fn count_for_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn window_for_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Convert a database row to a domain emoji.
fn row_to_emoji(row: EmojiRow) -> Emoji {
    let visibility = row.visibility.parse().unwrap_or_else(|_| {
        warn!(
            value = %row.visibility,
            emoji_id = %row.id,
            "unrecognised visibility value, treating as private"
        );
        Visibility::Private
    });
    Emoji {
        id: EmojiId::from_uuid(row.id),
        owner: UserId::from_uuid(row.user_id),
        prompt: row.prompt,
        storage_path: StoragePath::from_stored(row.storage_path),
        visibility,
        created_at: row.created_at,
        likes_count: count_from_db(row.likes_count),
    }
}

#[async_trait]
impl EmojiRepository for DieselEmojiRepository {
    async fn insert(&self, emoji: &Emoji) -> Result<(), EmojiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_row = NewEmojiRow {
            id: *emoji.id.as_uuid(),
            user_id: *emoji.owner.as_uuid(),
            prompt: &emoji.prompt,
            storage_path: emoji.storage_path.as_str(),
            visibility: emoji.visibility.as_str(),
            created_at: emoji.created_at,
            likes_count: count_for_db(emoji.likes_count),
        };

        diesel::insert_into(emojis::table)
            .values(&new_row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &EmojiId) -> Result<Option<Emoji>, EmojiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<EmojiRow> = emojis::table
            .filter(emojis::id.eq(id.as_uuid()))
            .select(EmojiRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(row_to_emoji))
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, EmojiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner_id = *owner.as_uuid();

        // One repeatable-read snapshot so the total agrees with the page rows
        // while other requests insert emojis.
        let (total, rows) = conn
            .build_transaction()
            .repeatable_read()
            .read_only()
            .run(|conn| {
                async move {
                    let total: i64 = emojis::table
                        .filter(emojis::user_id.eq(owner_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    let rows: Vec<(EmojiRow, Option<Uuid>)> = emojis::table
                        .left_join(
                            emoji_likes::table.on(emoji_likes::emoji_id
                                .eq(emojis::id)
                                .and(emoji_likes::user_id.eq(owner_id))),
                        )
                        .filter(emojis::user_id.eq(owner_id))
                        .order((emojis::created_at.desc(), emojis::id.desc()))
                        .limit(window_for_db(request.limit()))
                        .offset(window_for_db(request.offset()))
                        .select((EmojiRow::as_select(), emoji_likes::user_id.nullable()))
                        .load(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((total, rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        let items = rows
            .into_iter()
            .map(|(row, like)| EmojiListing {
                emoji: row_to_emoji(row),
                liked: like.is_some(),
            })
            .collect();
        Ok(Page::new(
            items,
            request,
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn toggle_like(
        &self,
        emoji: &EmojiId,
        user: &UserId,
    ) -> Result<Option<LikeToggle>, EmojiRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ToggleLikeRow> = diesel::sql_query(TOGGLE_LIKE_SQL)
            .bind::<sql_types::Uuid, _>(*emoji.as_uuid())
            .bind::<sql_types::Uuid, _>(*user.as_uuid())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(|row| LikeToggle {
            liked: row.liked_state,
            likes_count: count_from_db(row.total_likes),
        }))
    }
}
