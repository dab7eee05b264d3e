//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Generated emoji metadata. One row per stored image.
    emojis (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owner as issued by the identity provider.
        user_id -> Uuid,
        /// Prompt as entered by the owner.
        prompt -> Text,
        /// Object-store key, `{user_id}/{id}.png`. Unique.
        storage_path -> Text,
        /// `public` or `private`.
        visibility -> Text,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Count of `emoji_likes` rows, maintained by `toggle_emoji_like`.
        likes_count -> Int4,
    }
}

diesel::table! {
    /// Like rows keyed by `(user_id, emoji_id)`.
    emoji_likes (user_id, emoji_id) {
        /// User who liked the emoji.
        user_id -> Uuid,
        /// Liked emoji; cascades on delete.
        emoji_id -> Uuid,
        /// When the like was recorded.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(emoji_likes -> emojis (emoji_id));
diesel::allow_tables_to_appear_in_same_query!(emojis, emoji_likes);
