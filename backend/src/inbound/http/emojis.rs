//! Emoji API handlers.
//!
//! ```text
//! POST /api/generate {"prompt":"a happy cat","visibility":"public"}
//! GET /api/emojis?page=2
//! POST /api/emojis/like {"emojiId":"..."}
//! GET /api/emojis/{emoji_id}/image
//! ```
//!
//! Handlers only translate between JSON and domain types. The gateway has
//! already resolved the caller; handlers still demand an
//! [`AuthenticatedUser`] so they fail closed when mounted without it.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use pagination::{Page, PageLinks, PageRequest};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AuthenticatedUser, EMOJI_PAGE_SIZE, EmojiListing, Error, ErrorEnvelope, LIST_FAILED_MESSAGE,
    Prompt, Visibility,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cache_control::private_image_header;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_emoji_id, prompt_error};

/// Request body for `POST /api/generate`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Text describing the emoji, at most 500 characters once trimmed.
    #[schema(example = "a happy cat wearing sunglasses")]
    pub prompt: String,
    /// Sharing policy; private when omitted.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

/// Response body for a successful generation.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Always `true`.
    pub success: bool,
    /// Object-store key of the new image.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6/0b8f7c1e-3c1a-4b7e-9a55-1d9b1f9f4f10.png")]
    pub storage_path: String,
    /// Identifier of the new emoji.
    pub emoji_id: String,
}

/// Generate an emoji from a prompt and store it in the caller's gallery.
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Emoji generated and stored", body = GenerateResponse),
        (status = 400, description = "Invalid prompt", body = ErrorEnvelope),
        (status = 401, description = "Authentication required", body = ErrorEnvelope),
        (status = 500, description = "Failed to generate emoji", body = ErrorEnvelope)
    ),
    tags = ["emojis"],
    operation_id = "generateEmoji"
)]
#[post("/generate")]
pub async fn generate_emoji(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<GenerateRequest>,
) -> ApiResult<web::Json<GenerateResponse>> {
    let GenerateRequest { prompt, visibility } = payload.into_inner();
    let prompt = Prompt::new(&prompt).map_err(|err| prompt_error(&err))?;
    let generated = state
        .generation
        .generate(&user.id, prompt, visibility.unwrap_or_default())
        .await?;
    Ok(web::Json(GenerateResponse {
        success: true,
        storage_path: generated.storage_path.to_string(),
        emoji_id: generated.emoji_id.to_string(),
    }))
}

/// Query parameters for the gallery listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEmojisQuery {
    /// One-based page number; anything unparsable selects page 1.
    pub page: Option<String>,
}

/// One gallery entry.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct EmojiResponse {
    /// Emoji identifier.
    pub id: String,
    /// Owner identifier.
    pub user_id: String,
    /// Prompt as entered.
    pub prompt: String,
    /// Object-store key of the image.
    pub storage_path: String,
    /// Sharing policy.
    pub visibility: Visibility,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Number of likes.
    pub likes_count: u32,
    /// Whether the caller likes this emoji.
    pub liked: bool,
}

impl From<EmojiListing> for EmojiResponse {
    fn from(listing: EmojiListing) -> Self {
        let EmojiListing { emoji, liked } = listing;
        Self {
            id: emoji.id.to_string(),
            user_id: emoji.owner.to_string(),
            prompt: emoji.prompt,
            storage_path: emoji.storage_path.to_string(),
            visibility: emoji.visibility,
            created_at: emoji.created_at,
            likes_count: emoji.likes_count,
            liked,
        }
    }
}

/// One page of the caller's gallery.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmojiPageResponse {
    /// Always `true`.
    pub success: bool,
    /// Emojis on this page, newest first.
    pub emojis: Vec<EmojiResponse>,
    /// Whether another page follows.
    pub has_more: bool,
    /// Number of emojis the caller owns.
    pub total: u64,
    /// One-based page number served.
    pub page: u32,
    /// `self`, `next`, and `prev` URLs.
    #[schema(value_type = Object)]
    pub links: PageLinks,
}

impl EmojiPageResponse {
    fn from_page(page: Page<EmojiListing>, links: PageLinks) -> Self {
        Self {
            success: true,
            has_more: page.has_more(),
            total: page.total(),
            page: page.request().page(),
            emojis: page.into_items().into_iter().map(EmojiResponse::from).collect(),
            links,
        }
    }
}

/// List the caller's emojis, eight per page, newest first.
#[utoipa::path(
    get,
    path = "/api/emojis",
    params(ListEmojisQuery),
    responses(
        (status = 200, description = "One page of the caller's gallery", body = EmojiPageResponse),
        (status = 401, description = "Authentication required", body = ErrorEnvelope),
        (status = 500, description = "Failed to fetch emojis", body = ErrorEnvelope)
    ),
    tags = ["emojis"],
    operation_id = "listEmojis"
)]
#[get("/emojis")]
pub async fn list_emojis(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    query: web::Query<ListEmojisQuery>,
) -> ApiResult<web::Json<EmojiPageResponse>> {
    let request = PageRequest::from_query(query.page.as_deref(), EMOJI_PAGE_SIZE).map_err(|err| {
        tracing::error!(error = %err, "invalid gallery page size");
        Error::internal(LIST_FAILED_MESSAGE)
    })?;
    let page = state.gallery.list_emojis(&user.id, request).await?;
    let links = PageLinks::for_page(&state.site.url_for("/api/emojis"), &page);
    Ok(web::Json(EmojiPageResponse::from_page(page, links)))
}

/// Request body for `POST /api/emojis/like`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    /// Emoji to like or unlike.
    pub emoji_id: String,
}

/// Like state after a toggle.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    /// Always `true`.
    pub success: bool,
    /// Whether the caller now likes the emoji.
    pub liked: bool,
    /// Like count after the toggle.
    pub likes_count: u32,
}

/// Like or unlike an emoji the caller owns or that is public.
#[utoipa::path(
    post,
    path = "/api/emojis/like",
    request_body = LikeRequest,
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 400, description = "Malformed emoji id", body = ErrorEnvelope),
        (status = 401, description = "Authentication required", body = ErrorEnvelope),
        (status = 404, description = "Emoji not found", body = ErrorEnvelope),
        (status = 500, description = "Failed to toggle like", body = ErrorEnvelope)
    ),
    tags = ["emojis"],
    operation_id = "toggleLike"
)]
#[post("/emojis/like")]
pub async fn toggle_like(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<LikeRequest>,
) -> ApiResult<web::Json<LikeResponse>> {
    let emoji_id = parse_emoji_id("emojiId", &payload.emoji_id)?;
    let toggle = state.likes.toggle_like(&user.id, &emoji_id).await?;
    Ok(web::Json(LikeResponse {
        success: true,
        liked: toggle.liked,
        likes_count: toggle.likes_count,
    }))
}

/// Stream the stored image of an emoji the caller may see.
#[utoipa::path(
    get,
    path = "/api/emojis/{emoji_id}/image",
    params(("emoji_id" = String, Path, description = "Emoji identifier")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/png"),
        (status = 400, description = "Malformed emoji id", body = ErrorEnvelope),
        (status = 401, description = "Authentication required", body = ErrorEnvelope),
        (status = 404, description = "Emoji not found", body = ErrorEnvelope)
    ),
    tags = ["emojis"],
    operation_id = "emojiImage"
)]
#[get("/emojis/{emoji_id}/image")]
pub async fn emoji_image(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let emoji_id = parse_emoji_id("emojiId", &path)?;
    let image = state.gallery.emoji_image(&user.id, &emoji_id).await?;
    Ok(HttpResponse::Ok()
        .content_type(image.content_type)
        .insert_header(private_image_header())
        .body(image.bytes))
}

/// Register the emoji endpoints on an `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(generate_emoji)
        .service(list_emojis)
        .service(toggle_like)
        .service(emoji_image);
}

#[cfg(test)]
#[path = "emojis_tests.rs"]
mod tests;
