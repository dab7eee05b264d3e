//! Domain primitives, services, and ports.
//!
//! Purpose: define the strongly typed emoji, user, and session model used by
//! the HTTP and persistence adapters, plus the services implementing the
//! driving ports. Nothing here depends on actix or Diesel.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Emoji, EmojiId, Prompt, Visibility, StoragePath: the emoji aggregate.
//! - resolve_session: provider tokens to caller plus cookie update.
//! - EmojiGenerationService, EmojiGalleryService: driving port services.
//! - GalleryViewState: client view-model.

pub mod auth;
pub mod emoji;
pub mod error;
pub mod gallery_service;
pub mod gallery_view;
pub mod generation_service;
pub mod ports;
pub mod public_paths;
pub mod redirect;
pub mod session;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    AuthSession, CodeExchange, Credentials, CredentialsValidationError, EmailAddress, OtpKind,
    OtpKindParseError, OtpVerification, PASSWORD_MIN_CHARS, Password, SessionTokens,
    SignUpOutcome,
};
pub use self::emoji::{
    EMOJI_CONTENT_TYPE, EMOJI_PAGE_SIZE, Emoji, EmojiId, EmojiIdError, EmojiListing,
    GeneratedEmoji, ImageOutputError, LikeToggle, PROMPT_MAX_CHARS, Prompt,
    PromptValidationError, StoragePath, StoredImage, Visibility, VisibilityParseError,
    resolve_image_url,
};
pub use self::error::{EnvelopeSuccessFlagError, Error, ErrorCode, ErrorEnvelope};
pub use self::gallery_service::{
    EMOJI_NOT_FOUND_MESSAGE, EmojiGalleryService, LIST_FAILED_MESSAGE, TOGGLE_FAILED_MESSAGE,
};
pub use self::gallery_view::{EmojiCard, GalleryViewState, RECENT_CAPACITY};
pub use self::generation_service::{
    EmojiGenerationService, GENERATION_FAILED_MESSAGE, GenerationPorts,
};
pub use self::public_paths::{PUBLIC_ROUTES, PublicPaths, STATIC_EXTENSIONS};
pub use self::redirect::{
    AUTH_ERROR_PATH, DEFAULT_NEXT_PATH, LOGIN_PATH, callback_origin, forwarded_origin,
    safe_next_path,
};
pub use self::session::{SessionResolution, SessionUpdate, resolve_session};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{AuthenticatedUser, UserId, UserIdError};
