//! Client-side gallery view-model.
//!
//! Holds what the studio page renders: the latest generation, a short
//! session-only history, and the persisted gallery fetched page by page.
//! Like counts only change from server results passed to
//! [`GalleryViewState::apply_like`].

use super::{
    AuthenticatedUser, EmojiId, EmojiListing, GeneratedEmoji, LikeToggle, UserId, Visibility,
};

/// Maximum number of entries kept in the session history.
pub const RECENT_CAPACITY: usize = 12;

/// One renderable emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiCard {
    /// Emoji identifier.
    pub id: EmojiId,
    /// Prompt that produced the image.
    pub prompt: String,
    /// Object-store key of the image.
    pub storage_path: String,
    /// Sharing policy.
    pub visibility: Visibility,
    /// Like count as last reported by the server.
    pub likes_count: u32,
    /// Whether the viewer likes it.
    pub liked: bool,
}

impl EmojiCard {
    /// Card for an emoji the viewer just generated.
    pub fn from_generated(
        generated: &GeneratedEmoji,
        prompt: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            id: generated.emoji_id,
            prompt: prompt.into(),
            storage_path: generated.storage_path.to_string(),
            visibility,
            likes_count: 0,
            liked: false,
        }
    }

    fn apply(&mut self, toggle: LikeToggle) {
        self.liked = toggle.liked;
        self.likes_count = toggle.likes_count;
    }
}

impl From<EmojiListing> for EmojiCard {
    fn from(listing: EmojiListing) -> Self {
        let EmojiListing { emoji, liked } = listing;
        Self {
            id: emoji.id,
            prompt: emoji.prompt,
            storage_path: emoji.storage_path.to_string(),
            visibility: emoji.visibility,
            likes_count: emoji.likes_count,
            liked,
        }
    }
}

/// Studio page state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryViewState {
    /// Latest generation result.
    pub current: Option<EmojiCard>,
    /// Session history, newest first, at most [`RECENT_CAPACITY`] entries.
    pub recent: Vec<EmojiCard>,
    /// Persisted gallery pages plus emojis generated since loading.
    pub persisted: Vec<EmojiCard>,
    /// Whether the listing reported further pages.
    pub has_more: bool,
    /// Last page applied; `0` before the first fetch.
    pub current_page: u32,
    /// Who the state belongs to.
    pub signed_in_user: Option<UserId>,
}

impl GalleryViewState {
    /// Empty state for `user`.
    pub fn new(user: Option<&AuthenticatedUser>) -> Self {
        Self {
            signed_in_user: user.map(|u| u.id.clone()),
            ..Self::default()
        }
    }

    /// Record a successful generation.
    ///
    /// # Examples
    /// ```
    /// use emoji_backend::domain::{EmojiCard, EmojiId, GalleryViewState, Visibility};
    ///
    /// let mut state = GalleryViewState::default();
    /// let card = EmojiCard {
    ///     id: EmojiId::random(),
    ///     prompt: "a sleepy fox".into(),
    ///     storage_path: "u/e.png".into(),
    ///     visibility: Visibility::Private,
    ///     likes_count: 0,
    ///     liked: false,
    /// };
    /// state.record_generated(card.clone());
    /// assert_eq!(state.current.as_ref(), Some(&card));
    /// assert_eq!(state.generated_count(), 2);
    /// ```
    pub fn record_generated(&mut self, card: EmojiCard) {
        self.recent.insert(0, card.clone());
        self.recent.truncate(RECENT_CAPACITY);
        self.persisted.insert(0, card.clone());
        self.current = Some(card);
    }

    /// Apply a fetched page. Page 1 replaces the gallery; later pages append.
    pub fn apply_page(&mut self, page: u32, cards: Vec<EmojiCard>, has_more: bool) {
        if page <= 1 {
            self.persisted = cards;
        } else {
            self.persisted.extend(cards);
        }
        self.current_page = page.max(1);
        self.has_more = has_more;
    }

    /// Page to fetch next, if the listing reported more.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more.then(|| self.current_page.saturating_add(1))
    }

    /// Apply a server-confirmed like toggle to every copy of the emoji.
    pub fn apply_like(&mut self, emoji: &EmojiId, toggle: LikeToggle) {
        let matching = self
            .current
            .iter_mut()
            .chain(self.recent.iter_mut())
            .chain(self.persisted.iter_mut())
            .filter(|card| card.id == *emoji);
        for card in matching {
            card.apply(toggle);
        }
    }

    /// React to sign-in, sign-out, or an account switch.
    ///
    /// Any change of identity drops all cards so one user's gallery is never
    /// shown to another.
    pub fn on_auth_change(&mut self, user: Option<&AuthenticatedUser>) {
        let next = user.map(|u| u.id.clone());
        if next != self.signed_in_user {
            *self = Self {
                signed_in_user: next,
                ..Self::default()
            };
        }
    }

    /// Counter shown next to the gallery heading.
    pub fn generated_count(&self) -> usize {
        self.persisted.len() + self.recent.len()
    }
}
