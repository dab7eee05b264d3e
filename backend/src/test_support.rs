//! Test utilities for the backend crate.
//!
//! In-memory adapters standing in for PostgreSQL and the image bucket, plus a
//! session key file helper. Compiled for unit tests and for integration
//! tests through the `test-support` feature.

use std::collections::{HashMap, HashSet};
use std::io::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use tempfile::NamedTempFile;

use crate::domain::ports::{EmojiRepository, EmojiRepositoryError, ObjectStorage, ObjectStorageError};
use crate::domain::{Emoji, EmojiId, EmojiListing, LikeToggle, StoragePath, StoredImage, UserId};

#[derive(Default)]
struct StoreState {
    emojis: HashMap<EmojiId, Emoji>,
    likes: HashSet<(EmojiId, UserId)>,
}

/// Emoji repository holding rows in memory with the stored procedure's
/// toggle semantics.
///
/// # Examples
/// ```
/// use emoji_backend::test_support::InMemoryEmojiStore;
///
/// let store = InMemoryEmojiStore::default();
/// assert!(store.is_empty());
/// ```
#[derive(Default)]
pub struct InMemoryEmojiStore {
    state: Mutex<StoreState>,
}

impl InMemoryEmojiStore {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored emojis.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().emojis.len()
    }

    /// Whether no emoji is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of one stored emoji.
    #[must_use]
    pub fn get(&self, id: &EmojiId) -> Option<Emoji> {
        self.lock().emojis.get(id).cloned()
    }

    /// Number of like rows recorded for `id`.
    #[must_use]
    pub fn like_rows(&self, id: &EmojiId) -> usize {
        self.lock()
            .likes
            .iter()
            .filter(|(emoji, _)| emoji == id)
            .count()
    }
}

#[async_trait]
impl EmojiRepository for InMemoryEmojiStore {
    async fn insert(&self, emoji: &Emoji) -> Result<(), EmojiRepositoryError> {
        let mut state = self.lock();
        if state.emojis.contains_key(&emoji.id) {
            return Err(EmojiRepositoryError::conflict(format!(
                "duplicate emoji id {}",
                emoji.id
            )));
        }
        state.emojis.insert(emoji.id, emoji.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EmojiId) -> Result<Option<Emoji>, EmojiRepositoryError> {
        Ok(self.get(id))
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
        request: PageRequest,
    ) -> Result<Page<EmojiListing>, EmojiRepositoryError> {
        let state = self.lock();
        let mut owned: Vec<&Emoji> = state
            .emojis
            .values()
            .filter(|emoji| &emoji.owner == owner)
            .collect();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        let total = owned.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
        let items = owned
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|emoji| EmojiListing {
                liked: state.likes.contains(&(emoji.id, owner.clone())),
                emoji: emoji.clone(),
            })
            .collect();
        Ok(Page::new(items, request, total))
    }

    async fn toggle_like(
        &self,
        emoji: &EmojiId,
        user: &UserId,
    ) -> Result<Option<LikeToggle>, EmojiRepositoryError> {
        let mut state = self.lock();
        let StoreState { emojis, likes } = &mut *state;
        let Some(row) = emojis.get_mut(emoji) else {
            return Ok(None);
        };
        if !row.is_visible_to(user) {
            return Ok(None);
        }
        let key = (*emoji, user.clone());
        let liked = if likes.remove(&key) {
            row.likes_count = row.likes_count.saturating_sub(1);
            false
        } else {
            likes.insert(key);
            row.likes_count += 1;
            true
        };
        Ok(Some(LikeToggle {
            liked,
            likes_count: row.likes_count,
        }))
    }
}

/// Image bucket held in memory; refuses to overwrite existing objects.
#[derive(Default)]
pub struct InMemoryObjectStorage {
    objects: Mutex<HashMap<String, StoredImage>>,
}

impl InMemoryObjectStorage {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredImage>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an object exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &StoragePath) -> bool {
        self.lock().contains_key(path.as_str())
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed an object directly.
    pub fn put(&self, path: &StoragePath, bytes: Vec<u8>, content_type: &str) {
        self.lock().insert(
            path.as_str().to_owned(),
            StoredImage {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn upload(
        &self,
        path: &StoragePath,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ObjectStorageError> {
        let mut objects = self.lock();
        if objects.contains_key(path.as_str()) {
            return Err(ObjectStorageError::already_exists(path.as_str()));
        }
        objects.insert(
            path.as_str().to_owned(),
            StoredImage {
                bytes,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn download(&self, path: &StoragePath) -> Result<StoredImage, ObjectStorageError> {
        self.lock()
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| ObjectStorageError::not_found(path.as_str()))
    }

    async fn remove(&self, path: &StoragePath) -> Result<(), ObjectStorageError> {
        self.lock().remove(path.as_str());
        Ok(())
    }
}

/// Write `len` bytes of key material to a temporary file.
///
/// # Errors
/// Returns [`std::io::Error`] when the file cannot be created or written.
///
/// # Examples
/// ```
/// use emoji_backend::test_support::session_key_file;
///
/// let file = session_key_file(64)?;
/// assert_eq!(std::fs::read(file.path())?.len(), 64);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn session_key_file(len: usize) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    let material: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    file.write_all(&material)?;
    file.flush()?;
    Ok(file)
}
