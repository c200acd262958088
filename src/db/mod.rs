//! Typed access to the story and MVP collections.
//!
//! [`Database`] wraps a [`RecordStore`] and keeps both collections inside one
//! [`Document`] record. Every read loads and decodes the whole record; every
//! mutation rewrites it. Mutations that find nothing to change do not write.

mod ideas;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::models::*;
use crate::store::{document, FileStore, MemoryStore, RecordStore, SqliteStore};

/// Key the document is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "agile-requirements-data";

/// Key the cosmetic profile is stored under.
pub const PROFILE_KEY: &str = "user";

/// Key the idea list is stored under.
pub const IDEAS_KEY: &str = "ideas";

/// Keys owned by side records; the document may not be stored under them.
pub const RESERVED_KEYS: [&str; 2] = [PROFILE_KEY, IDEAS_KEY];

/// What to do when the stored document cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptPolicy {
    /// Substitute an empty document and log a warning.
    #[default]
    Recover,
    /// Return [`StoreError::Corrupt`].
    Fail,
}

impl CorruptPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recover => "recover",
            Self::Fail => "fail",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "recover" => Some(Self::Recover),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Database {
    store: Arc<dyn RecordStore>,
    key: String,
    policy: CorruptPolicy,
    // Serializes read-modify-write cycles between clones of this handle
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            key: DEFAULT_STORAGE_KEY.to_string(),
            policy: CorruptPolicy::default(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store the document under `key` instead of [`DEFAULT_STORAGE_KEY`].
    ///
    /// Fails for empty keys and for [`RESERVED_KEYS`], which would make the
    /// document and a side record overwrite each other.
    pub fn with_key(mut self, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let reason = if key.trim().is_empty() {
            Some("must not be empty")
        } else if RESERVED_KEYS.contains(&key.as_str()) {
            Some("reserved for another record")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(StoreError::InvalidKey {
                key,
                reason: reason.to_string(),
            });
        }
        self.key = key;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: CorruptPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn open_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Open (and migrate) a SQLite-backed database at `path`.
    pub fn open_sqlite(path: impl AsRef<Path>) -> Result<Self> {
        let store = SqliteStore::open(path)?;
        store.migrate()?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Open a file-backed database rooted at `dir`.
    pub fn open_file(dir: impl AsRef<Path>) -> Result<Self> {
        let store = FileStore::open(dir.as_ref())?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> CorruptPolicy {
        self.policy
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    /// The underlying record store.
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    // ============================================================
    // Document operations
    // ============================================================

    /// Load the document and report where it came from.
    pub fn load(&self) -> Result<LoadedDocument> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(LoadedDocument {
                document: Document::default(),
                origin: DocumentOrigin::Empty,
            });
        };

        match document::decode(&self.key, &raw) {
            Ok((document, origin)) => Ok(LoadedDocument { document, origin }),
            Err(StoreError::Corrupt { key, reason }) if self.policy == CorruptPolicy::Recover => {
                tracing::warn!(%key, %reason, "Stored document is corrupt, using empty collections");
                Ok(LoadedDocument {
                    document: Document::default(),
                    origin: DocumentOrigin::Recovered,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn read_document(&self) -> Result<Document> {
        Ok(self.load()?.document)
    }

    /// Overwrite the stored document.
    pub fn write_document(&self, document: &Document) -> Result<()> {
        let raw = document::encode(document)?;
        self.store.set(&self.key, &raw)?;
        tracing::debug!(
            key = %self.key,
            stories = document.stories.len(),
            mvps = document.mvps.len(),
            "Persisted document"
        );
        Ok(())
    }

    /// Remove the stored document entirely.
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.lock();
        self.store.remove(&self.key)?;
        tracing::info!(key = %self.key, "Cleared all data");
        Ok(())
    }

    /// Store `document` only if no stories or MVPs exist yet. Returns whether it was written.
    pub fn seed_if_empty(&self, document: Document) -> Result<bool> {
        let seeded = self.modify(|doc| {
            if !doc.is_empty() {
                return Ok(None);
            }
            *doc = document;
            Ok(Some(()))
        })?;
        Ok(seeded.is_some())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("database lock poisoned")
    }

    /// Run `f` against the current document and persist it if `f` returns `Some`.
    fn modify<R>(&self, f: impl FnOnce(&mut Document) -> Result<Option<R>>) -> Result<Option<R>> {
        let _guard = self.lock();
        self.modify_locked(f)
    }

    /// [`Database::modify`] for callers already holding the write lock.
    fn modify_locked<R>(
        &self,
        f: impl FnOnce(&mut Document) -> Result<Option<R>>,
    ) -> Result<Option<R>> {
        let mut document = self.read_document()?;
        let outcome = f(&mut document)?;
        if outcome.is_some() {
            self.write_document(&document)?;
        }
        Ok(outcome)
    }

    /// Read a JSON side record, honouring the corrupt policy.
    fn read_side_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.policy == CorruptPolicy::Recover => {
                tracing::warn!(%key, error = %e, "Stored record is corrupt, ignoring it");
                Ok(None)
            }
            Err(e) => Err(StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    // ============================================================
    // Story operations
    // ============================================================

    pub fn list_stories(&self) -> Result<Vec<UserStory>> {
        Ok(self.read_document()?.stories)
    }

    pub fn get_story(&self, id: &str) -> Result<Option<UserStory>> {
        Ok(self.read_document()?.story(id).cloned())
    }

    /// Overwrite the story collection, leaving MVPs untouched.
    pub fn replace_all_stories(&self, stories: Vec<UserStory>) -> Result<()> {
        self.modify(|doc| {
            doc.stories = stories;
            Ok(Some(()))
        })?;
        Ok(())
    }

    /// Append a story. Ids are caller-assigned and not checked for uniqueness.
    pub fn add_story(&self, story: UserStory) -> Result<UserStory> {
        self.modify(|doc| {
            doc.stories.push(story.clone());
            Ok(Some(()))
        })?;
        tracing::debug!(id = %story.id, "Added story");
        Ok(story)
    }

    /// Merge `input` into the story with `id`. `Ok(None)` if there is no such story.
    pub fn update_story(&self, id: &str, input: UpdateStoryInput) -> Result<Option<UserStory>> {
        self.modify(|doc| {
            Ok(doc.stories.iter_mut().find(|s| s.id == id).map(|story| {
                story.apply(input, Utc::now());
                story.clone()
            }))
        })
    }

    /// Remove the story with `id`. Returns whether anything was removed.
    pub fn delete_story(&self, id: &str) -> Result<bool> {
        let removed = self.modify(|doc| {
            let before = doc.stories.len();
            doc.stories.retain(|s| s.id != id);
            Ok((doc.stories.len() != before).then_some(()))
        })?;
        Ok(removed.is_some())
    }

    /// Move a story into `mvp_id`, or back to the unassigned backlog with `None`.
    ///
    /// Unlike [`Database::update_story`], the target MVP must exist.
    pub fn assign_story(&self, story_id: &str, mvp_id: Option<&str>) -> Result<Option<UserStory>> {
        self.modify(|doc| {
            if let Some(mvp_id) = mvp_id {
                if doc.mvp(mvp_id).is_none() {
                    return Err(StoreError::MvpNotFound(mvp_id.to_string()));
                }
            }
            let Some(story) = doc.stories.iter_mut().find(|s| s.id == story_id) else {
                return Ok(None);
            };
            story.mvp_id = mvp_id.map(str::to_string);
            story.updated_at = Utc::now();
            tracing::debug!(story = %story.id, mvp = ?story.mvp_id, "Reassigned story");
            Ok(Some(story.clone()))
        })
    }

    pub fn unassigned_stories(&self) -> Result<Vec<UserStory>> {
        Ok(self
            .list_stories()?
            .into_iter()
            .filter(|s| s.mvp_id.is_none())
            .collect())
    }

    // ============================================================
    // MVP operations
    // ============================================================

    pub fn list_mvps(&self) -> Result<Vec<Mvp>> {
        Ok(self.read_document()?.mvps)
    }

    pub fn get_mvp(&self, id: &str) -> Result<Option<Mvp>> {
        Ok(self.read_document()?.mvp(id).cloned())
    }

    /// Overwrite the MVP collection, leaving stories untouched.
    pub fn replace_all_mvps(&self, mvps: Vec<Mvp>) -> Result<()> {
        self.modify(|doc| {
            doc.mvps = mvps;
            Ok(Some(()))
        })?;
        Ok(())
    }

    pub fn add_mvp(&self, mvp: Mvp) -> Result<Mvp> {
        self.modify(|doc| {
            doc.mvps.push(mvp.clone());
            Ok(Some(()))
        })?;
        tracing::debug!(id = %mvp.id, "Added MVP");
        Ok(mvp)
    }

    pub fn update_mvp(&self, id: &str, input: UpdateMvpInput) -> Result<Option<Mvp>> {
        self.modify(|doc| {
            Ok(doc.mvps.iter_mut().find(|m| m.id == id).map(|mvp| {
                mvp.apply(input, Utc::now());
                mvp.clone()
            }))
        })
    }

    /// Remove the MVP with `id` and unassign every story that pointed at it.
    ///
    /// Stories are matched on `mvp_id` alone. Both collections are persisted in
    /// a single write. Returns the number of stories unassigned, or `None` if
    /// there was no such MVP.
    pub fn delete_mvp(&self, id: &str) -> Result<Option<usize>> {
        let removed = self.modify(|doc| {
            let before = doc.mvps.len();
            doc.mvps.retain(|m| m.id != id);
            if doc.mvps.len() == before {
                return Ok(None);
            }

            let now = Utc::now();
            let mut unassigned = 0usize;
            for story in doc
                .stories
                .iter_mut()
                .filter(|s| s.mvp_id.as_deref() == Some(id))
            {
                story.mvp_id = None;
                story.updated_at = now;
                unassigned += 1;
            }
            Ok(Some(unassigned))
        })?;

        if let Some(unassigned) = removed {
            tracing::info!(mvp = %id, unassigned, "Deleted MVP");
        }
        Ok(removed)
    }

    /// Stories assigned to `mvp_id`, in story order.
    pub fn mvp_stories(&self, mvp_id: &str) -> Result<Vec<UserStory>> {
        Ok(self
            .list_stories()?
            .into_iter()
            .filter(|s| s.mvp_id.as_deref() == Some(mvp_id))
            .collect())
    }

    pub fn get_mvp_with_stories(&self, id: &str) -> Result<Option<MvpWithStories>> {
        let document = self.read_document()?;
        Ok(document
            .mvp(id)
            .cloned()
            .map(|mvp| MvpWithStories::derive(mvp, &document.stories)))
    }

    pub fn list_mvps_with_stories(&self) -> Result<Vec<MvpWithStories>> {
        let document = self.read_document()?;
        Ok(document
            .mvps
            .iter()
            .cloned()
            .map(|mvp| MvpWithStories::derive(mvp, &document.stories))
            .collect())
    }

    // ============================================================
    // Profile operations
    // ============================================================

    pub fn profile(&self) -> Result<Option<Profile>> {
        self.read_side_record(PROFILE_KEY)
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let raw = serde_json::to_string(profile)?;
        self.store.set(PROFILE_KEY, &raw)
    }

    pub fn clear_profile(&self) -> Result<()> {
        self.store.remove(PROFILE_KEY)
    }
}
