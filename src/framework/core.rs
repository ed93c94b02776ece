//! # Core Store Framework
//!
//! This module defines the generic building blocks for file-backed resource collections.
//!
//! ## Key Types
//!
//! - [`StoreEntity`]: The trait that all stored resource types must implement.
//! - [`ResourceStore`]: The generic keyed collection that owns entities and persists them.
//! - [`StoreState`]: Whether the last load succeeded or degraded to an empty collection.
//! - [`StoreLimits`]: Size limits passed in from configuration.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{StoreError, StorePath};

// =============================================================================
// 1. THE ABSTRACTION
// =============================================================================

/// Trait that any resource entity must implement to be managed by [`ResourceStore`].
///
/// # Architecture Note
/// The store knows nothing about products. It only needs to know how to key an
/// entity and how to turn one entry of the data file into an entity and back.
/// Everything else (validation, derived values) belongs to the entity.
///
/// The on-disk document is `{ "<COLLECTION>": [entry, ...] }`.
pub trait StoreEntity: Clone + Debug {
    /// The unique identifier. `Ord` keeps iteration deterministic.
    type Id: Ord + Clone + Display + Debug;

    /// Error returned when a single entry cannot be decoded.
    type Error: std::error::Error;

    /// Key of the top-level array in the data file.
    const COLLECTION: &'static str;

    /// Older spellings of [`StoreEntity::COLLECTION`] still accepted on load.
    const COLLECTION_ALIASES: &'static [&'static str] = &[];

    fn id(&self) -> &Self::Id;

    /// Produces one entry of the data file.
    fn encode(&self) -> Value;

    /// Rebuilds an entity from one entry of the data file.
    fn decode(value: Value) -> Result<Self, Self::Error>;
}

// =============================================================================
// 2. LOAD STATE & LIMITS
// =============================================================================

/// Outcome of the most recent load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// The data file was read (or did not exist yet).
    Loaded,
    /// The data file could not be used; the store started empty but stays writable
    /// unless the location itself was rejected.
    Unavailable,
}

/// Limits applied when reading and writing the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_file_size: u64,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
        }
    }
}

/// Counts from the most recent load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

// =============================================================================
// 3. THE GENERIC STORE
// =============================================================================

/// A keyed collection of entities mirrored to one JSON file.
///
/// # Persistence Model
/// Every successful mutation rewrites the whole file (write to a temporary file,
/// then rename). If the write fails the mutation is undone, so the in-memory view
/// never runs ahead of what a fresh load would see.
///
/// Loading is resilient: entries that fail [`StoreEntity::decode`] are skipped
/// with a warning, and a file that is structurally unusable leaves the store
/// empty in [`StoreState::Unavailable`] instead of failing.
#[derive(Debug)]
pub struct ResourceStore<T: StoreEntity> {
    items: BTreeMap<T::Id, T>,
    location: Result<StorePath, String>,
    limits: StoreLimits,
    state: StoreState,
    last_load: LoadSummary,
}

impl<T: StoreEntity> ResourceStore<T> {
    /// Opens a store and synchronously loads whatever the location holds.
    ///
    /// A rejected location is not fatal: the store is empty and `Unavailable`,
    /// and every save reports [`StoreError::PathRejected`].
    pub fn open(location: Result<StorePath, StoreError>, limits: StoreLimits) -> Self {
        let entity_type = entity_type::<T>();
        let location = location.map_err(|e| {
            warn!(entity_type, error = %e, "Data file location rejected, starting empty");
            match e {
                StoreError::PathRejected(reason) => reason,
                other => other.to_string(),
            }
        });
        let rejected = location.is_err();

        let mut store = Self {
            items: BTreeMap::new(),
            location,
            limits,
            state: StoreState::Unavailable,
            last_load: LoadSummary::default(),
        };
        if !rejected {
            store.reload();
        }
        store
    }

    /// Replaces the in-memory contents with what is currently on disk.
    pub fn reload(&mut self) -> LoadSummary {
        let entity_type = entity_type::<T>();
        self.items.clear();
        self.last_load = LoadSummary::default();

        let entries = match self.read_entries() {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                info!(entity_type, "No data file yet, starting empty");
                self.state = StoreState::Loaded;
                return self.last_load;
            }
            Err(reason) => {
                warn!(entity_type, %reason, "Data file unusable, starting empty");
                self.state = StoreState::Unavailable;
                return self.last_load;
            }
        };

        for (index, entry) in entries.into_iter().enumerate() {
            match T::decode(entry) {
                Ok(item) => {
                    let id = item.id().clone();
                    if self.items.contains_key(&id) {
                        warn!(entity_type, index, %id, "Skipping duplicate entry");
                        self.last_load.skipped += 1;
                    } else {
                        self.items.insert(id, item);
                        self.last_load.loaded += 1;
                    }
                }
                Err(e) => {
                    warn!(entity_type, index, error = %e, "Skipping unreadable entry");
                    self.last_load.skipped += 1;
                }
            }
        }

        self.state = StoreState::Loaded;
        info!(
            entity_type,
            loaded = self.last_load.loaded,
            skipped = self.last_load.skipped,
            "Loaded"
        );
        self.last_load
    }

    /// Reads the raw entries. `Ok(None)` means there is no file yet.
    fn read_entries(&self) -> Result<Option<Vec<Value>>, String> {
        let path = self.location.as_ref().map_err(Clone::clone)?;
        path.verify().map_err(|e| e.to_string())?;
        let full_path = path.full_path();

        let meta = match std::fs::metadata(&full_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e).to_string()),
        };
        if !meta.is_file() {
            return Err("data file is not a regular file".to_string());
        }
        if meta.len() > self.limits.max_file_size {
            return Err(StoreError::FileTooLarge {
                size: meta.len(),
                limit: self.limits.max_file_size,
            }
            .to_string());
        }

        let bytes = std::fs::read(&full_path).map_err(|e| StoreError::Io(e).to_string())?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Some(Vec::new()));
        }

        let document: Value =
            serde_json::from_slice(&bytes).map_err(|e| format!("malformed JSON: {e}"))?;
        let Value::Object(mut document) = document else {
            return Err("top level is not an object".to_string());
        };

        let collection = std::iter::once(T::COLLECTION)
            .chain(T::COLLECTION_ALIASES.iter().copied())
            .find_map(|key| document.remove(key))
            .ok_or_else(|| format!("missing `{}` key", T::COLLECTION))?;

        match collection {
            Value::Array(entries) => Ok(Some(entries)),
            _ => Err(format!("`{}` is not a list", T::COLLECTION)),
        }
    }

    /// Writes the full collection to disk, replacing the previous content atomically.
    pub fn save(&self) -> Result<(), StoreError> {
        let entity_type = entity_type::<T>();
        let path = self
            .location
            .as_ref()
            .map_err(|reason| StoreError::PathRejected(reason.clone()))?;
        path.verify()?;

        let entries: Vec<Value> = self.items.values().map(T::encode).collect();
        let mut document = Map::new();
        document.insert(T::COLLECTION.to_string(), Value::Array(entries));
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))?;

        let size = bytes.len() as u64;
        if size > self.limits.max_file_size {
            return Err(StoreError::FileTooLarge {
                size,
                limit: self.limits.max_file_size,
            });
        }

        let full_path = path.full_path();
        write_atomic_file(&full_path, &bytes)?;
        debug!(entity_type, path = %full_path.display(), count = self.items.len(), "Saved");
        Ok(())
    }

    /// Inserts a new entity. Returns `Ok(false)` without touching anything if the id is taken.
    pub fn insert(&mut self, item: T) -> Result<bool, StoreError> {
        let entity_type = entity_type::<T>();
        let id = item.id().clone();
        if self.items.contains_key(&id) {
            debug!(entity_type, %id, "Create skipped, id already present");
            return Ok(false);
        }

        self.items.insert(id.clone(), item);
        if let Err(e) = self.save() {
            self.items.remove(&id);
            warn!(entity_type, %id, error = %e, "Create rolled back");
            return Err(e);
        }
        info!(entity_type, %id, size = self.items.len(), "Created");
        Ok(true)
    }

    /// Removes an entity. Returns `Ok(false)` if the id is absent.
    pub fn remove<Q>(&mut self, id: &Q) -> Result<bool, StoreError>
    where
        T::Id: Borrow<Q>,
        Q: Ord + Display + ?Sized,
    {
        let entity_type = entity_type::<T>();
        let Some(item) = self.items.remove(id) else {
            warn!(entity_type, %id, "Not found");
            return Ok(false);
        };

        if let Err(e) = self.save() {
            self.items.insert(item.id().clone(), item);
            warn!(entity_type, %id, error = %e, "Delete rolled back");
            return Err(e);
        }
        info!(entity_type, %id, size = self.items.len(), "Deleted");
        Ok(true)
    }

    /// Applies `apply` to the entity with `id` and persists the result.
    ///
    /// Returns `Ok(false)` if the id is absent. If `apply` fails or the save
    /// fails, the entity is restored to its previous value.
    pub fn update<Q, E>(
        &mut self,
        id: &Q,
        apply: impl FnOnce(&mut T) -> Result<(), E>,
    ) -> Result<bool, E>
    where
        T::Id: Borrow<Q>,
        Q: Ord + Display + ?Sized,
        E: From<StoreError>,
    {
        let entity_type = entity_type::<T>();
        let Some(item) = self.items.get_mut(id) else {
            warn!(entity_type, %id, "Not found");
            return Ok(false);
        };

        let previous = item.clone();
        if let Err(e) = apply(item) {
            *item = previous;
            warn!(entity_type, %id, "Update rejected");
            return Err(e);
        }

        if let Err(e) = self.save() {
            self.items.insert(previous.id().clone(), previous);
            warn!(entity_type, %id, error = %e, "Update rolled back");
            return Err(e.into());
        }
        info!(entity_type, %id, "Updated");
        Ok(true)
    }

    pub fn get<Q>(&self, id: &Q) -> Option<&T>
    where
        T::Id: Borrow<Q>,
        Q: Ord + Display + ?Sized,
    {
        let item = self.items.get(id);
        debug!(entity_type = entity_type::<T>(), %id, found = item.is_some(), "Get");
        item
    }

    /// All entities, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn last_load(&self) -> LoadSummary {
        self.last_load
    }

    /// The accepted data file location, if the guard let it through.
    pub fn location(&self) -> Option<&StorePath> {
        self.location.as_ref().ok()
    }
}

fn write_atomic_file(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let tmp = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|s| s.to_str()).unwrap_or("store"),
        std::process::id()
    ));
    let mut file = create_exclusive(&tmp)?;
    let written = (|| {
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)
    })();
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(StoreError::Io(e));
    }

    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Opens `tmp` with `create_new`, which never follows a link planted at that name.
///
/// An entry already there (a leftover from an interrupted save, or a link) is
/// unlinked and the exclusive create is retried once.
fn create_exclusive(tmp: &Path) -> std::io::Result<File> {
    let open = || OpenOptions::new().write(true).create_new(true).open(tmp);
    match open() {
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            std::fs::remove_file(tmp)?;
            open()
        }
        other => other,
    }
}

/// Short type name for log fields ("Product" rather than the full module path).
fn entity_type<T>() -> &'static str {
    std::any::type_name::<T>()
        .split("::")
        .last()
        .unwrap_or("Unknown")
}

// =============================================================================
// 4. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: u32,
        text: String,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("bad note: {0}")]
    struct NoteError(String);

    impl From<StoreError> for NoteError {
        fn from(e: StoreError) -> Self {
            NoteError(e.to_string())
        }
    }

    impl StoreEntity for Note {
        type Id = u32;
        type Error = NoteError;
        const COLLECTION: &'static str = "notes";
        const COLLECTION_ALIASES: &'static [&'static str] = &["notas"];

        fn id(&self) -> &u32 {
            &self.id
        }

        fn encode(&self) -> Value {
            serde_json::json!({ "id": self.id, "text": self.text })
        }

        fn decode(value: Value) -> Result<Self, NoteError> {
            serde_json::from_value(value).map_err(|e| NoteError(e.to_string()))
        }
    }

    fn note(id: u32, text: &str) -> Note {
        Note {
            id,
            text: text.to_string(),
        }
    }

    fn open_in(dir: &Path) -> ResourceStore<Note> {
        ResourceStore::open(StorePath::confined(dir, "notes.json"), StoreLimits::default())
    }

    // --- Tests ---

    #[test]
    fn test_missing_file_starts_empty_and_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(dir.path());
        assert!(store.is_empty());
        assert_eq!(store.state(), StoreState::Loaded);
        assert!(!dir.path().join("notes.json").exists());
    }

    #[test]
    fn test_insert_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(dir.path());
        assert!(store.insert(note(2, "two")).unwrap());
        assert!(store.insert(note(1, "one")).unwrap());

        let reopened = open_in(dir.path());
        assert_eq!(reopened.len(), 2);
        let ids: Vec<u32> = reopened.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(reopened.get(&1), Some(&note(1, "one")));
    }

    #[test]
    fn test_duplicate_insert_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(dir.path());
        assert!(store.insert(note(1, "first")).unwrap());
        assert!(!store.insert(note(1, "second")).unwrap());
        assert_eq!(store.get(&1).unwrap().text, "first");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(dir.path());
        store.insert(note(1, "one")).unwrap();

        let changed: Result<bool, NoteError> = store.update(&1, |n| {
            n.text = "uno".to_string();
            Ok(())
        });
        assert!(changed.unwrap());
        let missing: Result<bool, NoteError> = store.update(&9, |_| Ok(()));
        assert!(!missing.unwrap());

        assert!(store.remove(&1).unwrap());
        assert!(!store.remove(&1).unwrap());
        assert!(open_in(dir.path()).is_empty());
    }

    #[test]
    fn test_failed_update_restores_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(dir.path());
        store.insert(note(1, "one")).unwrap();

        let result = store.update(&1, |n| {
            n.text = "half-written".to_string();
            Err(NoteError("rejected".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.get(&1).unwrap().text, "one");
    }

    #[test]
    fn test_unreadable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"{"notes": [{"id": 1, "text": "ok"}, {"id": "x"}, {"id": 3, "text": "ok"}, {"id": 1, "text": "dup"}]}"#,
        )
        .unwrap();

        let store = open_in(dir.path());
        assert_eq!(store.state(), StoreState::Loaded);
        assert_eq!(store.len(), 2);
        assert_eq!(store.last_load(), LoadSummary { loaded: 2, skipped: 2 });
        assert_eq!(store.get(&1).unwrap().text, "ok");
    }

    #[test]
    fn test_collection_alias_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"{"notas": [{"id": 7, "text": "legacy"}]}"#,
        )
        .unwrap();
        assert_eq!(open_in(dir.path()).len(), 1);
    }

    #[test]
    fn test_structural_failures_degrade_to_empty() {
        for content in [
            "not json at all",
            "[1, 2, 3]",
            r#"{"other": []}"#,
            r#"{"notes": {"id": 1}}"#,
        ] {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("notes.json"), content).unwrap();
            let mut store = open_in(dir.path());
            assert!(store.is_empty(), "content: {content}");
            assert_eq!(store.state(), StoreState::Unavailable);

            // Still writable.
            assert!(store.insert(note(1, "fresh")).unwrap());
            assert_eq!(open_in(dir.path()).len(), 1);
        }
    }

    #[test]
    fn test_blank_file_is_an_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "  \n").unwrap();
        let store = open_in(dir.path());
        assert!(store.is_empty());
        assert_eq!(store.state(), StoreState::Loaded);
    }

    #[test]
    fn test_oversized_file_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("notes.json"),
            r#"{"notes": [{"id": 1, "text": "ok"}]}"#,
        )
        .unwrap();
        let store: ResourceStore<Note> = ResourceStore::open(
            StorePath::confined(dir.path(), "notes.json"),
            StoreLimits { max_file_size: 8 },
        );
        assert!(store.is_empty());
        assert_eq!(store.state(), StoreState::Unavailable);
    }

    #[test]
    fn test_rejected_location_fails_saves_and_keeps_memory_clean() {
        let dir = tempfile::tempdir().unwrap();
        let mut store: ResourceStore<Note> = ResourceStore::open(
            StorePath::confined(dir.path(), "../notes.json"),
            StoreLimits::default(),
        );
        assert_eq!(store.state(), StoreState::Unavailable);
        assert!(store.location().is_none());

        let err = store.insert(note(1, "one")).unwrap_err();
        assert!(matches!(err, StoreError::PathRejected(_)));
        assert!(store.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_does_not_follow_link_at_temporary_name() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let victim = outside.path().join("victim.txt");
        std::fs::write(&victim, "untouched").unwrap();
        let tmp_name = format!(".notes.json.tmp.{}", std::process::id());
        std::os::unix::fs::symlink(&victim, dir.path().join(tmp_name)).unwrap();

        let mut store = open_in(dir.path());
        assert!(store.insert(note(1, "one")).unwrap());

        assert_eq!(std::fs::read_to_string(&victim).unwrap(), "untouched");
        let data = std::fs::symlink_metadata(dir.path().join("notes.json")).unwrap();
        assert!(data.file_type().is_file());
        assert_eq!(open_in(dir.path()).len(), 1);
    }

    #[test]
    fn test_stale_temporary_file_does_not_block_saves() {
        let dir = tempfile::tempdir().unwrap();
        let tmp_name = format!(".notes.json.tmp.{}", std::process::id());
        std::fs::write(dir.path().join(&tmp_name), "half written").unwrap();

        let mut store = open_in(dir.path());
        assert!(store.insert(note(1, "one")).unwrap());
        assert!(!dir.path().join(tmp_name).exists());
        assert_eq!(open_in(dir.path()).len(), 1);
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_in(dir.path());
        store.insert(note(1, "one")).unwrap();
        store.insert(note(2, "two")).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["notes.json".to_string()]);
    }
}
