//! Generic document collection over one JSON file

use crate::error::Result;
use crate::store::id::{IdGenerator, UuidGenerator};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Fields every stored record carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record type that can live in a [`Collection`].
///
/// `Fields` is everything a caller supplies on creation; `Patch` is the
/// optional-field structure accepted by [`Collection::update`]. Neither can
/// express `id` or `createdAt`.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Top-level key holding the record array in the backing file
    const COLLECTION: &'static str;

    type Fields: Send;
    type Patch: Send;

    fn build(meta: RecordMeta, fields: Self::Fields) -> Self;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Shallow merge: present patch fields replace, absent ones are kept
    fn apply(&mut self, patch: Self::Patch);
}

struct Cache<T> {
    records: Vec<T>,
    loaded: bool,
}

/// File-backed collection of `T` records.
///
/// All access goes through one async mutex, so "load if stale, mutate,
/// persist" is a single serialization point per collection instance. Two
/// instances pointed at the same file do not coordinate: the last rename wins.
pub struct Collection<T: Document> {
    path: PathBuf,
    ids: Arc<dyn IdGenerator>,
    cache: Mutex<Cache<T>>,
}

impl<T: Document> Collection<T> {
    /// Open a collection at `path`, creating the parent directory.
    ///
    /// The file itself is not touched until the first access.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_id_generator(path, Arc::new(UuidGenerator)).await
    }

    /// Open a collection with a custom identifier source
    pub async fn with_id_generator(
        path: impl Into<PathBuf>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        Ok(Self {
            path,
            ids,
            cache: Mutex::new(Cache {
                records: Vec::new(),
                loaded: false,
            }),
        })
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every record, in on-disk order
    pub async fn all(&self) -> Result<Vec<T>> {
        let cache = self.lock().await?;
        Ok(cache.records.clone())
    }

    /// Find a record by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.find(|r| r.meta().id == id).await
    }

    /// First record matching `predicate`
    pub async fn find<P>(&self, predicate: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        let cache = self.lock().await?;
        Ok(cache.records.iter().find(|r| predicate(r)).cloned())
    }

    /// Every record matching `predicate`, in on-disk order
    pub async fn filter<P>(&self, predicate: P) -> Result<Vec<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        let cache = self.lock().await?;
        Ok(cache
            .records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a record with a fresh ID and both timestamps set to now
    pub async fn create(&self, fields: T::Fields) -> Result<T> {
        let mut cache = self.lock().await?;
        self.insert(&mut cache, fields).await
    }

    /// Create a record unless one already matches `exists`.
    ///
    /// The check and the append happen under one lock, so concurrent calls
    /// with the same key store at most one record. Returns `None` without
    /// touching the file when a match is found.
    pub async fn create_unless<P>(&self, exists: P, fields: T::Fields) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool + Send,
    {
        let mut cache = self.lock().await?;
        if cache.records.iter().any(|r| exists(r)) {
            return Ok(None);
        }
        self.insert(&mut cache, fields).await.map(Some)
    }

    /// Merge `patch` into the record with `id`.
    ///
    /// Returns `None` without touching the file when the record is missing.
    pub async fn update(&self, id: &str, patch: T::Patch) -> Result<Option<T>> {
        let mut cache = self.lock().await?;
        let Some(record) = cache.records.iter_mut().find(|r| r.meta().id == id) else {
            return Ok(None);
        };

        record.apply(patch);
        record.meta_mut().updated_at = Utc::now();
        let updated = record.clone();

        self.persist(&cache.records).await?;
        Ok(Some(updated))
    }

    /// Read-modify-write one record under the collection lock.
    ///
    /// `f` works on a copy; if it returns an error nothing is changed or
    /// persisted and the error is passed through. `id` and `createdAt` are
    /// restored after `f` runs.
    pub async fn update_with<F>(&self, id: &str, f: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let mut cache = self.lock().await?;
        let Some(index) = cache.records.iter().position(|r| r.meta().id == id) else {
            return Ok(None);
        };

        let original = cache.records[index].meta().clone();
        let mut candidate = cache.records[index].clone();
        f(&mut candidate)?;

        let meta = candidate.meta_mut();
        meta.id = original.id;
        meta.created_at = original.created_at;
        meta.updated_at = Utc::now();

        cache.records[index] = candidate.clone();
        self.persist(&cache.records).await?;
        Ok(Some(candidate))
    }

    /// Remove the record with `id`; the file is rewritten only on removal
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut cache = self.lock().await?;
        let Some(index) = cache.records.iter().position(|r| r.meta().id == id) else {
            return Ok(false);
        };

        cache.records.remove(index);
        self.persist(&cache.records).await?;

        tracing::debug!(collection = T::COLLECTION, id = %id, "Record deleted");
        Ok(true)
    }

    /// Replace the whole collection
    pub async fn replace_all(&self, records: Vec<T>) -> Result<()> {
        let mut cache = self.cache.lock().await;
        cache.records = records;
        cache.loaded = true;
        self.persist(&cache.records).await
    }

    /// Drop the cached records; the next access reloads the file
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        cache.records.clear();
        cache.loaded = false;
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    async fn insert(&self, cache: &mut Cache<T>, fields: T::Fields) -> Result<T> {
        let now = Utc::now();
        let record = T::build(
            RecordMeta {
                id: self.ids.new_id(),
                created_at: now,
                updated_at: now,
            },
            fields,
        );

        cache.records.push(record.clone());
        if let Err(e) = self.persist(&cache.records).await {
            cache.records.pop();
            return Err(e);
        }

        tracing::debug!(
            collection = T::COLLECTION,
            id = %record.meta().id,
            "Record created"
        );
        Ok(record)
    }

    /// Lock the cache, loading the backing file first if it is stale
    async fn lock(&self) -> Result<MutexGuard<'_, Cache<T>>> {
        let mut cache = self.cache.lock().await;
        if !cache.loaded {
            cache.records = self.load().await?;
            cache.loaded = true;
        }
        Ok(cache)
    }

    /// Read the backing file, healing it to an empty collection when it is
    /// missing, unreadable, or malformed
    async fn load(&self) -> Result<Vec<T>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match parse_records::<T>(&raw) {
                Ok(records) => return Ok(records),
                Err(reason) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        reason = %reason,
                        "Collection file is malformed, resetting to empty"
                    );
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Creating collection file");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Collection file is unreadable, resetting to empty"
                );
            }
        }

        let records = Vec::new();
        self.persist(&records).await?;
        Ok(records)
    }

    /// Write the full record set to `<path>.tmp`, then rename it into place
    async fn persist(&self, records: &[T]) -> Result<()> {
        let mut document = serde_json::Map::new();
        document.insert(T::COLLECTION.to_string(), serde_json::to_value(records)?);
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(document))?;

        let tmp = temp_path(&self.path);
        let written = match tokio::fs::write(&tmp, json).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to write collection file"
            );
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

/// Parse `{"<key>": [...]}` into records
fn parse_records<T: Document>(raw: &str) -> std::result::Result<Vec<T>, String> {
    let mut value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let items = value
        .as_object_mut()
        .and_then(|object| object.remove(T::COLLECTION))
        .ok_or_else(|| format!("missing top-level `{}` key", T::COLLECTION))?;
    if !items.is_array() {
        return Err(format!("`{}` is not an array", T::COLLECTION));
    }
    serde_json::from_value(items).map_err(|e| e.to_string())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        #[serde(flatten)]
        meta: RecordMeta,
        title: String,
        body: String,
        tags: Vec<String>,
    }

    struct NewNote {
        title: String,
        body: String,
        tags: Vec<String>,
    }

    #[derive(Default)]
    struct NotePatch {
        title: Option<String>,
        body: Option<String>,
        tags: Option<Vec<String>>,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "notes";
        type Fields = NewNote;
        type Patch = NotePatch;

        fn build(meta: RecordMeta, fields: NewNote) -> Self {
            Self {
                meta,
                title: fields.title,
                body: fields.body,
                tags: fields.tags,
            }
        }

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut RecordMeta {
            &mut self.meta
        }

        fn apply(&mut self, patch: NotePatch) {
            if let Some(title) = patch.title {
                self.title = title;
            }
            if let Some(body) = patch.body {
                self.body = body;
            }
            if let Some(tags) = patch.tags {
                self.tags = tags;
            }
        }
    }

    fn note(title: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            body: format!("Body of {}", title),
            tags: vec!["draft".to_string()],
        }
    }

    async fn make_collection() -> (Collection<Note>, TempDir) {
        let dir = TempDir::new().unwrap();
        let notes = Collection::open(dir.path().join("notes.json")).await.unwrap();
        (notes, dir)
    }

    fn read_file(path: &Path) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let (notes, _dir) = make_collection().await;

        let created = notes.create(note("first")).await.unwrap();
        assert!(!created.meta.id.is_empty());
        assert_eq!(created.meta.created_at, created.meta.updated_at);

        let fetched = notes.find_by_id(&created.meta.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let all = notes.all().await.unwrap();
        assert_eq!(all.iter().filter(|n| n.meta.id == created.meta.id).count(), 1);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let (notes, _dir) = make_collection().await;
        assert!(notes.find_by_id("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_all_preserves_insertion_order() {
        let (notes, _dir) = make_collection().await;
        for title in ["a", "b", "c"] {
            notes.create(note(title)).await.unwrap();
        }

        let titles: Vec<String> = notes.all().await.unwrap().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_find_and_filter() {
        let (notes, _dir) = make_collection().await;
        notes.create(note("alpha")).await.unwrap();
        notes.create(note("beta")).await.unwrap();
        notes.create(note("alphabet")).await.unwrap();

        let found = notes.find(|n| n.title == "beta").await.unwrap();
        assert_eq!(found.unwrap().title, "beta");

        let matching = notes.filter(|n| n.title.starts_with("alpha")).await.unwrap();
        assert_eq!(matching.len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_only_given_fields() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("first")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let patch = NotePatch {
            title: Some("renamed".to_string()),
            ..Default::default()
        };
        let updated = notes.update(&created.meta.id, patch).await.unwrap().unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.body, created.body);
        assert_eq!(updated.tags, created.tags);
        assert_eq!(updated.meta.id, created.meta.id);
        assert_eq!(updated.meta.created_at, created.meta.created_at);
        assert!(updated.meta.updated_at > created.meta.updated_at);

        let fetched = notes.find_by_id(&created.meta.id).await.unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn test_update_missing_has_no_side_effects() {
        let (notes, _dir) = make_collection().await;
        notes.create(note("first")).await.unwrap();
        let before = std::fs::read_to_string(notes.path()).unwrap();

        let result = notes
            .update("nonexistent", NotePatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(std::fs::read_to_string(notes.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_then_delete_again() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("doomed")).await.unwrap();

        assert!(notes.delete(&created.meta.id).await.unwrap());
        assert!(notes.all().await.unwrap().is_empty());
        assert!(!notes.delete(&created.meta.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_does_not_rewrite() {
        let (notes, _dir) = make_collection().await;
        notes.create(note("kept")).await.unwrap();
        let modified = std::fs::metadata(notes.path()).unwrap().modified().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!notes.delete("nonexistent").await.unwrap());
        let after = std::fs::metadata(notes.path()).unwrap().modified().unwrap();
        assert_eq!(modified, after);
    }

    #[tokio::test]
    async fn test_missing_file_is_created_on_first_access() {
        let (notes, _dir) = make_collection().await;
        assert!(!notes.path().exists());

        assert!(notes.all().await.unwrap().is_empty());
        assert_eq!(read_file(notes.path()), serde_json::json!({ "notes": [] }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_healed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let notes: Collection<Note> = Collection::open(&path).await.unwrap();
        assert!(notes.all().await.unwrap().is_empty());
        assert_eq!(read_file(&path), serde_json::json!({ "notes": [] }));

        let created = notes.create(note("after")).await.unwrap();
        assert_eq!(notes.all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_wrong_shape_is_treated_as_empty() {
        let shapes = [
            r#"[]"#,
            r#"{"other": []}"#,
            r#"{"notes": {"id": "x"}}"#,
            r#"{"notes": [{"unexpected": true}]}"#,
        ];

        for shape in shapes {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("notes.json");
            std::fs::write(&path, shape).unwrap();

            let notes: Collection<Note> = Collection::open(&path).await.unwrap();
            assert!(notes.all().await.unwrap().is_empty(), "shape: {}", shape);
            notes.create(note("fresh")).await.unwrap();
            assert_eq!(notes.all().await.unwrap().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_file_format_and_no_leftover_temp() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("first")).await.unwrap();

        let raw = std::fs::read_to_string(notes.path()).unwrap();
        assert!(raw.contains('\n'), "expected pretty-printed JSON");

        let json = read_file(notes.path());
        let items = json["notes"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], created.meta.id.as_str());
        assert!(items[0]["createdAt"].is_string());
        assert!(items[0]["updatedAt"].is_string());

        assert!(!temp_path(notes.path()).exists());
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");

        let created = {
            let notes: Collection<Note> = Collection::open(&path).await.unwrap();
            notes.create(note("durable")).await.unwrap()
        };

        let reopened: Collection<Note> = Collection::open(&path).await.unwrap();
        let fetched = reopened.find_by_id(&created.meta.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_invalidate_reloads_from_disk() {
        let (notes, _dir) = make_collection().await;
        notes.create(note("cached")).await.unwrap();

        std::fs::write(notes.path(), r#"{"notes": []}"#).unwrap();
        assert_eq!(notes.all().await.unwrap().len(), 1);

        notes.invalidate().await;
        assert!(notes.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("one")).await.unwrap();
        notes.create(note("two")).await.unwrap();

        notes.replace_all(vec![created.clone()]).await.unwrap();
        assert_eq!(notes.all().await.unwrap(), vec![created.clone()]);

        let reopened: Collection<Note> = Collection::open(notes.path()).await.unwrap();
        assert_eq!(reopened.all().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_update_with_applies_change() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("tagged")).await.unwrap();

        let updated = notes
            .update_with(&created.meta.id, |n| {
                n.tags.push("published".to_string());
                Ok(())
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.tags, vec!["draft", "published"]);
        assert_eq!(notes.find_by_id(&created.meta.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_with_rejection_leaves_record_untouched() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("guarded")).await.unwrap();

        let result = notes
            .update_with(&created.meta.id, |n| {
                n.title = "mutated".to_string();
                Err(Error::NoCapacity)
            })
            .await;
        assert!(matches!(result, Err(Error::NoCapacity)));

        let fetched = notes.find_by_id(&created.meta.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_with_cannot_change_identity() {
        let (notes, _dir) = make_collection().await;
        let created = notes.create(note("fixed")).await.unwrap();

        let updated = notes
            .update_with(&created.meta.id, |n| {
                n.meta.id = "hijacked".to_string();
                n.meta.created_at = Utc::now() + chrono::Duration::days(1);
                Ok(())
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.meta.id, created.meta.id);
        assert_eq!(updated.meta.created_at, created.meta.created_at);
        assert!(notes.find_by_id("hijacked").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persist_failure_is_propagated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let notes: Collection<Note> = Collection::open(&path).await.unwrap();
        let result = notes.create(note("lost")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let notes: Collection<Note> = Collection::open(&path).await.unwrap();
        notes.create(note("kept")).await.unwrap();

        std::fs::create_dir_all(temp_path(&path).join("blocker")).unwrap();
        let result = notes.create(note("lost")).await;
        assert!(matches!(result, Err(Error::Io(_))));

        let all = notes.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "kept");

        let reopened: Collection<Note> = Collection::open(&path).await.unwrap();
        assert_eq!(reopened.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_unless_skips_existing() {
        let dir = TempDir::new().unwrap();
        let notes: Collection<Note> = Collection::open(dir.path().join("notes.json")).await.unwrap();

        let first = notes
            .create_unless(|n| n.title == "a", note("a"))
            .await
            .unwrap();
        assert!(first.is_some());

        let second = notes
            .create_unless(|n| n.title == "a", note("a"))
            .await
            .unwrap();
        assert!(second.is_none());

        let other = notes
            .create_unless(|n| n.title == "b", note("b"))
            .await
            .unwrap();
        assert!(other.is_some());
        assert_eq!(notes.all().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_unless_stores_one() {
        let dir = TempDir::new().unwrap();
        let notes: Arc<Collection<Note>> =
            Arc::new(Collection::open(dir.path().join("notes.json")).await.unwrap());

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let notes = notes.clone();
                tokio::spawn(async move {
                    notes
                        .create_unless(|n| n.title == "same", note("same"))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let created = futures::future::join_all(tasks)
            .await
            .into_iter()
            .filter(|r| r.as_ref().unwrap().is_some())
            .count();
        assert_eq!(created, 1);

        let reopened: Collection<Note> =
            Collection::open(dir.path().join("notes.json")).await.unwrap();
        assert_eq!(reopened.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_leave_valid_file() {
        let (notes, _dir) = make_collection().await;
        let notes = Arc::new(notes);
        let created = notes.create(note("raced")).await.unwrap();

        let writers = ["writer-a", "writer-b"].map(|title| {
            let notes = notes.clone();
            let id = created.meta.id.clone();
            tokio::spawn(async move {
                let patch = NotePatch {
                    title: Some(title.to_string()),
                    ..Default::default()
                };
                notes.update(&id, patch).await.unwrap().unwrap()
            })
        });
        for writer in futures::future::join_all(writers).await {
            writer.unwrap();
        }

        let json = read_file(notes.path());
        let items = json["notes"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        let title = items[0]["title"].as_str().unwrap();
        assert!(title == "writer-a" || title == "writer-b");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_kept() {
        let (notes, _dir) = make_collection().await;
        let notes = Arc::new(notes);

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let notes = notes.clone();
                tokio::spawn(async move { notes.create(note(&format!("n{}", i))).await.unwrap() })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(notes.all().await.unwrap().len(), 32);
        let json = read_file(notes.path());
        assert_eq!(json["notes"].as_array().unwrap().len(), 32);
    }

    #[tokio::test]
    async fn test_separate_instances_lose_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.json");
        let first: Collection<Note> = Collection::open(&path).await.unwrap();
        let second: Collection<Note> = Collection::open(&path).await.unwrap();

        // Both instances cache the empty file before either writes.
        first.all().await.unwrap();
        second.all().await.unwrap();

        first.create(note("from-first")).await.unwrap();
        let survivor = second.create(note("from-second")).await.unwrap();

        let fresh: Collection<Note> = Collection::open(&path).await.unwrap();
        assert_eq!(fresh.all().await.unwrap(), vec![survivor]);
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/events.json"));
        assert_eq!(tmp, PathBuf::from("/data/events.json.tmp"));
    }
}
