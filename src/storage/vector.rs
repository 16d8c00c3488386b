//! Vector store adapter
//!
//! One JSON snapshot per collection under the index directory. The whole
//! collection lives in memory behind a `RwLock`; every mutation rewrites the
//! snapshot atomically (temp file in the same directory, then rename).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{HriError, Result};
use crate::model::Candidate;
use crate::search::embeddings::{Embedder, cosine_similarity};

pub const DEFAULT_COLLECTION: &str = "candidates";

const SNAPSHOT_FORMAT: u32 = 1;

/// A metadata value stored alongside an embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

impl MetadataValue {
    /// Case-insensitive equality; a list matches when any element does.
    #[must_use]
    pub fn matches(&self, wanted: &str) -> bool {
        match self {
            Self::Text(value) => value.eq_ignore_ascii_case(wanted),
            Self::List(values) => values.iter().any(|v| v.eq_ignore_ascii_case(wanted)),
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Every key must be present and match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    clauses: BTreeMap<String, String>,
}

impl MetadataFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn matches(&self, metadata: &Metadata) -> bool {
        self.clauses
            .iter()
            .all(|(key, wanted)| metadata.get(key).is_some_and(|v| v.matches(wanted)))
    }
}

/// Metadata stored with a candidate's embedding document.
#[must_use]
pub fn candidate_metadata(candidate: &Candidate) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("name".to_string(), MetadataValue::Text(candidate.name.clone()));
    metadata.insert(
        "skills".to_string(),
        MetadataValue::List(candidate.skills.clone()),
    );
    metadata.insert(
        "companies".to_string(),
        MetadataValue::List(
            candidate
                .work_experience
                .iter()
                .map(|exp| exp.company.clone())
                .collect(),
        ),
    );
    metadata
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub candidate_id: String,
    /// Cosine similarity clamped to [0, 1].
    pub similarity: f32,
}

/// Nearest-neighbour index over candidate embedding documents.
pub trait VectorIndex: Send + Sync {
    /// Embed `text` and store it for `candidate_id`, replacing any previous entry.
    fn upsert_embedding(&self, candidate_id: &str, text: &str, metadata: Metadata) -> Result<()>;

    /// Up to `k` hits with similarity above zero, best first, ties by id.
    fn query(&self, text: &str, filter: &MetadataFilter, k: usize) -> Result<Vec<VectorHit>>;

    /// Returns whether an entry was removed.
    fn delete(&self, candidate_id: &str) -> Result<bool>;

    fn contains(&self, candidate_id: &str) -> Result<bool>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every entry.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    embedding: Vec<f32>,
    #[serde(default)]
    metadata: Metadata,
    document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    format: u32,
    collection: String,
    model: String,
    dims: usize,
    entries: BTreeMap<String, Entry>,
}

/// File-backed collection.
pub struct VectorStore {
    path: Option<PathBuf>,
    embedder: Arc<dyn Embedder>,
    snapshot: RwLock<Snapshot>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("path", &self.path)
            .field("model", &self.embedder.model_id())
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Open `collection` under `dir`, creating the directory and an empty
    /// snapshot when absent.
    pub fn open(
        dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        validate_collection_name(collection)?;
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| HriError::vector(format!("cannot create {}: {e}", dir.display())))?;
        let path = dir.join(format!("{collection}.json"));

        if path.is_file() {
            let snapshot = load_snapshot(&path)?;
            check_compatible(&snapshot, collection, embedder.as_ref())?;
            info!(
                path = %path.display(),
                entries = snapshot.entries.len(),
                "reusing vector collection"
            );
            return Ok(Self {
                path: Some(path),
                embedder,
                snapshot: RwLock::new(snapshot),
            });
        }

        let store = Self {
            path: Some(path),
            snapshot: RwLock::new(empty_snapshot(collection, embedder.as_ref())),
            embedder,
        };
        store.persist(&store.snapshot.read())?;
        info!(collection, "created vector collection");
        Ok(store)
    }

    /// Open a collection whose index directory must already exist.
    pub fn open_existing(
        dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(HriError::MissingConfig(format!(
                "vector index not found at {} (run `hri init` first)",
                dir.display()
            )));
        }
        Self::open(dir, collection, embedder)
    }

    /// Start `collection` over with an empty snapshot, discarding whatever
    /// was on disk, including a snapshot that no longer loads.
    pub fn recreate(
        dir: impl AsRef<Path>,
        collection: &str,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        validate_collection_name(collection)?;
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(HriError::MissingConfig(format!(
                "vector index not found at {} (run `hri init` first)",
                dir.display()
            )));
        }
        let store = Self {
            path: Some(dir.join(format!("{collection}.json"))),
            snapshot: RwLock::new(empty_snapshot(collection, embedder.as_ref())),
            embedder,
        };
        store.persist(&store.snapshot.read())?;
        info!(collection, "recreated vector collection");
        Ok(store)
    }

    /// Collection that is never written to disk.
    #[must_use]
    pub fn in_memory(collection: &str, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            path: None,
            snapshot: RwLock::new(empty_snapshot(collection, embedder.as_ref())),
            embedder,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The stored embedding document for a candidate.
    #[cfg(test)]
    fn document(&self, candidate_id: &str) -> Option<String> {
        self.snapshot
            .read()
            .entries
            .get(candidate_id)
            .map(|entry| entry.document.clone())
    }

    fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let json = serde_json::to_vec(snapshot)?;
        let write = || -> std::io::Result<()> {
            let mut temp = tempfile::NamedTempFile::new_in(dir)?;
            temp.write_all(&json)?;
            temp.as_file().sync_all()?;
            temp.persist(path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| HriError::vector(format!("cannot write {}: {e}", path.display())))
    }
}

impl VectorIndex for VectorStore {
    fn upsert_embedding(&self, candidate_id: &str, text: &str, metadata: Metadata) -> Result<()> {
        let embedding = self.embedder.embed(text);
        let mut snapshot = self.snapshot.write();
        let previous = snapshot.entries.insert(
            candidate_id.to_string(),
            Entry {
                embedding,
                metadata,
                document: text.to_string(),
            },
        );
        if let Err(err) = self.persist(&snapshot) {
            match previous {
                Some(entry) => snapshot.entries.insert(candidate_id.to_string(), entry),
                None => snapshot.entries.remove(candidate_id),
            };
            return Err(err);
        }
        debug!(candidate_id, "upserted embedding");
        Ok(())
    }

    fn query(&self, text: &str, filter: &MetadataFilter, k: usize) -> Result<Vec<VectorHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let wanted = self.embedder.embed(text);
        let snapshot = self.snapshot.read();
        let mut hits: Vec<VectorHit> = snapshot
            .entries
            .iter()
            .filter(|(_, entry)| filter.matches(&entry.metadata))
            .filter_map(|(id, entry)| {
                let similarity = cosine_similarity(&wanted, &entry.embedding).clamp(0.0, 1.0);
                (similarity > 0.0).then(|| VectorHit {
                    candidate_id: id.clone(),
                    similarity,
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn delete(&self, candidate_id: &str) -> Result<bool> {
        let mut snapshot = self.snapshot.write();
        let Some(previous) = snapshot.entries.remove(candidate_id) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&snapshot) {
            snapshot.entries.insert(candidate_id.to_string(), previous);
            return Err(err);
        }
        Ok(true)
    }

    fn contains(&self, candidate_id: &str) -> Result<bool> {
        Ok(self.snapshot.read().entries.contains_key(candidate_id))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.snapshot.read().entries.len())
    }

    fn clear(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write();
        let previous = std::mem::take(&mut snapshot.entries);
        if let Err(err) = self.persist(&snapshot) {
            snapshot.entries = previous;
            return Err(err);
        }
        Ok(())
    }
}

/// Stand-in used when the collection could not be opened; every call fails
/// with a vector `StoreUnavailable` so searches degrade instead of aborting.
#[derive(Debug, Clone)]
pub struct UnavailableIndex {
    reason: String,
}

impl UnavailableIndex {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(HriError::vector(self.reason.clone()))
    }
}

impl VectorIndex for UnavailableIndex {
    fn upsert_embedding(&self, _: &str, _: &str, _: Metadata) -> Result<()> {
        self.fail()
    }

    fn query(&self, _: &str, _: &MetadataFilter, _: usize) -> Result<Vec<VectorHit>> {
        self.fail()
    }

    fn delete(&self, _: &str) -> Result<bool> {
        self.fail()
    }

    fn contains(&self, _: &str) -> Result<bool> {
        self.fail()
    }

    fn len(&self) -> Result<usize> {
        self.fail()
    }

    fn clear(&self) -> Result<()> {
        self.fail()
    }
}

fn validate_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(HriError::Config(format!(
            "invalid collection name {name:?}: use letters, digits, '_' or '-'"
        )))
    }
}

fn empty_snapshot(collection: &str, embedder: &dyn Embedder) -> Snapshot {
    Snapshot {
        format: SNAPSHOT_FORMAT,
        collection: collection.to_string(),
        model: embedder.model_id(),
        dims: embedder.dims(),
        entries: BTreeMap::new(),
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path)
        .map_err(|e| HriError::vector(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| HriError::vector(format!("corrupt snapshot {}: {e}", path.display())))
}

fn check_compatible(snapshot: &Snapshot, collection: &str, embedder: &dyn Embedder) -> Result<()> {
    if snapshot.format != SNAPSHOT_FORMAT {
        return Err(HriError::vector(format!(
            "unsupported snapshot format {}",
            snapshot.format
        )));
    }
    if snapshot.collection != collection {
        return Err(HriError::vector(format!(
            "snapshot holds collection {:?}, expected {collection:?}",
            snapshot.collection
        )));
    }
    if snapshot.dims != embedder.dims() || snapshot.model != embedder.model_id() {
        return Err(HriError::vector(format!(
            "collection built with {} ({} dims), configured embedder is {} ({} dims); run `hri reindex`",
            snapshot.model,
            snapshot.dims,
            embedder.model_id(),
            embedder.dims()
        )));
    }
    if let Some((id, _)) = snapshot
        .entries
        .iter()
        .find(|(_, entry)| entry.embedding.len() != snapshot.dims)
    {
        return Err(HriError::vector(format!(
            "entry {id} has the wrong embedding length"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::search::embeddings::HashEmbedder;

    fn embedder() -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(128))
    }

    fn meta(skills: &[&str]) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            "skills".to_string(),
            MetadataValue::List(skills.iter().map(ToString::to_string).collect()),
        );
        metadata
    }

    #[test]
    fn test_open_creates_then_reuses_collection() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");
        {
            let store = VectorStore::open(&index_dir, "candidates", embedder()).unwrap();
            store
                .upsert_embedding("a", "cloud infrastructure", Metadata::new())
                .unwrap();
        }
        assert!(index_dir.join("candidates.json").is_file());
        let reopened = VectorStore::open(&index_dir, "candidates", embedder()).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
        assert_eq!(reopened.document("a").as_deref(), Some("cloud infrastructure"));
    }

    #[test]
    fn test_open_existing_requires_directory() {
        let dir = tempdir().unwrap();
        let result = VectorStore::open_existing(dir.path().join("missing"), "c", embedder());
        assert!(matches!(result, Err(HriError::MissingConfig(_))));
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let dir = tempdir().unwrap();
        VectorStore::open(dir.path(), "candidates", embedder()).unwrap();
        let err = VectorStore::open(dir.path(), "candidates", Arc::new(HashEmbedder::new(64)))
            .unwrap_err();
        assert!(err.is_vector_unavailable());
    }

    #[test]
    fn test_corrupt_snapshot_is_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("candidates.json"), b"{not json").unwrap();
        let err = VectorStore::open(dir.path(), "candidates", embedder()).unwrap_err();
        assert!(err.is_vector_unavailable());
    }

    #[test]
    fn test_recreate_replaces_unreadable_snapshot() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("candidates.json"), b"{not json").unwrap();
        let store = VectorStore::recreate(dir.path(), "candidates", embedder()).unwrap();
        store.upsert_embedding("a", "cloud", Metadata::new()).unwrap();

        let reopened = VectorStore::open(dir.path(), "candidates", embedder()).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[test]
    fn test_recreate_accepts_new_dimensions() {
        let dir = tempdir().unwrap();
        VectorStore::open(dir.path(), "candidates", embedder()).unwrap();
        let smaller: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(64));
        VectorStore::recreate(dir.path(), "candidates", Arc::clone(&smaller)).unwrap();
        assert!(VectorStore::open(dir.path(), "candidates", smaller).is_ok());
    }

    #[test]
    fn test_invalid_collection_name() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            VectorStore::open(dir.path(), "../escape", embedder()),
            Err(HriError::Config(_))
        ));
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let store = VectorStore::in_memory("c", embedder());
        store
            .upsert_embedding("cloud", "built scalable cloud infrastructure", Metadata::new())
            .unwrap();
        store
            .upsert_embedding("chef", "pastry chef at a bakery", Metadata::new())
            .unwrap();
        let hits = store
            .query("cloud infrastructure", &MetadataFilter::new(), 10)
            .unwrap();
        assert_eq!(hits[0].candidate_id, "cloud");
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.similarity) && h.similarity > 0.0));
    }

    #[test]
    fn test_query_respects_k_and_filter() {
        let store = VectorStore::in_memory("c", embedder());
        store
            .upsert_embedding("a", "rust engineer", meta(&["Rust"]))
            .unwrap();
        store
            .upsert_embedding("b", "rust engineer", meta(&["Go"]))
            .unwrap();
        let filter = MetadataFilter::new().with("skills", "rust");
        let hits = store.query("rust engineer", &filter, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].candidate_id, "a");

        let top = store.query("rust engineer", &MetadataFilter::new(), 1).unwrap();
        assert_eq!(top.len(), 1);
        // Equal similarity resolves by id.
        assert_eq!(top[0].candidate_id, "a");
        assert!(store.query("rust", &MetadataFilter::new(), 0).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_and_delete_removes() {
        let store = VectorStore::in_memory("c", embedder());
        store.upsert_embedding("a", "first", Metadata::new()).unwrap();
        store.upsert_embedding("a", "second", Metadata::new()).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.document("a").as_deref(), Some("second"));
        assert!(store.delete("a").unwrap());
        assert!(!store.contains("a").unwrap());
        assert!(!store.delete("a").unwrap());
    }

    #[test]
    fn test_unavailable_index_reports_vector_error() {
        let index = UnavailableIndex::new("offline");
        assert!(index.len().unwrap_err().is_vector_unavailable());
        assert!(index
            .query("x", &MetadataFilter::new(), 3)
            .unwrap_err()
            .is_vector_unavailable());
    }

    #[test]
    fn test_metadata_value_matching() {
        assert!(MetadataValue::Text("Acme".into()).matches("acme"));
        assert!(MetadataValue::List(vec!["Go".into(), "Rust".into()]).matches("RUST"));
        assert!(!MetadataValue::List(vec![]).matches("rust"));
    }
}
