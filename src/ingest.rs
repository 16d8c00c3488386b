//! Ingestion: extraction output into both stores.
//!
//! The structured store is written first and is authoritative. A vector write
//! failure is logged and reported, never rolled back into the structured
//! store; `reindex` rebuilds the collection from structured records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{HriError, Result};
use crate::model::{Candidate, PartialDataWarning, RawCandidate};
use crate::storage::vector::candidate_metadata;
use crate::storage::{CandidateLocks, Database, VectorIndex};

/// A record that could not be ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejected {
    pub source: String,
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub ingested: Vec<String>,
    pub warnings: Vec<PartialDataWarning>,
    pub rejected: Vec<Rejected>,
    /// Candidates stored structurally whose embedding could not be written.
    pub vector_failures: Vec<String>,
}

impl IngestReport {
    fn absorb(&mut self, other: Self) {
        self.ingested.extend(other.ingested);
        self.warnings.extend(other.warnings);
        self.rejected.extend(other.rejected);
        self.vector_failures.extend(other.vector_failures);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub indexed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// The candidate was in the structured store or the vector collection.
    pub existed: bool,
    /// Why the embedding could not be removed; `reindex` clears it later.
    pub vector_failure: Option<String>,
}

/// Writes candidates to both stores under per-candidate locks.
pub struct Ingestor {
    db: Arc<Database>,
    vectors: Arc<dyn VectorIndex>,
    locks: Arc<CandidateLocks>,
}

impl Ingestor {
    pub fn new(
        db: Arc<Database>,
        vectors: Arc<dyn VectorIndex>,
        locks: Arc<CandidateLocks>,
    ) -> Self {
        Self { db, vectors, locks }
    }

    /// Every `.json` file under `path` (or `path` itself), sorted.
    pub fn discover(path: &Path) -> Result<Vec<PathBuf>> {
        if path.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }
        if !path.is_dir() {
            return Err(HriError::NotFound(format!("{} does not exist", path.display())));
        }
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let json = std::fs::read_to_string(path)?;
        self.ingest_json(&json, &path.display().to_string())
    }

    /// Ingest one raw record or an array of them. Malformed records are
    /// rejected individually; the rest are stored.
    pub fn ingest_json(&self, json: &str, source: &str) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for (index, parsed) in RawCandidate::parse_each(json)?.into_iter().enumerate() {
            let validated = parsed.and_then(Candidate::from_raw);
            let validated = match validated {
                Ok(validated) => validated,
                Err(HriError::Validation(reason)) => {
                    warn!(source, index, %reason, "rejected record");
                    report.rejected.push(Rejected {
                        source: source.to_string(),
                        index,
                        reason,
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };
            report.warnings.extend(validated.warnings);
            report.absorb(self.ingest_candidate(&validated.candidate)?);
        }
        info!(
            source,
            ingested = report.ingested.len(),
            rejected = report.rejected.len(),
            "ingested records"
        );
        Ok(report)
    }

    /// Upsert an already validated candidate into both stores.
    pub fn ingest_candidate(&self, candidate: &Candidate) -> Result<IngestReport> {
        let candidate = candidate.clone().validate()?;
        let mut report = IngestReport::default();
        self.locks.with_lock(&candidate.id, || -> Result<()> {
            self.db.upsert_candidate(&candidate)?;
            if let Err(err) = self.vectors.upsert_embedding(
                &candidate.id,
                &candidate.embedding_text(),
                candidate_metadata(&candidate),
            ) {
                warn!(candidate_id = %candidate.id, error = %err, "embedding not stored");
                report.vector_failures.push(candidate.id.clone());
            }
            Ok(())
        })?;
        report.ingested.push(candidate.id);
        Ok(report)
    }

    /// Remove a candidate from both stores. A vector failure is reported,
    /// not raised, once the structured delete has committed.
    pub fn delete(&self, candidate_id: &str) -> Result<DeleteReport> {
        self.locks.with_lock(candidate_id, || {
            let stored = self.db.delete_candidate(candidate_id)?;
            Ok(match self.vectors.delete(candidate_id) {
                Ok(embedded) => DeleteReport {
                    existed: stored || embedded,
                    vector_failure: None,
                },
                Err(err) => {
                    warn!(candidate_id, error = %err, "embedding not removed");
                    DeleteReport {
                        existed: stored,
                        vector_failure: Some(err.to_string()),
                    }
                }
            })
        })
    }

    /// Rebuild every embedding from the structured store.
    pub fn reindex(&self, mut progress: impl FnMut(usize, usize)) -> Result<ReindexReport> {
        let ids = self.db.candidate_ids()?;
        self.vectors.clear()?;
        let mut report = ReindexReport::default();
        for (done, id) in ids.iter().enumerate() {
            self.locks.with_lock(id, || -> Result<()> {
                let Some(candidate) = self.db.get_by_id(id)? else {
                    return Ok(());
                };
                match self.vectors.upsert_embedding(
                    id,
                    &candidate.embedding_text(),
                    candidate_metadata(&candidate),
                ) {
                    Ok(()) => report.indexed += 1,
                    Err(err) => {
                        warn!(candidate_id = %id, error = %err, "reindex failed for candidate");
                        report.failed += 1;
                    }
                }
                Ok(())
            })?;
            progress(done + 1, ids.len());
        }
        info!(indexed = report.indexed, failed = report.failed, "reindex complete");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::search::embeddings::HashEmbedder;
    use crate::storage::vector::{UnavailableIndex, VectorStore};

    const TWO_RECORDS: &str = r#"[
        {
            "id": "c1",
            "candidate_name": "Alice",
            "skills": "Python, Kubernetes",
            "work_experience": [
                {"company": "Acme", "role": "Engineer",
                 "responsibilities": "built scalable cloud infrastructure",
                 "dates": "Jan 2020 - Present"}
            ]
        },
        {"id": "c2", "education": [{"institution": "MIT", "degree": "BSc"}]}
    ]"#;

    fn ingestor() -> (Ingestor, Arc<Database>, Arc<VectorStore>) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let vectors = Arc::new(VectorStore::in_memory("t", Arc::new(HashEmbedder::new(64))));
        let ingestor = Ingestor::new(
            Arc::clone(&db),
            Arc::clone(&vectors) as Arc<dyn VectorIndex>,
            Arc::new(CandidateLocks::new()),
        );
        (ingestor, db, vectors)
    }

    #[test]
    fn test_ingest_writes_both_stores_and_rejects_bad_records() {
        let (ingestor, db, vectors) = ingestor();
        let report = ingestor.ingest_json(TWO_RECORDS, "test").unwrap();
        assert_eq!(report.ingested, vec!["c1"]);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert!(db.get_by_id("c1").unwrap().is_some());
        assert!(vectors.contains("c1").unwrap());
        assert!(report.warnings.iter().any(|w| w.field == "certifications"));
    }

    #[test]
    fn test_reingest_is_idempotent() {
        let (ingestor, db, vectors) = ingestor();
        ingestor.ingest_json(TWO_RECORDS, "a").unwrap();
        ingestor.ingest_json(TWO_RECORDS, "b").unwrap();
        assert_eq!(db.count_candidates().unwrap(), 1);
        assert_eq!(vectors.len().unwrap(), 1);
    }

    #[test]
    fn test_delete_removes_from_both_stores() {
        let (ingestor, db, vectors) = ingestor();
        ingestor.ingest_json(TWO_RECORDS, "test").unwrap();
        assert!(ingestor.delete("c1").unwrap().existed);
        assert_eq!(db.references("c1").unwrap(), 0);
        assert!(!vectors.contains("c1").unwrap());
        assert!(!ingestor.delete("c1").unwrap().existed);
    }

    #[test]
    fn test_delete_with_vector_store_down_still_clears_records() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ingestor = Ingestor::new(
            Arc::clone(&db),
            Arc::new(UnavailableIndex::new("down")),
            Arc::new(CandidateLocks::new()),
        );
        ingestor.ingest_json(TWO_RECORDS, "test").unwrap();

        let report = ingestor.delete("c1").unwrap();
        assert!(report.existed);
        assert!(report.vector_failure.unwrap().contains("down"));
        assert!(db.get_by_id("c1").unwrap().is_none());
    }

    #[test]
    fn test_vector_failure_is_reported_not_fatal() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let ingestor = Ingestor::new(
            Arc::clone(&db),
            Arc::new(UnavailableIndex::new("down")),
            Arc::new(CandidateLocks::new()),
        );
        let report = ingestor.ingest_json(TWO_RECORDS, "test").unwrap();
        assert_eq!(report.vector_failures, vec!["c1"]);
        assert!(db.get_by_id("c1").unwrap().is_some());
    }

    #[test]
    fn test_reindex_rebuilds_collection() {
        let (ingestor, _db, vectors) = ingestor();
        ingestor.ingest_json(TWO_RECORDS, "test").unwrap();
        vectors.clear().unwrap();
        let mut calls = 0;
        let report = ingestor.reindex(|_, _| calls += 1).unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(calls, 1);
        assert!(vectors.contains("c1").unwrap());
    }

    #[test]
    fn test_not_json_is_an_error() {
        let (ingestor, _, _) = ingestor();
        assert!(matches!(
            ingestor.ingest_json("not json", "x"),
            Err(HriError::Validation(_))
        ));
    }

    #[test]
    fn test_discover_finds_json_files() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("nested/a.JSON"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = Ingestor::discover(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(Ingestor::discover(&dir.path().join("missing")).is_err());
    }
}
