use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::app::AppContext;
use crate::config::Config;
use crate::ingest::Ingestor;
use crate::model::{Candidate, ContactInfo, Education, WorkExperience};
use crate::search::{HashEmbedder, HybridSearch};
use crate::storage::vector::candidate_metadata;
use crate::storage::{CandidateLocks, Database, VectorIndex, VectorStore};
use crate::tools::Tools;

/// Platform engineer with cloud infrastructure experience.
#[must_use]
pub fn alice() -> Candidate {
    Candidate::new("c-alice", "Alice")
        .expect("valid candidate")
        .with_contact(ContactInfo {
            email: Some("alice@example.com".to_string()),
            ..ContactInfo::default()
        })
        .with_skills(["Python", "Kubernetes"])
        .with_experience(
            WorkExperience::new("Acme Inc.", "Platform Engineer")
                .with_responsibility("built scalable cloud infrastructure"),
        )
        .with_education(Education::new(
            "Massachusetts Institute of Technology",
            "BSc Computer Science",
        ))
        .validate()
        .expect("valid candidate")
}

/// Backend developer; shares Python with Alice.
#[must_use]
pub fn bob() -> Candidate {
    Candidate::new("c-bob", "Bob")
        .expect("valid candidate")
        .with_skills(["Python", "PostgreSQL", "Django"])
        .with_experience(
            WorkExperience::new("Globex Corporation", "Backend Developer")
                .with_responsibility("designed REST APIs for billing"),
        )
        .with_education(Education::new("Stanford University", "MSc Software Engineering"))
        .validate()
        .expect("valid candidate")
}

/// Designer with no overlap with the engineers.
#[must_use]
pub fn carol() -> Candidate {
    Candidate::new("c-carol", "Carol")
        .expect("valid candidate")
        .with_skills(["Figma", "User Research"])
        .with_experience(
            WorkExperience::new("Initech", "Product Designer")
                .with_responsibility("led mobile app redesign"),
        )
        .validate()
        .expect("valid candidate")
}

#[must_use]
pub fn sample_candidates() -> Vec<Candidate> {
    vec![alice(), bob(), carol()]
}

/// Two valid raw records and one without a name, as extraction emits them.
pub const SAMPLE_EXTRACTION_JSON: &str = r#"[
    {
        "id": "r-1",
        "candidate_name": "Dana Scully",
        "contact_info": {"email": "dana@example.com"},
        "skills": "Rust, Python, Kubernetes",
        "work_experience": [
            {"company": "Acme Inc.", "role": "Site Reliability Engineer",
             "responsibilities": ["ran cloud infrastructure", "on-call lead"],
             "dates": "Mar 2019 - Present"}
        ],
        "education": [{"institution": "MIT", "degree": "BSc Physics", "graduation_date": "2015"}]
    },
    {
        "id": "r-2",
        "candidate_name": "Fox Mulder",
        "skills": ["Java", "Spring"],
        "work_experience": [{"company": "Globex", "role": "Java Developer"}]
    },
    {"id": "r-3", "skills": "Nothing"}
]"#;

/// Both stores in memory, wired the way `AppContext` wires them.
pub struct MemoryStore {
    pub db: Arc<Database>,
    pub vectors: Arc<VectorStore>,
    pub search: Arc<HybridSearch>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().expect("in-memory database"));
        let vectors = Arc::new(VectorStore::in_memory(
            "candidates",
            Arc::new(HashEmbedder::default()),
        ));
        let search = Arc::new(HybridSearch::new(
            Arc::clone(&db),
            Arc::clone(&vectors) as Arc<dyn VectorIndex>,
        ));
        Self {
            db,
            vectors,
            search,
        }
    }

    #[must_use]
    pub fn with_candidates(candidates: &[Candidate]) -> Self {
        let store = Self::new();
        for candidate in candidates {
            store.insert(candidate);
        }
        store
    }

    pub fn insert(&self, candidate: &Candidate) {
        self.db.upsert_candidate(candidate).expect("upsert candidate");
        self.vectors
            .upsert_embedding(
                &candidate.id,
                &candidate.embedding_text(),
                candidate_metadata(candidate),
            )
            .expect("upsert embedding");
    }

    #[must_use]
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            Arc::clone(&self.db),
            Arc::clone(&self.vectors) as Arc<dyn VectorIndex>,
            Arc::new(CandidateLocks::new()),
        )
    }

    #[must_use]
    pub fn tools(&self) -> Tools {
        Tools::new(Arc::clone(&self.search), Arc::clone(&self.db))
    }
}

/// An initialized data root in a temporary directory.
pub struct TempRoot {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl Default for TempRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl TempRoot {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join(".hri");
        let config = Config::default();
        Database::open(config.storage.database_path(&root)).expect("create database");
        VectorStore::open(
            config.storage.vector_path(&root),
            &config.storage.collection,
            Arc::new(HashEmbedder::new(config.embedding.dims as usize)),
        )
        .expect("create index");
        Self { temp_dir, root }
    }

    /// Open a fresh context over the root, as a new process would.
    #[must_use]
    pub fn context(&self) -> AppContext {
        AppContext::open(self.root.clone(), Config::default()).expect("open context")
    }

    /// Write `content` under the temp dir (outside the data root).
    #[must_use]
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.temp_dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }
}
