use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::config::{CONFIG_FILENAME, Config};
use crate::error::{HriError, Result};
use crate::ingest::Ingestor;
use crate::search::{Embedder, HashEmbedder, HybridSearch};
use crate::storage::{CandidateLocks, Database, UnavailableIndex, VectorIndex, VectorStore};
use crate::tools::Tools;

pub const ROOT_DIRNAME: &str = ".hri";

pub struct AppContext {
    pub hri_root: PathBuf,
    pub config_path: PathBuf,
    pub config: Config,
    pub db: Arc<Database>,
    pub vectors: Arc<dyn VectorIndex>,
    pub locks: Arc<CandidateLocks>,
    pub search: Arc<HybridSearch>,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let hri_root = find_hri_root()?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| default_config_path(&hri_root));
        let config = Config::load(cli.config.as_deref(), &hri_root)?;
        let mut ctx = Self::open(hri_root, config)?;
        ctx.config_path = config_path;
        ctx.robot_mode = cli.robot || ctx.config.robot.enabled;
        ctx.verbosity = cli.verbose;
        Ok(ctx)
    }

    /// Open both stores under `hri_root`. The structured store must exist;
    /// a broken vector index degrades to semantic-less search.
    pub fn open(hri_root: PathBuf, config: Config) -> Result<Self> {
        let db = Arc::new(Database::open_existing(
            config.storage.database_path(&hri_root),
        )?);

        let embedder: Arc<dyn Embedder> =
            Arc::new(HashEmbedder::new(config.embedding.dims as usize));
        let vectors: Arc<dyn VectorIndex> = match VectorStore::open_existing(
            config.storage.vector_path(&hri_root),
            &config.storage.collection,
            embedder,
        ) {
            Ok(store) => Arc::new(store),
            Err(err @ (HriError::MissingConfig(_) | HriError::Config(_))) => return Err(err),
            Err(err) => {
                warn!(error = %err, "vector index unavailable; semantic search disabled");
                Arc::new(UnavailableIndex::new(err.to_string()))
            }
        };

        let search = Arc::new(HybridSearch::with_settings(
            Arc::clone(&db),
            Arc::clone(&vectors),
            config.search.settings(),
        ));

        Ok(Self {
            config_path: default_config_path(&hri_root),
            hri_root,
            config,
            db,
            vectors,
            locks: Arc::new(CandidateLocks::new()),
            search,
            robot_mode: false,
            verbosity: 0,
        })
    }

    #[must_use]
    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            Arc::clone(&self.db),
            Arc::clone(&self.vectors),
            Arc::clone(&self.locks),
        )
    }

    /// An ingestor writing to a freshly recreated vector collection, for
    /// rebuilding an index that is stale, corrupt or built with other
    /// embedding settings.
    pub fn reindexer(&self) -> Result<Ingestor> {
        let vectors = VectorStore::recreate(
            self.config.storage.vector_path(&self.hri_root),
            &self.config.storage.collection,
            self.embedder(),
        )?;
        Ok(Ingestor::new(
            Arc::clone(&self.db),
            Arc::new(vectors),
            Arc::clone(&self.locks),
        ))
    }

    fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::new(HashEmbedder::new(self.config.embedding.dims as usize))
    }

    #[must_use]
    pub fn tools(&self) -> Tools {
        Tools::new(Arc::clone(&self.search), Arc::clone(&self.db))
            .with_timeout(self.config.search.timeout())
    }
}

/// `HRI_ROOT`, else the nearest `.hri` above the working directory, else
/// the per-user data directory.
pub fn find_hri_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("HRI_ROOT") {
        return Ok(PathBuf::from(root));
    }
    let cwd = std::env::current_dir()?;
    if let Some(found) = find_upwards(&cwd, ROOT_DIRNAME) {
        return Ok(found);
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| HriError::MissingConfig("data directory not found".to_string()))?;
    Ok(data_dir.join("hri"))
}

fn default_config_path(hri_root: &Path) -> PathBuf {
    hri_root.join(CONFIG_FILENAME)
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_dir())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_find_upwards_walks_parents() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(ROOT_DIRNAME)).unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            find_upwards(&nested, ROOT_DIRNAME),
            Some(dir.path().join(ROOT_DIRNAME))
        );
        assert_eq!(find_upwards(&nested, ".nothing-here"), None);
    }

    #[test]
    fn test_open_requires_initialized_root() {
        let dir = tempdir().unwrap();
        let result = AppContext::open(dir.path().to_path_buf(), Config::default());
        assert!(matches!(result, Err(HriError::MissingConfig(_))));
    }

    #[test]
    fn test_corrupt_index_degrades() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        Database::open(config.storage.database_path(dir.path())).unwrap();
        let index = config.storage.vector_path(dir.path());
        std::fs::create_dir_all(&index).unwrap();
        std::fs::write(index.join("candidates.json"), "{ not json").unwrap();

        let ctx = AppContext::open(dir.path().to_path_buf(), config).unwrap();
        assert!(ctx.vectors.len().is_err());
    }

    #[test]
    fn test_reindex_repairs_corrupt_index() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let db = Database::open(config.storage.database_path(dir.path())).unwrap();
        db.upsert_candidate(&crate::test_utils::fixtures::alice()).unwrap();
        drop(db);
        let index = config.storage.vector_path(dir.path());
        std::fs::create_dir_all(&index).unwrap();
        std::fs::write(index.join("candidates.json"), "{ not json").unwrap();

        let ctx = AppContext::open(dir.path().to_path_buf(), config.clone()).unwrap();
        assert!(ctx.ingestor().reindex(|_, _| {}).is_err());
        let report = ctx.reindexer().unwrap().reindex(|_, _| {}).unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.failed, 0);

        let reopened = AppContext::open(dir.path().to_path_buf(), config).unwrap();
        assert_eq!(reopened.vectors.len().unwrap(), 1);
    }
}
