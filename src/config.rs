use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HriError, Result};
use crate::search::hybrid::SearchSettings;
use crate::search::query::{MAX_LIMIT, Weights};

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub robot: RobotConfig,
}

impl Config {
    /// Defaults, then the global file and the data root's file (or only the
    /// explicit file), then `HRI_*` environment overrides. Validated last.
    pub fn load(explicit_path: Option<&Path>, hri_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("HRI_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                HriError::MissingConfig(format!("config file {} not found", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_project(hri_root)? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(&|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("hri").join(CONFIG_FILENAME))
    }

    fn load_project(hri_root: &Path) -> Result<Option<ConfigPatch>> {
        Self::load_patch(&hri_root.join(CONFIG_FILENAME))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| HriError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| HriError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.search {
            self.search.merge(patch);
        }
        if let Some(patch) = patch.embedding {
            self.embedding.merge(patch);
        }
        if let Some(patch) = patch.robot {
            self.robot.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<()> {
        if env_bool(env, "HRI_ROBOT").unwrap_or(false) {
            self.robot.enabled = true;
        }

        if let Some(value) = env_string(env, "HRI_DATABASE_PATH") {
            self.storage.database_path = value;
        }
        if let Some(value) = env_string(env, "HRI_VECTOR_PATH") {
            self.storage.vector_path = value;
        }
        if let Some(value) = env_string(env, "HRI_COLLECTION") {
            self.storage.collection = value;
        }

        if let Some(value) = env_u32(env, "HRI_SEARCH_DEFAULT_LIMIT")? {
            self.search.default_limit = value;
        }
        if let Some(value) = env_f32(env, "HRI_SEARCH_SEMANTIC_WEIGHT")? {
            self.search.semantic_weight = value;
        }
        if let Some(value) = env_f32(env, "HRI_SEARCH_FUZZY_WEIGHT")? {
            self.search.fuzzy_weight = value;
        }
        if let Some(value) = env_f32(env, "HRI_SEARCH_EXACT_WEIGHT")? {
            self.search.exact_weight = value;
        }
        if let Some(value) = env_f32(env, "HRI_SEARCH_FUZZY_THRESHOLD")? {
            self.search.fuzzy_threshold = value;
        }
        if let Some(value) = env_f32(env, "HRI_SEARCH_MIN_SEMANTIC_SIMILARITY")? {
            self.search.min_semantic_similarity = value;
        }
        if let Some(value) = env_u32(env, "HRI_SEARCH_CANDIDATE_FACTOR")? {
            self.search.candidate_factor = value;
        }
        if let Some(value) = env_u64(env, "HRI_SEARCH_TIMEOUT_MS")? {
            self.search.timeout_ms = value;
        }

        if let Some(value) = env_u32(env, "HRI_EMBEDDING_DIMS")? {
            self.embedding.dims = value;
        }

        Ok(())
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        Weights::new(search.semantic_weight, search.fuzzy_weight, search.exact_weight)
            .validate()
            .map_err(|e| HriError::Config(format!("search weights: {e}")))?;
        if !(0.0..=1.0).contains(&search.fuzzy_threshold) {
            return Err(HriError::Config(format!(
                "search.fuzzy_threshold must be within [0, 1], got {}",
                search.fuzzy_threshold
            )));
        }
        if !(0.0..=1.0).contains(&search.min_semantic_similarity) {
            return Err(HriError::Config(format!(
                "search.min_semantic_similarity must be within [0, 1], got {}",
                search.min_semantic_similarity
            )));
        }
        if search.default_limit == 0 || search.default_limit as usize > MAX_LIMIT {
            return Err(HriError::Config(format!(
                "search.default_limit must be within 1..={MAX_LIMIT}, got {}",
                search.default_limit
            )));
        }
        if search.candidate_factor == 0 {
            return Err(HriError::Config(
                "search.candidate_factor must be at least 1".to_string(),
            ));
        }
        if self.embedding.backend != "hash" {
            return Err(HriError::Config(format!(
                "unknown embedding backend {:?} (expected \"hash\")",
                self.embedding.backend
            )));
        }
        if self.embedding.dims == 0 {
            return Err(HriError::Config("embedding.dims must be positive".to_string()));
        }
        if self.storage.collection.is_empty() {
            return Err(HriError::Config("storage.collection is empty".to_string()));
        }
        Ok(())
    }

    /// The defaults as TOML, written by `hri init`.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default())
            .map_err(|e| HriError::Serialization(format!("render default config: {e}")))
    }
}

fn resolve(root: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file; relative paths are under the data root.
    #[serde(default)]
    pub database_path: String,
    /// Vector index directory; relative paths are under the data root.
    #[serde(default)]
    pub vector_path: String,
    #[serde(default)]
    pub collection: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "hri.db".to_string(),
            vector_path: "index".to_string(),
            collection: crate::storage::vector::DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.database_path {
            self.database_path = value;
        }
        if let Some(value) = patch.vector_path {
            self.vector_path = value;
        }
        if let Some(value) = patch.collection {
            self.collection = value;
        }
    }

    #[must_use]
    pub fn database_path(&self, hri_root: &Path) -> PathBuf {
        resolve(hri_root, &self.database_path)
    }

    #[must_use]
    pub fn vector_path(&self, hri_root: &Path) -> PathBuf {
        resolve(hri_root, &self.vector_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_limit: u32,
    #[serde(default)]
    pub semantic_weight: f32,
    #[serde(default)]
    pub fuzzy_weight: f32,
    #[serde(default)]
    pub exact_weight: f32,
    #[serde(default)]
    pub fuzzy_threshold: f32,
    #[serde(default)]
    pub min_semantic_similarity: f32,
    #[serde(default)]
    pub candidate_factor: u32,
    /// 0 disables the deadline.
    #[serde(default)]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let settings = SearchSettings::default();
        Self {
            default_limit: 10,
            semantic_weight: settings.weights.semantic_weight,
            fuzzy_weight: settings.weights.fuzzy_weight,
            exact_weight: settings.weights.exact_weight,
            fuzzy_threshold: settings.fuzzy_threshold,
            min_semantic_similarity: settings.min_semantic_similarity,
            candidate_factor: 3,
            timeout_ms: 0,
        }
    }
}

impl SearchConfig {
    fn merge(&mut self, patch: SearchPatch) {
        if let Some(value) = patch.default_limit {
            self.default_limit = value;
        }
        if let Some(value) = patch.semantic_weight {
            self.semantic_weight = value;
        }
        if let Some(value) = patch.fuzzy_weight {
            self.fuzzy_weight = value;
        }
        if let Some(value) = patch.exact_weight {
            self.exact_weight = value;
        }
        if let Some(value) = patch.fuzzy_threshold {
            self.fuzzy_threshold = value;
        }
        if let Some(value) = patch.min_semantic_similarity {
            self.min_semantic_similarity = value;
        }
        if let Some(value) = patch.candidate_factor {
            self.candidate_factor = value;
        }
        if let Some(value) = patch.timeout_ms {
            self.timeout_ms = value;
        }
    }

    #[must_use]
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            default_limit: self.default_limit as usize,
            weights: Weights::new(self.semantic_weight, self.fuzzy_weight, self.exact_weight),
            fuzzy_threshold: self.fuzzy_threshold,
            min_semantic_similarity: self.min_semantic_similarity,
            candidate_factor: self.candidate_factor as usize,
        }
    }

    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub dims: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: "hash".to_string(),
            dims: 384,
        }
    }
}

impl EmbeddingConfig {
    fn merge(&mut self, patch: EmbeddingPatch) {
        if let Some(value) = patch.backend {
            self.backend = value;
        }
        if let Some(value) = patch.dims {
            self.dims = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Behave as if `--robot` were passed.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub include_metadata: bool,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            include_metadata: true,
        }
    }
}

impl RobotConfig {
    fn merge(&mut self, patch: RobotPatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.include_metadata {
            self.include_metadata = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub search: Option<SearchPatch>,
    pub embedding: Option<EmbeddingPatch>,
    pub robot: Option<RobotPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub database_path: Option<String>,
    pub vector_path: Option<String>,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchPatch {
    pub default_limit: Option<u32>,
    pub semantic_weight: Option<f32>,
    pub fuzzy_weight: Option<f32>,
    pub exact_weight: Option<f32>,
    pub fuzzy_threshold: Option<f32>,
    pub min_semantic_similarity: Option<f32>,
    pub candidate_factor: Option<u32>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingPatch {
    pub backend: Option<String>,
    pub dims: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RobotPatch {
    pub enabled: Option<bool>,
    pub include_metadata: Option<bool>,
}

type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn env_string(env: EnvLookup<'_>, key: &str) -> Option<String> {
    env(key)
}

fn env_bool(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    env(key).map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u32(env: EnvLookup<'_>, key: &str) -> Result<Option<u32>> {
    match env(key) {
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|err| HriError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn env_u64(env: EnvLookup<'_>, key: &str) -> Result<Option<u64>> {
    match env(key) {
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|err| HriError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn env_f32(env: EnvLookup<'_>, key: &str) -> Result<Option<f32>> {
    match env(key) {
        Some(value) => value
            .parse::<f32>()
            .map(Some)
            .map_err(|err| HriError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.search.settings(), SearchSettings::default());
        assert_eq!(config.search.timeout(), None);
    }

    #[test]
    fn test_explicit_file_patches_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[search]\nfuzzy_threshold = 0.7\n\n[storage]\ncollection = \"resumes\"\n",
        )
        .unwrap();
        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert!((config.search.fuzzy_threshold - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.storage.collection, "resumes");
        // Untouched fields keep their defaults.
        assert!((config.search.semantic_weight - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.storage.database_path, "hri.db");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")), dir.path());
        assert!(matches!(result, Err(HriError::MissingConfig(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[search\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path), dir.path()),
            Err(HriError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let env = env_from(&[
            ("HRI_ROBOT", "1"),
            ("HRI_COLLECTION", "other"),
            ("HRI_SEARCH_DEFAULT_LIMIT", "25"),
            ("HRI_SEARCH_TIMEOUT_MS", "1500"),
            ("HRI_EMBEDDING_DIMS", "128"),
        ]);
        config.apply_env_overrides(&env).unwrap();
        assert!(config.robot.enabled);
        assert_eq!(config.storage.collection, "other");
        assert_eq!(config.search.default_limit, 25);
        assert_eq!(config.search.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.embedding.dims, 128);
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let mut config = Config::default();
        let env = env_from(&[("HRI_SEARCH_FUZZY_THRESHOLD", "high")]);
        assert!(matches!(
            config.apply_env_overrides(&env),
            Err(HriError::Config(_))
        ));
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let mut config = Config::default();
        config.search.fuzzy_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.semantic_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.embedding.backend = "onnx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_paths_resolve_under_root() {
        let config = StorageConfig::default();
        let root = Path::new("/data/hri");
        assert_eq!(config.database_path(root), root.join("hri.db"));
        let absolute = StorageConfig {
            vector_path: "/var/index".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(absolute.vector_path(root), PathBuf::from("/var/index"));
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = Config::default_toml().unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
