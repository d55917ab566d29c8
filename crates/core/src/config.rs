//! Configuration management for PolicyLens.
//!
//! Configuration is layered, later layers winning:
//! - Built-in defaults
//! - Config file (`.policylens/config.yaml` in the workspace, or an explicit path)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Directory inside the workspace holding PolicyLens state.
pub const STATE_DIR: &str = ".policylens";

/// Embedding providers the QA crate knows how to build.
pub const EMBEDDING_PROVIDERS: &[&str] = &["trigram", "ollama"];

/// Answer extractors the QA crate knows how to build.
pub const EXTRACTOR_PROVIDERS: &[&str] = &["lexical", "http"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root (contains .policylens/ and the output directory)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub embedding: EmbeddingSettings,
    pub extractor: ExtractorSettings,
    pub retrieval: RetrievalSettings,
    pub timeouts: TimeoutSettings,
    pub risk: RiskSettings,
    pub storage: StorageSettings,
}

/// Which embedding model to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// "trigram" (local, offline) or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Expected vector dimension
    pub dimensions: usize,

    /// Base URL for HTTP providers
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v2".to_string(),
            dimensions: 384,
            endpoint: None,
        }
    }
}

/// Which extractive QA model to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// "lexical" (local) or "http"
    pub provider: String,

    /// Model identifier, informational for local extractors
    pub model: String,

    /// Inference endpoint URL for the "http" extractor
    pub endpoint: Option<String>,

    /// Environment variable holding a bearer token for the endpoint
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            provider: "lexical".to_string(),
            model: "sentence-overlap".to_string(),
            endpoint: None,
            api_key_env: None,
        }
    }
}

/// Passage retrieval knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of top passages merged into the extractor context
    pub top_k: usize,

    /// Passages with this many characters or fewer (after trimming) are dropped
    pub min_passage_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_passage_chars: 10,
        }
    }
}

/// Upper bounds on model work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub model_load_secs: u64,
    pub inference_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            model_load_secs: 60,
            inference_secs: 30,
        }
    }
}

/// A single keyword rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRuleSetting {
    pub phrase: String,
    pub weight: i32,
}

/// Risk scorer configuration. `rules: None` selects the built-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub baseline: i32,
    pub rules: Option<Vec<RiskRuleSetting>>,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            baseline: 50,
            rules: None,
        }
    }
}

/// Where extracted policy text is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Relative paths are resolved against the workspace
    pub output_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("saved_policies"),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingSettings>,
    extractor: Option<ExtractorSettings>,
    retrieval: Option<RetrievalSettings>,
    timeouts: Option<TimeoutSettings>,
    risk: Option<RiskSettings>,
    storage: Option<StorageSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            embedding: EmbeddingSettings::default(),
            extractor: ExtractorSettings::default(),
            retrieval: RetrievalSettings::default(),
            timeouts: TimeoutSettings::default(),
            risk: RiskSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment.
    ///
    /// Environment variables:
    /// - `POLICYLENS_WORKSPACE`: Override workspace path
    /// - `POLICYLENS_CONFIG`: Path to config file
    /// - `POLICYLENS_EMBEDDING_PROVIDER`: Embedding provider
    /// - `POLICYLENS_EXTRACTOR_PROVIDER`: Answer extractor
    /// - `POLICYLENS_OUTPUT_DIR`: Where policy text is saved
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let workspace = std::env::var_os("POLICYLENS_WORKSPACE").map(PathBuf::from);
        let config_file = std::env::var_os("POLICYLENS_CONFIG").map(PathBuf::from);
        Self::load_from(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
    ///
    /// Both fall back to defaults when `None`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }
        config.config_file = config_file;

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.state_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();
        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(extractor) = file.extractor {
            self.extractor = extractor;
        }
        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }
        if let Some(timeouts) = file.timeouts {
            self.timeouts = timeouts;
        }
        if let Some(risk) = file.risk {
            self.risk = risk;
        }
        if let Some(storage) = file.storage {
            self.storage = storage;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        Ok(())
    }

    /// Environment variables override the config file.
    fn apply_env(&mut self) {
        if let Ok(provider) = std::env::var("POLICYLENS_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Ok(provider) = std::env::var("POLICYLENS_EXTRACTOR_PROVIDER") {
            self.extractor.provider = provider;
        }

        if let Some(dir) = std::env::var_os("POLICYLENS_OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over everything else.
    pub fn with_overrides(
        mut self,
        embedding_provider: Option<String>,
        extractor_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = embedding_provider {
            self.embedding.provider = provider;
        }

        if let Some(provider) = extractor_provider {
            self.extractor.provider = provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Path to the .policylens directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Resolved directory for saved policy text.
    pub fn output_dir(&self) -> PathBuf {
        if self.storage.output_dir.is_absolute() {
            self.storage.output_dir.clone()
        } else {
            self.workspace.join(&self.storage.output_dir)
        }
    }

    /// Resolve the extractor bearer token from its environment variable, if configured.
    pub fn resolve_extractor_key(&self) -> Option<String> {
        self.extractor
            .api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Validate the configuration before any model is loaded.
    pub fn validate(&self) -> AppResult<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !EXTRACTOR_PROVIDERS.contains(&self.extractor.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown extractor provider: {}. Supported: {}",
                self.extractor.provider,
                EXTRACTOR_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.extractor.provider == "http" && self.extractor.endpoint.is_none() {
            return Err(AppError::Config(
                "The http extractor requires extractor.endpoint".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }

        if self.timeouts.model_load_secs == 0 || self.timeouts.inference_secs == 0 {
            return Err(AppError::Config("Timeouts must be non-zero".to_string()));
        }

        Ok(())
    }
}
