//! Configuration management for Veritas.
//!
//! Configuration is resolved once at process start, in increasing precedence:
//! - Built-in defaults
//! - Config file (`.veritas/config.yaml` or `VERITAS_CONFIG`)
//! - Environment variables (`VERITAS_*`)
//! - Command-line flags ([`ConfigOverrides`])
//!
//! The resulting [`AppConfig`] is passed by reference into every component
//! constructor. There is no global configuration state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Kind of evidence source the pipeline can consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Chunks from the uploaded-document index
    Document,
    /// Live web search results
    Web,
}

impl SourceKind {
    /// Every source kind, in declaration order.
    pub const ALL: [SourceKind; 2] = [SourceKind::Document, SourceKind::Web];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Web => "web",
        }
    }

    /// Parse a source kind name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" | "documents" | "doc" | "docs" => Some(Self::Document),
            "web" | "internet" => Some(Self::Web),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .veritas/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format ("pretty" or "json")
    pub log_format: String,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Generation backend settings
    pub llm: LlmSettings,

    /// Web search backend settings
    pub search: SearchSettings,

    /// Retrieval agent settings
    pub retrieval: RetrievalSettings,

    /// Evidence fusion settings
    pub fusion: FusionSettings,
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider identifier ("ollama", "openrouter", "openai", "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens in the generated answer
    pub max_tokens: u32,

    /// Generation timeout in seconds
    pub timeout_secs: u64,

    /// Prompt definition used for grounded answers
    pub prompt_id: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            endpoint: None,
            api_key_env: None,
            temperature: 0.2,
            max_tokens: 800,
            timeout_secs: 30,
            prompt_id: "answer.grounded".to_string(),
        }
    }
}

/// Web search backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    /// Providers tried in order ("serpapi", "tavily", "duckduckgo", "static")
    pub providers: Vec<String>,

    /// Environment variable holding the SerpAPI key
    pub serpapi_key_env: String,

    /// Environment variable holding the Tavily key
    pub tavily_key_env: String,

    /// JSON fixture of search hits for the "static" provider
    pub fixture: Option<PathBuf>,

    /// HTTP timeout in seconds for a single provider call
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            providers: vec![
                "serpapi".to_string(),
                "tavily".to_string(),
                "duckduckgo".to_string(),
            ],
            serpapi_key_env: "SERPAPI_API_KEY".to_string(),
            tavily_key_env: "TAVILY_API_KEY".to_string(),
            fixture: None,
            timeout_secs: 10,
        }
    }
}

/// Retrieval agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Maximum evidence items returned per agent
    pub top_k: usize,

    /// Per-agent timeout in milliseconds
    pub agent_timeout_ms: u64,

    /// Minimum similarity for a document chunk to count as evidence
    pub min_document_score: f32,

    /// Knowledge base backing the document agent
    pub knowledge_base: String,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            agent_timeout_ms: 8_000,
            min_document_score: 0.2,
            knowledge_base: "default".to_string(),
        }
    }
}

/// Evidence fusion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FusionSettings {
    /// Similarity above which two items are near-duplicates, in (0, 1]
    pub similarity_threshold: f32,

    /// Maximum number of evidence items handed to generation
    pub max_evidence: usize,

    /// Tie-break order between source kinds, most authoritative first
    pub source_precedence: Vec<SourceKind>,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            max_evidence: 12,
            source_precedence: vec![SourceKind::Document, SourceKind::Web],
        }
    }
}

/// Command-line overrides applied on top of file and environment config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub top_k: Option<usize>,
    pub agent_timeout_ms: Option<u64>,
    pub verbose: bool,
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    llm: Option<LlmSettings>,
    search: Option<SearchSettings>,
    retrieval: Option<RetrievalSettings>,
    fusion: Option<FusionSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    format: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            log_format: "pretty".to_string(),
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            search: SearchSettings::default(),
            retrieval: RetrievalSettings::default(),
            fusion: FusionSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Environment variables:
    /// - `VERITAS_WORKSPACE`: Override workspace path
    /// - `VERITAS_CONFIG`: Path to config file
    /// - `VERITAS_PROVIDER`: LLM provider
    /// - `VERITAS_MODEL`: Model identifier
    /// - `VERITAS_TOP_K`: Evidence items per agent
    /// - `VERITAS_AGENT_TIMEOUT_MS`: Per-agent timeout
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use veritas_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut workspace = None;
        let mut config_file = None;

        if let Ok(ws) = std::env::var("VERITAS_WORKSPACE") {
            workspace = Some(PathBuf::from(ws));
        }
        if let Ok(cf) = std::env::var("VERITAS_CONFIG") {
            config_file = Some(PathBuf::from(cf));
        }

        Self::load_from(workspace, config_file)
    }

    /// Load configuration for an explicit workspace and config file.
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
            None => config.veritas_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env()?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(fusion) = config_file.fusion {
            result.fusion = fusion;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(provider) = std::env::var("VERITAS_PROVIDER") {
            self.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("VERITAS_MODEL") {
            self.llm.model = model;
        }

        if let Ok(top_k) = std::env::var("VERITAS_TOP_K") {
            self.retrieval.top_k = top_k
                .parse()
                .map_err(|_| AppError::Config(format!("Invalid VERITAS_TOP_K: {}", top_k)))?;
        }

        if let Ok(timeout) = std::env::var("VERITAS_AGENT_TIMEOUT_MS") {
            self.retrieval.agent_timeout_ms = timeout.parse().map_err(|_| {
                AppError::Config(format!("Invalid VERITAS_AGENT_TIMEOUT_MS: {}", timeout))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over everything else.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = overrides.provider {
            self.llm.provider = provider;
        }

        if let Some(model) = overrides.model {
            self.llm.model = model;
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }

        if let Some(top_k) = overrides.top_k {
            self.retrieval.top_k = top_k;
        }

        if let Some(timeout) = overrides.agent_timeout_ms {
            self.retrieval.agent_timeout_ms = timeout;
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .veritas directory.
    pub fn veritas_dir(&self) -> PathBuf {
        self.workspace.join(".veritas")
    }

    /// Ensure the .veritas directory exists.
    pub fn ensure_veritas_dir(&self) -> AppResult<()> {
        let dir = self.veritas_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .veritas directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolve the LLM API key from its configured environment variable.
    pub fn resolve_llm_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var("VERITAS_API_KEY") {
            return Some(key);
        }
        let env_var = self
            .llm
            .api_key_env
            .clone()
            .or_else(|| default_api_key_env(&self.llm.provider).map(str::to_string))?;
        std::env::var(env_var).ok()
    }

    /// Validate configuration ranges and provider names.
    pub fn validate(&self) -> AppResult<()> {
        let known_llm = ["ollama", "openrouter", "openai", "gemini", "mock"];
        if !known_llm.contains(&self.llm.provider.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                known_llm.join(", ")
            )));
        }

        let known_search = ["serpapi", "tavily", "duckduckgo", "static"];
        for provider in &self.search.providers {
            if !known_search.contains(&provider.to_lowercase().as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown search provider: {}. Supported: {}",
                    provider,
                    known_search.join(", ")
                )));
            }
        }

        let threshold = self.fusion.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(AppError::Config(format!(
                "fusion.similarityThreshold must be in (0, 1], got {}",
                threshold
            )));
        }

        if self.fusion.max_evidence == 0 {
            return Err(AppError::Config(
                "fusion.maxEvidence must be greater than 0".to_string(),
            ));
        }

        for kind in SourceKind::ALL {
            if !self.fusion.source_precedence.contains(&kind) {
                return Err(AppError::Config(format!(
                    "fusion.sourcePrecedence must list '{}'",
                    kind
                )));
            }
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.agent_timeout_ms == 0 || self.llm.timeout_secs == 0 {
            return Err(AppError::Config("Timeouts must be greater than 0".to_string()));
        }

        Ok(())
    }
}

/// Conventional API key variable for providers that need one.
fn default_api_key_env(provider: &str) -> Option<&'static str> {
    match provider.to_lowercase().as_str() {
        "openrouter" => Some("OPENROUTER_API_KEY"),
        "openai" => Some("OPENAI_API_KEY"),
        "gemini" => Some("GEMINI_API_KEY"),
        _ => None,
    }
}
