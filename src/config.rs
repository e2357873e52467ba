use std::{net::SocketAddr, path::PathBuf};

use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::recommender::RecommendParams;
use crate::semantic::{DEFAULT_LIMIT, DEFAULT_MODEL, DEFAULT_THRESHOLD};

const CONFIG_FILE: &str = "config.yaml";

/// Default bound on a single query embedding call in seconds
const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 30;
/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;
/// Default webpage fetch timeout in seconds
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;
/// Default number of paragraphs taken from a fetched page
const DEFAULT_MAX_PARAGRAPHS: usize = 5;
const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
const USER_AGENT_DEFAULT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine home directory; set SHLREC_BASE_PATH")]
    NoHome,

    #[error("config io error: {0}")]
    IO(#[from] std::io::Error),

    #[error("config is malformed: {0}")]
    Malformed(#[from] serde_yml::Error),

    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Ranking and embedding model settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_model")]
    pub model: String,

    /// Scores must be strictly above this to be recommended [-1.0, 1.0]
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    /// Maximum number of recommendations per request
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Bound on one query embedding call in seconds, 0 disables it
    #[serde(default = "default_embed_timeout_secs")]
    pub embed_timeout_secs: u64,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_LIMIT,
            embed_timeout_secs: DEFAULT_EMBED_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

impl RecommenderConfig {
    pub fn params(&self) -> RecommendParams {
        RecommendParams {
            threshold: self.threshold,
            limit: self.limit,
        }
    }
}

/// Webpage text extraction settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of leading `<p>` blocks used as query text
    #[serde(default = "default_max_paragraphs")]
    pub max_paragraphs: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_allowed_schemes")]
    pub allowed_schemes: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_paragraphs: DEFAULT_MAX_PARAGRAPHS,
            user_agent: default_user_agent(),
            allowed_schemes: default_allowed_schemes(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_embed_timeout_secs() -> u64 {
    DEFAULT_EMBED_TIMEOUT_SECS
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

fn default_max_paragraphs() -> usize {
    DEFAULT_MAX_PARAGRAPHS
}

fn default_user_agent() -> String {
    USER_AGENT_DEFAULT.to_string()
}

fn default_allowed_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string()]
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recommender: RecommenderConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub server: ServerConfig,

    /// YAML catalog file replacing the built-in catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<String>,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

/// Data directory: `$SHLREC_BASE_PATH` or `~/.local/share/shlrec`.
pub fn base_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("SHLREC_BASE_PATH") {
        return Ok(PathBuf::from(path));
    }

    let home = my_home()
        .map_err(|_| ConfigError::NoHome)?
        .ok_or(ConfigError::NoHome)?;
    Ok(home.join(".local/share/shlrec"))
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rec = &self.recommender;
        if !(-1.0..=1.0).contains(&rec.threshold) {
            return Err(ConfigError::invalid(
                "recommender.threshold",
                format!("must be between -1.0 and 1.0, got {}", rec.threshold),
            ));
        }
        if rec.limit == 0 {
            return Err(ConfigError::invalid("recommender.limit", "must be greater than 0"));
        }
        if rec.download_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "recommender.download_timeout_secs",
                "must be greater than 0",
            ));
        }

        let ext = &self.extract;
        if ext.timeout_secs == 0 {
            return Err(ConfigError::invalid("extract.timeout_secs", "must be greater than 0"));
        }
        if ext.max_paragraphs == 0 {
            return Err(ConfigError::invalid(
                "extract.max_paragraphs",
                "must be greater than 0",
            ));
        }
        if ext.allowed_schemes.is_empty() {
            return Err(ConfigError::invalid(
                "extract.allowed_schemes",
                "must list at least one scheme",
            ));
        }

        self.listen_addr()?;

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen.parse().map_err(|e| {
            ConfigError::invalid("server.listen", format!("{:?}: {e}", self.server.listen))
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(base_path()?)
    }

    pub fn load_with(base_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        let config_path = base_path.join(CONFIG_FILE);

        // create new if does not exist
        if !config_path.exists() {
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&config_path)?;
        let mut config: Self = serde_yml::from_str(&config_str)?;

        config.base_path = base_path;

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(self.base_path.join(CONFIG_FILE), config_str)?;
        Ok(())
    }
}
