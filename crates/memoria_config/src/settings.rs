//! Configuration structures and loading.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use memoria_error::{ConfigError, MemoriaError, MemoriaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../memoria.toml");

/// Where and how media, the index and the memorial record are kept.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct StorageConfig {
    /// Root directory for all persisted state
    data_dir: PathBuf,
    /// Deadline for any single disk operation
    io_timeout_ms: u64,
}

impl StorageConfig {
    /// Disk deadline as a [`Duration`].
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Guestbook log settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct GuestbookConfig {
    /// File name of the log inside `storage.data_dir`
    file_name: String,
}

/// Generative restyling service settings.
///
/// # Example
///
/// ```toml
/// [restyle.remote]
/// endpoint = "https://api.example.com/v1/images/restyle"
/// api_key_env = "MEMORIA_RESTYLE_API_KEY"
/// style_prompt = "a soft watercolor portrait of this pet"
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RemoteConfig {
    /// URL the image is POSTed to
    endpoint: String,
    /// Environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    /// Style instruction sent with every image
    #[serde(default = "default_style_prompt")]
    style_prompt: String,
    /// Deadline for a single attempt
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    /// Retries after the first attempt, transient failures only
    #[serde(default = "default_max_retries")]
    max_retries: usize,
    /// First backoff delay
    #[serde(default = "default_initial_backoff_ms")]
    initial_backoff_ms: u64,
    /// Backoff cap
    #[serde(default = "default_max_delay_secs")]
    max_delay_secs: u64,
}

fn default_api_key_env() -> String {
    "MEMORIA_RESTYLE_API_KEY".to_string()
}

fn default_style_prompt() -> String {
    "a soft watercolor portrait of this pet".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    2
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    4
}

impl RemoteConfig {
    /// Creates a remote configuration for `endpoint` with default tuning.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key_env: default_api_key_env(),
            style_prompt: default_style_prompt(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }

    /// Per-attempt deadline as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parameters of the deterministic local filter chain.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct LocalFilterConfig {
    /// Longest edge after downscaling, in pixels
    max_edge: u32,
    /// Posterization levels per channel
    levels: u8,
    /// Normalized Sobel magnitude above which a pixel is an edge
    edge_threshold: f32,
    /// Warm tone shift, 0.0 to 1.0
    warmth: f32,
}

impl Default for LocalFilterConfig {
    fn default() -> Self {
        Self {
            max_edge: 1024,
            levels: 6,
            edge_threshold: 0.25,
            warmth: 0.12,
        }
    }
}

/// Restyling pipeline settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct RestyleConfig {
    /// Remote strategy; absent means local-only
    #[serde(default)]
    remote: Option<RemoteConfig>,
    /// Local strategy
    #[serde(default)]
    local: LocalFilterConfig,
}

/// HTTP front end settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Socket address to listen on
    bind: String,
    /// Largest accepted upload body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    max_upload_bytes: usize,
    /// Carousel sessions kept at once; the least recently used go first
    #[serde(default = "default_max_carousel_sessions")]
    max_carousel_sessions: u64,
    /// Seconds an untouched carousel session is kept
    #[serde(default = "default_carousel_idle_secs")]
    carousel_idle_secs: u64,
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_max_carousel_sessions() -> u64 {
    1024
}

fn default_carousel_idle_secs() -> u64 {
    3600
}

impl ServerConfig {
    /// Idle lifetime of a carousel session.
    pub fn carousel_idle(&self) -> Duration {
        Duration::from_secs(self.carousel_idle_secs)
    }
}

/// Top-level Memoria configuration.
///
/// # Example
///
/// ```no_run
/// use memoria_config::MemoriaConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MemoriaConfig::load(None)?;
/// println!("media lives in {}", config.storage().data_dir().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct MemoriaConfig {
    /// Storage settings
    storage: StorageConfig,
    /// Guestbook settings
    guestbook: GuestbookConfig,
    /// Restyling settings
    restyle: RestyleConfig,
    /// HTTP settings
    server: ServerConfig,
}

impl MemoriaConfig {
    /// Bundled defaults only.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled file fails to parse.
    pub fn bundled() -> MemoriaResult<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Parses a complete configuration from TOML text layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if either document is invalid.
    pub fn from_toml_str(toml: &str) -> MemoriaResult<Self> {
        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from_str(toml, FileFormat::Toml)),
        )
    }

    /// Loads a specific file layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MemoriaResult<Self> {
        debug!("Loading configuration from file");

        Self::build(
            Config::builder()
                .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
                .add_source(File::from(path.as_ref())),
        )
    }

    /// Loads configuration with the full precedence chain.
    ///
    /// User files are optional and skipped if missing; `explicit` must exist when given.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source fails to parse.
    #[instrument]
    pub fn load(explicit: Option<&Path>) -> MemoriaResult<Self> {
        debug!("Loading configuration: env > explicit > current dir > home dir > bundled");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/memoria/memoria.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("memoria").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("MEMORIA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> MemoriaResult<Self> {
        builder
            .build()
            .map_err(|e| {
                MemoriaError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                MemoriaError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Absolute-or-relative path of the guestbook log.
    pub fn guestbook_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.guestbook.file_name)
    }
}
