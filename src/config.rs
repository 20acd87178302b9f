use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BYTE_THRESHOLD: u64 = 50_000;

/// Everything a sync or catalog pass needs, resolved once at startup and
/// handed to the orchestrator and reconciler explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the cloud-synced mirror (`<year>/<person>/*`).
    pub remote_root: PathBuf,
    /// Root of the local working tree, same layout as the mirror.
    pub local_root: PathBuf,
    /// Quarantine directory, relative to `remote_root`.
    #[serde(default = "default_quarantine_dir")]
    pub quarantine_dir: String,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    /// Largest size difference at which two similarly named files are still
    /// considered the same clip.
    #[serde(default = "default_byte_threshold")]
    pub byte_threshold: u64,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Optional CSV file the per-person summary is appended to.
    #[serde(default)]
    pub report_csv: Option<String>,
    #[serde(default)]
    pub mount: MountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Program and arguments run once when the mirror is missing.
    #[serde(default)]
    pub remount_command: Vec<String>,
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u64,
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            remount_command: Vec::new(),
            wait_secs: default_wait_secs(),
            poll_secs: default_poll_secs(),
        }
    }
}

fn default_quarantine_dir() -> String {
    "_quarantine".to_string()
}

fn default_catalog_path() -> String {
    "reel_sync.db".to_string()
}

fn default_media_type() -> String {
    "video".to_string()
}

fn default_byte_threshold() -> u64 {
    DEFAULT_BYTE_THRESHOLD
}

fn default_wait_secs() -> u64 {
    120
}

fn default_poll_secs() -> u64 {
    3
}

impl AppConfig {
    /// Config built from explicit roots with every other field defaulted.
    pub fn new(remote_root: impl Into<PathBuf>, local_root: impl Into<PathBuf>) -> Self {
        Self {
            remote_root: remote_root.into(),
            local_root: local_root.into(),
            quarantine_dir: default_quarantine_dir(),
            catalog_path: default_catalog_path(),
            media_type: default_media_type(),
            byte_threshold: default_byte_threshold(),
            ignore_patterns: Vec::new(),
            report_csv: None,
            mount: MountConfig::default(),
        }
    }

    pub fn quarantine_root(&self) -> PathBuf {
        self.remote_root.join(&self.quarantine_dir)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Load `Config.toml` (optional) overlaid by `REEL_SYNC__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    load_from(Path::new("Config"))
}

pub fn load_from(file_stem: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(file_stem).required(false))
        .add_source(Environment::with_prefix("REEL_SYNC").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
