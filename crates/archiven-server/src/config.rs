use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use archiven_core::UploadPolicy;

/// Environment variable that overrides `storage.root`.
pub const STORAGE_ROOT_ENV: &str = "ARCHIVEN_STORAGE_ROOT";
/// Environment variable that overrides `server.host`.
pub const HOST_ENV: &str = "ARCHIVEN_HOST";
/// Environment variable that overrides `server.port`.
pub const PORT_ENV: &str = "ARCHIVEN_PORT";
/// `PORT_ENV` が無いときに参照する旧来の変数名
pub const LEGACY_PORT_ENV: &str = "SERVER_PORT";

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct ArchivenConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Blob store backend configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation policy.
    #[serde(default)]
    pub upload: UploadPolicy,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL used to build `download_url` in responses.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_public_url() -> String {
    "http://localhost:8080".to_owned()
}

/// Which blob store backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Fs,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the `fs` backend.
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

impl ArchivenConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Apply environment overrides on top of the file values.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// `lookup` から得た値で上書きする（空文字列は未設定として扱う）
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(root) = lookup(STORAGE_ROOT_ENV) {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        let port = lookup(PORT_ENV)
            .map(|v| (PORT_ENV, v))
            .or_else(|| lookup(LEGACY_PORT_ENV).map(|v| (LEGACY_PORT_ENV, v)));
        if let Some((var, value)) = port {
            self.server.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var, value })?;
        }
        Ok(())
    }
}
