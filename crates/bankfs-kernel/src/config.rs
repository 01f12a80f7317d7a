//! Storage pool configuration.
//!
//! Loaded from TOML. Every field is optional and falls back to the default
//! geometry: a 2 GiB pool of 4 MiB banks carved into 16 KiB chunks.
//!
//! ```toml
//! total_size = 67108864   # 64 MiB
//! bank_size = 4194304
//! chunk_size = 16384
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageLayout;

/// Default total pool size (2 GiB).
pub const DEFAULT_TOTAL_SIZE: u64 = 2 * 1024 * 1024 * 1024;
/// Default bank size (4 MiB).
pub const DEFAULT_BANK_SIZE: usize = 4 * 1024 * 1024;
/// Default chunk size (16 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Sizes are inconsistent.
    #[error("invalid storage geometry: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Config result type.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Storage pool sizes, in bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub total_size: u64,
    pub bank_size: usize,
    pub chunk_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            total_size: DEFAULT_TOTAL_SIZE,
            bank_size: DEFAULT_BANK_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StorageConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded storage config");
        Ok(config)
    }

    pub fn with_total_size(mut self, total_size: u64) -> Self {
        self.total_size = total_size;
        self
    }

    pub fn with_bank_size(mut self, bank_size: usize) -> Self {
        self.bank_size = bank_size;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Check the sizes and produce the pool geometry.
    pub fn layout(&self) -> ConfigResult<StorageLayout> {
        StorageLayout::new(self.total_size, self.bank_size, self.chunk_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        let layout = config.layout().unwrap();
        assert_eq!(layout.chunk_size(), 16 * 1024);
        assert_eq!(layout.bank_count(), 512);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = StorageConfig::from_toml_str("total_size = 8388608").unwrap();
        assert_eq!(config.total_size, 8 * 1024 * 1024);
        assert_eq!(config.bank_size, DEFAULT_BANK_SIZE);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.layout().unwrap().bank_count(), 2);
    }

    #[test]
    fn test_bad_toml() {
        let err = StorageConfig::from_toml_str("chunk_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_inconsistent_geometry() {
        let config = StorageConfig::default().with_chunk_size(3000);
        assert!(matches!(config.layout(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "total_size = 65536").unwrap();
        writeln!(file, "bank_size = 16384").unwrap();
        writeln!(file, "chunk_size = 4096").unwrap();

        let config = StorageConfig::load(file.path()).unwrap();
        let layout = config.layout().unwrap();
        assert_eq!(layout.total_chunks(), 16);
        assert_eq!(layout.chunks_per_bank(), 4);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StorageConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
