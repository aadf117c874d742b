//! Catalog configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::thumb::generator::{EncodingOptions, ThumbnailOptions};

/// Top-level catalog configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub thumbs: ThumbnailConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_io(path, e))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }
}

/// Which [`crate::thumb::store::ThumbnailStore`] implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Where the thumbnail cache lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_thumbs_path")]
    pub thumbs: PathBuf,
    #[serde(default)]
    pub backend: StorageBackend,
    /// Idle SQLite connections kept open for reuse.
    #[serde(default = "default_connections")]
    pub connections: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            thumbs: default_thumbs_path(),
            backend: StorageBackend::default(),
            connections: default_connections(),
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Lowercase extensions eligible for thumbnailing.
    #[serde(default = "default_thumb_types")]
    pub types: Vec<String>,
    #[serde(default = "default_max_width")]
    pub max_width: u32,
    #[serde(default = "default_max_height")]
    pub max_height: u32,
    #[serde(default)]
    pub jpeg: JpegConfig,
}

impl ThumbnailConfig {
    /// Returns the resize and encoding options described by this section.
    pub fn options(&self) -> ThumbnailOptions {
        ThumbnailOptions {
            max_width: self.max_width,
            max_height: self.max_height,
            encoding: EncodingOptions {
                quality: self.jpeg.quality,
            },
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            types: default_thumb_types(),
            max_width: default_max_width(),
            max_height: default_max_height(),
            jpeg: JpegConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JpegConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
        }
    }
}

/// Fan-out limits for listing, thumbnail and batch operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            fan_out: default_fan_out(),
        }
    }
}

fn default_thumbs_path() -> PathBuf {
    PathBuf::from("storage").join("thumbs.db")
}

fn default_connections() -> usize {
    4
}

fn default_thumb_types() -> Vec<String> {
    ["jpg", "jpeg", "png", "gif", "webp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_width() -> u32 {
    200
}

fn default_max_height() -> u32 {
    100
}

fn default_quality() -> u8 {
    60
}

fn default_fan_out() -> usize {
    32
}
