//! thumbfm core library: catalog and thumbnail-cache logic for a networked
//! file manager.
//!
//! `thumbfm-core` knows nothing about HTTP. It turns paths into [`Item`]
//! records, lists directories, generates and caches image thumbnails, and
//! keeps the cache consistent when entries are moved or deleted. The
//! `thumbfm-web` binary exposes it over JSON routes.
//!
//! # Modules
//!
//! - [`path`]: Path normalization ([`NormalizedPath`]) and name sanitising.
//! - [`fs`]: The [`FileSystem`] seam, item classification, display formatting and [`resolve_item`].
//! - [`thumb`]: Content keys, the persistent [`ThumbnailStore`] and the [`ThumbnailGenerator`].
//! - [`catalog`]: The async [`Catalog`] facade: listing, thumbnails, invalidation, batches.
//! - [`config`]: TOML configuration.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod catalog;
pub mod config;
pub mod error;
pub mod fs;
pub mod path;
pub mod thumb;

pub use catalog::{BatchAction, BatchFailure, BatchReport, Catalog, ThumbnailOutcome};
pub use config::settings::{Config, StorageBackend};
pub use error::{CoreError, CoreResult};
pub use fs::{resolve_item, EntryStat, FileSystem, Item, ItemType, LocalFs};
pub use path::{normalize, strip_name, NormalizedPath};
pub use thumb::{
    open_store, ContentKey, EncodingOptions, ThumbnailGenerator, ThumbnailOptions, ThumbnailStore,
};
