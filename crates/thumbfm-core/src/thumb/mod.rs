//! Thumbnail cache: content keys, persistent storage and generation.

pub mod generator;
pub mod key;
pub mod store;

pub use generator::{EncodingOptions, ThumbnailGenerator, ThumbnailOptions};
pub use key::ContentKey;
pub use store::{open_store, MemoryThumbnailStore, SqliteThumbnailStore, ThumbnailStore};
