//! File system access and item metadata.
//!
//! [`ops::FileSystem`] is the seam between the catalog and the disk;
//! [`item::resolve_item`] turns a path into the [`item::Item`] record clients
//! see, using [`classify`] for type detection and [`format`] for display
//! strings.

pub mod classify;
pub mod format;
pub mod item;
pub mod ops;

pub use classify::ItemType;
pub use item::{resolve_item, Item};
pub use ops::{EntryStat, FileSystem, LocalFs};
