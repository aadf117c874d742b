//! Catalog item records and their resolution from the file system.

use std::time::SystemTime;

use serde::Serialize;

use crate::fs::classify::{classify, is_protected, ItemType};
use crate::fs::format::{byte_size, date_string, noun};
use crate::fs::ops::{EntryStat, FileSystem};
use crate::path::{normalize, NormalizedPath};
use crate::thumb::key::ContentKey;
use crate::thumb::store::{cached_thumbnail, ThumbnailStore};

/// Metadata record for one file-system entry.
///
/// Items are only built by [`resolve_item`], which keeps `icon` in step with
/// `type` and leaves `thumbnail` empty for anything but images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    path: NormalizedPath,
    name: String,
    parent: String,
    #[serde(rename = "type")]
    item_type: ItemType,
    extension: String,
    size: String,
    created: String,
    modified: String,
    icon: &'static str,
    thumbnail: String,
    protected: bool,
}

impl Item {
    fn from_stat(
        path: NormalizedPath,
        stat: &EntryStat,
        item_type: ItemType,
        extension: String,
        size: String,
    ) -> Self {
        let now = SystemTime::now();
        let created = stat.created.or(stat.modified).unwrap_or(now);
        let modified = stat.modified.or(stat.created).unwrap_or(now);
        let name = path.name().to_string();

        Self {
            parent: path.parent().to_string(),
            protected: is_protected(&name),
            name,
            path,
            item_type,
            extension,
            size,
            created: date_string(created, false),
            modified: date_string(modified, false),
            icon: item_type.icon(),
            thumbnail: String::new(),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &str {
        &self.parent
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Lowercase extension, empty for folders and extensionless files.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `"N items"` for folders, a human-readable byte count for files.
    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn created(&self) -> &str {
        &self.created
    }

    pub fn modified(&self) -> &str {
        &self.modified
    }

    pub fn icon(&self) -> &'static str {
        self.icon
    }

    /// Cached thumbnail data URI, or an empty string.
    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    pub fn is_folder(&self) -> bool {
        self.item_type == ItemType::Folder
    }

    /// Advisory flag for dotfiles and OS metadata files.
    pub fn is_protected(&self) -> bool {
        self.protected
    }
}

/// Resolves the metadata record for `raw_path`.
///
/// Returns `None` when the entry does not exist (or cannot be stat'ed). For
/// images, the thumbnail is looked up in `store` when one is supplied; a
/// failed lookup leaves the thumbnail empty. This never generates thumbnails.
pub fn resolve_item(
    fs: &dyn FileSystem,
    raw_path: &str,
    store: Option<&dyn ThumbnailStore>,
) -> Option<Item> {
    let path = normalize(raw_path);
    let stat = match fs.stat(path.as_ref()) {
        Ok(stat) => stat,
        Err(e) => {
            tracing::debug!(%path, "item absent: {e}");
            return None;
        }
    };

    if stat.is_dir {
        // an unreadable folder still resolves, with zero children
        let children = fs.list(path.as_ref()).map(|names| names.len()).unwrap_or(0);
        let size = noun(children, "item", "items");
        return Some(Item::from_stat(path, &stat, ItemType::Folder, String::new(), size));
    }

    let (item_type, extension) = classify(path.name(), false);
    let mut item = Item::from_stat(path, &stat, item_type, extension, byte_size(stat.len));

    if item_type == ItemType::Image {
        if let Some(store) = store {
            item.thumbnail = cached_thumbnail(store, &ContentKey::of(&item.path)).unwrap_or_default();
        }
    }
    Some(item)
}
