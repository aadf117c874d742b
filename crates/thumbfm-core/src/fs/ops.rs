//! File system primitives the catalog is built on.
//!
//! [`FileSystem`] is the seam between the catalog and the storage it browses.
//! [`LocalFs`] implements it on top of `std::fs`; tests substitute their own
//! implementations to inject failures.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{CoreError, CoreResult};

/// Metadata for a single entry, as returned by [`FileSystem::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub is_dir: bool,
    /// Size in bytes. Meaningless for directories.
    pub len: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
}

/// Stat, list, read and mutate entries.
///
/// All methods block; async callers run them on the blocking pool. Errors use
/// the conventional [`CoreError::NotFound`] / [`CoreError::PermissionDenied`] /
/// [`CoreError::Io`] signaling.
pub trait FileSystem: Send + Sync {
    /// Returns metadata for `path`, following symlinks.
    fn stat(&self, path: &Path) -> CoreResult<EntryStat>;

    /// Returns the names of the direct children of `path`, in enumeration order.
    fn list(&self, path: &Path) -> CoreResult<Vec<String>>;

    /// Reads the full contents of a file.
    fn read(&self, path: &Path) -> CoreResult<Vec<u8>>;

    /// Moves `src` to `dest`. Fails with [`CoreError::AlreadyExists`] if `dest`
    /// exists and `overwrite` is `false`, and with [`CoreError::InvalidRequest`]
    /// if the two name the same entry or one contains the other.
    fn move_entry(&self, src: &Path, dest: &Path, overwrite: bool) -> CoreResult<()>;

    /// Removes a file, or a directory recursively.
    fn remove(&self, path: &Path) -> CoreResult<()>;

    /// Copies a file, or a directory recursively.
    fn copy(&self, src: &Path, dest: &Path) -> CoreResult<()>;

    /// Creates an empty file (and its parents) unless it already exists.
    fn create_file(&self, path: &Path) -> CoreResult<()>;

    /// Creates a directory and all of its parents.
    fn create_dir(&self, path: &Path) -> CoreResult<()>;
}

/// [`FileSystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn stat(&self, path: &Path) -> CoreResult<EntryStat> {
        let meta = std::fs::metadata(path).map_err(|e| CoreError::from_io(path, e))?;
        Ok(EntryStat {
            is_dir: meta.is_dir(),
            len: if meta.is_dir() { 0 } else { meta.len() },
            created: meta.created().ok(),
            modified: meta.modified().ok(),
        })
    }

    fn list(&self, path: &Path) -> CoreResult<Vec<String>> {
        let meta = std::fs::metadata(path).map_err(|e| CoreError::from_io(path, e))?;
        if !meta.is_dir() {
            return Err(CoreError::NotADirectory(path.to_path_buf()));
        }

        let read_dir = std::fs::read_dir(path).map_err(|e| CoreError::from_io(path, e))?;
        let names = read_dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }

    fn read(&self, path: &Path) -> CoreResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| CoreError::from_io(path, e))
    }

    fn move_entry(&self, src: &Path, dest: &Path, overwrite: bool) -> CoreResult<()> {
        // symlink_metadata: does not follow symlinks, a dangling link still moves
        let src_meta = std::fs::symlink_metadata(src).map_err(|e| CoreError::from_io(src, e))?;
        let dest_meta = std::fs::symlink_metadata(dest).ok();

        // All rejections happen before anything is removed
        let real_src = resolved_location(src)?;
        let real_dest = resolved_location(dest)?;
        if real_src == real_dest || dest_meta.as_ref().is_some_and(|m| same_entry(&src_meta, m)) {
            return Err(CoreError::InvalidRequest(format!(
                "source and destination are the same: {}",
                src.display()
            )));
        }
        if real_dest.starts_with(&real_src) {
            return Err(CoreError::InvalidRequest(format!(
                "cannot move {} into itself",
                src.display()
            )));
        }
        if real_src.starts_with(&real_dest) {
            return Err(CoreError::InvalidRequest(format!(
                "cannot move {} onto {}, which contains it",
                src.display(),
                dest.display()
            )));
        }

        if dest_meta.is_some() {
            if !overwrite {
                return Err(CoreError::AlreadyExists(dest.to_path_buf()));
            }
            self.remove(dest)?;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::from_io(parent, e))?;
        }

        match std::fs::rename(src, dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                self.copy(src, dest)?;
                self.remove(src)
            }
            Err(e) => Err(CoreError::from_io(src, e)),
        }
    }

    fn remove(&self, path: &Path) -> CoreResult<()> {
        let meta = std::fs::symlink_metadata(path).map_err(|e| CoreError::from_io(path, e))?;
        let result = if meta.is_dir() {
            std::fs::remove_dir_all(path)
        } else {
            // Handles both regular files and symlinks
            std::fs::remove_file(path)
        };
        result.map_err(|e| CoreError::from_io(path, e))
    }

    fn copy(&self, src: &Path, dest: &Path) -> CoreResult<()> {
        let meta = std::fs::symlink_metadata(src).map_err(|e| CoreError::from_io(src, e))?;

        if meta.is_dir() {
            copy_dir_recursive(src, dest, 0)
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            copy_leaf(src, dest, meta.is_symlink())
        }
    }

    fn create_file(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::from_io(parent, e))?;
        }
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| CoreError::from_io(path, e))?;
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> CoreResult<()> {
        std::fs::create_dir_all(path).map_err(|e| CoreError::from_io(path, e))
    }
}

/// Absolute location of `path` with every existing ancestor resolved through
/// symlinks. The last component is kept as written, so a link is not followed
/// and a path that does not exist yet still resolves.
fn resolved_location(path: &Path) -> CoreResult<PathBuf> {
    let Some(name) = path.file_name() else {
        return std::fs::canonicalize(path).map_err(|e| CoreError::from_io(path, e));
    };

    let mut missing: Vec<&OsStr> = Vec::new();
    let mut cursor = parent_or_cwd(path);
    let base = loop {
        match std::fs::canonicalize(cursor) {
            Ok(real) => break real,
            Err(e) if e.kind() == ErrorKind::NotFound => match cursor.file_name() {
                Some(part) => {
                    missing.push(part);
                    cursor = parent_or_cwd(cursor);
                }
                None => return Err(CoreError::from_io(cursor, e)),
            },
            Err(e) => return Err(CoreError::from_io(cursor, e)),
        }
    };

    let mut resolved = missing.iter().rev().fold(base, |acc, part| acc.join(part));
    resolved.push(name);
    Ok(resolved)
}

fn parent_or_cwd(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(unix)]
fn same_entry(a: &std::fs::Metadata, b: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
fn same_entry(_a: &std::fs::Metadata, _b: &std::fs::Metadata) -> bool {
    false
}

/// Maximum recursion depth for copy_dir_recursive to prevent symlink loops.
const MAX_COPY_DEPTH: usize = 64;

fn copy_dir_recursive(src: &Path, dest: &Path, depth: usize) -> CoreResult<()> {
    if depth > MAX_COPY_DEPTH {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("maximum recursion depth ({MAX_COPY_DEPTH}) exceeded during copy"),
        )));
    }

    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let target = dest.join(entry.file_name());

        // file_type() does not follow symlinks
        let ft = entry.file_type()?;
        if ft.is_dir() {
            copy_dir_recursive(&entry_path, &target, depth + 1)?;
        } else {
            copy_leaf(&entry_path, &target, ft.is_symlink())?;
        }
    }

    Ok(())
}

fn copy_leaf(src: &Path, dest: &Path, is_symlink: bool) -> CoreResult<()> {
    if is_symlink {
        // Copy symlink as symlink rather than following it
        let link_target = std::fs::read_link(src)?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&link_target, dest)?;
        #[cfg(not(unix))]
        {
            let _ = link_target;
            std::fs::copy(src, dest)?;
        }
    } else {
        std::fs::copy(src, dest)?;
    }
    Ok(())
}
