//! The catalog facade.
//!
//! [`Catalog`] wires the file system, the thumbnail store and the generator
//! together and exposes every operation asynchronously. Per-item work runs on
//! tokio's blocking pool; listings, thumbnail requests and batches fan out with
//! at most `fan_out` items in flight and collect results in input order.
//!
//! Mutations go through [`move_and_invalidate`] and [`delete_and_invalidate`],
//! which only drop a cache entry after the file-system change has succeeded.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::config::settings::Config;
use crate::error::{CoreError, CoreResult};
use crate::fs::classify::extension_of;
use crate::fs::format::noun;
use crate::fs::item::{resolve_item, Item};
use crate::fs::ops::FileSystem;
use crate::path::{normalize, strip_name, NormalizedPath};
use crate::thumb::generator::{ThumbnailGenerator, ThumbnailOptions};
use crate::thumb::key::ContentKey;
use crate::thumb::store::ThumbnailStore;

/// The per-item operation applied by [`Catalog::invalidate_batch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchAction {
    Move,
    Delete,
}

impl BatchAction {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchAction::Move => "move",
            BatchAction::Delete => "delete",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            BatchAction::Move => "moved",
            BatchAction::Delete => "deleted",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item of a batch that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    pub path: String,
    pub error: String,
}

/// Aggregate outcome of a batch: how many items succeeded, and which failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Human readable summary, e.g. `"3 items moved successfully."`.
    pub fn summary(&self, action: BatchAction) -> String {
        format!(
            "{} {} successfully.",
            noun(self.succeeded, "item", "items"),
            action.past_tense()
        )
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of one thumbnail request. `thumb` is `None` when generation was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailOutcome {
    pub path: NormalizedPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
}

/// Moves `old` to `new`, then drops the cached thumbnails of both paths.
///
/// Nothing is dropped when the move fails. A failed cache delete after a
/// successful move is logged and does not fail the operation.
pub fn move_and_invalidate(
    fs: &dyn FileSystem,
    store: &dyn ThumbnailStore,
    old: &NormalizedPath,
    new: &NormalizedPath,
    overwrite: bool,
) -> CoreResult<()> {
    fs.move_entry(old.as_ref(), new.as_ref(), overwrite)?;
    forget(store, old);
    // an overwritten destination leaves its own entry behind
    forget(store, new);
    tracing::debug!(from = %old, to = %new, "moved");
    Ok(())
}

/// Removes `path`, then drops its cached thumbnail.
///
/// Nothing is dropped when the removal fails.
pub fn delete_and_invalidate(
    fs: &dyn FileSystem,
    store: &dyn ThumbnailStore,
    path: &NormalizedPath,
) -> CoreResult<()> {
    fs.remove(path.as_ref())?;
    forget(store, path);
    tracing::debug!(%path, "deleted");
    Ok(())
}

fn forget(store: &dyn ThumbnailStore, path: &NormalizedPath) {
    if let Err(e) = store.delete(&ContentKey::of(path)) {
        tracing::warn!(%path, "failed to drop cached thumbnail: {e}");
    }
}

async fn run_blocking<T, F>(task: F) -> CoreResult<T>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await.map_err(|e| {
        CoreError::Io(std::io::Error::other(format!("blocking task failed: {e}")))
    })?
}

/// Entry point for every catalog operation.
///
/// Cloning is cheap; clones share the same file system and store handles.
#[derive(Clone)]
pub struct Catalog {
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn ThumbnailStore>,
    generator: ThumbnailGenerator,
    options: ThumbnailOptions,
    fan_out: usize,
}

impl Catalog {
    pub fn new(fs: Arc<dyn FileSystem>, store: Arc<dyn ThumbnailStore>, config: &Config) -> Self {
        let generator =
            ThumbnailGenerator::new(Arc::clone(&fs), Arc::clone(&store), &config.thumbs.types);
        Self {
            fs,
            store,
            generator,
            options: config.thumbs.options(),
            fan_out: config.catalog.fan_out.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn ThumbnailStore> {
        &self.store
    }

    /// The configured resize and encoding options.
    pub fn thumbnail_options(&self) -> ThumbnailOptions {
        self.options
    }

    /// Resolves a single item. Never generates a thumbnail.
    pub async fn resolve_item(&self, path: &str) -> Option<Item> {
        self.resolve_owned(path.to_string()).await
    }

    async fn resolve_owned(&self, path: String) -> Option<Item> {
        let fs = Arc::clone(&self.fs);
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || resolve_item(fs.as_ref(), &path, Some(store.as_ref())))
            .await
        {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("item resolution task failed: {e}");
                None
            }
        }
    }

    /// Lists the direct children of `path`, folders first.
    ///
    /// Within each group the directory's enumeration order is kept. Entries
    /// that vanish (or fail to resolve) while the listing runs are left out.
    ///
    /// # Errors
    ///
    /// Fails only if the directory itself cannot be enumerated.
    pub async fn list_directory(&self, path: &str) -> CoreResult<Vec<Item>> {
        let dir = normalize(path);
        let names = {
            let fs = Arc::clone(&self.fs);
            let dir = dir.clone();
            run_blocking(move || fs.list(dir.as_ref())).await?
        };
        let listed = names.len();

        let resolved: Vec<Option<Item>> = stream::iter(names)
            .map(|name| self.resolve_owned(dir.child(&name).into_string()))
            .buffered(self.fan_out)
            .collect()
            .await;

        let (folders, files): (Vec<Item>, Vec<Item>) =
            resolved.into_iter().flatten().partition(Item::is_folder);
        tracing::debug!(
            %dir,
            listed,
            folders = folders.len(),
            files = files.len(),
            "listed directory"
        );
        Ok(folders.into_iter().chain(files).collect())
    }

    /// Generates thumbnails for `paths`, one outcome per path in input order.
    pub async fn generate_thumbnails(
        &self,
        paths: Vec<String>,
        options: ThumbnailOptions,
    ) -> Vec<ThumbnailOutcome> {
        stream::iter(paths)
            .map(|raw| {
                let generator = self.generator.clone();
                let path = normalize(&raw);
                async move {
                    let target = path.clone();
                    let thumb = tokio::task::spawn_blocking(move || generator.generate(&target, &options))
                        .await
                        .unwrap_or_else(|e| {
                            tracing::warn!("thumbnail task failed: {e}");
                            None
                        });
                    ThumbnailOutcome { path, thumb }
                }
            })
            .buffered(self.fan_out)
            .collect()
            .await
    }

    /// Moves `old` to `new` and invalidates the cache on success.
    pub async fn invalidate_on_move(&self, old: &str, new: &str, overwrite: bool) -> CoreResult<()> {
        let fs = Arc::clone(&self.fs);
        let store = Arc::clone(&self.store);
        let (old, new) = (normalize(old), normalize(new));
        run_blocking(move || move_and_invalidate(fs.as_ref(), store.as_ref(), &old, &new, overwrite))
            .await
    }

    /// Deletes `path` and invalidates the cache on success.
    pub async fn invalidate_on_delete(&self, path: &str) -> CoreResult<()> {
        let fs = Arc::clone(&self.fs);
        let store = Arc::clone(&self.store);
        let path = normalize(path);
        run_blocking(move || delete_and_invalidate(fs.as_ref(), store.as_ref(), &path)).await
    }

    /// Applies `action` to every path independently.
    ///
    /// A batch move places each item at `destination/<name>`, replacing what
    /// is there. One item's failure never stops the others; it is recorded in
    /// the report instead.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidRequest`] for a move without a destination.
    pub async fn invalidate_batch(
        &self,
        action: BatchAction,
        paths: Vec<String>,
        destination: Option<&str>,
    ) -> CoreResult<BatchReport> {
        let destination = match (action, destination) {
            (BatchAction::Move, Some(dir)) => Some(normalize(dir)),
            (BatchAction::Move, None) => {
                return Err(CoreError::InvalidRequest(
                    "batch move requires a destination directory".to_string(),
                ))
            }
            (BatchAction::Delete, _) => None,
        };

        let outcomes: Vec<(NormalizedPath, CoreResult<()>)> = stream::iter(paths)
            .map(|raw| {
                let fs = Arc::clone(&self.fs);
                let store = Arc::clone(&self.store);
                let destination = destination.clone();
                let path = normalize(&raw);
                async move {
                    let target = path.clone();
                    let result = run_blocking(move || match destination {
                        Some(dir) => {
                            let moved = dir.child(target.name());
                            move_and_invalidate(fs.as_ref(), store.as_ref(), &target, &moved, true)
                        }
                        None => delete_and_invalidate(fs.as_ref(), store.as_ref(), &target),
                    })
                    .await;
                    (path, result)
                }
            })
            .buffered(self.fan_out)
            .collect()
            .await;

        let mut report = BatchReport::default();
        for (path, result) in outcomes {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::warn!(%path, "batch {action} failed: {e}");
                    report.failures.push(BatchFailure {
                        path: path.into_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "batch {action} finished"
        );
        Ok(report)
    }

    /// Removes every cached thumbnail and returns how many were removed.
    pub async fn clear_thumbnail_cache(&self) -> CoreResult<usize> {
        let store = Arc::clone(&self.store);
        let removed = run_blocking(move || store.clear()).await?;
        tracing::info!(removed, "cleared thumbnail cache");
        Ok(removed)
    }

    /// Creates `name` inside `parent`: an empty file when the name carries an
    /// extension, a folder otherwise. Existing entries are left untouched.
    pub async fn create_item(&self, parent: &str, name: &str) -> CoreResult<NormalizedPath> {
        let name = strip_name(name);
        if name.is_empty() {
            return Err(CoreError::InvalidName("name is empty after sanitising".to_string()));
        }
        let target = normalize(parent).child(&name);
        let is_file = extension_of(&name).is_some();

        let fs = Arc::clone(&self.fs);
        let created = target.clone();
        run_blocking(move || {
            if is_file {
                fs.create_file(created.as_ref())
            } else {
                fs.create_dir(created.as_ref())
            }
        })
        .await?;
        tracing::info!(path = %target, "created");
        Ok(target)
    }

    /// Copies a file or folder next to itself and returns the copy's path.
    ///
    /// See [`copy_target`] for naming. A copy replaces an existing file at the
    /// target, so the target's cached thumbnail is dropped once the copy lands.
    pub async fn copy_item(&self, path: &str) -> CoreResult<NormalizedPath> {
        let source = normalize(path);
        let target = copy_target(&source);

        let fs = Arc::clone(&self.fs);
        let store = Arc::clone(&self.store);
        let (src, dest) = (source.clone(), target.clone());
        run_blocking(move || {
            fs.copy(src.as_ref(), dest.as_ref())?;
            forget(store.as_ref(), &dest);
            Ok(())
        })
        .await?;
        tracing::info!(from = %source, to = %target, "copied");
        Ok(target)
    }
}

/// Path of the copy made by [`Catalog::copy_item`]: `photo.jpg` becomes
/// `photo-copy.jpg`, `album` becomes `album-copy`. The copy stays in the
/// source's folder, and a relative source gives a relative copy.
pub fn copy_target(source: &NormalizedPath) -> NormalizedPath {
    let name = source.name();
    let copy_name = match (extension_of(name), name.rfind('.')) {
        (Some(_), Some(dot)) => format!("{}-copy{}", &name[..dot], &name[dot..]),
        _ => format!("{name}-copy"),
    };
    match source.as_str().rfind('/') {
        Some(slash) => normalize(&format!("{}{copy_name}", &source.as_str()[..=slash])),
        None => normalize(&copy_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::classify::ItemType;
    use crate::fs::ops::{EntryStat, LocalFs};
    use crate::thumb::generator::EncodingOptions;
    use crate::thumb::store::MemoryThumbnailStore;
    use image::{ImageBuffer, Rgb};
    use std::collections::HashSet;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn memory_store() -> Arc<dyn ThumbnailStore> {
        Arc::new(MemoryThumbnailStore::new())
    }

    fn catalog(store: Arc<dyn ThumbnailStore>) -> Catalog {
        Catalog::new(Arc::new(LocalFs), store, &Config::default())
    }

    fn raw(tmp: &TempDir, name: &str) -> String {
        tmp.path().join(name).to_string_lossy().into_owned()
    }

    fn key(tmp: &TempDir, name: &str) -> ContentKey {
        ContentKey::of(&normalize(&raw(tmp, name)))
    }

    fn write_jpeg(path: &Path) {
        let img = ImageBuffer::from_pixel(320, 240, Rgb([10u8, 120, 200]));
        img.save(path).unwrap();
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(Item::name).collect()
    }

    /// File system with a fixed enumeration order. Names in `dirs` are folders,
    /// `ghosts` vanish before they can be stat'ed and `bombs` panic on stat.
    struct ScriptedFs {
        names: Vec<&'static str>,
        dirs: HashSet<&'static str>,
        ghosts: HashSet<&'static str>,
        bombs: HashSet<&'static str>,
    }

    impl ScriptedFs {
        fn new(names: &[&'static str]) -> Self {
            Self {
                names: names.to_vec(),
                dirs: HashSet::new(),
                ghosts: HashSet::new(),
                bombs: HashSet::new(),
            }
        }

        fn unsupported(path: &Path) -> CoreError {
            CoreError::PermissionDenied(path.to_path_buf())
        }
    }

    impl FileSystem for ScriptedFs {
        fn stat(&self, path: &Path) -> CoreResult<EntryStat> {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if self.bombs.contains(name) {
                panic!("stat exploded on {name}");
            }
            if self.ghosts.contains(name) {
                return Err(CoreError::NotFound(path.to_path_buf()));
            }
            Ok(EntryStat {
                is_dir: path == Path::new("/scripted") || self.dirs.contains(name),
                len: 10,
                created: None,
                modified: None,
            })
        }

        fn list(&self, path: &Path) -> CoreResult<Vec<String>> {
            if path == Path::new("/scripted") {
                Ok(self.names.iter().map(|n| n.to_string()).collect())
            } else {
                Ok(Vec::new())
            }
        }

        fn read(&self, path: &Path) -> CoreResult<Vec<u8>> {
            Err(Self::unsupported(path))
        }

        fn move_entry(&self, src: &Path, _dest: &Path, _overwrite: bool) -> CoreResult<()> {
            Err(Self::unsupported(src))
        }

        fn remove(&self, path: &Path) -> CoreResult<()> {
            Err(Self::unsupported(path))
        }

        fn copy(&self, src: &Path, _dest: &Path) -> CoreResult<()> {
            Err(Self::unsupported(src))
        }

        fn create_file(&self, path: &Path) -> CoreResult<()> {
            Err(Self::unsupported(path))
        }

        fn create_dir(&self, path: &Path) -> CoreResult<()> {
            Err(Self::unsupported(path))
        }
    }

    fn scripted_catalog(fs: ScriptedFs) -> Catalog {
        Catalog::new(Arc::new(fs), memory_store(), &Config::default())
    }

    #[tokio::test]
    async fn listing_puts_folders_before_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::create_dir(tmp.path().join("zeta")).unwrap();
        fs::write(tmp.path().join("a.png"), "a").unwrap();
        fs::create_dir(tmp.path().join("alpha")).unwrap();

        let items = catalog(memory_store())
            .list_directory(&tmp.path().to_string_lossy())
            .await
            .unwrap();

        assert_eq!(items.len(), 4);
        assert!(items[..2].iter().all(Item::is_folder));
        assert!(items[2..].iter().all(|item| !item.is_folder()));
        let mut all: Vec<&str> = names(&items);
        all.sort_unstable();
        assert_eq!(all, vec!["a.png", "alpha", "b.txt", "zeta"]);
    }

    #[tokio::test]
    async fn listing_keeps_enumeration_order_within_groups() {
        let mut fs = ScriptedFs::new(&["c.txt", "dirB", "a.txt", "dirA", "b.mp3"]);
        fs.dirs.extend(["dirB", "dirA"]);

        let items = scripted_catalog(fs).list_directory("/scripted/").await.unwrap();

        assert_eq!(names(&items), vec!["dirB", "dirA", "c.txt", "a.txt", "b.mp3"]);
        assert_eq!(items[4].item_type(), ItemType::Audio);
    }

    #[tokio::test]
    async fn listing_is_stable_with_fan_out_of_one() {
        let mut fs = ScriptedFs::new(&["x.txt", "d1", "y.txt", "d2"]);
        fs.dirs.extend(["d1", "d2"]);
        let mut config = Config::default();
        config.catalog.fan_out = 1;
        let catalog = Catalog::new(Arc::new(fs), memory_store(), &config);

        let items = catalog.list_directory("/scripted").await.unwrap();

        assert_eq!(names(&items), vec!["d1", "d2", "x.txt", "y.txt"]);
    }

    #[tokio::test]
    async fn listing_drops_vanished_entries() {
        let mut fs = ScriptedFs::new(&["keep.txt", "ghost.txt", "also.txt"]);
        fs.ghosts.insert("ghost.txt");

        let items = scripted_catalog(fs).list_directory("/scripted").await.unwrap();

        assert_eq!(names(&items), vec!["keep.txt", "also.txt"]);
    }

    #[tokio::test]
    async fn listing_survives_a_panicking_resolution() {
        let mut fs = ScriptedFs::new(&["ok.txt", "boom.txt", "fine.txt"]);
        fs.bombs.insert("boom.txt");

        let items = scripted_catalog(fs).list_directory("/scripted").await.unwrap();

        assert_eq!(names(&items), vec!["ok.txt", "fine.txt"]);
    }

    #[tokio::test]
    async fn listing_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();

        let result = catalog(memory_store()).list_directory(&raw(&tmp, "nope")).await;

        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("plain.txt"), "").unwrap();

        let result = catalog(memory_store()).list_directory(&raw(&tmp, "plain.txt")).await;

        assert!(matches!(result.unwrap_err(), CoreError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn listing_reads_cached_thumbnails_only() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("cached.jpg"));
        write_jpeg(&tmp.path().join("fresh.jpg"));
        let store = memory_store();
        store.put(&key(&tmp, "cached.jpg"), "data:image/jpeg;base64,QQ==").unwrap();

        let items = catalog(Arc::clone(&store))
            .list_directory(&tmp.path().to_string_lossy())
            .await
            .unwrap();

        let cached = items.iter().find(|i| i.name() == "cached.jpg").unwrap();
        let fresh = items.iter().find(|i| i.name() == "fresh.jpg").unwrap();
        assert_eq!(cached.thumbnail(), "data:image/jpeg;base64,QQ==");
        assert_eq!(fresh.thumbnail(), "");
        assert!(store.get(&key(&tmp, "fresh.jpg")).unwrap().is_none());
    }

    #[tokio::test]
    async fn thumbnail_round_trip_through_delete() {
        let tmp = TempDir::new().unwrap();
        let photo = raw(&tmp, "photo.jpg");
        write_jpeg(Path::new(&photo));
        let catalog = catalog(memory_store());

        let outcomes = catalog
            .generate_thumbnails(vec![photo.clone()], catalog.thumbnail_options())
            .await;
        let payload = outcomes[0].thumb.clone().unwrap();
        let item = catalog.resolve_item(&photo).await.unwrap();
        assert_eq!(item.thumbnail(), payload);

        catalog.invalidate_on_delete(&photo).await.unwrap();
        assert!(catalog.resolve_item(&photo).await.is_none());

        write_jpeg(Path::new(&photo));
        let item = catalog.resolve_item(&photo).await.unwrap();
        assert_eq!(item.thumbnail(), "");
    }

    #[tokio::test]
    async fn generate_reports_every_path_in_order() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("one.jpg"));
        fs::write(tmp.path().join("notes.txt"), "text").unwrap();
        write_jpeg(&tmp.path().join("two.jpg"));
        let catalog = catalog(memory_store());
        let paths = vec![
            raw(&tmp, "one.jpg"),
            raw(&tmp, "notes.txt"),
            raw(&tmp, "missing.jpg"),
            format!("{}/", raw(&tmp, "two.jpg")),
        ];

        let outcomes = catalog
            .generate_thumbnails(paths, catalog.thumbnail_options())
            .await;

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].thumb.is_some());
        assert!(outcomes[1].thumb.is_none());
        assert!(outcomes[2].thumb.is_none());
        assert!(outcomes[3].thumb.is_some());
        assert_eq!(outcomes[3].path, normalize(&raw(&tmp, "two.jpg")));
    }

    #[tokio::test]
    async fn generate_honours_requested_options() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("wide.jpg"));
        let catalog = catalog(memory_store());
        let options = ThumbnailOptions {
            max_width: 40,
            max_height: 400,
            encoding: EncodingOptions { quality: 90 },
        };

        let outcomes = catalog
            .generate_thumbnails(vec![raw(&tmp, "wide.jpg")], options)
            .await;

        let payload = outcomes[0].thumb.as_deref().unwrap();
        let encoded = payload.strip_prefix("data:image/jpeg;base64,").unwrap();
        use base64::Engine;
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[tokio::test]
    async fn move_drops_old_entry_and_leaves_new_path_ungenerated() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("before.jpg"));
        let store = memory_store();
        let catalog = catalog(Arc::clone(&store));
        catalog
            .generate_thumbnails(vec![raw(&tmp, "before.jpg")], catalog.thumbnail_options())
            .await;

        catalog
            .invalidate_on_move(&raw(&tmp, "before.jpg"), &raw(&tmp, "after.jpg"), false)
            .await
            .unwrap();

        assert!(store.get(&key(&tmp, "before.jpg")).unwrap().is_none());
        let moved = catalog.resolve_item(&raw(&tmp, "after.jpg")).await.unwrap();
        assert_eq!(moved.thumbnail(), "");
    }

    #[tokio::test]
    async fn failed_move_keeps_cache_entry() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("a.jpg"));
        write_jpeg(&tmp.path().join("b.jpg"));
        let store = memory_store();
        store.put(&key(&tmp, "a.jpg"), "data:image/jpeg;base64,QQ==").unwrap();
        let catalog = catalog(Arc::clone(&store));

        let result = catalog
            .invalidate_on_move(&raw(&tmp, "a.jpg"), &raw(&tmp, "b.jpg"), false)
            .await;

        assert!(matches!(result.unwrap_err(), CoreError::AlreadyExists(_)));
        let item = catalog.resolve_item(&raw(&tmp, "a.jpg")).await.unwrap();
        assert_eq!(item.thumbnail(), "data:image/jpeg;base64,QQ==");
    }

    #[tokio::test]
    async fn overwriting_move_drops_destination_entry() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("a.jpg"));
        write_jpeg(&tmp.path().join("b.jpg"));
        let store = memory_store();
        store.put(&key(&tmp, "b.jpg"), "data:image/jpeg;base64,Qg==").unwrap();

        catalog(Arc::clone(&store))
            .invalidate_on_move(&raw(&tmp, "a.jpg"), &raw(&tmp, "b.jpg"), true)
            .await
            .unwrap();

        assert!(!tmp.path().join("a.jpg").exists());
        assert!(store.get(&key(&tmp, "b.jpg")).unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_delete_keeps_cache_entry() {
        let tmp = TempDir::new().unwrap();
        let store = memory_store();
        store.put(&key(&tmp, "gone.jpg"), "data:image/jpeg;base64,QQ==").unwrap();

        let result = catalog(Arc::clone(&store))
            .invalidate_on_delete(&raw(&tmp, "gone.jpg"))
            .await;

        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
        assert!(store.get(&key(&tmp, "gone.jpg")).unwrap().is_some());
    }

    #[tokio::test]
    async fn mutation_succeeds_when_store_is_closed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("doomed.txt"), "").unwrap();
        let store = memory_store();
        store.close().unwrap();

        catalog(store)
            .invalidate_on_delete(&raw(&tmp, "doomed.txt"))
            .await
            .unwrap();

        assert!(!tmp.path().join("doomed.txt").exists());
    }

    #[tokio::test]
    async fn batch_delete_isolates_failures() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("one.txt"), "").unwrap();
        fs::write(tmp.path().join("three.txt"), "").unwrap();
        let store = memory_store();
        store.put(&key(&tmp, "one.txt"), "x").unwrap();
        store.put(&key(&tmp, "three.txt"), "x").unwrap();
        let paths = vec![raw(&tmp, "one.txt"), raw(&tmp, "two.txt"), raw(&tmp, "three.txt")];

        let report = catalog(Arc::clone(&store))
            .invalidate_batch(BatchAction::Delete, paths, None)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, normalize(&raw(&tmp, "two.txt")).as_str());
        assert!(!report.is_complete());
        assert!(!tmp.path().join("one.txt").exists());
        assert!(!tmp.path().join("three.txt").exists());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[tokio::test]
    async fn batch_move_places_items_in_destination() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::create_dir(tmp.path().join("dest")).unwrap();
        fs::write(tmp.path().join("src").join("a.txt"), "new").unwrap();
        fs::create_dir(tmp.path().join("src").join("folder")).unwrap();
        fs::write(tmp.path().join("dest").join("a.txt"), "old").unwrap();
        let paths = vec![raw(&tmp, "src/a.txt"), raw(&tmp, "src/folder")];

        let report = catalog(memory_store())
            .invalidate_batch(BatchAction::Move, paths, Some(&raw(&tmp, "dest")))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert!(report.is_complete());
        assert_eq!(
            fs::read_to_string(tmp.path().join("dest").join("a.txt")).unwrap(),
            "new"
        );
        assert!(tmp.path().join("dest").join("folder").is_dir());
        assert!(!tmp.path().join("src").join("a.txt").exists());
    }

    #[tokio::test]
    async fn batch_move_onto_containing_folder_fails_without_data_loss() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("r").join("p").join("p");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("keep.txt"), "keep").unwrap();
        fs::write(tmp.path().join("r").join("p").join("sibling.txt"), "sib").unwrap();

        let report = catalog(memory_store())
            .invalidate_batch(BatchAction::Move, vec![raw(&tmp, "r/p/p")], Some(&raw(&tmp, "r")))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(fs::read_to_string(nested.join("keep.txt")).unwrap(), "keep");
        assert!(tmp.path().join("r").join("p").join("sibling.txt").is_file());
    }

    #[tokio::test]
    async fn move_into_own_subfolder_keeps_cache_and_tree() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("a").join("sub")).unwrap();
        let store = memory_store();
        store.put(&key(&tmp, "a"), "data:image/jpeg;base64,QQ==").unwrap();

        let result = catalog(Arc::clone(&store))
            .invalidate_on_move(&raw(&tmp, "a"), &raw(&tmp, "a/sub/a"), false)
            .await;

        assert!(matches!(result.unwrap_err(), CoreError::InvalidRequest(_)));
        assert!(!tmp.path().join("a").join("sub").join("a").exists());
        assert!(store.get(&key(&tmp, "a")).unwrap().is_some());
    }

    #[tokio::test]
    async fn batch_move_without_destination_is_rejected() {
        let result = catalog(memory_store())
            .invalidate_batch(BatchAction::Move, vec!["/tmp/x".to_string()], None)
            .await;

        assert!(matches!(result.unwrap_err(), CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn empty_batch_reports_nothing() {
        let report = catalog(memory_store())
            .invalidate_batch(BatchAction::Delete, Vec::new(), None)
            .await
            .unwrap();

        assert_eq!(report, BatchReport::default());
    }

    #[test]
    fn batch_summary_messages() {
        let report = BatchReport {
            succeeded: 1,
            failures: Vec::new(),
        };
        assert_eq!(report.summary(BatchAction::Move), "1 item moved successfully.");

        let report = BatchReport {
            succeeded: 3,
            failures: Vec::new(),
        };
        assert_eq!(report.summary(BatchAction::Delete), "3 items deleted successfully.");
    }

    #[test]
    fn batch_action_parses_lowercase() {
        let action: BatchAction = serde_json::from_str("\"move\"").unwrap();
        assert_eq!(action, BatchAction::Move);
        assert!(serde_json::from_str::<BatchAction>("\"copy\"").is_err());
    }

    #[tokio::test]
    async fn clearing_twice_reports_zero_second_time() {
        let store = memory_store();
        store.put(&ContentKey::of(&normalize("/a.jpg")), "x").unwrap();
        store.put(&ContentKey::of(&normalize("/b.jpg")), "y").unwrap();
        let catalog = catalog(store);

        assert_eq!(catalog.clear_thumbnail_cache().await.unwrap(), 2);
        assert_eq!(catalog.clear_thumbnail_cache().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn create_item_file_or_folder_by_extension() {
        let tmp = TempDir::new().unwrap();
        let catalog = catalog(memory_store());
        let parent = tmp.path().to_string_lossy().into_owned();

        let file = catalog.create_item(&parent, "readme.md").await.unwrap();
        let folder = catalog.create_item(&parent, "Photos 2024").await.unwrap();

        assert!(tmp.path().join("readme.md").is_file());
        assert!(tmp.path().join("Photos 2024").is_dir());
        assert_eq!(file, normalize(&raw(&tmp, "readme.md")));
        assert_eq!(folder.name(), "Photos 2024");
    }

    #[tokio::test]
    async fn create_item_sanitises_name() {
        let tmp = TempDir::new().unwrap();
        let catalog = catalog(memory_store());

        let created = catalog
            .create_item(&tmp.path().to_string_lossy(), "../escape/me.txt")
            .await
            .unwrap();

        assert_eq!(created.name(), ".. escape me.txt");
        assert!(tmp.path().join(".. escape me.txt").is_file());
    }

    #[tokio::test]
    async fn create_item_rejects_empty_name() {
        let tmp = TempDir::new().unwrap();

        let result = catalog(memory_store())
            .create_item(&tmp.path().to_string_lossy(), "..")
            .await;

        assert!(matches!(result.unwrap_err(), CoreError::InvalidName(_)));
    }

    #[tokio::test]
    async fn copy_item_names_copies() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("photo.JPG"), "jpg").unwrap();
        fs::create_dir(tmp.path().join("album")).unwrap();
        fs::write(tmp.path().join("album").join("inner.txt"), "hi").unwrap();
        let catalog = catalog(memory_store());

        let file = catalog.copy_item(&raw(&tmp, "photo.JPG")).await.unwrap();
        let folder = catalog.copy_item(&raw(&tmp, "album")).await.unwrap();

        assert_eq!(file.name(), "photo-copy.JPG");
        assert_eq!(fs::read_to_string(tmp.path().join("photo-copy.JPG")).unwrap(), "jpg");
        assert_eq!(folder.name(), "album-copy");
        assert!(tmp.path().join("album-copy").join("inner.txt").is_file());
    }

    #[tokio::test]
    async fn copy_item_drops_thumbnail_of_replaced_target() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("photo.png"), "new bytes").unwrap();
        fs::write(tmp.path().join("photo-copy.png"), "old bytes").unwrap();
        let store = memory_store();
        store.put(&key(&tmp, "photo-copy.png"), "data:image/jpeg;base64,OLD").unwrap();
        let catalog = catalog(Arc::clone(&store));

        catalog.copy_item(&raw(&tmp, "photo.png")).await.unwrap();

        assert_eq!(fs::read_to_string(tmp.path().join("photo-copy.png")).unwrap(), "new bytes");
        let copy = catalog.resolve_item(&raw(&tmp, "photo-copy.png")).await.unwrap();
        assert_eq!(copy.thumbnail(), "");
        assert!(store.get(&key(&tmp, "photo-copy.png")).unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_copy_keeps_target_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let store = memory_store();
        store.put(&key(&tmp, "none-copy.png"), "data:image/jpeg;base64,QQ==").unwrap();

        let result = catalog(Arc::clone(&store)).copy_item(&raw(&tmp, "none.png")).await;

        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
        assert!(store.get(&key(&tmp, "none-copy.png")).unwrap().is_some());
    }

    #[tokio::test]
    async fn copy_item_missing_source_fails() {
        let tmp = TempDir::new().unwrap();

        let result = catalog(memory_store()).copy_item(&raw(&tmp, "nothing.txt")).await;

        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn copy_target_naming() {
        assert_eq!(copy_target(&normalize("/a/b/report.tar.gz")).as_str(), "/a/b/report.tar-copy.gz");
        assert_eq!(copy_target(&normalize("/a/Makefile")).as_str(), "/a/Makefile-copy");
        assert_eq!(copy_target(&normalize("/data")).as_str(), "/data-copy");
    }

    #[test]
    fn copy_target_keeps_relative_paths_relative() {
        assert_eq!(copy_target(&normalize("photo.jpg")).as_str(), "photo-copy.jpg");
        assert_eq!(copy_target(&normalize("album")).as_str(), "album-copy");
        assert_eq!(copy_target(&normalize("pics/photo.jpg")).as_str(), "pics/photo-copy.jpg");
    }
}
