//! Thumbnail generation for image files.

use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::fs::classify::extension_of;
use crate::fs::ops::FileSystem;
use crate::path::NormalizedPath;
use crate::thumb::key::ContentKey;
use crate::thumb::store::ThumbnailStore;

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// JPEG encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {
    /// 1-100, clamped.
    pub quality: u8,
}

/// Bounding box and encoding for generated thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub encoding: EncodingOptions,
}

/// Produces JPEG thumbnails and records them in the [`ThumbnailStore`].
///
/// Generation is only ever triggered explicitly; resolving or listing items
/// reads the store but never calls into the generator.
#[derive(Clone)]
pub struct ThumbnailGenerator {
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn ThumbnailStore>,
    types: Vec<String>,
}

impl ThumbnailGenerator {
    /// Creates a generator accepting the given image extensions.
    pub fn new(fs: Arc<dyn FileSystem>, store: Arc<dyn ThumbnailStore>, types: &[String]) -> Self {
        Self {
            fs,
            store,
            types: types.iter().map(|t| t.to_ascii_lowercase()).collect(),
        }
    }

    /// Returns `true` if the path's extension is on the allow-list.
    pub fn is_eligible(&self, path: &NormalizedPath) -> bool {
        extension_of(path.name())
            .map(|ext| self.types.contains(&ext))
            .unwrap_or(false)
    }

    /// Generates the thumbnail for `path` and stores it under the path's key.
    ///
    /// Returns `None` (skipped) when the path is missing, is not a regular
    /// file, is not on the allow-list, or cannot be decoded or encoded. A
    /// failed cache write is logged and the payload is still returned.
    pub fn generate(&self, path: &NormalizedPath, options: &ThumbnailOptions) -> Option<String> {
        match self.fs.stat(path.as_ref()) {
            Ok(stat) if !stat.is_dir => {}
            Ok(_) => {
                tracing::debug!(%path, "thumbnail skipped: not a file");
                return None;
            }
            Err(e) => {
                tracing::debug!(%path, "thumbnail skipped: {e}");
                return None;
            }
        }
        if !self.is_eligible(path) {
            tracing::debug!(%path, "thumbnail skipped: extension not allowed");
            return None;
        }

        let data = match self.fs.read(path.as_ref()) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(%path, "thumbnail skipped, read failed: {e}");
                return None;
            }
        };
        let encoded = match render_thumbnail(&data, options) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(%path, "thumbnail skipped, image error: {e}");
                return None;
            }
        };

        let payload = data_uri(&encoded);
        if let Err(e) = self.store.put(&ContentKey::of(path), &payload) {
            tracing::warn!(%path, "failed to cache thumbnail: {e}");
        }
        tracing::debug!(%path, bytes = encoded.len(), "generated thumbnail");
        Some(payload)
    }
}

/// Decodes `data`, fits it to the options' bounding box and re-encodes it as JPEG.
pub fn render_thumbnail(data: &[u8], options: &ThumbnailOptions) -> image::ImageResult<Vec<u8>> {
    let img = image::load_from_memory(data)?;
    let (width, height) = img.dimensions();

    let img = match target_dimensions(width, height, options) {
        Some((w, h)) => img.resize_exact(w, h, FilterType::Triangle),
        None => img,
    };
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Cursor::new(Vec::new());
    let quality = options.encoding.quality.clamp(1, 100);
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf.into_inner())
}

/// Returns the resized dimensions for a `width` x `height` image, or `None`
/// when it already fits.
///
/// An image taller than `max_height` is scaled to exactly that height; else
/// one wider than `max_width` is scaled to that width. Aspect ratio is kept
/// in both cases.
pub fn target_dimensions(width: u32, height: u32, options: &ThumbnailOptions) -> Option<(u32, u32)> {
    let max_width = options.max_width.max(1);
    let max_height = options.max_height.max(1);

    if height > max_height {
        let scaled = (f64::from(width) * f64::from(max_height) / f64::from(height)).round();
        Some(((scaled as u32).max(1), max_height))
    } else if width > max_width {
        let scaled = (f64::from(height) * f64::from(max_width) / f64::from(width)).round();
        Some((max_width, (scaled as u32).max(1)))
    } else {
        None
    }
}

/// Wraps encoded JPEG bytes in a self-describing data URI.
pub fn data_uri(jpeg: &[u8]) -> String {
    format!("{DATA_URI_PREFIX}{}", BASE64.encode(jpeg))
}
