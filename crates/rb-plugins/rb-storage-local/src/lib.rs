//! # rb-storage-local
//! rusty-blog/crates/rb-plugins/rb-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Image validation, content-addressable storage, directory sharding, and thumbnailing.

use async_trait::async_trait;
use image::io::Reader as ImageReader;
use image::{DynamicImage, ImageFormat};
use rb_core::error::{AppError, Result};
use rb_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::PathBuf;
use tokio::fs;

/// Subdirectory of the media root that holds post images.
pub const UPLOAD_DIR: &str = "posts";
/// Bounding box of generated thumbnails, in pixels.
pub const THUMBNAIL_SIZE: u32 = 250;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Generates a sharded relative path: "posts/ab/cd/abcd...hash.ext"
    fn sharded_path(hash: &str, extension: &str) -> String {
        format!("{UPLOAD_DIR}/{}/{}/{hash}.{extension}", &hash[0..2], &hash[2..4])
    }

    /// "posts/ab/cd/<hash>.gif" -> "posts/ab/cd/thumb_<hash>.png"
    fn thumbnail_path(media_id: &str) -> String {
        let (dir, file) = media_id.rsplit_once('/').unwrap_or(("", media_id));
        let stem = file.split_once('.').map(|(stem, _)| stem).unwrap_or(file);
        if dir.is_empty() {
            format!("thumb_{stem}.png")
        } else {
            format!("{dir}/thumb_{stem}.png")
        }
    }

    fn invalid_image(filename: &str, reason: impl std::fmt::Display) -> AppError {
        AppError::ValidationError(format!("{filename} is not a usable image: {reason}"))
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        // 1. Validate: the bytes must decode as an image
        let reader = ImageReader::new(Cursor::new(data.as_slice()))
            .with_guessed_format()
            .map_err(|e| Self::invalid_image(filename, e))?;
        let format = reader
            .format()
            .ok_or_else(|| Self::invalid_image(filename, "unrecognised format"))?;
        let img = reader.decode().map_err(|e| Self::invalid_image(filename, e))?;

        // 2. Calculate Hash
        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = format!("{:x}", hasher.finalize());

        let extension = format.extensions_str().first().copied().unwrap_or("img");
        let media_id = Self::sharded_path(&hash, extension);
        let target_path = self.root_path.join(&media_id);

        // 3. Ensure directory exists
        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("cannot create {}: {e}", parent.display())))?;
        }

        // 4. Save Original (if not exists)
        if !target_path.exists() {
            fs::write(&target_path, &data)
                .await
                .map_err(|e| AppError::Internal(format!("cannot write {}: {e}", target_path.display())))?;
            log::info!("stored upload {filename} as {media_id}");
        }

        // 5. Thumbnail, checked on its own so a failed earlier attempt is redone
        let thumb_relative = Self::thumbnail_path(&media_id);
        if !self.root_path.join(&thumb_relative).exists() {
            self.generate_thumbnail(img, &thumb_relative)?;
        }

        Ok(media_id)
    }

    fn url(&self, media_id: &str) -> String {
        format!("{}/{}", self.url_prefix, media_id)
    }

    fn thumbnail_url(&self, media_id: &str) -> String {
        format!("{}/{}", self.url_prefix, Self::thumbnail_path(media_id))
    }
}

impl LocalMediaStore {
    /// Internal helper to write a PNG thumbnail next to the original.
    fn generate_thumbnail(&self, img: DynamicImage, relative: &str) -> Result<()> {
        let thumb = img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE);
        let thumb_path = self.root_path.join(relative);
        thumb
            .save_with_format(&thumb_path, ImageFormat::Png)
            .map_err(|e| AppError::Internal(format!("cannot write thumbnail {}: {e}", thumb_path.display())))
    }
}
