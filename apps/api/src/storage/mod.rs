//! Upload storage: a flat directory of uploaded images and their analysis sidecars.
//!
//! Layout: `{root}/{generated_name}` holds the image bytes and
//! `{root}/{generated_name}.json` holds the pretty-printed analysis.
//! Generated names are `{unix_millis}-{random < 1e9}-{sanitized original name}`.
//! Collisions between concurrent uploads are possible in principle; the image file is
//! opened with `create_new` so a collision fails the upload instead of overwriting.

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::models::analysis::AnalysisResult;
use crate::models::upload::UploadedImage;

/// Route prefix under which stored files are served back.
pub const UPLOADS_ROUTE_PREFIX: &str = "/api/uploads";

/// Cache directive for stored files. Generated names are never reused.
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const FALLBACK_FILE_NAME: &str = "upload";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Result of a successful store.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub file_name: String,
    pub image_path: PathBuf,
    pub sidecar_path: PathBuf,
    /// Relative URL the image can be fetched back from.
    pub url: String,
}

/// An opened stored file ready to be streamed.
#[derive(Debug)]
pub struct StoredFile {
    pub file: fs::File,
    pub len: u64,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image under a generated name, then its analysis sidecar next to it.
    pub async fn store(
        &self,
        image: &UploadedImage,
        analysis: &AnalysisResult,
    ) -> Result<StoredUpload, StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(io_error(&self.root))?;

        let file_name = generate_file_name(&image.file_name);
        let image_path = self.root.join(&file_name);
        let sidecar_path = self.root.join(format!("{file_name}.json"));

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&image_path)
            .await
            .map_err(io_error(&image_path))?;
        file.write_all(&image.bytes)
            .await
            .map_err(io_error(&image_path))?;
        file.flush().await.map_err(io_error(&image_path))?;

        if let Err(e) = write_sidecar(&sidecar_path, analysis).await {
            discard_orphan_image(&image_path).await;
            return Err(e);
        }

        info!(
            "Stored upload {} ({} bytes) with analysis sidecar",
            file_name,
            image.bytes.len()
        );

        Ok(StoredUpload {
            url: format!("{UPLOADS_ROUTE_PREFIX}/{file_name}"),
            file_name,
            image_path,
            sidecar_path,
        })
    }

    /// Opens a stored file by its path relative to the storage root.
    ///
    /// `relative` must be a plain relative path: absolute paths and `..` are rejected
    /// with `InvalidPath`. Missing files, directories, and anything that resolves outside
    /// the root (e.g. via a symlink) are `NotFound`.
    pub async fn open(&self, relative: &str) -> Result<StoredFile, StorageError> {
        let path = self.resolve(relative)?;

        let meta = match fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(relative.to_string()))
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        if !meta.is_file() {
            return Err(StorageError::NotFound(relative.to_string()));
        }

        let canonical_root = fs::canonicalize(&self.root)
            .await
            .map_err(io_error(&self.root))?;
        let canonical = fs::canonicalize(&path).await.map_err(io_error(&path))?;
        if !canonical.starts_with(&canonical_root) {
            warn!(
                "Refusing to serve {} - resolves outside upload root",
                path.display()
            );
            return Err(StorageError::NotFound(relative.to_string()));
        }

        let file = fs::File::open(&canonical)
            .await
            .map_err(io_error(&canonical))?;
        debug!("Serving stored file {} ({} bytes)", relative, meta.len());

        Ok(StoredFile {
            file,
            len: meta.len(),
            content_type: content_type_for(relative),
        })
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let candidate = Path::new(relative);
        let is_plain = !relative.is_empty()
            && !relative.contains('\0')
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}

async fn write_sidecar(path: &Path, analysis: &AnalysisResult) -> Result<(), StorageError> {
    let sidecar = serde_json::to_vec_pretty(analysis)?;
    fs::write(path, sidecar).await.map_err(io_error(path))
}

/// Best-effort removal of an image whose sidecar could not be written.
async fn discard_orphan_image(image_path: &Path) {
    match fs::remove_file(image_path).await {
        Ok(()) => warn!(
            "Removed {} after its analysis sidecar failed to write",
            image_path.display()
        ),
        Err(e) => warn!(
            "Could not remove {} after its analysis sidecar failed to write: {e}",
            image_path.display()
        ),
    }
}

/// `{unix_millis}-{random < 1e9}-{sanitized original}`
pub fn generate_file_name(original: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        suffix,
        sanitize_file_name(original)
    )
}

/// Keeps only the last path segment and maps anything outside `[A-Za-z0-9._-]` to `_`,
/// so the result is a single URL-safe path segment.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '.') {
        FALLBACK_FILE_NAME.to_string()
    } else {
        cleaned
    }
}

/// Content type from the file extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}
