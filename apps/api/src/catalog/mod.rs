//! Furniture catalog loading.
//!
//! The catalog is a directory of JSON files, each `{ "data": record | [records] }`.
//! It is re-read on every call with no process-wide cache, so edits to the directory take
//! effect on the next upload.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::models::furniture::{CatalogFile, FurnitureRecord};

/// Read-through accessor for the on-disk catalog.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    dir: PathBuf,
}

impl CatalogSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every record currently on disk. Never fails; see [`load_catalog`].
    pub async fn load(&self) -> Vec<FurnitureRecord> {
        load_catalog(&self.dir).await
    }
}

/// Loads and flattens all catalog files in `dir`.
///
/// Unreadable or malformed files are skipped with a warning. A directory-level failure
/// (missing directory, permissions) is logged and yields an empty catalog.
/// Order: files sorted by name, then in-file order. Duplicate ids are kept.
pub async fn load_catalog(dir: &Path) -> Vec<FurnitureRecord> {
    let files = match list_json_files(dir).await {
        Ok(files) => files,
        Err(e) => {
            error!("Error loading furniture catalog from {}: {e:#}", dir.display());
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for path in files {
        match read_catalog_file(&path).await {
            Ok(mut file_records) => {
                debug!(
                    "Loaded {} catalog records from {}",
                    file_records.len(),
                    path.display()
                );
                records.append(&mut file_records);
            }
            Err(e) => warn!("Skipping catalog file {}: {e:#}", path.display()),
        }
    }

    info!(
        "Furniture catalog loaded: {} records from {}",
        records.len(),
        dir.display()
    );
    records
}

async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("cannot read directory {}", dir.display()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_name().to_string_lossy().ends_with(".json") {
            continue;
        }
        let path = entry.path();
        // metadata() follows symlinks, so a linked catalog file still counts as regular
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping catalog entry {}: {e}", path.display()),
        }
    }

    files.sort();
    Ok(files)
}

async fn read_catalog_file(path: &Path) -> Result<Vec<FurnitureRecord>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .context("read failed")?;
    let file: CatalogFile =
        serde_json::from_str(&content).context("not a {\"data\": ...} catalog document")?;
    Ok(file.data.into_records())
}

/// Renders the catalog as compact text for embedding in the analysis prompt.
/// One line per record; empty attributes are omitted.
pub fn catalog_prompt_text(records: &[FurnitureRecord]) -> String {
    let mut out = String::new();
    for record in records {
        let _ = write!(out, "- id: {} | name: {}", record.id, record.name);
        for (label, value) in [
            ("category", &record.category),
            ("wood", &record.wood_type),
            ("finish", &record.finish),
        ] {
            if !value.is_empty() {
                let _ = write!(out, " | {label}: {value}");
            }
        }
        let d = &record.dimensions;
        if d.width > 0.0 || d.height > 0.0 || d.depth > 0.0 {
            let _ = write!(out, " | size WxHxD: {}x{}x{}", d.width, d.height, d.depth);
        }
        let _ = write!(out, " | price: {}", record.price);
        if let Some(tags) = record.tags.as_ref().filter(|t| !t.is_empty()) {
            let _ = write!(out, " | tags: {}", tags.join(", "));
        }
        if !record.description.is_empty() {
            let _ = write!(out, " | description: {}", record.description);
        }
        out.push('\n');
    }
    out
}
