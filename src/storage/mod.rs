//! Uploaded file storage.
//!
//! Files are content-addressed: the stored name is the SHA-256 of the bytes
//! plus the original extension, so re-uploading identical content reuses
//! the same object. Each [`UploadKind`] only admits its own extensions.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File too large (limit {limit} bytes)")]
    TooLarge { limit: usize },

    #[error("Unsupported file type .{extension} (allowed: {})", .allowed.join(", "))]
    UnsupportedType {
        extension: String,
        allowed: &'static [&'static str],
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What an upload is for; decides its folder and accepted extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    ProfileImage,
    Submission,
}

impl UploadKind {
    pub fn folder(self) -> &'static str {
        match self {
            UploadKind::ProfileImage => "profiles",
            UploadKind::Submission => "submissions",
        }
    }

    /// Never includes anything a browser would render as active content.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadKind::ProfileImage => &["jpg", "jpeg", "png"],
            UploadKind::Submission => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "md", "csv", "zip", "jpg", "jpeg", "png",
            ],
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `bytes` for `kind` and returns the public URL path.
    async fn put(&self, kind: UploadKind, original_name: Option<&str>, bytes: &[u8]) -> Result<String, StorageError>;
}

pub struct LocalObjectStore {
    root: PathBuf,
    public_path: String,
    max_file_bytes: usize,
}

impl LocalObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
            public_path: config.public_path.trim_end_matches('/').to_string(),
            max_file_bytes: config.max_file_bytes,
        }
    }
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Lowercased alphanumeric extension of at most 8 characters, or `bin`.
fn safe_extension(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

fn checked_extension(kind: UploadKind, original_name: Option<&str>) -> Result<String, StorageError> {
    let extension = safe_extension(original_name);
    let allowed = kind.allowed_extensions();
    if allowed.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(StorageError::UnsupportedType { extension, allowed })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, kind: UploadKind, original_name: Option<&str>, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.len() > self.max_file_bytes {
            return Err(StorageError::TooLarge { limit: self.max_file_bytes });
        }
        let extension = checked_extension(kind, original_name).map_err(|e| {
            warn!("Refused {:?} upload {:?}: {}", kind, original_name, e);
            e
        })?;

        let folder = kind.folder();
        let file_name = format!("{}.{}", calculate_hash(bytes), extension);
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(&file_name);
        if tokio::fs::try_exists(&path).await? {
            info!("Reusing stored object {}/{}", folder, file_name);
        } else {
            tokio::fs::write(&path, bytes).await?;
            info!("Stored object {}/{} ({} bytes)", folder, file_name, bytes.len());
        }

        Ok(format!("{}/{}/{}", self.public_path, folder, file_name))
    }
}
