//! Filesystem-backed invoice document store
//!
//! Documents are written under the configured invoice directory and
//! addressed through the configured public base URL. Swappable for an
//! object store behind the same surface.

use sha2::{Digest, Sha256};
use std::path::PathBuf;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

/// Stores invoice documents and hands back their public URL
#[derive(Clone)]
pub struct InvoiceStore {
    root: PathBuf,
    public_base_url: String,
}

/// A stored document: where to reach it and what it hashed to
#[derive(Debug)]
pub struct StoredDocument {
    pub url: String,
    pub checksum: String,
}

impl InvoiceStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: PathBuf::from(&config.invoice_dir),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Write a document and return its URL and sha256 checksum
    pub async fn put(&self, filename: &str, contents: &[u8]) -> AppResult<StoredDocument> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::StorageError(format!("create invoice dir: {e}")))?;

        let path = self.root.join(filename);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| AppError::StorageError(format!("write {}: {e}", path.display())))?;

        let mut hasher = Sha256::new();
        hasher.update(contents);
        let checksum = format!("{:x}", hasher.finalize());

        Ok(StoredDocument {
            url: format!("{}/{}", self.public_base_url, filename),
            checksum,
        })
    }
}
