//! Stored-product catalog.
//!
//! A computation resolves a context to a [`ProductRef`]; the catalog answers
//! whether that product has been stored and where it lives on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageResult;

/// Handle to one stored product of one computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductRef {
    /// Name of the computation that produces the product
    pub computation: String,
    /// Directory relative to the catalog root
    pub relative_dir: PathBuf,
    pub file_name: String,
}

impl ProductRef {
    pub fn new(
        computation: impl Into<String>,
        relative_dir: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            computation: computation.into(),
            relative_dir: relative_dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn relative_path(&self) -> PathBuf {
        self.relative_dir.join(&self.file_name)
    }
}

/// Catalog of stored products.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Whether the product has been stored.
    async fn exists(&self, product: &ProductRef) -> StorageResult<bool>;

    /// Absolute path of the product, whether or not it exists yet.
    fn path(&self, product: &ProductRef) -> PathBuf;
}

/// Catalog backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FilesystemCatalog {
    root: PathBuf,
}

impl FilesystemCatalog {
    /// A relative root is resolved against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ProductCatalog for FilesystemCatalog {
    async fn exists(&self, product: &ProductRef) -> StorageResult<bool> {
        let path = self.path(product);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Product not in catalog");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn path(&self, product: &ProductRef) -> PathBuf {
        self.root.join(product.relative_path())
    }
}
