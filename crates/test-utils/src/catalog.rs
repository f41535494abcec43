//! In-memory product catalog for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use storage::{ProductCatalog, ProductRef, StorageResult};

/// Catalog whose contents are a set of relative product paths.
///
/// Every `exists` query is recorded so tests can assert which products were
/// looked up.
#[derive(Debug)]
pub struct RecordingCatalog {
    root: PathBuf,
    present: Mutex<HashSet<PathBuf>>,
    queries: Mutex<Vec<ProductRef>>,
}

impl RecordingCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            present: Mutex::new(HashSet::new()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mark a product as stored.
    pub fn add(&self, product: &ProductRef) {
        self.present
            .lock()
            .unwrap()
            .insert(product.relative_path());
    }

    /// Mark a product as stored and write a file for it under the root.
    pub fn add_with_file(&self, product: &ProductRef, contents: &[u8]) -> PathBuf {
        self.add(product);
        crate::paths::write_file(&self.root, product.relative_path(), contents)
    }

    pub fn queries(&self) -> Vec<ProductRef> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProductCatalog for RecordingCatalog {
    async fn exists(&self, product: &ProductRef) -> StorageResult<bool> {
        self.queries.lock().unwrap().push(product.clone());
        Ok(self
            .present
            .lock()
            .unwrap()
            .contains(&product.relative_path()))
    }

    fn path(&self, product: &ProductRef) -> PathBuf {
        self.root.join(product.relative_path())
    }
}
