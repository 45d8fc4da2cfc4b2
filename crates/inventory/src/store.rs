//! Persistence for the product map.
//!
//! The on-disk format is a versioned JSON document holding one
//! [`ProductSnapshot`] per product. The whole file is rewritten on every save.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::DomainError;
use stockroom_products::ProductSnapshot;

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Default data file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "inventory.dat";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed inventory data: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unsupported inventory format version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid product record: {0}")]
    InvalidRecord(#[from] DomainError),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whole-inventory persistence backend.
pub trait InventoryStore {
    /// Read every stored record.
    ///
    /// `Ok(None)` means nothing has been stored yet.
    fn load(&self) -> Result<Option<Vec<ProductSnapshot>>, StoreError>;

    /// Replace the stored inventory with `products`.
    fn save(&self, products: &[ProductSnapshot]) -> Result<(), StoreError>;
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn load(&self) -> Result<Option<Vec<ProductSnapshot>>, StoreError> {
        (**self).load()
    }

    fn save(&self, products: &[ProductSnapshot]) -> Result<(), StoreError> {
        (**self).save(products)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InventoryDocument {
    format_version: u32,
    products: Vec<ProductSnapshot>,
}

/// JSON file store with atomic replace-on-save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path used while writing, renamed over `path` once complete.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_FILE)
    }
}

impl InventoryStore for FileStore {
    fn load(&self) -> Result<Option<Vec<ProductSnapshot>>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let document: InventoryDocument = serde_json::from_reader(BufReader::new(file))?;
        if document.format_version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(document.format_version));
        }
        Ok(Some(document.products))
    }

    fn save(&self, products: &[ProductSnapshot]) -> Result<(), StoreError> {
        let staging = self.staging_path();
        let document = InventoryDocument {
            format_version: FORMAT_VERSION,
            products: products.to_vec(),
        };

        let write = || -> Result<(), StoreError> {
            let file = File::create(&staging).map_err(|e| StoreError::io(&staging, e))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writer.flush().map_err(|e| StoreError::io(&staging, e))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|e| StoreError::io(&staging, e))?;
            Ok(())
        };

        if let Err(err) = write() {
            let _ = fs::remove_file(&staging);
            return Err(err);
        }

        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            StoreError::io(&self.path, e)
        })
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Option<Vec<ProductSnapshot>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `products`.
    pub fn with_snapshots(products: Vec<ProductSnapshot>) -> Self {
        Self {
            inner: RwLock::new(Some(products)),
        }
    }

    /// Last saved records, if anything has been saved.
    pub fn snapshots(&self) -> Option<Vec<ProductSnapshot>> {
        self.inner.read().ok()?.clone()
    }
}

impl InventoryStore for InMemoryStore {
    fn load(&self) -> Result<Option<Vec<ProductSnapshot>>, StoreError> {
        Ok(self.snapshots())
    }

    fn save(&self, products: &[ProductSnapshot]) -> Result<(), StoreError> {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(products.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_products::ProductId;

    fn snapshot(id: i64, name: &str) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId(id),
            name: name.to_string(),
            quantity: 3,
            quantity_threshold: 1,
            price: 1.5,
            category: None,
            description: None,
            last_updated: None,
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("inventory.dat"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_returns_same_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("inventory.dat"));
        let records = vec![snapshot(1, "Apples"), snapshot(2, "Pears")];

        store.save(&records).unwrap();
        assert_eq!(store.load().unwrap(), Some(records));
    }

    #[test]
    fn save_leaves_no_staging_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("inventory.dat"));
        store.save(&[snapshot(1, "Apples")]).unwrap();

        assert!(store.path().exists());
        assert!(!store.staging_path().exists());
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("inventory.dat"));
        store.save(&[snapshot(1, "Apples"), snapshot(2, "Pears")]).unwrap();
        store.save(&[snapshot(3, "Plums")]).unwrap();

        assert_eq!(store.load().unwrap(), Some(vec![snapshot(3, "Plums")]));
    }

    #[test]
    fn garbage_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.dat");
        fs::write(&path, b"\xac\xed\x00\x05not json").unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.dat");
        fs::write(&path, r#"{"format_version": 99, "products": []}"#).unwrap();

        let err = FileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(99)));
    }

    #[test]
    fn optional_fields_may_be_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.dat");
        fs::write(
            &path,
            r#"{"format_version": 1, "products": [
                {"id": 4, "name": "Kiwi", "quantity": 2, "quantity_threshold": 1}
            ]}"#,
        )
        .unwrap();

        let records = FileStore::new(&path).load().unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].price, 0.0);
        assert_eq!(records[0].category, None);
        assert_eq!(records[0].last_updated, None);
    }

    #[test]
    fn save_into_missing_directory_fails_with_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("missing").join("inventory.dat"));

        let err = store.save(&[snapshot(1, "Apples")]).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&[snapshot(1, "Apples")]).unwrap();
        assert_eq!(store.load().unwrap(), Some(vec![snapshot(1, "Apples")]));
    }

    #[test]
    fn arc_store_delegates() {
        let store = Arc::new(InMemoryStore::new());
        let shared = Arc::clone(&store);
        shared.save(&[snapshot(9, "Figs")]).unwrap();
        assert_eq!(store.snapshots(), Some(vec![snapshot(9, "Figs")]));
    }
}
