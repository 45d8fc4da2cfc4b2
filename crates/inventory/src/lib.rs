//! Inventory module: the product map and its persistence.
//!
//! `InventoryManager` owns every `Product` by id and is the only entry point
//! callers need. Persistence is whole-file: load once, mutate in memory, save
//! explicitly.

pub mod export;
pub mod manager;
pub mod store;

pub use export::{write_csv, CSV_HEADER, DEFAULT_EXPORT_FILE};
pub use manager::{InventoryManager, LoadOutcome, SellOutcome, SharedProduct};
pub use store::{
    FileStore, InMemoryStore, InventoryStore, StoreError, DEFAULT_DATA_FILE, FORMAT_VERSION,
};
