use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use stockroom_core::{DomainError, DomainResult};
use stockroom_products::{Product, ProductId};

use crate::store::{FileStore, InventoryStore, StoreError};

/// Shared handle to a product owned by an [`InventoryManager`].
///
/// Edits made through a handle are visible to the manager.
pub type SharedProduct = Rc<RefCell<Product>>;

/// Result of [`InventoryManager::sell_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellOutcome {
    /// No product with that id; nothing changed.
    NotFound,
    /// Stock was reduced.
    Sold { remaining: i64, low_stock: bool },
}

/// Result of [`InventoryManager::load_inventory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { count: usize },
    /// Nothing usable was stored; the inventory is empty.
    StartedFresh { reason: String },
}

/// Owns the id → product mapping and its persistence backend.
///
/// Products are enumerated in ascending id order.
#[derive(Debug)]
pub struct InventoryManager<S = FileStore> {
    products: BTreeMap<ProductId, SharedProduct>,
    store: S,
}

impl<S: InventoryStore> InventoryManager<S> {
    /// Manager over `store` with nothing loaded.
    pub fn empty(store: S) -> Self {
        Self {
            products: BTreeMap::new(),
            store,
        }
    }

    /// Manager over `store`, populated from whatever it holds.
    pub fn open(store: S) -> (Self, LoadOutcome) {
        let mut manager = Self::empty(store);
        let outcome = manager.load_inventory();
        (manager, outcome)
    }

    /// Replace the in-memory map with the store's contents.
    ///
    /// Never fails: missing or unusable data leaves an empty inventory.
    pub fn load_inventory(&mut self) -> LoadOutcome {
        match self.read_store() {
            Ok(Some(products)) => {
                let count = products.len();
                self.products = products;
                tracing::info!(count, "inventory loaded");
                LoadOutcome::Loaded { count }
            }
            Ok(None) => {
                self.products.clear();
                tracing::info!("no existing inventory found; starting fresh");
                LoadOutcome::StartedFresh {
                    reason: "no existing inventory found".to_string(),
                }
            }
            Err(err) => {
                self.products.clear();
                tracing::warn!(error = %err, "failed to load inventory; starting fresh");
                LoadOutcome::StartedFresh {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn read_store(&self) -> Result<Option<BTreeMap<ProductId, SharedProduct>>, StoreError> {
        let Some(snapshots) = self.store.load()? else {
            return Ok(None);
        };

        let mut products = BTreeMap::new();
        for snapshot in snapshots {
            let product = Product::restore(snapshot)?;
            // Later records win on duplicate ids.
            products.insert(product.id_typed(), Rc::new(RefCell::new(product)));
        }
        Ok(Some(products))
    }

    /// Write the full current mapping to the store.
    pub fn save_inventory(&self) -> Result<(), StoreError> {
        let snapshots: Vec<_> = self
            .products
            .values()
            .map(|p| p.borrow().snapshot())
            .collect();

        match self.store.save(&snapshots) {
            Ok(()) => {
                tracing::debug!(count = snapshots.len(), "inventory saved");
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "error saving inventory");
                Err(err)
            }
        }
    }

    /// Insert a new product, replacing any existing product with the same id.
    pub fn add_product(
        &mut self,
        name: &str,
        quantity: i64,
        threshold: i64,
        id: ProductId,
    ) -> DomainResult<SharedProduct> {
        let product = Rc::new(RefCell::new(Product::new(name, quantity, threshold, id)?));
        if self.products.insert(id, Rc::clone(&product)).is_some() {
            tracing::debug!(product_id = %id, "replaced existing product");
        }
        Ok(product)
    }

    /// Sell `quantity` units of product `id`.
    ///
    /// An unknown id is reported via [`SellOutcome::NotFound`]; an invalid amount
    /// is a validation error.
    pub fn sell_product(&mut self, id: ProductId, quantity: i64) -> DomainResult<SellOutcome> {
        let Some(handle) = self.products.get(&id) else {
            tracing::info!(product_id = %id, "product not found");
            return Ok(SellOutcome::NotFound);
        };

        let mut product = handle.borrow_mut();
        product.sell(quantity)?;

        let low_stock = product.is_low_stock();
        if low_stock {
            tracing::warn!(
                product_id = %id,
                name = product.name(),
                quantity = product.quantity(),
                threshold = product.quantity_threshold(),
                "low stock product"
            );
        }

        Ok(SellOutcome::Sold {
            remaining: product.quantity(),
            low_stock,
        })
    }

    /// Add `quantity` units (possibly negative) to product `id`.
    ///
    /// Returns `false` when the id is unknown.
    pub fn restock_product(&mut self, id: ProductId, quantity: i64) -> bool {
        match self.products.get(&id) {
            Some(handle) => {
                handle.borrow_mut().restock(quantity);
                true
            }
            None => {
                tracing::info!(product_id = %id, "product not found");
                false
            }
        }
    }

    /// Remove product `id`; returns whether anything was removed.
    pub fn delete_product(&mut self, id: ProductId) -> bool {
        self.products.remove(&id).is_some()
    }

    pub fn product_exists(&self, id: ProductId) -> bool {
        self.products.contains_key(&id)
    }

    pub fn get_product(&self, id: ProductId) -> Option<SharedProduct> {
        self.products.get(&id).cloned()
    }

    /// Like [`get_product`](Self::get_product), but a missing id is an error.
    pub fn require_product(&self, id: ProductId) -> DomainResult<SharedProduct> {
        self.get_product(id)
            .ok_or_else(|| DomainError::not_found(format!("Product {id}")))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Fresh vector of handles to every product.
    pub fn all_products(&self) -> Vec<SharedProduct> {
        self.products.values().cloned().collect()
    }

    /// Case-insensitive substring search on product names.
    ///
    /// A missing or blank term matches everything.
    pub fn search_products(&self, term: Option<&str>) -> Vec<SharedProduct> {
        let needle = match term.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_lowercase(),
            _ => return self.all_products(),
        };

        self.filtered(|p| p.name().to_lowercase().contains(&needle))
    }

    /// Products whose category equals `category` exactly.
    ///
    /// `None` matches nothing, including products without a category.
    pub fn products_by_category(&self, category: Option<&str>) -> Vec<SharedProduct> {
        let Some(category) = category else {
            return Vec::new();
        };
        self.filtered(|p| p.category() == Some(category))
    }

    /// Distinct non-blank categories, in order of first appearance.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for handle in self.products.values() {
            let product = handle.borrow();
            if let Some(category) = product.category() {
                if !category.trim().is_empty() && !seen.iter().any(|c| c == category) {
                    seen.push(category.to_string());
                }
            }
        }
        seen
    }

    pub fn low_stock_products(&self) -> Vec<SharedProduct> {
        self.filtered(Product::is_low_stock)
    }

    /// Sum of every product's `price * quantity`.
    pub fn total_inventory_value(&self) -> f64 {
        self.products
            .values()
            .map(|p| p.borrow().total_value())
            .sum()
    }

    fn filtered(&self, predicate: impl Fn(&Product) -> bool) -> Vec<SharedProduct> {
        self.products
            .values()
            .filter(|p| predicate(&p.borrow()))
            .cloned()
            .collect()
    }
}
