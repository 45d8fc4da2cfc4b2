//! Products domain module.
//!
//! This crate contains the `Product` entity and its invariants, implemented
//! purely as deterministic domain logic (no IO, no storage).

pub mod product;

pub use product::{Product, ProductId, ProductSnapshot};
