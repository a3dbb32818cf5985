//! Catalog domain module.
//!
//! Storage locations, products and their location assignments, plus the pure
//! comparison logic behind product-count reconciliation (no IO, no HTTP, no storage).

pub mod correction;
pub mod product;
pub mod storage;

pub use correction::{count_products_in, CountCorrection, StorageCountDiagnosis};
pub use product::{LocationAssignment, ProductRecord};
pub use storage::StorageRecord;
