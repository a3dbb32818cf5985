use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, StorageId};

/// A storage location (shelf, back room, warehouse bay).
///
/// `products_count` is a denormalized cache of how many distinct products list
/// this storage among their locations. Other parts of the system maintain it
/// incrementally and it drifts; reconciliation recomputes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageRecord {
    id: StorageId,
    name: String,
    products_count: u64,
}

impl StorageRecord {
    /// Create a storage record with an explicit cached count.
    pub fn new(id: StorageId, name: impl Into<String>, products_count: u64) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("storage name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            products_count,
        })
    }

    pub fn id(&self) -> StorageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn products_count(&self) -> u64 {
        self.products_count
    }

    /// Overwrite the cached product count.
    pub fn set_products_count(&mut self, count: u64) {
        self.products_count = count;
    }
}
