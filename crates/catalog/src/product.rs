use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, ProductId, StorageId};

/// Where a product is kept, and how much of it.
///
/// `storage_id` is a weak reference: the storage may since have been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationAssignment {
    pub storage_id: StorageId,
    #[serde(default)]
    pub stock: i64,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl LocationAssignment {
    pub fn new(storage_id: StorageId, stock: i64) -> Self {
        Self {
            storage_id,
            stock,
            visible: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A product in the catalog with its location assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    id: ProductId,
    name: String,
    locations: Vec<LocationAssignment>,
}

impl ProductRecord {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        locations: Vec<LocationAssignment>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            locations,
        })
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locations(&self) -> &[LocationAssignment] {
        &self.locations
    }

    /// Whether any location entry points at `storage_id`.
    ///
    /// Visibility and stock do not matter; an entry with zero stock still
    /// places the product in that storage.
    pub fn is_stored_in(&self, storage_id: StorageId) -> bool {
        self.locations.iter().any(|l| l.storage_id == storage_id)
    }
}
