//! Comparison of cached vs. actual per-storage product counts.

use serde::{Deserialize, Serialize};

use stockroom_core::StorageId;

use crate::product::ProductRecord;
use crate::storage::StorageRecord;

/// One storage whose cached count was overwritten by a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountCorrection {
    pub storage_id: StorageId,
    pub old_count: u64,
    pub new_count: u64,
}

impl CountCorrection {
    /// Compare a storage's cached count with the freshly computed one.
    ///
    /// Returns `None` when they agree (no write should happen).
    pub fn between(storage: &StorageRecord, actual: u64) -> Option<Self> {
        if storage.products_count() == actual {
            return None;
        }

        Some(Self {
            storage_id: storage.id(),
            old_count: storage.products_count(),
            new_count: actual,
        })
    }
}

/// Read-only cached-vs-actual view of a single storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCountDiagnosis {
    pub storage_id: StorageId,
    pub name: String,
    pub cached_count: u64,
    pub actual_count: u64,
    pub in_sync: bool,
}

impl StorageCountDiagnosis {
    pub fn new(storage: &StorageRecord, actual_count: u64) -> Self {
        Self {
            storage_id: storage.id(),
            name: storage.name().to_string(),
            cached_count: storage.products_count(),
            actual_count,
            in_sync: storage.products_count() == actual_count,
        }
    }
}

/// Number of distinct products that list `storage_id` among their locations.
///
/// A product listing the same storage twice counts once. References to
/// storages that no longer exist simply never match.
pub fn count_products_in<'a, I>(products: I, storage_id: StorageId) -> u64
where
    I: IntoIterator<Item = &'a ProductRecord>,
{
    products
        .into_iter()
        .filter(|p| p.is_stored_in(storage_id))
        .count() as u64
}
