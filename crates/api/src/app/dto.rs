//! Request/response DTOs.

use serde::{Deserialize, Serialize};

use stockroom_catalog::{CountCorrection, StorageRecord};
use stockroom_core::StorageId;

/// Body of a successful `POST /storages/reconcile-counts`.
#[derive(Debug, Serialize)]
pub struct ReconcileSucceeded {
    pub success: bool,
    pub message: String,
    pub details: Vec<CountCorrection>,
}

/// Body of a failed `POST /storages/reconcile-counts`.
#[derive(Debug, Serialize)]
pub struct ReconcileFailed {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListStoragesQuery {
    pub after: Option<String>,
    pub limit: Option<u32>,
}

impl ListStoragesQuery {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 1000;

    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT) as usize
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePage {
    pub items: Vec<StorageRecord>,
    /// Pass as `after` to fetch the next page; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<StorageId>,
}

impl StoragePage {
    pub fn new(items: Vec<StorageRecord>, limit: usize) -> Self {
        let next_cursor = if items.len() == limit {
            items.last().map(|s| s.id())
        } else {
            None
        };
        Self { items, next_cursor }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_caps() {
        let q = ListStoragesQuery { after: None, limit: None };
        assert_eq!(q.limit(), 50);

        let q = ListStoragesQuery { after: None, limit: Some(50_000) };
        assert_eq!(q.limit(), 1000);

        let q = ListStoragesQuery { after: None, limit: Some(0) };
        assert_eq!(q.limit(), 1);
    }

    #[test]
    fn full_page_carries_cursor() {
        let items: Vec<_> = (0..2)
            .map(|i| StorageRecord::new(StorageId::new(), format!("Bay {i}"), 0).unwrap())
            .collect();
        let last = items[1].id();

        assert_eq!(StoragePage::new(items.clone(), 2).next_cursor, Some(last));
        assert_eq!(StoragePage::new(items, 3).next_cursor, None);
    }

    #[test]
    fn failure_body_omits_missing_details() {
        let body = ReconcileFailed {
            success: false,
            error: "boom".to_string(),
            details: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["success"], false);
    }
}
