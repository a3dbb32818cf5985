//! Strongly-typed identifiers for catalog records.
//!
//! Ids are UUIDv7, so they sort roughly by creation time. The storage catalog
//! is walked in id order with a keyset cursor, which needs `Ord`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident, kind = $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Human-readable record kind, used in parse errors.
            pub const KIND: &'static str = $kind;

            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(self.0.as_hyphenated(), f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    DomainError::invalid_id(format!("{} id `{}`: {}", Self::KIND, s, e))
                })
            }
        }
    };
}

catalog_id!(
    /// Primary key of the storage catalog.
    StorageId,
    kind = "storage"
);

catalog_id!(
    /// Primary key of a product record.
    ProductId,
    kind = "product"
);
