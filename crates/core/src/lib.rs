//! `stockroom-core` — shared building blocks.
//!
//! Pure primitives only (identifiers, domain errors); no infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, StorageId};
