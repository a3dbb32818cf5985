//! HTTP API and batch entrypoints for storage product-count reconciliation.

pub mod app;
pub mod config;
