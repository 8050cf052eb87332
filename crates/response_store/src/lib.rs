//! # Response Store
//!
//! This crate provides durable memoization for responses fetched from
//! external APIs. Values are keyed by the raw bytes of the request content
//! and written once on first computation; there is no expiry and no
//! eviction, so a key that has ever been stored is served from disk for
//! the lifetime of the database.
//!
//! Each call path opens its own store at a dedicated path, which keeps
//! keys from one domain from ever colliding with another.

mod store;

pub use store::sled::SledResponseStore;
pub use store::{ResponseStore, StoreError};
