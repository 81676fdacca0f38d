//! Catalog cache
//!
//! Keeps every standard and custom food in memory so name resolution and feed
//! sampling never hit the database. The store remains the source of truth:
//! the cache is populated once at start-up and afterwards only follows writes
//! the store has already accepted.

mod snapshot;
mod store;

pub use snapshot::{CatalogCounts, CatalogSnapshot};
pub use store::{CatalogCache, CatalogWriteGuard, LoadPolicy};
