//! File-backed blockchain asset catalog with persistent stable asset IDs.
//!
//! The catalog mirrors a hierarchical asset repository on disk (one
//! directory per chain, one subdirectory per token). [`CatalogCache`]
//! indexes it by symbol with TTL-based synchronous refresh, and every
//! discovered asset gets a durable numeric ID from
//! [`identity::IdentityAllocator`] that survives restarts and rescans.

pub mod cache;
pub mod chains;
pub mod error;
pub mod identity;
pub mod loader;
pub mod model;
pub mod resolver;
pub mod settings;

pub use cache::CatalogCache;
pub use chains::ChainRegistry;
pub use error::{CatalogError, CatalogResult};
pub use model::{AssetKey, AssetRecord, CacheStats};
pub use resolver::TokenSymbolCache;
pub use settings::CatalogSettings;
