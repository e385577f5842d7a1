//! Brezza Cache System
//!
//! Two coordinated caches keep reads cheap without ever serving stale data:
//!
//! - **Entity Cache**: (kind, id) → detached entity snapshot
//! - **Query Cache**: (kind, query signature) → materialized result list
//!
//! Both are purged for the affected kind *before* any write reaches the
//! store, so an entry is either trustworthy or already gone.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `brezza.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! entity_limit = 500
//! query_limit = 50
//! ```

mod config;
mod entity;
mod lock;
mod query;
mod service;

pub use config::CacheConfig;
pub use entity::EntityCache;
pub use query::{QueryCache, QuerySignature};
pub use service::CacheService;
