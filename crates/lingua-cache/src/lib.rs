//! # lingua-cache
//!
//! Redis connection pool and the non-relational revocation registries.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Redis registry**: `SET NX EXAT` entries that Redis expires on its own
//! - **Memory registry**: process-local registry for tests and single-node setups
//!
//! ## Example
//!
//! ```ignore
//! use lingua_cache::{RedisPool, RedisPoolConfig, RedisRevocationRegistry};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let registry = RedisRevocationRegistry::new(pool);
//! ```

pub mod pool;
pub mod registry;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export registry types
pub use registry::{MemoryRevocationRegistry, RedisRevocationRegistry, REVOCATION_KEY_PREFIX};
