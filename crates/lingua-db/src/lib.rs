//! # lingua-db
//!
//! Database layer implementing the subject repository and the revocation
//! registry with PostgreSQL via SQLx.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lingua_db::{create_pool, ensure_schema, PgRevocationRegistry, PoolConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&PoolConfig::from_env()).await?;
//!     ensure_schema(&pool).await?;
//!     let registry = PgRevocationRegistry::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod schema;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, PgPool, PoolConfig};
pub use repositories::{PgRevocationRegistry, PgSubjectRepository};
pub use schema::ensure_schema;
