//! Revocation registry implementations backed by Redis or process memory.

mod memory_registry;
mod redis_registry;

pub use memory_registry::MemoryRevocationRegistry;
pub use redis_registry::{RedisRevocationRegistry, REVOCATION_KEY_PREFIX};
