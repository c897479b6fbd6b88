mod memory_cache;
mod redis_cache;

pub use memory_cache::InMemoryResultCache;
pub use redis_cache::RedisResultCache;
