//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryCache**: プロセス内の TTL 付き KV ストア
//! - **RedisCache**: Redis 上の Cache（`USE_REDIS=true` のとき EngineBuilder が選ぶ）

pub mod inmem_cache;
pub mod redis_cache;

// 主要な型を再エクスポート
pub use self::inmem_cache::InMemoryCache;
pub use self::redis_cache::RedisCache;
