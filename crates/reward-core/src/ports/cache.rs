//! Cache port - TTL 付き Key-Value ストア
//!
//! Cache はエンジンの可変状態をすべて保持します：
//! - idempotency レコード（`idem:{txn}:{user}:{merchant}`）
//! - persona キャッシュ（`persona:{user}`）
//! - 日次 spend カウンタ（`cac:{user}:{YYYY-MM-DD}`）
//! - cooldown 用の最終報酬時刻（`last_reward:{user}`）
//!
//! # 実装
//! - **InMemoryCache**: プロセス内（`impls::inmem_cache`）
//! - **RedisCache**: Redis 上（`impls::redis_cache`）

use std::time::Duration;

use async_trait::async_trait;

/// Values are stored as JSON so any backend can hold them as text.
pub type CacheValue = serde_json::Value;

/// CacheError は backend の障害
///
/// エンジンは読み取り失敗をミス、書き込み失敗を no-op として扱う。
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache operation failed: {0}")]
    OperationFailed(String),
}

/// Cache は TTL 付きの KV ストア
///
/// # 契約
/// - TTL は書き込み時点からの秒数。期限切れのキーは存在しないものとして振る舞う
/// - `increment` は存在しないキーを 0 から始める
/// - 複数キーにまたがる原子性はない。呼び出し側の read-modify-write も原子的ではない
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから共有される）
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// `ttl = None` means the key never expires.
    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError>;

    /// Returns whether a live key was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Adds `amount` to an integer value and returns the new value.
    async fn increment(&self, key: &str, amount: i64) -> Result<i64, CacheError>;
}
