//! InMemoryCache - プロセス内の TTL 付きキャッシュ
//!
//! # 学習ポイント
//! - tokio::sync::Mutex による排他制御（await をまたいでも安全）
//! - アクセス時に期限切れエントリを掃除する（バックグラウンドの sweeper なし）
//! - 読まれないまま期限切れになったキーは `set` が `SWEEP_EVERY` 回ごとにまとめて掃除
//! - Clock 注入による TTL の決定的なテスト

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;

use crate::ports::{Cache, CacheError, CacheValue, Clock, SystemClock};

/// `set` の呼び出し回数がこの倍数になるたびに全エントリを走査する
pub const SWEEP_EVERY: u64 = 256;

#[derive(Debug, Clone)]
struct Entry {
    value: CacheValue,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(at) if now > at)
    }
}

/// InMemoryCache はプロセス内の Cache 実装
///
/// # 実装詳細
/// - HashMap<String, Entry> を Mutex で保護
/// - 期限切れは読み取り時に判定し、その場で削除
/// - `set` の `SWEEP_EVERY` 回ごとに期限切れを一括削除
///
/// # 使用例
/// ```ignore
/// let cache = InMemoryCache::new();
/// cache.set("persona:u1", json!({...}), Some(Duration::from_secs(3600))).await?;
/// ```
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    writes: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            writes: AtomicU64::new(0),
        }
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    fn expiry(&self, ttl: Option<Duration>) -> Result<Option<DateTime<Utc>>, CacheError> {
        ttl.map(|ttl| {
            TimeDelta::from_std(ttl)
                .map(|delta| self.clock.now() + delta)
                .map_err(|e| CacheError::OperationFailed(format!("ttl out of range: {e}")))
        })
        .transpose()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// 期限切れなら削除して None を返す
fn live_entry<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: DateTime<Utc>,
) -> Option<&'a Entry> {
    if entries.get(key).is_some_and(|e| e.is_expired(now)) {
        entries.remove(key);
        return None;
    }
    entries.get(key)
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key, now).map(|e| e.value.clone()))
    }

    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let expires_at = self.expiry(ttl)?;
        let sweep = (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0;
        let mut entries = self.entries.lock().await;
        if sweep {
            let now = self.clock.now();
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired(now));
            tracing::debug!(removed = before - entries.len(), "swept expired cache entries");
        }
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(entries.remove(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;
        Ok(live_entry(&mut entries, key, now).is_some())
    }

    /// 既存の有効期限は維持する
    async fn increment(&self, key: &str, amount: i64) -> Result<i64, CacheError> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().await;

        let (current, expires_at) = match live_entry(&mut entries, key, now) {
            None => (0, None),
            Some(entry) => {
                let current = entry.value.as_i64().ok_or_else(|| {
                    CacheError::OperationFailed(format!("value at {key} is not an integer"))
                })?;
                (current, entry.expires_at)
            }
        };

        let next = current
            .checked_add(amount)
            .ok_or_else(|| CacheError::OperationFailed(format!("increment overflow at {key}")))?;
        entries.insert(
            key.to_string(),
            Entry {
                value: CacheValue::from(next),
                expires_at,
            },
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::TimeZone;
    use serde_json::json;

    fn cache_at_noon() -> (InMemoryCache, FixedClock) {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 20, 12, 0, 0).unwrap());
        (InMemoryCache::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn set_then_get_roundtrip() {
        let (cache, _) = cache_at_noon();
        assert!(cache.set("k", json!({"a": 1}), None).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let (cache, clock) = cache_at_noon();
        cache
            .set("k", json!("v"), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        clock.advance(TimeDelta::seconds(60));
        assert!(cache.exists("k").await.unwrap());

        clock.advance(TimeDelta::seconds(1));
        assert!(!cache.exists("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_resets_ttl() {
        let (cache, clock) = cache_at_noon();
        cache
            .set("k", json!(1), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(8));
        cache.set("k", json!(2), None).await.unwrap();
        clock.advance(TimeDelta::days(30));
        assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_live_key_was_removed() {
        let (cache, clock) = cache_at_noon();
        cache.set("k", json!(1), None).await.unwrap();
        assert!(cache.delete("k").await.unwrap());
        assert!(!cache.delete("k").await.unwrap());

        cache
            .set("short", json!(1), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(5));
        assert!(!cache.delete("short").await.unwrap());
    }

    #[tokio::test]
    async fn increment_starts_from_zero() {
        let (cache, _) = cache_at_noon();
        assert_eq!(cache.increment("n", 1).await.unwrap(), 1);
        assert_eq!(cache.increment("n", 5).await.unwrap(), 6);
        assert_eq!(cache.increment("n", -2).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn increment_keeps_existing_expiry() {
        let (cache, clock) = cache_at_noon();
        cache
            .set("n", json!(10), Some(Duration::from_secs(30)))
            .await
            .unwrap();
        clock.advance(TimeDelta::seconds(20));
        assert_eq!(cache.increment("n", 1).await.unwrap(), 11);

        clock.advance(TimeDelta::seconds(11));
        assert_eq!(cache.get("n").await.unwrap(), None);
        // 期限切れ後は 0 から再スタート
        assert_eq!(cache.increment("n", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn increment_rejects_non_integer_values() {
        let (cache, _) = cache_at_noon();
        cache.set("s", json!("text"), None).await.unwrap();
        assert!(matches!(
            cache.increment("s", 1).await,
            Err(CacheError::OperationFailed(_))
        ));
    }

    #[tokio::test]
    async fn purge_expired_drops_only_dead_entries() {
        let (cache, clock) = cache_at_noon();
        cache
            .set("a", json!(1), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        cache
            .set("b", json!(2), Some(Duration::from_secs(100)))
            .await
            .unwrap();
        cache.set("c", json!(3), None).await.unwrap();

        clock.advance(TimeDelta::seconds(10));
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.purge_expired().await, 1);
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn writes_sweep_entries_that_are_never_read_again() {
        let (cache, clock) = cache_at_noon();
        for i in 0..10 {
            cache
                .set(&format!("idem:{i}"), json!(i), Some(Duration::from_secs(1)))
                .await
                .unwrap();
        }
        clock.advance(TimeDelta::seconds(5));

        // 10 件の期限切れは誰も読まないまま SWEEP_EVERY 回目の書き込みまで残る
        for i in 10..SWEEP_EVERY - 1 {
            cache.set(&format!("live:{i}"), json!(i), None).await.unwrap();
        }
        assert_eq!(cache.entries.lock().await.len(), SWEEP_EVERY as usize - 1);

        cache.set("last", json!(0), None).await.unwrap();
        let raw = cache.entries.lock().await.len();
        assert_eq!(raw, SWEEP_EVERY as usize - 10);
        assert_eq!(raw, cache.len().await);
    }
}
