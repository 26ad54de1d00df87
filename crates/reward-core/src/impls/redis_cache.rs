//! RedisCache - Redis 上の Cache 実装
//!
//! # 実装詳細
//! - 値は JSON 文字列で保存し、読み取り時に戻す（JSON でなければ文字列として返す）
//! - TTL は `SET key value EX secs`、`increment` は `INCRBY`
//! - 期限切れは Redis 側が処理する
//! - MultiplexedConnection を clone して各コマンドに使う（ロック不要）
//!
//! # エラー
//! - 接続断・I/O・タイムアウトは `CacheError::Unavailable`
//! - それ以外（型の不一致など）は `CacheError::OperationFailed`

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use crate::ports::{Cache, CacheError, CacheValue};

/// 接続確認（PING まで）の上限
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
}

impl RedisCache {
    /// `redis://host:port/db` に接続し、PING が通れば返す
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(map_error)?;
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        })
        .await
        .map_err(|_| CacheError::Unavailable(format!("connect to {url} timed out")))?
        .map_err(map_error)?;

        tracing::info!(url, "connected to redis");
        Ok(Self { conn })
    }
}

fn map_error(err: redis::RedisError) -> CacheError {
    if err.is_io_error()
        || err.is_timeout()
        || err.is_connection_refusal()
        || err.is_connection_dropped()
    {
        CacheError::Unavailable(err.to_string())
    } else {
        CacheError::OperationFailed(err.to_string())
    }
}

fn decode(raw: String) -> CacheValue {
    serde_json::from_str(&raw).unwrap_or(CacheValue::String(raw))
}

/// EX は秒単位。1 秒未満の TTL は 1 秒に切り上げる
fn expiry_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 { secs + 1 } else { secs.max(1) }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await.map_err(map_error)?;
        Ok(raw.map(decode))
    }

    async fn set(
        &self,
        key: &str,
        value: CacheValue,
        ttl: Option<Duration>,
    ) -> Result<bool, CacheError> {
        let encoded = serde_json::to_string(&value)
            .map_err(|e| CacheError::OperationFailed(format!("failed to encode {key}: {e}")))?;
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, encoded, expiry_seconds(ttl))
                .await
                .map_err(map_error)?,
            None => conn.set::<_, _, ()>(key, encoded).await.map_err(map_error)?,
        }
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(map_error)?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(map_error)
    }

    /// INCRBY は既存の TTL を維持する
    async fn increment(&self, key: &str, amount: i64) -> Result<i64, CacheError> {
        let mut conn = self.conn.clone();
        conn.incr(key, amount).await.map_err(map_error)
    }
}
