//! PersonaResolver - user id から persona を解決（キャッシュ付き）
//!
//! # 解決順序
//! 1. キャッシュ `persona:{user_id}` にあればそのまま返す
//! 2. 静的データセットにあればレコードを組み立てる
//! 3. どちらにもなければ NEW として扱う
//!
//! 2 と 3 の結果は persona キャッシュ TTL でキャッシュに書き戻す。
//! キャッシュ障害はミス扱い（書き込み失敗は無視）で、解決自体は失敗しない。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::keys::persona_key;
use crate::domain::{Persona, PersonaEntry, UserPersonaRecord};
use crate::ports::Cache;

/// Static persona dataset keyed by user id.
pub type PersonaDataset = HashMap<String, PersonaEntry>;

/// Reads a persona dataset from a JSON object keyed by user id.
///
/// A missing file is an empty dataset. A malformed file is logged and also
/// treated as empty, so a bad dataset degrades everyone to NEW instead of
/// stopping the service.
pub fn load_persona_dataset(path: &Path) -> PersonaDataset {
    if !path.exists() {
        return PersonaDataset::new();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<PersonaDataset>(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(dataset) => {
            tracing::info!(path = %path.display(), users = dataset.len(), "persona dataset loaded");
            dataset
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to load persona dataset, starting empty");
            PersonaDataset::new()
        }
    }
}

pub struct PersonaResolver {
    cache: Arc<dyn Cache>,
    dataset: RwLock<PersonaDataset>,
    cache_ttl: Duration,
}

impl PersonaResolver {
    pub fn new(cache: Arc<dyn Cache>, dataset: PersonaDataset, cache_ttl: Duration) -> Self {
        Self {
            cache,
            dataset: RwLock::new(dataset),
            cache_ttl,
        }
    }

    pub async fn get_persona(&self, user_id: &str) -> UserPersonaRecord {
        let key = persona_key(user_id);

        if let Some(record) = self.cached(&key).await {
            return record;
        }

        let entry = self.dataset.read().await.get(user_id).cloned();
        let record = match entry {
            Some(entry) => entry.into_record(user_id),
            None => UserPersonaRecord::new_user(user_id),
        };

        self.store(&key, &record).await;
        record
    }

    /// Overwrites both the dataset entry and the cached record; no merge.
    pub async fn update_persona(&self, user_id: &str, record: UserPersonaRecord) {
        self.dataset
            .write()
            .await
            .insert(user_id.to_string(), PersonaEntry::from(&record));
        self.store(&persona_key(user_id), &record).await;
    }

    /// Not used during resolution; for callers maintaining the dataset.
    pub fn infer_persona(lifetime_purchases: u64) -> Persona {
        Persona::infer(lifetime_purchases)
    }

    async fn cached(&self, key: &str) -> Option<UserPersonaRecord> {
        let value = match self.cache.get(key).await {
            Ok(value) => value?,
            Err(error) => {
                tracing::warn!(key, %error, "persona cache read failed, treating as miss");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(key, %error, "unreadable persona cache entry, treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &str, record: &UserPersonaRecord) {
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(key, %error, "failed to encode persona record");
                return;
            }
        };
        if let Err(error) = self.cache.set(key, value, Some(self.cache_ttl)).await {
            tracing::warn!(key, %error, "persona cache write failed");
        }
    }
}
