//! EngineBuilder - DecisionEngine の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 未指定の依存はデフォルト実装で埋める
//! - Redis に繋がらなければ警告してプロセス内キャッシュで続行

use std::sync::Arc;
use std::time::Duration;

use super::engine::{DecisionEngine, EngineOptions};
use super::persona_resolver::{PersonaDataset, PersonaResolver, load_persona_dataset};
use crate::domain::RewardError;
use crate::impls::{InMemoryCache, RedisCache};
use crate::policy::{PolicyStore, load_policy};
use crate::ports::{Cache, Clock, IdGenerator, SystemClock, UlidGenerator};
use crate::settings::Settings;

/// EngineBuilder は DecisionEngine を構築
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::from_settings(&Settings::from_env()?)
///     .await?
///     .clock(Arc::new(my_clock))
///     .build()?;
/// ```
///
/// # デフォルト
/// - policy: 組み込みのデフォルトポリシー
/// - cache: clock を共有する InMemoryCache
/// - clock: SystemClock
/// - id_generator: 同じ clock を使う UlidGenerator
pub struct EngineBuilder {
    settings: Settings,
    policy: Option<PolicyStore>,
    cache: Option<Arc<dyn Cache>>,
    clock: Option<Arc<dyn Clock>>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    persona_dataset: PersonaDataset,
}

/// BuildError はエンジン構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0} must be greater than zero")]
    ZeroTtl(&'static str),
}

impl From<BuildError> for RewardError {
    fn from(err: BuildError) -> Self {
        RewardError::Configuration(err.to_string())
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            policy: None,
            cache: None,
            clock: None,
            id_generator: None,
            persona_dataset: PersonaDataset::new(),
        }
    }

    /// Settings のパスからポリシーと persona データセットを読み込み、キャッシュを選ぶ
    ///
    /// ポリシーが壊れていれば Configuration エラー。データセットは壊れていても空で続行。
    /// `use_redis` のときは Redis に接続し、失敗すれば `warn!` を出して InMemoryCache のまま。
    pub async fn from_settings(settings: &Settings) -> Result<Self, RewardError> {
        let policy = load_policy(&settings.policy_config_path)?;
        let dataset = load_persona_dataset(&settings.persona_config_path);
        let mut builder = Self::new()
            .settings(settings.clone())
            .policy(policy)
            .persona_dataset(dataset);

        if settings.use_redis {
            let url = settings.redis_url();
            match RedisCache::connect(&url).await {
                Ok(cache) => builder = builder.cache(Arc::new(cache)),
                Err(error) => {
                    tracing::warn!(url = url.as_str(), %error, "redis unavailable, falling back to in-memory cache");
                }
            }
        }
        Ok(builder)
    }

    /// キャッシュが注入済みか（未注入なら build 時に InMemoryCache）
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn policy(mut self, policy: PolicyStore) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn persona_dataset(mut self, dataset: PersonaDataset) -> Self {
        self.persona_dataset = dataset;
        self
    }

    /// EngineBuilder を構築して DecisionEngine を生成
    ///
    /// # 検証
    /// - TTL が 0 の設定は BuildError::ZeroTtl
    pub fn build(self) -> Result<DecisionEngine, BuildError> {
        let ttls: [(&'static str, Duration); 3] = [
            ("IDEMPOTENCY_TTL", self.settings.idempotency_ttl),
            ("PERSONA_CACHE_TTL", self.settings.persona_cache_ttl),
            ("LAST_REWARD_CACHE_TTL", self.settings.last_reward_cache_ttl),
        ];
        if let Some((name, _)) = ttls.iter().find(|(_, ttl)| ttl.is_zero()) {
            return Err(BuildError::ZeroTtl(*name));
        }

        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let cache: Arc<dyn Cache> = match self.cache {
            Some(cache) => cache,
            None => Arc::new(InMemoryCache::with_clock(clock.clone())),
        };
        let ids: Arc<dyn IdGenerator> = match self.id_generator {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(clock.clone())),
        };
        let policy = self.policy.unwrap_or_default();

        tracing::info!(
            policy_version = policy.version(),
            personas = self.persona_dataset.len(),
            idempotency = self.settings.enable_idempotency,
            "decision engine ready"
        );

        let personas = PersonaResolver::new(
            cache.clone(),
            self.persona_dataset,
            self.settings.persona_cache_ttl,
        );
        Ok(DecisionEngine::new(
            Arc::new(policy),
            cache,
            Arc::new(personas),
            ids,
            clock,
            EngineOptions::from(&self.settings),
        ))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
