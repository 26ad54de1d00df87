//! Settings - 環境変数から読むプロセス設定
//!
//! | 変数                    | デフォルト                 |
//! |-------------------------|----------------------------|
//! | `IDEMPOTENCY_TTL`       | 86400（秒）                |
//! | `PERSONA_CACHE_TTL`     | 3600（秒）                 |
//! | `LAST_REWARD_CACHE_TTL` | 86400（秒）                |
//! | `POLICY_CONFIG_PATH`    | `./config/policy.yaml`     |
//! | `PERSONA_CONFIG_PATH`   | `./config/personas.json`   |
//! | `ENABLE_IDEMPOTENCY`    | `true`                     |
//! | `USE_REDIS`             | `false`                    |
//! | `REDIS_HOST`            | `localhost`                |
//! | `REDIS_PORT`            | 6379                       |
//! | `REDIS_DB`              | 0                          |
//!
//! 真偽値は大文字小文字を無視した `true` のみ真。

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::RewardError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub idempotency_ttl: Duration,
    pub persona_cache_ttl: Duration,
    pub last_reward_cache_ttl: Duration,
    pub policy_config_path: PathBuf,
    pub persona_config_path: PathBuf,
    pub enable_idempotency: bool,
    pub use_redis: bool,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_db: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idempotency_ttl: Duration::from_secs(86_400),
            persona_cache_ttl: Duration::from_secs(3_600),
            last_reward_cache_ttl: Duration::from_secs(86_400),
            policy_config_path: PathBuf::from("./config/policy.yaml"),
            persona_config_path: PathBuf::from("./config/personas.json"),
            enable_idempotency: true,
            use_redis: false,
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, RewardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `lookup` returns the raw value for a variable name, if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RewardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(ttl) = seconds(&lookup, "IDEMPOTENCY_TTL")? {
            settings.idempotency_ttl = ttl;
        }
        if let Some(ttl) = seconds(&lookup, "PERSONA_CACHE_TTL")? {
            settings.persona_cache_ttl = ttl;
        }
        if let Some(ttl) = seconds(&lookup, "LAST_REWARD_CACHE_TTL")? {
            settings.last_reward_cache_ttl = ttl;
        }
        if let Some(path) = lookup("POLICY_CONFIG_PATH") {
            settings.policy_config_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("PERSONA_CONFIG_PATH") {
            settings.persona_config_path = PathBuf::from(path);
        }
        if let Some(flag) = lookup("ENABLE_IDEMPOTENCY") {
            settings.enable_idempotency = is_true(&flag);
        }
        if let Some(flag) = lookup("USE_REDIS") {
            settings.use_redis = is_true(&flag);
        }
        if let Some(host) = lookup("REDIS_HOST") {
            settings.redis_host = host.trim().to_string();
        }
        if let Some(port) = parsed(&lookup, "REDIS_PORT")? {
            settings.redis_port = port;
        }
        if let Some(db) = parsed(&lookup, "REDIS_DB")? {
            settings.redis_db = db;
        }

        Ok(settings)
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }
}

// "true" 以外はすべて偽
fn is_true(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("true")
}

fn parsed<F, T>(lookup: &F, key: &str) -> Result<Option<T>, RewardError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| RewardError::Configuration(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

fn seconds<F>(lookup: &F, key: &str) -> Result<Option<Duration>, RewardError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parsed::<F, u64>(lookup, key)?.map(Duration::from_secs))
}
