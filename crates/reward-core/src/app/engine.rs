//! DecisionEngine - 1 件の取引に対する報酬を決める
//!
//! # 処理の流れ
//! 1. idempotency キーでキャッシュを引き、あれば保存済みの decision をそのまま返す
//! 2. persona を解決
//! 3. XP を計算（`floor(amount × xp_per_unit × multiplier)`、上限でクリップ）
//! 4. 報酬タイプを決定（日次上限 → prefer XP → cooldown → 重み付き選択）
//! 5. decision を組み立てる
//! 6. idempotency キーに保存（無条件に上書き）
//! 7. `last_reward:{user}` を更新（どの経路でも無条件）
//!
//! # 並行性
//! エンジン自体は状態を持たず、ロックもしない。同じキーの要求が同時に来ると
//! 両方がステップ 1 でミスし、別々の decision_id で計算・上書きし得る。
//! 保証されるのは「最初の書き込み完了後に来た要求は再生される」ことだけ。
//!
//! # 日次 spend
//! `decide` は spend カウンタを更新しない。支払い確定後に
//! `record_daily_spend` を呼ぶのは外部（精算ジョブなど）の責務で、
//! ステップ 4 の上限判定はそこで記録された分だけを見る。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::keys::{daily_spend_key, idempotency_key, last_reward_key};
use super::persona_resolver::PersonaResolver;
use super::selection::weighted_reward;
use crate::domain::{
    Persona, ReasonCode, RewardDecision, RewardError, RewardType, TransactionRequest,
};
use crate::policy::{PolicyConfig, PolicySnapshot, PolicyStore};
use crate::ports::{Cache, Clock, IdGenerator};
use crate::settings::Settings;

/// Daily spend counters live for one day past their last write.
pub const DAILY_SPEND_TTL: Duration = Duration::from_secs(86_400);

/// Engine knobs taken from the process settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub enable_idempotency: bool,
    pub idempotency_ttl: Duration,
    pub last_reward_ttl: Duration,
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            enable_idempotency: settings.enable_idempotency,
            idempotency_ttl: settings.idempotency_ttl,
            last_reward_ttl: settings.last_reward_cache_ttl,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Cheap to clone; every clone shares the same collaborators.
#[derive(Clone)]
pub struct DecisionEngine {
    policy: Arc<PolicyStore>,
    cache: Arc<dyn Cache>,
    personas: Arc<PersonaResolver>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    options: EngineOptions,
}

impl DecisionEngine {
    pub fn new(
        policy: Arc<PolicyStore>,
        cache: Arc<dyn Cache>,
        personas: Arc<PersonaResolver>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        options: EngineOptions,
    ) -> Self {
        Self {
            policy,
            cache,
            personas,
            ids,
            clock,
            options,
        }
    }

    pub fn personas(&self) -> &PersonaResolver {
        &self.personas
    }

    pub fn policy(&self) -> &PolicyConfig {
        self.policy.config()
    }

    pub fn policy_snapshot(&self) -> PolicySnapshot {
        self.policy.snapshot()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub async fn decide(&self, request: &TransactionRequest) -> Result<RewardDecision, RewardError> {
        request.validate()?;

        let idem_key = self
            .options
            .enable_idempotency
            .then(|| idempotency_key(request));

        if let Some(key) = &idem_key {
            if let Some(decision) = self.replay(key).await {
                tracing::debug!(key = key.as_str(), decision_id = %decision.decision_id, "replaying stored decision");
                return Ok(decision);
            }
        }

        let persona = self.personas.get_persona(&request.user_id).await.persona;
        let xp = self.calculate_xp(request.amount, persona);
        let (reward_type, reward_value) = self
            .determine_reward(&request.user_id, persona, request.amount)
            .await;

        let decision = RewardDecision {
            decision_id: self.ids.generate_decision_id(),
            policy_version: self.policy.version().to_string(),
            reward_type,
            reward_value,
            xp,
            reason_codes: self.reason_codes(persona, reward_type),
            meta: self.meta(request, persona),
        };

        if let Some(key) = &idem_key {
            self.remember(key, &decision).await?;
        }
        self.update_last_reward(&request.user_id, request.timestamp)
            .await;

        tracing::debug!(
            txn_id = request.txn_id.as_str(),
            user_id = request.user_id.as_str(),
            decision_id = %decision.decision_id,
            persona = persona.as_str(),
            reward_type = reward_type.as_str(),
            reward_value,
            xp,
            "reward decided"
        );
        Ok(decision)
    }

    /// `floor(amount × xp_per_unit × multiplier)` clamped to `[0, max_xp]`.
    pub fn calculate_xp(&self, amount: f64, persona: Persona) -> u64 {
        let policy = self.policy.config();
        let raw = amount * policy.xp_per_unit * policy.multiplier(persona);
        // `as` saturates: negative and NaN become 0
        (raw as u64).min(policy.max_xp_per_transaction)
    }

    /// Accumulated spend recorded for the user on the current local date.
    pub async fn daily_spend(&self, user_id: &str) -> f64 {
        let key = daily_spend_key(user_id, self.clock.local_date());
        match self.cache.get(&key).await {
            Ok(value) => value.and_then(|v| v.as_f64()).unwrap_or(0.0),
            Err(error) => {
                tracing::warn!(key = key.as_str(), %error, "daily spend read failed, assuming 0");
                0.0
            }
        }
    }

    /// Adds `amount` to today's spend for the user and returns the new total.
    ///
    /// Plain read-then-write: concurrent calls for the same user can lose
    /// updates.
    pub async fn record_daily_spend(&self, user_id: &str, amount: f64) -> Result<f64, RewardError> {
        // カウンタは単調増加。負値・0・NaN・無限大はここで弾く
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RewardError::Validation(format!(
                "spend amount must be greater than 0 (got {amount})"
            )));
        }
        let key = daily_spend_key(user_id, self.clock.local_date());
        let current = self
            .cache
            .get(&key)
            .await?
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let total = current + amount;
        self.cache
            .set(&key, Value::from(total), Some(DAILY_SPEND_TTL))
            .await?;
        Ok(total)
    }

    /// 優先順位: 日次上限 → prefer XP → cooldown → 重み付き選択
    async fn determine_reward(&self, user_id: &str, persona: Persona, amount: f64) -> (RewardType, u64) {
        let policy = self.policy.config();

        // 上限 0 は「金銭報酬の予算なし」。正の amount は必ず超過するので spend は読まない
        let cap = policy.daily_cap(persona);
        if cap == 0 {
            return (RewardType::Xp, 0);
        }
        let spend = self.daily_spend(user_id).await;
        if spend + amount > cap as f64 {
            // fallback_to_xp_on_cap_exceeded の値に関わらず XP
            return (RewardType::Xp, 0);
        }

        if policy.prefer_xp_mode {
            return (RewardType::Xp, 0);
        }

        if policy.cooldown_enabled && self.in_cooldown(user_id).await {
            return (RewardType::Xp, 0);
        }

        weighted_reward(&policy.reward_type_weights, user_id, amount)
    }

    async fn in_cooldown(&self, user_id: &str) -> bool {
        let key = last_reward_key(user_id);
        let last = match self.cache.get(&key).await {
            Ok(value) => value.and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))),
            Err(error) => {
                tracing::warn!(key = key.as_str(), %error, "cooldown read failed, assuming no cooldown");
                None
            }
        };
        let Some(last) = last else {
            return false;
        };
        let window = self.policy.config().cooldown_window().as_secs() as i64;
        // ts はリクエスト由来で任意の i64 があり得る
        self.clock.unix_seconds().saturating_sub(last) < window
    }

    /// 設定状態も反映する: 決め手でなくても PREFER_XP_MODE / COOLDOWN_POLICY_ENABLED を付ける
    fn reason_codes(&self, persona: Persona, reward_type: RewardType) -> Vec<ReasonCode> {
        let policy = self.policy.config();
        let mut codes = vec![
            ReasonCode::for_persona(persona),
            ReasonCode::for_reward_type(reward_type),
        ];
        if policy.prefer_xp_mode {
            codes.push(ReasonCode::PreferXpMode);
        }
        if policy.cooldown_enabled {
            codes.push(ReasonCode::CooldownPolicyEnabled);
        }
        codes
    }

    fn meta(&self, request: &TransactionRequest, persona: Persona) -> BTreeMap<String, Value> {
        BTreeMap::from([
            ("persona".to_string(), Value::from(persona.as_str())),
            (
                "multiplier".to_string(),
                Value::from(self.policy.config().multiplier(persona)),
            ),
            ("txn_id".to_string(), Value::from(request.txn_id.as_str())),
            ("user_id".to_string(), Value::from(request.user_id.as_str())),
            (
                "merchant_id".to_string(),
                Value::from(request.merchant_id.as_str()),
            ),
        ])
    }

    async fn replay(&self, key: &str) -> Option<RewardDecision> {
        let value = match self.cache.get(key).await {
            Ok(value) => value?,
            Err(error) => {
                tracing::warn!(key, %error, "idempotency read failed, computing fresh decision");
                return None;
            }
        };
        match serde_json::from_value(value) {
            Ok(decision) => Some(decision),
            Err(error) => {
                tracing::warn!(key, %error, "unreadable idempotency record, computing fresh decision");
                None
            }
        }
    }

    async fn remember(&self, key: &str, decision: &RewardDecision) -> Result<(), RewardError> {
        let value = serde_json::to_value(decision)
            .map_err(|e| RewardError::DecisionFailed(format!("failed to encode decision: {e}")))?;
        if let Err(error) = self
            .cache
            .set(key, value, Some(self.options.idempotency_ttl))
            .await
        {
            tracing::warn!(key, %error, "idempotency write failed, replay will not be available");
        }
        Ok(())
    }

    async fn update_last_reward(&self, user_id: &str, ts: Option<i64>) {
        let key = last_reward_key(user_id);
        let timestamp = ts.unwrap_or_else(|| self.clock.unix_seconds());
        if let Err(error) = self
            .cache
            .set(&key, Value::from(timestamp), Some(self.options.last_reward_ttl))
            .await
        {
            tracing::warn!(key = key.as_str(), %error, "last reward write failed");
        }
    }
}
