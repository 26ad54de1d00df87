//! Decision model: what reward a transaction earns and why.
//!
//! A `RewardDecision` is immutable once it is stored under an idempotency key;
//! replays return it verbatim, `decision_id` included.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::DecisionId;
use super::persona::Persona;

/// Types of rewards that can be offered.
///
/// Serialized as XP / CHECKOUT / GOLD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardType {
    Xp,
    Checkout,
    Gold,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardType::Xp => "XP",
            RewardType::Checkout => "CHECKOUT",
            RewardType::Gold => "GOLD",
        }
    }

    /// Share of the transaction amount paid out for this type.
    pub fn payout_rate(&self) -> f64 {
        match self {
            RewardType::Xp => 0.0,
            RewardType::Checkout => 0.05,
            RewardType::Gold => 0.02,
        }
    }

    /// Monetary payout, truncated toward zero.
    pub fn payout(&self, amount: f64) -> u64 {
        (amount * self.payout_rate()).max(0.0) as u64
    }
}

/// Reason codes attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    NewUser,
    ReturningUser,
    PowerUser,
    XpModeEnabled,
    CheckoutReward,
    GoldReward,
    PreferXpMode,
    CooldownPolicyEnabled,
}

impl ReasonCode {
    pub fn for_persona(persona: Persona) -> Self {
        match persona {
            Persona::New => ReasonCode::NewUser,
            Persona::Returning => ReasonCode::ReturningUser,
            Persona::Power => ReasonCode::PowerUser,
        }
    }

    pub fn for_reward_type(reward_type: RewardType) -> Self {
        match reward_type {
            RewardType::Xp => ReasonCode::XpModeEnabled,
            RewardType::Checkout => ReasonCode::CheckoutReward,
            RewardType::Gold => ReasonCode::GoldReward,
        }
    }

    pub fn is_persona_code(&self) -> bool {
        matches!(
            self,
            ReasonCode::NewUser | ReasonCode::ReturningUser | ReasonCode::PowerUser
        )
    }

    pub fn is_reward_type_code(&self) -> bool {
        matches!(
            self,
            ReasonCode::XpModeEnabled | ReasonCode::CheckoutReward | ReasonCode::GoldReward
        )
    }
}

/// The reward outcome for one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardDecision {
    pub decision_id: DecisionId,
    pub policy_version: String,
    pub reward_type: RewardType,

    /// Monetary value; always 0 for XP.
    pub reward_value: u64,
    pub xp: u64,

    #[serde(default)]
    pub reason_codes: Vec<ReasonCode>,

    /// persona / multiplier / txn_id / user_id / merchant_id
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn reward_type_serializes_as_required_names() {
        let s = serde_json::to_string(&RewardType::Xp).unwrap();
        assert_eq!(s, "\"XP\"");
        let s = serde_json::to_string(&RewardType::Checkout).unwrap();
        assert_eq!(s, "\"CHECKOUT\"");
        let s = serde_json::to_string(&RewardType::Gold).unwrap();
        assert_eq!(s, "\"GOLD\"");
    }

    #[test]
    fn reason_codes_serialize_as_screaming_snake_case() {
        let codes = vec![
            ReasonCode::ReturningUser,
            ReasonCode::XpModeEnabled,
            ReasonCode::CooldownPolicyEnabled,
        ];
        let v = serde_json::to_value(&codes).unwrap();
        assert_eq!(
            v,
            serde_json::json!(["RETURNING_USER", "XP_MODE_ENABLED", "COOLDOWN_POLICY_ENABLED"])
        );
    }

    #[rstest]
    #[case::checkout(RewardType::Checkout, 1000.0, 50)]
    #[case::checkout_truncates(RewardType::Checkout, 39.0, 1)]
    #[case::gold(RewardType::Gold, 1000.0, 20)]
    #[case::gold_below_one(RewardType::Gold, 49.99, 0)]
    #[case::xp(RewardType::Xp, 1000.0, 0)]
    fn payout_truncates(#[case] reward_type: RewardType, #[case] amount: f64, #[case] expected: u64) {
        assert_eq!(reward_type.payout(amount), expected);
    }

    #[test]
    fn code_classification_is_disjoint() {
        for persona in Persona::ALL {
            let code = ReasonCode::for_persona(persona);
            assert!(code.is_persona_code());
            assert!(!code.is_reward_type_code());
        }
        for rt in [RewardType::Xp, RewardType::Checkout, RewardType::Gold] {
            let code = ReasonCode::for_reward_type(rt);
            assert!(code.is_reward_type_code());
            assert!(!code.is_persona_code());
        }
        assert!(!ReasonCode::PreferXpMode.is_persona_code());
        assert!(!ReasonCode::PreferXpMode.is_reward_type_code());
    }
}
