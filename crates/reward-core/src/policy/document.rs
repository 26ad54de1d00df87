//! Policy document: the on-disk shape of a policy file.
//!
//! ```yaml
//! version: "v1.0.0"
//! reward_types:
//!   XP: { weight: 0.7 }
//!   CHECKOUT: { weight: 0.2 }
//!   GOLD: { weight: 0.1 }
//! xp:
//!   xp_per_rupee: 0.1
//!   max_xp_per_txn: 500
//!   persona_multipliers: { NEW: 1.0, RETURNING: 1.5, POWER: 2.0 }
//! cac:
//!   daily_cap_per_persona: { NEW: 0, RETURNING: 1000, POWER: 5000 }
//!   fallback_to_xp: true
//! features:
//!   prefer_xp_mode: false
//!   cooldown_enabled: false
//!   cooldown_hours: 24
//! ```
//!
//! Missing or null keys take their defaults. Documents are handled as
//! `serde_json::Value` with `preserve_order`, so the configured order of
//! `reward_types` survives both YAML and JSON sources.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::config::{PolicyConfig, RewardWeights};
use crate::domain::{Persona, RewardType};

#[derive(Debug, Default, Deserialize)]
struct PolicyDocument {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    reward_types: Option<Map<String, Value>>,
    #[serde(default)]
    xp: Option<XpSection>,
    #[serde(default)]
    cac: Option<CacSection>,
    #[serde(default)]
    features: Option<FeaturesSection>,
}

#[derive(Debug, Default, Deserialize)]
struct XpSection {
    #[serde(default)]
    xp_per_rupee: Option<f64>,
    #[serde(default)]
    max_xp_per_txn: Option<u64>,
    #[serde(default)]
    persona_multipliers: Option<HashMap<Persona, f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct CacSection {
    #[serde(default)]
    daily_cap_per_persona: Option<HashMap<Persona, u64>>,
    #[serde(default)]
    fallback_to_xp: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FeaturesSection {
    #[serde(default)]
    prefer_xp_mode: Option<bool>,
    #[serde(default)]
    cooldown_enabled: Option<bool>,
    #[serde(default)]
    cooldown_hours: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightEntry {
    #[serde(default)]
    weight: Option<f64>,
}

/// Walks `reward_types` in document order; `preserve_order` keeps the map ordered.
fn ordered_weights(section: Map<String, Value>) -> Result<RewardWeights, serde_json::Error> {
    section
        .into_iter()
        .map(|(name, entry)| {
            let reward_type: RewardType = serde_json::from_value(Value::String(name))?;
            let entry: Option<WeightEntry> = serde_json::from_value(entry)?;
            Ok((reward_type, entry.and_then(|e| e.weight).unwrap_or(0.0)))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RewardWeights::new)
}

/// Builds a typed policy from a parsed document.
///
/// `Null` is treated as an empty document.
pub fn policy_from_value(value: &Value) -> Result<PolicyConfig, serde_json::Error> {
    let doc = match value {
        Value::Null => PolicyDocument::default(),
        other => PolicyDocument::deserialize(other)?,
    };

    let xp = doc.xp.unwrap_or_default();
    let cac = doc.cac.unwrap_or_default();
    let features = doc.features.unwrap_or_default();

    Ok(PolicyConfig {
        version: doc
            .version
            .unwrap_or_else(|| PolicyConfig::DEFAULT_VERSION.to_string()),
        reward_type_weights: doc
            .reward_types
            .map(ordered_weights)
            .transpose()?
            .unwrap_or_default(),
        xp_per_unit: xp.xp_per_rupee.unwrap_or(PolicyConfig::DEFAULT_XP_PER_UNIT),
        max_xp_per_transaction: xp
            .max_xp_per_txn
            .unwrap_or(PolicyConfig::DEFAULT_MAX_XP_PER_TRANSACTION),
        persona_multiplier: xp.persona_multipliers.unwrap_or_default(),
        daily_cap_per_persona: cac.daily_cap_per_persona.unwrap_or_default(),
        fallback_to_xp_on_cap_exceeded: cac.fallback_to_xp.unwrap_or(true),
        prefer_xp_mode: features.prefer_xp_mode.unwrap_or(false),
        cooldown_enabled: features.cooldown_enabled.unwrap_or(false),
        cooldown_hours: features
            .cooldown_hours
            .unwrap_or(PolicyConfig::DEFAULT_COOLDOWN_HOURS),
    })
}

/// Renders a policy back into the document shape.
pub fn policy_to_value(policy: &PolicyConfig) -> Value {
    let mut reward_types = Map::new();
    for (reward_type, weight) in policy.reward_type_weights.iter() {
        reward_types.insert(reward_type.as_str().to_string(), json!({ "weight": weight }));
    }

    let mut multipliers = Map::new();
    let mut caps = Map::new();
    for persona in Persona::ALL {
        if let Some(m) = policy.persona_multiplier.get(&persona) {
            multipliers.insert(persona.as_str().to_string(), json!(m));
        }
        if let Some(c) = policy.daily_cap_per_persona.get(&persona) {
            caps.insert(persona.as_str().to_string(), json!(c));
        }
    }

    json!({
        "version": policy.version,
        "reward_types": reward_types,
        "xp": {
            "xp_per_rupee": policy.xp_per_unit,
            "max_xp_per_txn": policy.max_xp_per_transaction,
            "persona_multipliers": multipliers,
        },
        "cac": {
            "daily_cap_per_persona": caps,
            "fallback_to_xp": policy.fallback_to_xp_on_cap_exceeded,
        },
        "features": {
            "prefer_xp_mode": policy.prefer_xp_mode,
            "cooldown_enabled": policy.cooldown_enabled,
            "cooldown_hours": policy.cooldown_hours,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_survives_document_roundtrip() {
        let policy = PolicyConfig::default();
        let back = policy_from_value(&policy_to_value(&policy)).unwrap();
        assert_eq!(back, policy);
    }

    #[test]
    fn weights_keep_document_order() {
        let value: Value = serde_json::from_str(
            r#"{"reward_types": {"GOLD": {"weight": 0.5}, "XP": {"weight": 0.25}, "CHECKOUT": {}}}"#,
        )
        .unwrap();
        let policy = policy_from_value(&value).unwrap();
        assert_eq!(
            policy.reward_type_weights.iter().collect::<Vec<_>>(),
            vec![
                (RewardType::Gold, 0.5),
                (RewardType::Xp, 0.25),
                (RewardType::Checkout, 0.0)
            ]
        );
    }

    #[test]
    fn null_and_missing_keys_take_defaults() {
        let value = json!({ "xp": null, "features": { "cooldown_hours": null } });
        let policy = policy_from_value(&value).unwrap();
        assert_eq!(policy.version, "v1.0.0");
        assert!(policy.reward_type_weights.is_empty());
        assert_eq!(policy.xp_per_unit, 0.1);
        assert_eq!(policy.max_xp_per_transaction, 500);
        assert!(policy.persona_multiplier.is_empty());
        assert_eq!(policy.cooldown_hours, 24);
        assert!(policy.fallback_to_xp_on_cap_exceeded);

        let empty = policy_from_value(&Value::Null).unwrap();
        assert_eq!(empty, policy);
    }

    #[test]
    fn unknown_reward_type_is_rejected() {
        let value = json!({ "reward_types": { "DIAMOND": { "weight": 1.0 } } });
        assert!(policy_from_value(&value).is_err());
    }

    #[test]
    fn negative_cap_is_rejected() {
        let value = json!({ "cac": { "daily_cap_per_persona": { "POWER": -5 } } });
        assert!(policy_from_value(&value).is_err());
    }
}
