//! Persona model: coarse user classification driving multipliers and caps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User persona.
///
/// Serialized as SCREAMING_SNAKE_CASE: NEW / RETURNING / POWER.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Persona {
    #[default]
    New,
    Returning,
    Power,
}

impl Persona {
    pub const ALL: [Persona; 3] = [Persona::New, Persona::Returning, Persona::Power];

    /// Lifetime purchase count at which a user becomes POWER.
    pub const POWER_THRESHOLD: u64 = 10;

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::New => "NEW",
            Persona::Returning => "RETURNING",
            Persona::Power => "POWER",
        }
    }

    /// `0 → NEW`, `≥10 → POWER`, それ以外は RETURNING
    pub fn infer(lifetime_purchases: u64) -> Persona {
        match lifetime_purchases {
            0 => Persona::New,
            n if n >= Self::POWER_THRESHOLD => Persona::Power,
            _ => Persona::Returning,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persona information for a user, as cached under `persona:{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPersonaRecord {
    pub user_id: String,
    pub persona: Persona,

    #[serde(default)]
    pub lifetime_purchases: u64,

    /// Unix seconds of the last monetary reward, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reward_ts: Option<i64>,
}

impl UserPersonaRecord {
    /// Record for a user with no history.
    pub fn new_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            persona: Persona::New,
            lifetime_purchases: 0,
            last_reward_ts: None,
        }
    }
}

/// One entry of the static persona dataset (keyed by user id elsewhere).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaEntry {
    #[serde(default)]
    pub persona: Persona,

    #[serde(default)]
    pub lifetime_purchases: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reward_ts: Option<i64>,
}

impl PersonaEntry {
    pub fn new(persona: Persona, lifetime_purchases: u64) -> Self {
        Self {
            persona,
            lifetime_purchases,
            last_reward_ts: None,
        }
    }

    pub fn into_record(self, user_id: impl Into<String>) -> UserPersonaRecord {
        UserPersonaRecord {
            user_id: user_id.into(),
            persona: self.persona,
            lifetime_purchases: self.lifetime_purchases,
            last_reward_ts: self.last_reward_ts,
        }
    }
}

impl From<&UserPersonaRecord> for PersonaEntry {
    fn from(record: &UserPersonaRecord) -> Self {
        Self {
            persona: record.persona,
            lifetime_purchases: record.lifetime_purchases,
            last_reward_ts: record.last_reward_ts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::no_purchases(0, Persona::New)]
    #[case::first_purchase(1, Persona::Returning)]
    #[case::just_below_power(9, Persona::Returning)]
    #[case::power_threshold(10, Persona::Power)]
    #[case::long_time_customer(250, Persona::Power)]
    fn infer_persona_from_purchases(#[case] purchases: u64, #[case] expected: Persona) {
        assert_eq!(Persona::infer(purchases), expected);
    }

    #[test]
    fn persona_serializes_as_upper_case() {
        assert_eq!(serde_json::to_string(&Persona::Returning).unwrap(), "\"RETURNING\"");
        let p: Persona = serde_json::from_str("\"POWER\"").unwrap();
        assert_eq!(p, Persona::Power);
    }

    #[test]
    fn dataset_entry_defaults_to_new() {
        let entry: PersonaEntry = serde_json::from_str("{}").unwrap();
        assert_eq!(entry, PersonaEntry::default());

        let record = entry.into_record("u1");
        assert_eq!(record, UserPersonaRecord::new_user("u1"));
    }
}
