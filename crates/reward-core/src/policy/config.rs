//! PolicyConfig - 意思決定時に読み取り専用で使うポリシー値

use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{Persona, RewardType};

/// Reward-type weights in configured order.
///
/// Order matters: weighted selection walks the entries front to back.
/// Weights need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardWeights(Vec<(RewardType, f64)>);

impl RewardWeights {
    pub fn new(entries: Vec<(RewardType, f64)>) -> Self {
        Self(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RewardType, f64)> + '_ {
        self.0.iter().copied()
    }

    pub fn get(&self, reward_type: RewardType) -> Option<f64> {
        self.iter().find(|(t, _)| *t == reward_type).map(|(_, w)| w)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(RewardType, f64)> for RewardWeights {
    fn from_iter<I: IntoIterator<Item = (RewardType, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Versioned, immutable policy snapshot.
///
/// Loaded once per process; a reload is a restart.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub version: String,
    pub reward_type_weights: RewardWeights,
    pub xp_per_unit: f64,
    pub max_xp_per_transaction: u64,
    pub persona_multiplier: HashMap<Persona, f64>,
    pub daily_cap_per_persona: HashMap<Persona, u64>,

    /// Parsed and exposed, but a cap breach yields XP either way.
    pub fallback_to_xp_on_cap_exceeded: bool,
    pub prefer_xp_mode: bool,
    pub cooldown_enabled: bool,
    pub cooldown_hours: u64,
}

impl PolicyConfig {
    pub const DEFAULT_VERSION: &'static str = "v1.0.0";
    pub const DEFAULT_XP_PER_UNIT: f64 = 0.1;
    pub const DEFAULT_MAX_XP_PER_TRANSACTION: u64 = 500;
    pub const DEFAULT_COOLDOWN_HOURS: u64 = 24;

    /// Missing personas get a neutral multiplier.
    pub fn multiplier(&self, persona: Persona) -> f64 {
        self.persona_multiplier.get(&persona).copied().unwrap_or(1.0)
    }

    /// Missing personas get no monetary budget.
    pub fn daily_cap(&self, persona: Persona) -> u64 {
        self.daily_cap_per_persona.get(&persona).copied().unwrap_or(0)
    }

    pub fn cooldown_window(&self) -> Duration {
        Duration::from_secs(self.cooldown_hours.saturating_mul(3600))
    }
}

impl Default for PolicyConfig {
    /// Built-in policy used when no policy source exists.
    fn default() -> Self {
        Self {
            version: Self::DEFAULT_VERSION.to_string(),
            reward_type_weights: RewardWeights::new(vec![
                (RewardType::Xp, 0.7),
                (RewardType::Checkout, 0.2),
                (RewardType::Gold, 0.1),
            ]),
            xp_per_unit: Self::DEFAULT_XP_PER_UNIT,
            max_xp_per_transaction: Self::DEFAULT_MAX_XP_PER_TRANSACTION,
            persona_multiplier: HashMap::from([
                (Persona::New, 1.0),
                (Persona::Returning, 1.5),
                (Persona::Power, 2.0),
            ]),
            daily_cap_per_persona: HashMap::from([
                (Persona::New, 0),
                (Persona::Returning, 1000),
                (Persona::Power, 5000),
            ]),
            fallback_to_xp_on_cap_exceeded: true,
            prefer_xp_mode: false,
            cooldown_enabled: false,
            cooldown_hours: Self::DEFAULT_COOLDOWN_HOURS,
        }
    }
}
