//! Deterministic reward-type selection.
//!
//! The seed is a 64-bit FNV-1a hash of the user id's UTF-8 bytes, modulo 100.
//! It is the same on every process and in any language, so a user always lands
//! in the same weight bucket for a given policy.

use crate::domain::RewardType;
use crate::policy::RewardWeights;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a.
pub fn stable_hash(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Bucket in `0..100` for a user.
pub fn seed_for(user_id: &str) -> u64 {
    stable_hash(user_id) % 100
}

/// Walks the weights in order, accumulating `round(weight × 100)`; the first
/// type whose running total exceeds `seed` wins.
///
/// `None` when the weights sum to less than the seed.
pub fn select_by_seed(weights: &RewardWeights, seed: u64) -> Option<RewardType> {
    let seed = seed as i64;
    let mut cumulative: i64 = 0;
    for (reward_type, weight) in weights.iter() {
        cumulative += (weight * 100.0).round() as i64;
        if seed < cumulative {
            return Some(reward_type);
        }
    }
    None
}

/// Winning type and its payout; XP when no bucket matches.
pub fn weighted_reward(weights: &RewardWeights, user_id: &str, amount: f64) -> (RewardType, u64) {
    let reward_type = select_by_seed(weights, seed_for(user_id)).unwrap_or(RewardType::Xp);
    (reward_type, reward_type.payout(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyConfig;
    use rstest::rstest;

    #[rstest]
    #[case::empty("", 0xcbf2_9ce4_8422_2325)]
    #[case::single_byte("a", 0xaf63_dc4c_8601_ec8c)]
    #[case::word("foobar", 0x8594_4171_f739_67e8)]
    fn fnv1a_reference_vectors(#[case] input: &str, #[case] expected: u64) {
        assert_eq!(stable_hash(input), expected);
    }

    #[rstest]
    #[case("user_001", 38)]
    #[case("user_789", 87)]
    #[case("alice", 83)]
    #[case("bob", 92)]
    fn seeds_are_fixed_per_user(#[case] user_id: &str, #[case] expected: u64) {
        assert_eq!(seed_for(user_id), expected);
    }

    #[rstest]
    #[case::first_bucket_start(0, Some(RewardType::Xp))]
    #[case::first_bucket_end(69, Some(RewardType::Xp))]
    #[case::second_bucket_start(70, Some(RewardType::Checkout))]
    #[case::second_bucket_end(89, Some(RewardType::Checkout))]
    #[case::last_bucket(90, Some(RewardType::Gold))]
    #[case::last_seed(99, Some(RewardType::Gold))]
    fn default_weights_partition_seeds(#[case] seed: u64, #[case] expected: Option<RewardType>) {
        let weights = PolicyConfig::default().reward_type_weights;
        assert_eq!(select_by_seed(&weights, seed), expected);
    }

    #[test]
    fn weights_below_one_leave_a_gap() {
        let weights = RewardWeights::new(vec![(RewardType::Gold, 0.25)]);
        assert_eq!(select_by_seed(&weights, 24), Some(RewardType::Gold));
        assert_eq!(select_by_seed(&weights, 25), None);
        assert_eq!(select_by_seed(&RewardWeights::default(), 0), None);
    }

    #[test]
    fn weights_are_rounded_not_truncated() {
        // 0.29 * 100 = 28.999999999999996
        let weights = RewardWeights::new(vec![
            (RewardType::Checkout, 0.29),
            (RewardType::Gold, 0.71),
        ]);
        assert_eq!(select_by_seed(&weights, 28), Some(RewardType::Checkout));
        assert_eq!(select_by_seed(&weights, 29), Some(RewardType::Gold));
    }

    #[test]
    fn configured_order_decides_buckets() {
        let gold_first = RewardWeights::new(vec![(RewardType::Gold, 0.5), (RewardType::Xp, 0.5)]);
        let xp_first = RewardWeights::new(vec![(RewardType::Xp, 0.5), (RewardType::Gold, 0.5)]);
        assert_eq!(select_by_seed(&gold_first, 10), Some(RewardType::Gold));
        assert_eq!(select_by_seed(&xp_first, 10), Some(RewardType::Xp));
    }

    #[test]
    fn weighted_reward_pays_out_by_type() {
        let weights = PolicyConfig::default().reward_type_weights;
        // alice → 83 (CHECKOUT), bob → 92 (GOLD), user_001 → 38 (XP)
        assert_eq!(weighted_reward(&weights, "alice", 1000.0), (RewardType::Checkout, 50));
        assert_eq!(weighted_reward(&weights, "bob", 1000.0), (RewardType::Gold, 20));
        assert_eq!(weighted_reward(&weights, "user_001", 1000.0), (RewardType::Xp, 0));

        let gap = RewardWeights::new(vec![(RewardType::Checkout, 0.1)]);
        assert_eq!(weighted_reward(&gap, "alice", 1000.0), (RewardType::Xp, 0));
    }
}
