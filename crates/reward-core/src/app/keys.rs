//! Cache key layout.
//!
//! | key                              | value                         |
//! |----------------------------------|-------------------------------|
//! | `idem:{txn}:{user}:{merchant}`   | stored `RewardDecision`       |
//! | `persona:{user}`                 | `UserPersonaRecord`           |
//! | `cac:{user}:{YYYY-MM-DD}`        | accumulated spend (float)     |
//! | `last_reward:{user}`             | unix seconds (integer)        |

use chrono::NaiveDate;

use crate::domain::TransactionRequest;

pub fn idempotency_key(request: &TransactionRequest) -> String {
    let parts = [
        request.txn_id.as_str(),
        request.user_id.as_str(),
        request.merchant_id.as_str(),
    ];
    format!("idem:{}", parts.join(":"))
}

pub fn persona_key(user_id: &str) -> String {
    format!("persona:{user_id}")
}

pub fn daily_spend_key(user_id: &str, date: NaiveDate) -> String {
    format!("cac:{user_id}:{}", date.format("%Y-%m-%d"))
}

pub fn last_reward_key(user_id: &str) -> String {
    format!("last_reward:{user_id}")
}
