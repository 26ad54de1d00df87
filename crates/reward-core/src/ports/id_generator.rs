//! IdGenerator port - decision_id の発行
//!
//! 新しく計算した decision ごとに 1 つ発行する。再生（idempotency ヒット）では
//! 発行しない。時刻は Clock から取るので、テストでは ULID の timestamp 部分も固定できる。

use ulid::Ulid;

use crate::domain::ids::DecisionId;
use crate::ports::Clock;

/// 発行した ID は衝突しないこと。順序は保証しなくてよい
pub trait IdGenerator: Send + Sync {
    fn generate_decision_id(&self) -> DecisionId;
}

/// Clock の時刻 + 80 bit の乱数で ULID を組み立てる
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_decision_id(&self) -> DecisionId {
        // 1970 年より前の時刻は 0 に丸める
        let millis = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        DecisionId::from(Ulid::from_parts(millis, rand::random()))
    }
}
