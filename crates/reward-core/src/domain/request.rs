//! Transaction request: the immutable input of one decision.

use serde::{Deserialize, Serialize};

use super::errors::RewardError;

/// A transaction event to decide a reward for.
///
/// The wire shape keeps the short `ts` name for the optional unix timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub txn_id: String,
    pub user_id: String,
    pub merchant_id: String,
    pub amount: f64,
    #[serde(default = "default_txn_type")]
    pub txn_type: String,

    /// Unix seconds; the engine clock is used when absent.
    #[serde(default, rename = "ts", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

fn default_txn_type() -> String {
    TransactionRequest::DEFAULT_TXN_TYPE.to_string()
}

impl TransactionRequest {
    pub const DEFAULT_TXN_TYPE: &'static str = "purchase";

    pub fn new(
        txn_id: impl Into<String>,
        user_id: impl Into<String>,
        merchant_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            txn_id: txn_id.into(),
            user_id: user_id.into(),
            merchant_id: merchant_id.into(),
            amount,
            txn_type: Self::DEFAULT_TXN_TYPE.to_string(),
            timestamp: None,
        }
    }

    pub fn with_txn_type(mut self, txn_type: impl Into<String>) -> Self {
        self.txn_type = txn_type.into();
        self
    }

    pub fn with_timestamp(mut self, ts: i64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// `amount` must be a finite positive number.
    pub fn validate(&self) -> Result<(), RewardError> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(RewardError::Validation(format!(
                "amount must be greater than 0 (got {})",
                self.amount
            )));
        }
        Ok(())
    }
}
