//! Errors - エラー型と分類
//!
//! # 分類
//! - Validation: リクエストが不正（amount ≤ 0 など）
//! - Configuration: 設定ソースは存在するが壊れている
//! - CacheUnavailable: キャッシュ backend の障害
//! - DecisionFailed: それ以外の計算失敗（詳細テキスト付き）

use thiserror::Error;

use crate::ports::CacheError;

/// RewardError はエンジン境界で返すエラー
///
/// `decide` は `CacheUnavailable` を返さない。キャッシュ障害はミス扱いに
/// 縮退するため、このバリアントは spend の記録など明示的な書き込み操作のみで使う。
#[derive(Debug, Error)]
pub enum RewardError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("error processing reward decision: {0}")]
    DecisionFailed(String),
}

impl RewardError {
    /// 呼び出し側の入力が原因かどうか
    pub fn is_client_error(&self) -> bool {
        matches!(self, RewardError::Validation(_))
    }
}

impl From<CacheError> for RewardError {
    fn from(err: CacheError) -> Self {
        RewardError::CacheUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_errors_map_to_cache_unavailable() {
        let err: RewardError = CacheError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, RewardError::CacheUnavailable(_)));
        assert!(err.to_string().contains("connection refused"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn validation_is_a_client_error() {
        let err = RewardError::Validation("amount must be positive".into());
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "validation error: amount must be positive");
    }
}
