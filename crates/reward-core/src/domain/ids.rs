//! Domain identifiers.
//!
//! # ULID ベースの DecisionId
//! - **時刻でソート可能**: timestamp が先頭にあるため、生成順序でソートできる
//! - **分散生成可能**: 調整なしで複数ノードで生成できる
//! - **UUID互換**: 128-bit で UUID と同じサイズ
//!
//! 文字列表現は `dec-` プレフィックス付き。シリアライズも同じ表現を使うので、
//! キャッシュに保存した decision をそのまま返せる。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Identifier of one freshly computed reward decision.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecisionId(Ulid);

impl DecisionId {
    /// Display で使うプレフィックス
    pub const PREFIX: &'static str = "dec-";

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// 内部の ULID を取得
    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for DecisionId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for DecisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::PREFIX, self.0)
    }
}

impl FromStr for DecisionId {
    type Err = ulid::DecodeError;

    /// プレフィックスは省略可能（素の ULID も受け付ける）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(Self::PREFIX).unwrap_or(s);
        Ulid::from_string(raw).map(Self)
    }
}

impl Serialize for DecisionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DecisionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        let ulid = Ulid::new();
        let id = DecisionId::from_ulid(ulid);
        assert_eq!(id.to_string(), format!("dec-{ulid}"));
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn serialized_form_matches_display() {
        let id = DecisionId::from(Ulid::new());
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let back: DecisionId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn parse_accepts_bare_ulid_and_rejects_garbage() {
        let ulid = Ulid::new();
        let id: DecisionId = ulid.to_string().parse().unwrap();
        assert_eq!(id.as_ulid(), ulid);

        assert!("dec-not-a-ulid".parse::<DecisionId>().is_err());
    }

    #[test]
    fn ids_are_sortable_by_creation_time() {
        let id1 = DecisionId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = DecisionId::from_ulid(Ulid::new());
        assert!(id1 < id2);
    }
}
