//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（Redis などの KV ストア、時計、ID 生成）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - エンジンの可変状態はすべて Cache に置く
//! - 時刻と ID は trait 経由で差し替え可能（テストでは FixedClock）

pub mod cache;
pub mod clock;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::cache::{Cache, CacheError, CacheValue};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
