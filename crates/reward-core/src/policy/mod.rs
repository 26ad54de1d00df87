//! Policy - ポリシー設定
//!
//! - **config**: 型付きの PolicyConfig と組み込みデフォルト
//! - **document**: ファイル上のドキュメント形状との相互変換
//! - **store**: PolicyStore（読み取り専用）と PolicySnapshot
//! - **loader**: YAML / JSON ファイルからの読み込み

pub mod config;
pub mod document;
pub mod loader;
pub mod store;

pub use self::config::{PolicyConfig, RewardWeights};
pub use self::loader::{DocumentFormat, PolicyError, load_policy, parse_policy};
pub use self::store::{PolicySnapshot, PolicyStore};
