//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて報酬決定のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **EngineBuilder**: エンジンの構築とワイヤリング
//! - **DecisionEngine**: idempotency → persona → XP → 報酬タイプ → 保存
//! - **PersonaResolver**: キャッシュ付きの persona 解決
//! - **keys / selection**: キャッシュキーの形式と決定的な重み付き選択

pub mod builder;
pub mod engine;
pub mod keys;
pub mod persona_resolver;
pub mod selection;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, EngineBuilder};
pub use self::engine::{DAILY_SPEND_TTL, DecisionEngine, EngineOptions};
pub use self::persona_resolver::{PersonaDataset, PersonaResolver, load_persona_dataset};
