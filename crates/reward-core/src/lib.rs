//! reward-core
//!
//! Deterministic reward decisions for transaction events.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, persona, request, decision, errors）
//! - **ports**: 抽象化レイヤー（Cache, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryCache, RedisCache）
//! - **policy**: ポリシー設定（PolicyConfig, PolicyStore, ローダー）
//! - **app**: アプリケーションロジック（DecisionEngine, PersonaResolver, EngineBuilder）
//! - **settings**: 環境変数から読むプロセス設定

pub mod domain;
pub mod ports;
pub mod impls;
pub mod policy;
pub mod app;
pub mod settings;

pub use app::{BuildError, DecisionEngine, EngineBuilder, PersonaResolver};
pub use domain::{
    DecisionId, Persona, ReasonCode, RewardDecision, RewardError, RewardType, TransactionRequest,
    UserPersonaRecord,
};
pub use policy::{PolicyConfig, PolicySnapshot, PolicyStore};
pub use settings::Settings;
