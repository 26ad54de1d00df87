//! Domain model (ids, personas, requests, decisions, errors).

pub mod decision;
pub mod errors;
pub mod ids;
pub mod persona;
pub mod request;

pub use self::decision::{ReasonCode, RewardDecision, RewardType};
pub use self::errors::RewardError;
pub use self::ids::DecisionId;
pub use self::persona::{Persona, PersonaEntry, UserPersonaRecord};
pub use self::request::TransactionRequest;
