//! PolicyStore - バージョン付きポリシーの保持と公開

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::config::PolicyConfig;
use super::document::{policy_from_value, policy_to_value};

/// `{version, config}` view exposed for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot {
    pub version: String,
    pub config: Value,
}

/// PolicyStore holds the typed policy and the document it came from.
///
/// Read-only after construction.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    config: PolicyConfig,
    document: Value,
}

impl PolicyStore {
    /// Store for a typed policy; the document is rendered from it.
    pub fn new(config: PolicyConfig) -> Self {
        let document = policy_to_value(&config);
        Self { config, document }
    }

    /// Store for a parsed document, kept verbatim for the snapshot.
    pub fn from_document(document: Value) -> Result<Self, serde_json::Error> {
        let config = policy_from_value(&document)?;
        let document = match document {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        Ok(Self { config, document })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            version: self.config.version.clone(),
            config: self.document.clone(),
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}
