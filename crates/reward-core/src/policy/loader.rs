//! Policy loader - YAML / JSON ファイルから PolicyStore を構築
//!
//! # 挙動
//! - ファイルが存在しない → 組み込みのデフォルトポリシー
//! - 空のドキュメント → 全フィールドがデフォルト値
//! - 壊れたドキュメント → PolicyError（起動時に fail-fast）

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::store::PolicyStore;
use crate::domain::RewardError;

/// PolicyError はポリシー読み込み時のエラー
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML policy document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON policy document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("policy document must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

impl From<PolicyError> for RewardError {
    fn from(err: PolicyError) -> Self {
        RewardError::Configuration(err.to_string())
    }
}

/// Source format of a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` is JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Loads the policy at `path`, or the built-in default when the file is absent.
pub fn load_policy(path: &Path) -> Result<PolicyStore, PolicyError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "policy file not found, using built-in default policy");
        return Ok(PolicyStore::default());
    }

    let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let store = parse_policy(&text, DocumentFormat::from_path(path))?;
    tracing::info!(path = %path.display(), version = store.version(), "policy loaded");
    Ok(store)
}

pub fn parse_policy(text: &str, format: DocumentFormat) -> Result<PolicyStore, PolicyError> {
    let value: Value = match format {
        _ if text.trim().is_empty() => Value::Null,
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
        DocumentFormat::Json => serde_json::from_str(text)?,
    };

    match &value {
        Value::Null | Value::Object(_) => {}
        Value::Bool(_) => return Err(PolicyError::NotAMapping("a boolean")),
        Value::Number(_) => return Err(PolicyError::NotAMapping("a number")),
        Value::String(_) => return Err(PolicyError::NotAMapping("a string")),
        Value::Array(_) => return Err(PolicyError::NotAMapping("a sequence")),
    }

    Ok(PolicyStore::from_document(value)?)
}
