use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

pub const DEFAULT_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Word,
    /// Chinese segmentation (jieba, search mode).
    Jieba,
    Whitespace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub kind: TokenizerKind,
    /// English Snowball stemming.
    pub stem: bool,
    /// Drop English stopwords. Note that this also drops `and`/`or`/`not` as plain terms.
    pub stopwords: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject unbalanced parentheses and leftover operands in boolean queries.
    pub strict_boolean: bool,
    pub excerpt_chars: usize,
    pub tokenizer: TokenizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_boolean: false,
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
            tokenizer: TokenizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"strict_boolean": true, "tokenizer": {"kind": "whitespace"}}"#).unwrap();
        assert!(config.strict_boolean);
        assert_eq!(config.excerpt_chars, DEFAULT_EXCERPT_CHARS);
        assert_eq!(config.tokenizer.kind, TokenizerKind::Whitespace);
        assert!(!config.tokenizer.stem);
    }

    #[test]
    fn jieba_kind_parses() {
        let config: EngineConfig = serde_json::from_str(r#"{"tokenizer": {"kind": "jieba"}}"#).unwrap();
        assert_eq!(config.tokenizer.kind, TokenizerKind::Jieba);
    }
}
