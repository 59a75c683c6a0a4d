#![forbid(unsafe_code)]

//! Engine configuration loaded from TOML.
//!
//! ```toml
//! compression_level = 9
//! eager_by_default = true
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunables for binding and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// zlib level for portable bodies, 0..=9.
    pub compression_level: u32,
    /// Run new bindings once at bind time unless the call says otherwise.
    pub eager_by_default: bool,
    /// Interpreter recursion limit.
    pub max_call_depth: usize,
    /// Treat a binding whose trigger set contains its own target as a cycle.
    pub self_trigger_is_cycle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
            eager_by_default: false,
            max_call_depth: bindery_script::DEFAULT_MAX_DEPTH,
            self_trigger_is_cycle: true,
        }
    }
}

/// Errors loading an [`EngineConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A value outside its allowed range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Parse(e) => write!(f, "invalid config: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_level > 9 {
            return Err(ConfigError::Invalid(format!(
                "compression_level must be 0..=9, got {}",
                self.compression_level
            )));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid("max_call_depth must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_override() {
        let config = EngineConfig::from_toml_str("eager_by_default = true\nmax_call_depth = 32").unwrap();
        assert!(config.eager_by_default);
        assert_eq!(config.max_call_depth, 32);
        assert_eq!(config.compression_level, 6);
    }

    #[test]
    fn unknown_keys_and_bad_ranges_fail() {
        assert!(matches!(
            EngineConfig::from_toml_str("compresion_level = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("compression_level = 12"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "self_trigger_is_cycle = false\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert!(!config.self_trigger_is_cycle);
    }
}
