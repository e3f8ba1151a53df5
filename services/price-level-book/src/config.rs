//! Book configuration

use serde::{Deserialize, Serialize};
use types::errors::ConfigError;
use types::ids::{SourceId, Symbol};

/// Construction parameters for one price level book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    /// Instrument symbol to subscribe to.
    pub symbol: String,
    /// Order source (venue) to subscribe to.
    pub source: String,
    /// Levels visible per side; 0 means unbounded.
    #[serde(default)]
    pub depth: usize,
}

impl BookConfig {
    pub fn new(symbol: impl Into<String>, source: impl Into<String>, depth: usize) -> Self {
        Self {
            symbol: symbol.into(),
            source: source.into(),
            depth,
        }
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.symbol_id()?;
        self.source_id()?;
        Ok(())
    }

    pub fn symbol_id(&self) -> Result<Symbol, ConfigError> {
        Symbol::try_new(self.symbol.clone()).ok_or(ConfigError::EmptySymbol)
    }

    pub fn source_id(&self) -> Result<SourceId, ConfigError> {
        SourceId::try_new(self.source.clone()).ok_or(ConfigError::EmptySource)
    }
}
