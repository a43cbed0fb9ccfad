//! Timer configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::PlayerColor;

/// Default name of the table/collection holding timer records.
pub const DEFAULT_TABLE: &str = "alexa_game_timer";

/// Default player palette.
pub const DEFAULT_COLORS: &[&str] = &["red", "green", "blue", "yellow", "black", "white"];

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Timer configuration.
///
/// Every field is optional in the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Recognized player colors. Empty accepts any token.
    pub colors: Vec<String>,

    /// Table/collection name for stores that need one
    pub table: String,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl TimerConfig {
    /// Configuration accepting any color token.
    pub fn any_color() -> Self {
        Self {
            colors: Vec::new(),
            ..Self::default()
        }
    }

    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Lowercase a color token the way palette entries are compared.
    pub fn fold_color(token: &str) -> String {
        token.trim().to_lowercase()
    }

    /// Check a color against the palette, ignoring case.
    pub fn accepts(&self, color: &PlayerColor) -> bool {
        let folded = Self::fold_color(color.as_str());
        self.colors.is_empty() || self.colors.iter().any(|c| Self::fold_color(c) == folded)
    }
}
