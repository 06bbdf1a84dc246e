// ⚙️ Configuration - TOML file with defaults for every field
// A missing file section (or a missing file) falls back to defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// BATCH SETTINGS
// ============================================================================

/// How a batch file is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Header name of the IBAN column (used when `has_headers`)
    pub column: String,

    /// Zero-based column index (used for headerless files)
    pub column_index: usize,

    /// Field delimiter, a single ASCII character
    pub delimiter: char,

    pub has_headers: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            column: "iban".to_string(),
            column_index: 0,
            delimiter: ',',
            has_headers: true,
        }
    }
}

impl BatchConfig {
    /// Delimiter as the byte the csv reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(anyhow::anyhow!(
                "Delimiter {:?} must be a single ASCII character",
                self.delimiter
            ))
        }
    }
}

// ============================================================================
// SERVER SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address for the HTTP service
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:3000".to_string(),
        }
    }
}

// ============================================================================
// ROOT CONFIG
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub batch: BatchConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
