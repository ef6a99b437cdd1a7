//! TOML configuration for the Tiller CLI.
//!
//! Every section is optional; an absent file yields the defaults (CRC32
//! hashing, `info` logging).

use std::path::Path;

use serde::Deserialize;
use tiller_hash::HashAlgorithm;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Key digest selection.
    pub hash: HashSection,
    /// Logging configuration.
    pub log: LogSection,
    /// Interactive console tuning.
    pub console: ConsoleSection,
}

/// `[hash]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HashSection {
    /// Digest algorithm: `"crc32"` (default), `"md5"` or `"sha256"`.
    pub algorithm: HashAlgorithm,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[console]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ConsoleSection {
    /// Upper bound (exclusive) on the integer space random node addresses
    /// are drawn from. Larger values make collisions rarer.
    pub random_addr_space: u32,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            random_addr_space: 100_000,
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or fall back to defaults when no path
    /// is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
