//! Configuration for a crossing run
//!
//! Values come from an optional TOML file and may be overridden by the
//! command line. Every field has a default, so an empty file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CrossingError, CrossingResult};
use crate::policy::{SelectionPolicy, DEFAULT_STARVATION_CAP};

//-----------------------------------------------------------------------------
// Configuration Structures
//-----------------------------------------------------------------------------

/// Maximum number of trains accepted for one run.
pub const DEFAULT_MAX_TRAINS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Records beyond this count are rejected.
    pub max_trains: usize,
    /// Real length of one input time unit, in milliseconds.
    pub time_unit_ms: u64,
    /// Consecutive same-direction crossings allowed while the other side waits.
    pub starvation_cap: u32,
    /// Where the event log is written.
    pub output_path: PathBuf,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            max_trains: DEFAULT_MAX_TRAINS,
            time_unit_ms: 100,
            starvation_cap: DEFAULT_STARVATION_CAP,
            output_path: PathBuf::from("output.txt"),
        }
    }
}

impl CrossingConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> CrossingResult<Self> {
        let config: CrossingConfig = toml::from_str(content)
            .map_err(|e| CrossingError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> CrossingResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrossingError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CrossingResult<()> {
        if self.max_trains == 0 {
            return Err(CrossingError::Configuration(
                "max_trains must be at least 1".to_string(),
            ));
        }
        if self.time_unit_ms == 0 {
            return Err(CrossingError::Configuration(
                "time_unit_ms must be at least 1".to_string(),
            ));
        }
        if self.starvation_cap == 0 {
            return Err(CrossingError::Configuration(
                "starvation_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }

    pub fn policy(&self) -> SelectionPolicy {
        SelectionPolicy::new(self.starvation_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = CrossingConfig::from_toml_str("").unwrap();
        assert_eq!(config, CrossingConfig::default());
        assert_eq!(config.time_unit(), Duration::from_millis(100));
        assert_eq!(config.policy().starvation_cap(), 2);
    }

    #[test]
    fn test_partial_override() {
        let config = CrossingConfig::from_toml_str(
            "max_trains = 4\ntime_unit_ms = 10\noutput_path = \"log.txt\"\n",
        )
        .unwrap();
        assert_eq!(config.max_trains, 4);
        assert_eq!(config.time_unit_ms, 10);
        assert_eq!(config.starvation_cap, 2);
        assert_eq!(config.output_path, PathBuf::from("log.txt"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let docs = [
            "max_trains = 0",
            "time_unit_ms = 0",
            "starvation_cap = 0",
            "max_trains = \"x\"",
        ];
        for doc in docs {
            let err = CrossingConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, CrossingError::Configuration(_)), "{}", doc);
        }
    }
}
