//! Chain configuration

use serde::{Deserialize, Serialize};

use crate::constants::CUT_OFF_AGE;
use crate::error::{ConsensusError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Blocks may only extend forks at most this many blocks behind the best height
    pub cutoff_age: u64,
    /// Drop forks that can no longer be extended after every accepted block
    pub prune_stale_forks: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            cutoff_age: CUT_OFF_AGE,
            prune_stale_forks: true,
        }
    }
}

impl ChainConfig {
    /// Parse a JSON object; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConsensusError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = ChainConfig::default();
        assert_eq!(config.cutoff_age, 10);
        assert!(config.prune_stale_forks);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ChainConfig::from_json(r#"{"cutoff_age": 3}"#).unwrap();
        assert_eq!(config.cutoff_age, 3);
        assert!(config.prune_stale_forks);
    }

    #[test]
    fn test_from_json_invalid() {
        let result = ChainConfig::from_json(r#"{"cutoff_age": -1}"#);
        assert!(matches!(result, Err(ConsensusError::Serialization(_))));
    }
}
