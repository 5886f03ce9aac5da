//! Run configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wd_types::{config_error, FullRange, WdResult};

/// Unique search run identifier.
pub type SearchId = Uuid;

fn default_name() -> String {
    "search".to_string()
}

fn default_attempts_per_param() -> usize {
    2
}

/// Top-level configuration for a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "Uuid::new_v4")]
    pub id: SearchId,

    #[serde(default = "default_name")]
    pub name: String,

    /// Seed handed to the learner, and the starting value of the sampler's
    /// seed counter.
    #[serde(default)]
    pub seed: u64,

    /// Samples drawn per round for each tunable parameter.
    #[serde(default = "default_attempts_per_param")]
    pub attempts_per_param: usize,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SearchConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            seed: 0,
            attempts_per_param: default_attempts_per_param(),
            created_at: Utc::now(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_attempts_per_param(mut self, n: usize) -> Self {
        self.attempts_per_param = n;
        self
    }

    pub fn from_json_str(json: &str) -> WdResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> WdResult<()> {
        if self.attempts_per_param == 0 {
            return Err(config_error!(
                "attempts_per_param must be positive, got {}",
                self.attempts_per_param
            ));
        }
        Ok(())
    }

    /// Configurations sampled per growth round for `full_range`; at least one.
    pub fn attempts_per_round(&self, full_range: &FullRange) -> usize {
        self.attempts_per_param
            .saturating_mul(full_range.tunable_count())
            .max(1)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(default_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wd_types::SearchError;

    fn space() -> FullRange {
        FullRange::builder()
            .ordered("lr", [0.01, 0.1, 1.0])
            .ordered("layers", [2])
            .unordered("activation", ["relu", "tanh"])
            .num_epochs([1, 2])
            .build()
            .unwrap()
    }

    #[test]
    fn attempts_scale_with_tunable_parameters() {
        let config = SearchConfig::new("t");
        assert_eq!(config.attempts_per_round(&space()), 4);

        let config = config.with_attempts_per_param(3);
        assert_eq!(config.attempts_per_round(&space()), 6);
    }

    #[test]
    fn attempts_never_drop_below_one() {
        let fixed = FullRange::builder()
            .ordered("layers", [2])
            .num_epochs([1])
            .build()
            .unwrap();
        assert_eq!(SearchConfig::default().attempts_per_round(&fixed), 1);
    }

    #[test]
    fn json_fills_defaults() {
        let config = SearchConfig::from_json_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.attempts_per_param, 2);
        assert_eq!(config.name, "search");
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = SearchConfig::from_json_str(r#"{"attempts_per_param": 0}"#).unwrap_err();
        assert!(matches!(err, SearchError::InvalidConfig(_)));
        assert!(SearchConfig::new("t").with_attempts_per_param(0).validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = SearchConfig::from_json_str(r#"{"seed": "seven"}"#).unwrap_err();
        assert!(matches!(err, SearchError::Serialization(_)));
    }
}
