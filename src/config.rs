// Configuration for ruleset mining
//
// Values come from an optional TOML file; command-line flags override them.

use crate::error::{Result, RulesetError};
use crate::subsumption::{GraphOptions, DEFAULT_LABEL_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Knobs of a mining run
///
/// # Example
/// ```
/// use guardminer::config::RulesetConfig;
///
/// let config: RulesetConfig = toml::from_str("strict_support = false").unwrap();
/// assert!(!config.strict_support);
/// assert_eq!(config.label_limit, 16383);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesetConfig {
    /// Require the subsuming rule to have strictly more supporting apps
    ///
    /// When false, a rule calling a superset of APIs with the same support
    /// also subsumes.
    pub strict_support: bool,

    /// Report the supporting applications instead of the commit message
    pub detailed: bool,

    /// Maximum DOT label length in characters
    pub label_limit: usize,

    /// Factor `k` of the reliability weighting
    ///
    /// 0 disables the boost even when an API usage table is given.
    pub reliability_weight: f64,

    /// Regular expressions of APIs removed before mining
    pub denylist: Vec<String>,
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self {
            strict_support: true,
            detailed: false,
            label_limit: DEFAULT_LABEL_LIMIT,
            reliability_weight: 1.0,
            denylist: Vec::new(),
        }
    }
}

impl RulesetConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| RulesetError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate().map_err(RulesetError::Config)?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.label_limit < 4 {
            return Err(format!(
                "label_limit must be at least 4, got {}",
                self.label_limit
            ));
        }

        if !self.reliability_weight.is_finite() || self.reliability_weight < 0.0 {
            return Err(format!(
                "reliability_weight must be a non-negative number, got {}",
                self.reliability_weight
            ));
        }

        Ok(())
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            strict_support: self.strict_support,
            label_limit: self.label_limit,
        }
    }
}
