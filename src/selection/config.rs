//! Selector configuration

use super::error::{SelectionError, SelectionResult};
use crate::models::HmmConfig;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Settings shared by every selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// State count of the constant topology and of every fallback
    pub n_constant: usize,
    /// Smallest candidate state count
    pub min_n_components: usize,
    /// Largest candidate state count (inclusive)
    pub max_n_components: usize,
    /// Seed passed to every fit
    pub random_state: u64,
    /// Log every fit at info level
    pub verbose: bool,
    /// Number of folds for cross-validation
    pub cv_folds: usize,
    /// Baum-Welch settings
    pub hmm: HmmConfig,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            n_constant: 3,
            min_n_components: 2,
            max_n_components: 10,
            random_state: 14,
            verbose: false,
            cv_folds: 2,
            hmm: HmmConfig::default(),
        }
    }
}

impl SelectorConfig {
    /// Create config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set constant / fallback state count
    pub fn with_n_constant(mut self, n_constant: usize) -> Self {
        self.n_constant = n_constant;
        self
    }

    /// Set candidate range (inclusive)
    pub fn with_range(mut self, min_n_components: usize, max_n_components: usize) -> Self {
        self.min_n_components = min_n_components;
        self.max_n_components = max_n_components;
        self
    }

    /// Set fitting seed
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Enable verbose fit logging
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set cross-validation fold count
    pub fn with_cv_folds(mut self, cv_folds: usize) -> Self {
        self.cv_folds = cv_folds;
        self
    }

    /// Set Baum-Welch settings
    pub fn with_hmm(mut self, hmm: HmmConfig) -> Self {
        self.hmm = hmm;
        self
    }

    /// Candidate state counts, ascending. Empty when min > max.
    pub fn candidates(&self) -> RangeInclusive<usize> {
        self.min_n_components..=self.max_n_components
    }

    /// Reject settings no selector can work with
    pub fn validate(&self) -> SelectionResult<()> {
        if self.n_constant == 0 {
            return Err(SelectionError::InvalidConfig("n_constant must be at least 1".into()));
        }
        if self.min_n_components == 0 {
            return Err(SelectionError::InvalidConfig(
                "min_n_components must be at least 1".into(),
            ));
        }
        if self.cv_folds < 2 {
            return Err(SelectionError::InvalidConfig(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        Ok(())
    }

    /// Parse from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> SelectionResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SelectionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> SelectionResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SelectionError::InvalidConfig(e.to_string()))
    }
}
