//! Configuration management for the community detector

use crate::error::ConfigError;

/// Parameters of a single filter → build → detect run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Minimum similarity weight for an edge to be retained (inclusive)
    pub threshold: f64,

    /// Louvain resolution; higher values favour smaller communities
    pub resolution: f64,

    /// Minimum modularity gain between two levels for Louvain to continue
    pub min_modularity_gain: f64,

    /// Maximum local-moving passes per Louvain level
    pub max_passes: usize,

    /// Maximum aggregation levels
    pub max_levels: usize,

    /// Communities smaller than this count as "small" in the diagnostics
    pub small_community_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 7.0,
            resolution: 1.0,
            min_modularity_gain: 1e-7,
            max_passes: 100,
            max_levels: 32,
            small_community_size: 50,
        }
    }
}

impl Config {
    /// Create a configuration with custom threshold and resolution, other
    /// values at their defaults
    pub fn new(threshold: f64, resolution: f64) -> Self {
        Self {
            threshold,
            resolution,
            ..Self::default()
        }
    }

    /// Copy of this configuration with a different threshold
    pub fn with_threshold(&self, threshold: f64) -> Self {
        Self {
            threshold,
            ..self.clone()
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "threshold",
                value: self.threshold,
            });
        }
        if !self.resolution.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "resolution",
                value: self.resolution,
            });
        }
        if self.resolution <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "resolution",
                value: self.resolution,
            });
        }
        if !self.min_modularity_gain.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "min_modularity_gain",
                value: self.min_modularity_gain,
            });
        }
        if self.max_passes == 0 {
            return Err(ConfigError::Zero { name: "max_passes" });
        }
        if self.max_levels == 0 {
            return Err(ConfigError::Zero { name: "max_levels" });
        }
        Ok(())
    }
}
