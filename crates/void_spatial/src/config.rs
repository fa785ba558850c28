//! Scene index configuration

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpatialError};
use crate::morton;

/// When `restructure` throws the tree away and rebuilds it
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RebuildPolicy {
    /// Any pending change triggers a full rebuild
    Always,
    /// Rebuild only when the share of changed objects exceeds `ratio`;
    /// otherwise splice changes into the existing tree
    Threshold { ratio: f32 },
}

impl Default for RebuildPolicy {
    fn default() -> Self {
        Self::Always
    }
}

/// Scene index configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    pub rebuild_policy: RebuildPolicy,

    /// Floor on the per-axis extent used to normalize build centroids
    pub morton_epsilon: f32,

    /// A build deeper than this logs a warning
    pub max_depth_warning: u32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            rebuild_policy: RebuildPolicy::Always,
            morton_epsilon: morton::DEFAULT_EPSILON,
            max_depth_warning: 64,
        }
    }
}

impl SpatialConfig {
    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let RebuildPolicy::Threshold { ratio } = self.rebuild_policy {
            if !ratio.is_finite() || ratio < 0.0 {
                return Err(SpatialError::InvalidConfig(format!(
                    "rebuild ratio must be finite and non-negative, got {}",
                    ratio
                )));
            }
        }

        if !(self.morton_epsilon > 0.0) {
            return Err(SpatialError::InvalidConfig(format!(
                "morton epsilon must be positive, got {}",
                self.morton_epsilon
            )));
        }

        Ok(())
    }

    pub fn with_rebuild_policy(mut self, policy: RebuildPolicy) -> Self {
        self.rebuild_policy = policy;
        self
    }

    pub fn with_morton_epsilon(mut self, epsilon: f32) -> Self {
        self.morton_epsilon = epsilon;
        self
    }

    pub fn with_max_depth_warning(mut self, depth: u32) -> Self {
        self.max_depth_warning = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpatialConfig::default();
        assert_eq!(config.rebuild_policy, RebuildPolicy::Always);
        assert_eq!(config.max_depth_warning, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = SpatialConfig::from_json(
            r#"{ "rebuild_policy": { "mode": "threshold", "ratio": 0.25 } }"#,
        )
        .unwrap();

        assert_eq!(config.rebuild_policy, RebuildPolicy::Threshold { ratio: 0.25 });
        assert_eq!(config.morton_epsilon, morton::DEFAULT_EPSILON);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            SpatialConfig::from_json(r#"{ "morton_epsilon": 0.0 }"#),
            Err(SpatialError::InvalidConfig(_))
        ));
        assert!(matches!(
            SpatialConfig::from_json(r#"{ "rebuild_policy": { "mode": "threshold", "ratio": -1.0 } }"#),
            Err(SpatialError::InvalidConfig(_))
        ));
        assert!(matches!(
            SpatialConfig::from_json("{ not json"),
            Err(SpatialError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_builder() {
        let config = SpatialConfig::default()
            .with_rebuild_policy(RebuildPolicy::Threshold { ratio: 0.5 })
            .with_morton_epsilon(1e-3)
            .with_max_depth_warning(16);

        assert_eq!(config.max_depth_warning, 16);
        assert!(config.validate().is_ok());
    }
}
