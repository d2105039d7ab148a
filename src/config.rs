// Timeouts, topics, module layout
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::kinematics::{Translation2d, ZeroCurvature};

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Pose older than this is not trusted for prediction
pub const POSE_TIMEOUT: Duration = Duration::from_millis(250);

// Zenoh topics
pub const TOPIC_CMD_CHASSIS: &str = "swerve/cmd/chassis"; // commands
pub const TOPIC_POSE: &str = "swerve/state/pose"; // localization input
pub const TOPIC_RT_MODULES: &str = "swerve/rt/modules"; // actuation
pub const TOPIC_HEALTH: &str = "swerve/state/health"; // health status

// Module mounting offsets (m) from chassis center, body frame:
// front-left, front-right, back-left, back-right
pub const MODULE_OFFSETS: [[f64; 2]; 4] = [[0.3, 0.3], [0.3, -0.3], [-0.3, 0.3], [-0.3, -0.3]];

/// Error types for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Runtime settings. Every field falls back to the constants above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub cmd_timeout_ms: u64,
    pub pose_timeout_ms: u64,
    pub topic_cmd: String,
    pub topic_pose: String,
    pub topic_modules: String,
    pub topic_health: String,
    pub module_offsets: Vec<[f64; 2]>,
    pub zero_curvature: ZeroCurvature,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cmd_timeout_ms: CMD_TIMEOUT.as_millis() as u64,
            pose_timeout_ms: POSE_TIMEOUT.as_millis() as u64,
            topic_cmd: TOPIC_CMD_CHASSIS.to_string(),
            topic_pose: TOPIC_POSE.to_string(),
            topic_modules: TOPIC_RT_MODULES.to_string(),
            topic_health: TOPIC_HEALTH.to_string(),
            module_offsets: MODULE_OFFSETS.to_vec(),
            zero_curvature: ZeroCurvature::Preserve,
        }
    }
}

impl RuntimeConfig {
    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.module_offsets.is_empty() {
            return Err(ConfigError::Invalid {
                field: "module_offsets",
                reason: "at least one module is required".to_string(),
            });
        }
        if let Some(i) = self
            .module_offsets
            .iter()
            .position(|[x, y]| !x.is_finite() || !y.is_finite())
        {
            return Err(ConfigError::Invalid {
                field: "module_offsets",
                reason: format!("offset {} is not finite", i),
            });
        }
        if self.cmd_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "cmd_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.pose_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "pose_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if let ZeroCurvature::ChordFallback { epsilon } = self.zero_curvature {
            if !(epsilon >= 0.0 && epsilon.is_finite()) {
                return Err(ConfigError::Invalid {
                    field: "zero_curvature.epsilon",
                    reason: format!("{} is not a finite non-negative angle", epsilon),
                });
            }
        }
        Ok(())
    }

    pub fn cmd_timeout(&self) -> Duration {
        Duration::from_millis(self.cmd_timeout_ms)
    }

    pub fn pose_timeout(&self) -> Duration {
        Duration::from_millis(self.pose_timeout_ms)
    }

    pub fn module_offsets(&self) -> Vec<Translation2d> {
        self.module_offsets
            .iter()
            .map(|&[x, y]| Translation2d::new(x, y))
            .collect()
    }
}
