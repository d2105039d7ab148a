// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::kinematics::{ChassisSpeeds, Pose2d, Rotation2d, SwerveModuleState};

// Command from teleop/trajectory follower -> runtime
// Linear velocities are field-frame m/s, theta_vel is rad/s
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChassisCommand {
    pub x_vel: f64,
    pub y_vel: f64,
    pub theta_vel: f64,
}

impl From<&ChassisCommand> for ChassisSpeeds {
    fn from(cmd: &ChassisCommand) -> Self {
        ChassisSpeeds::new(cmd.x_vel, cmd.y_vel, cmd.theta_vel)
    }
}

// Pose from localization -> runtime (meters, radians)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseUpdate {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl From<&PoseUpdate> for Pose2d {
    fn from(pose: &PoseUpdate) -> Self {
        Pose2d::new(pose.x, pose.y, Rotation2d::from_radians(pose.theta))
    }
}

impl From<&Pose2d> for PoseUpdate {
    fn from(pose: &Pose2d) -> Self {
        Self {
            x: pose.x(),
            y: pose.y(),
            theta: pose.rotation.radians(),
        }
    }
}

/// One module's command: speed in m/s, steering angle in radians
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ModuleCommand {
    pub speed: f64,
    pub angle: f64,
}

// Actuation output from runtime -> module controllers, in geometry order
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModuleActuation {
    pub modules: Vec<ModuleCommand>,
}

impl From<&[SwerveModuleState]> for ModuleActuation {
    fn from(states: &[SwerveModuleState]) -> Self {
        Self {
            modules: states
                .iter()
                .map(|s| ModuleCommand {
                    speed: s.speed,
                    angle: s.angle.radians(),
                })
                .collect(),
        }
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    PoseStale,
    KinematicsFault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let cmd: ChassisCommand =
            serde_json::from_str(r#"{"x_vel": 0.5, "y_vel": -0.1, "theta_vel": 1.0}"#).unwrap();
        let speeds = ChassisSpeeds::from(&cmd);
        assert_eq!(speeds, ChassisSpeeds::new(0.5, -0.1, 1.0));
    }

    #[test]
    fn test_health_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RuntimeHealth::KinematicsFault).unwrap(),
            "\"kinematics_fault\""
        );
        assert_eq!(
            serde_json::to_string(&RuntimeHealth::PoseStale).unwrap(),
            "\"pose_stale\""
        );
    }

    #[test]
    fn test_actuation_keeps_module_order() {
        let states = [
            SwerveModuleState::new(1.0, Rotation2d::from_radians(0.1)),
            SwerveModuleState::new(-0.5, Rotation2d::from_radians(-2.0)),
        ];
        let actuation = ModuleActuation::from(&states[..]);
        assert_eq!(
            actuation.modules,
            vec![
                ModuleCommand { speed: 1.0, angle: 0.1 },
                ModuleCommand { speed: -0.5, angle: -2.0 },
            ]
        );
    }
}
