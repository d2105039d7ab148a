// Kinematics for the swerve base
//
// Provides:
// - 2-D geometry primitives (translations, rotations, poses)
// - Predictive swerve inverse kinematics (chassis velocity -> module states)

pub mod geometry;
pub mod swerve;

pub use geometry::{Pose2d, Rotation2d, Translation2d};
pub use swerve::{
    CYCLE_SECONDS, ChassisSpeeds, KinematicsError, PredictiveSwerveKinematics, SwerveModuleState,
    ZeroCurvature,
};
