// Predictive inverse kinematics for an N-module swerve chassis
//
// Each cycle the chassis pose is extrapolated one step ahead. Every module's
// mounting point then moves along a chord; that chord is treated as part of a
// circular arc tangent to the module's previous heading, and the arc's angle
// and radius give the next speed and heading.

use std::f64::consts::FRAC_PI_2;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::geometry::{MIN_DIRECTION_NORM, Pose2d, Rotation2d, Translation2d};

/// Control cycle length in seconds (50 Hz)
pub const CYCLE_SECONDS: f64 = 0.02;

/// Errors raised by the swerve solver
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("Module count mismatch: geometry has {expected} modules, got {actual} states")]
    ModuleCountMismatch { expected: usize, actual: usize },

    #[error("Forward kinematics is not implemented for the predictive swerve solver")]
    ForwardKinematicsUnimplemented,
}

pub type Result<T> = std::result::Result<T, KinematicsError>;

/// Desired chassis velocity. Linear components are added to the field-frame
/// pose as-is, so they must be expressed in the same frame as the pose.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChassisSpeeds {
    /// m/s
    pub vx: f64,
    /// m/s
    pub vy: f64,
    /// rad/s, counter-clockwise positive
    pub omega: f64,
}

impl ChassisSpeeds {
    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(vx: {:.3} m/s, vy: {:.3} m/s, ω: {:.3} rad/s)",
            self.vx, self.vy, self.omega
        )
    }
}

/// Speed and steering angle of one module
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwerveModuleState {
    /// Signed rolling speed, m/s
    pub speed: f64,
    /// Steering angle relative to the chassis
    pub angle: Rotation2d,
}

impl SwerveModuleState {
    pub const fn new(speed: f64, angle: Rotation2d) -> Self {
        Self { speed, angle }
    }

    /// Same heading, zero speed
    pub fn stopped(&self) -> Self {
        Self::new(0.0, self.angle)
    }
}

impl fmt::Display for SwerveModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(speed: {:.4} m/s, angle: {})", self.speed, self.angle)
    }
}

/// What to do when a module's chord shows no curvature (alpha == 0)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ZeroCurvature {
    /// Zero radius, hence zero speed.
    #[default]
    Preserve,
    /// When |alpha| <= epsilon, drive the chord length per cycle and keep the heading.
    /// This departs from the arc formulation.
    ChordFallback { epsilon: f64 },
}

/// Predictive swerve solver over a fixed module layout.
///
/// Holds nothing but the module offsets; the caller owns the previous states
/// and hands them back every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictiveSwerveKinematics {
    module_offsets: Vec<Translation2d>,
    zero_curvature: ZeroCurvature,
}

impl PredictiveSwerveKinematics {
    /// Create a solver for modules mounted at `module_offsets` (body frame,
    /// relative to the chassis center). The layout is not validated.
    pub fn new(module_offsets: impl Into<Vec<Translation2d>>) -> Self {
        Self {
            module_offsets: module_offsets.into(),
            zero_curvature: ZeroCurvature::Preserve,
        }
    }

    pub fn with_zero_curvature(mut self, zero_curvature: ZeroCurvature) -> Self {
        if let ZeroCurvature::ChordFallback { epsilon } = zero_curvature {
            warn!(
                "Chord fallback enabled (epsilon {:e} rad): straight module motion will report chord speed instead of zero",
                epsilon
            );
        }
        self.zero_curvature = zero_curvature;
        self
    }

    pub fn module_count(&self) -> usize {
        self.module_offsets.len()
    }

    pub fn module_offsets(&self) -> &[Translation2d] {
        &self.module_offsets
    }

    pub fn zero_curvature(&self) -> ZeroCurvature {
        self.zero_curvature
    }

    /// Chassis pose one cycle ahead, extrapolated linearly
    pub fn estimate_pose(speeds: ChassisSpeeds, current_pose: Pose2d) -> Pose2d {
        Pose2d::new(
            current_pose.x() + speeds.vx * CYCLE_SECONDS,
            current_pose.y() + speeds.vy * CYCLE_SECONDS,
            current_pose
                .rotation
                .plus(Rotation2d::from_radians(speeds.omega * CYCLE_SECONDS)),
        )
    }

    /// Compute the module commands for the upcoming cycle.
    ///
    /// # Arguments
    /// * `speeds` - Commanded chassis velocity
    /// * `current_pose` - Chassis pose at the start of the cycle
    /// * `prev_states` - Last cycle's module commands, in geometry order
    ///
    /// # Errors
    /// `ModuleCountMismatch` if `prev_states` does not have one entry per module.
    pub fn to_module_states(
        &self,
        speeds: ChassisSpeeds,
        current_pose: Pose2d,
        prev_states: &[SwerveModuleState],
    ) -> Result<Vec<SwerveModuleState>> {
        if prev_states.len() != self.module_count() {
            return Err(KinematicsError::ModuleCountMismatch {
                expected: self.module_count(),
                actual: prev_states.len(),
            });
        }

        let estimated_pose = Self::estimate_pose(speeds, current_pose);
        debug!(command = %speeds, pose = %current_pose, estimated = %estimated_pose, "Predicting module states");

        // Chassis rotation over the cycle, removed from each module's world-frame turn
        let chassis_turn = estimated_pose
            .rotation
            .minus(current_pose.rotation)
            .radians();

        let states: Vec<SwerveModuleState> = self
            .module_offsets
            .iter()
            .zip(prev_states)
            .map(|(&offset, prev)| {
                let current_pos =
                    current_pose.translation + offset.rotate_by(current_pose.rotation);
                let estimated_pos =
                    estimated_pose.translation + offset.rotate_by(estimated_pose.rotation);
                self.module_state(estimated_pos - current_pos, current_pose.rotation, prev, chassis_turn)
            })
            .collect();

        for (i, state) in states.iter().enumerate() {
            debug!(module = i, state = %state, "Module state");
        }
        Ok(states)
    }

    fn module_state(
        &self,
        delta: Translation2d,
        chassis_heading: Rotation2d,
        prev: &SwerveModuleState,
        chassis_turn: f64,
    ) -> SwerveModuleState {
        let chord = delta.norm();
        if chord <= MIN_DIRECTION_NORM {
            // No displacement, so no direction to steer toward
            return prev.stopped();
        }

        let reference = prev.angle.rotate_by(chassis_heading);
        let alpha = delta.angle().minus(reference).radians();

        if let ZeroCurvature::ChordFallback { epsilon } = self.zero_curvature {
            if alpha.abs() <= epsilon {
                return SwerveModuleState::new(chord / CYCLE_SECONDS, prev.angle);
            }
        }

        // Isosceles triangle of two radii and the chord, apex angle 2 * alpha
        let radius = if alpha != 0.0 {
            chord * (FRAC_PI_2 - alpha).sin() / (alpha * 2.0).sin()
        } else {
            0.0
        };
        let speed = alpha * 2.0 * radius / CYCLE_SECONDS;
        let heading = prev.angle.radians() + 2.0 * alpha - chassis_turn;

        SwerveModuleState::new(speed, Rotation2d::from_radians(heading))
    }

    /// Forward kinematics (module states to chassis velocity). Never computed.
    ///
    /// # Errors
    /// Always `ForwardKinematicsUnimplemented`.
    pub fn to_chassis_speeds(&self, _states: &[SwerveModuleState]) -> Result<ChassisSpeeds> {
        Err(KinematicsError::ForwardKinematicsUnimplemented)
    }

    /// The null chassis velocity for callers that expect a value from forward kinematics
    pub fn to_chassis_speeds_or_zero(&self, states: &[SwerveModuleState]) -> ChassisSpeeds {
        self.to_chassis_speeds(states).unwrap_or_default()
    }

    /// Zero speed on every module, headings held
    pub fn hold_states(prev_states: &[SwerveModuleState]) -> Vec<SwerveModuleState> {
        prev_states.iter().map(SwerveModuleState::stopped).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::geometry::wrap_angle;
    use std::f64::consts::{FRAC_PI_4, PI};

    const EPSILON: f64 = 1e-9;

    fn square_layout() -> PredictiveSwerveKinematics {
        PredictiveSwerveKinematics::new(vec![
            Translation2d::new(0.3, 0.3),
            Translation2d::new(0.3, -0.3),
            Translation2d::new(-0.3, 0.3),
            Translation2d::new(-0.3, -0.3),
        ])
    }

    fn headings(states: &[SwerveModuleState]) -> Vec<f64> {
        states.iter().map(|s| s.angle.radians()).collect()
    }

    fn same_angle(a: f64, b: f64) -> bool {
        wrap_angle(a - b).abs() < 1e-6
    }

    #[test]
    fn test_translation_reports_zero_speed_without_curvature() {
        // 1 m/s forward from rest: every chord lines up with the previous heading,
        // alpha is exactly zero and so is the speed
        let kinematics = square_layout();
        let prev = vec![SwerveModuleState::default(); 4];
        let speeds = ChassisSpeeds::new(1.0, 0.0, 0.0);

        let estimated = PredictiveSwerveKinematics::estimate_pose(speeds, Pose2d::default());
        assert!((estimated.x() - 0.02).abs() < EPSILON);
        assert_eq!(estimated.y(), 0.0);

        let states = kinematics
            .to_module_states(speeds, Pose2d::default(), &prev)
            .unwrap();
        for state in &states {
            assert_eq!(state.speed, 0.0);
            assert_eq!(state.angle.radians(), 0.0);
        }
    }

    #[test]
    fn test_chord_fallback_reports_chord_speed() {
        let kinematics =
            square_layout().with_zero_curvature(ZeroCurvature::ChordFallback { epsilon: 1e-9 });
        let prev = vec![SwerveModuleState::default(); 4];
        let states = kinematics
            .to_module_states(ChassisSpeeds::new(1.0, 0.0, 0.0), Pose2d::default(), &prev)
            .unwrap();
        for state in &states {
            assert!((state.speed - 1.0).abs() < 1e-9, "speed {}", state.speed);
            assert_eq!(state.angle.radians(), 0.0);
        }
    }

    #[test]
    fn test_chord_fallback_ignored_above_epsilon() {
        let preserve = square_layout();
        let fallback =
            square_layout().with_zero_curvature(ZeroCurvature::ChordFallback { epsilon: 1e-3 });
        let prev = vec![SwerveModuleState::default(); 4];
        let speeds = ChassisSpeeds::new(0.5, 0.5, 0.0);

        let a = preserve.to_module_states(speeds, Pose2d::default(), &prev).unwrap();
        let b = fallback.to_module_states(speeds, Pose2d::default(), &prev).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_motion_holds_headings() {
        let kinematics = square_layout();
        let prev = vec![
            SwerveModuleState::new(0.4, Rotation2d::from_radians(0.5)),
            SwerveModuleState::new(-0.2, Rotation2d::from_radians(-1.0)),
            SwerveModuleState::new(0.0, Rotation2d::from_radians(2.0)),
            SwerveModuleState::new(1.0, Rotation2d::from_radians(0.0)),
        ];
        let pose = Pose2d::new(1.5, -2.0, Rotation2d::from_radians(0.7));

        let states = kinematics
            .to_module_states(ChassisSpeeds::default(), pose, &prev)
            .unwrap();
        assert_eq!(states, PredictiveSwerveKinematics::hold_states(&prev));
        for (state, before) in states.iter().zip(&prev) {
            assert_eq!(state.speed, 0.0);
            assert_eq!(state.angle, before.angle);
        }
    }

    #[test]
    fn test_straight_line_is_uniform_across_modules() {
        let kinematics = square_layout();
        let prev = vec![SwerveModuleState::default(); 4];
        let states = kinematics
            .to_module_states(ChassisSpeeds::new(1.0, 1.0, 0.0), Pose2d::default(), &prev)
            .unwrap();
        println!("Diagonal: {:?}", states);

        // Chord at 45° from the previous heading: alpha = PI/4, heading turns by 2 * alpha
        for state in &states {
            assert!((state.angle.radians() - 2.0 * FRAC_PI_4).abs() < 1e-6);
            assert!((state.speed - states[0].speed).abs() < EPSILON);
            assert!((state.speed - FRAC_PI_4 * 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_linear_command_is_not_rotated_by_heading() {
        // Chassis faces +y; vx still moves it along field +x
        let kinematics =
            square_layout().with_zero_curvature(ZeroCurvature::ChordFallback { epsilon: 1e-9 });
        let pose = Pose2d::new(0.0, 0.0, Rotation2d::from_radians(PI / 2.0));
        // Body-frame -PI/2 points along field +x for this heading
        let prev = vec![SwerveModuleState::new(0.0, Rotation2d::from_radians(-PI / 2.0)); 4];

        let states = kinematics
            .to_module_states(ChassisSpeeds::new(1.0, 0.0, 0.0), pose, &prev)
            .unwrap();
        for state in &states {
            assert!((state.speed - 1.0).abs() < 1e-6, "speed {}", state.speed);
            assert_eq!(state.angle.radians(), -PI / 2.0);
        }
    }

    #[test]
    fn test_pure_rotation_gives_equal_tangential_speeds() {
        // Modules already steered tangent to the turn circle
        let kinematics = square_layout();
        let prev: Vec<SwerveModuleState> = kinematics
            .module_offsets()
            .iter()
            .map(|o| SwerveModuleState::new(0.0, Rotation2d::from_radians(o.angle().radians() + PI / 2.0)))
            .collect();

        let states = kinematics
            .to_module_states(ChassisSpeeds::new(0.0, 0.0, 1.0), Pose2d::default(), &prev)
            .unwrap();
        println!("Rotation: {:?}", states);

        let expected = 0.3 * 2.0_f64.sqrt(); // omega * module radius
        for (state, before) in states.iter().zip(&prev) {
            assert!((state.speed - expected).abs() < EPSILON, "speed {}", state.speed);
            assert!(same_angle(state.angle.radians(), before.angle.radians()));
        }
    }

    #[test]
    fn test_rotation_compensates_chassis_turn_in_heading() {
        let kinematics = PredictiveSwerveKinematics::new(vec![Translation2d::new(0.5, 0.0)]);
        let prev = vec![SwerveModuleState::new(0.0, Rotation2d::from_radians(PI / 2.0))];
        let pose = Pose2d::new(0.0, 0.0, Rotation2d::from_radians(1.0));
        let speeds = ChassisSpeeds::new(0.0, 0.0, 2.0);

        let states = kinematics.to_module_states(speeds, pose, &prev).unwrap();
        // Chord turns by half the chassis turn, so 2 * alpha cancels it
        assert!((states[0].speed - 1.0).abs() < EPSILON);
        assert!(same_angle(states[0].angle.radians(), PI / 2.0));
    }

    #[test]
    fn test_determinism() {
        let kinematics = square_layout();
        let prev = vec![
            SwerveModuleState::new(0.1, Rotation2d::from_radians(0.3)),
            SwerveModuleState::new(0.2, Rotation2d::from_radians(-0.4)),
            SwerveModuleState::new(0.3, Rotation2d::from_radians(1.2)),
            SwerveModuleState::new(0.4, Rotation2d::from_radians(-2.9)),
        ];
        let pose = Pose2d::new(3.0, 1.0, Rotation2d::from_radians(-0.6));
        let speeds = ChassisSpeeds::new(0.8, -0.3, 1.7);

        let first = kinematics.to_module_states(speeds, pose, &prev).unwrap();
        let second = kinematics.to_module_states(speeds, pose, &prev).unwrap();
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.speed.to_bits(), b.speed.to_bits());
            assert_eq!(a.angle.radians().to_bits(), b.angle.radians().to_bits());
        }
    }

    #[test]
    fn test_module_count_follows_geometry() {
        let three = PredictiveSwerveKinematics::new(vec![
            Translation2d::new(0.25, 0.0),
            Translation2d::new(-0.125, 0.2165),
            Translation2d::new(-0.125, -0.2165),
        ]);
        let six = PredictiveSwerveKinematics::new(
            (0..6)
                .map(|i| Translation2d::new(0.4, 0.0).rotate_by(Rotation2d::from_degrees(60.0 * i as f64)))
                .collect::<Vec<_>>(),
        );
        let speeds = ChassisSpeeds::new(0.3, 0.2, 0.5);

        for kinematics in [three, six] {
            let n = kinematics.module_count();
            let prev = vec![SwerveModuleState::default(); n];
            let states = kinematics.to_module_states(speeds, Pose2d::default(), &prev).unwrap();
            assert_eq!(states.len(), n);
            assert!(headings(&states).iter().all(|h| h.is_finite()));
        }
    }

    #[test]
    fn test_mismatched_prev_states_fail() {
        let kinematics = square_layout();
        let prev = vec![SwerveModuleState::default(); 3];
        let result = kinematics.to_module_states(ChassisSpeeds::new(1.0, 0.0, 0.0), Pose2d::default(), &prev);
        assert_eq!(
            result,
            Err(KinematicsError::ModuleCountMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_forward_kinematics_is_unimplemented() {
        let kinematics = square_layout();
        let states = vec![SwerveModuleState::new(1.0, Rotation2d::from_radians(0.3)); 4];
        assert_eq!(
            kinematics.to_chassis_speeds(&states),
            Err(KinematicsError::ForwardKinematicsUnimplemented)
        );
        assert_eq!(kinematics.to_chassis_speeds_or_zero(&states), ChassisSpeeds::default());
    }
}
