// 2-D geometry primitives for chassis and module kinematics
//
// Angles produced by rotation arithmetic (plus, minus, rotate_by) and by
// vector directions are wrapped to (-PI, PI]. Angles built directly from
// radians, or scaled with `times`, keep their raw value.

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Vectors shorter than this have no meaningful direction
pub const MIN_DIRECTION_NORM: f64 = 1e-6;

/// Wrap an angle to (-PI, PI]
pub fn wrap_angle(radians: f64) -> f64 {
    half_open(radians.sin().atan2(radians.cos()))
}

// atan2 can yield -PI on the negative x axis
fn half_open(radians: f64) -> f64 {
    if radians <= -PI { PI } else { radians }
}

/// A planar rotation, stored in radians
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation2d {
    radians: f64,
}

impl Rotation2d {
    pub const fn from_radians(radians: f64) -> Self {
        Self { radians }
    }

    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Direction of the vector (x, y). A vector shorter than
    /// `MIN_DIRECTION_NORM` maps to zero radians.
    pub fn from_components(x: f64, y: f64) -> Self {
        if x.hypot(y) > MIN_DIRECTION_NORM {
            Self::from_radians(half_open(y.atan2(x)))
        } else {
            Self::default()
        }
    }

    pub fn radians(&self) -> f64 {
        self.radians
    }

    pub fn degrees(&self) -> f64 {
        self.radians.to_degrees()
    }

    pub fn cos(&self) -> f64 {
        self.radians.cos()
    }

    pub fn sin(&self) -> f64 {
        self.radians.sin()
    }

    /// Compose two rotations, wrapped
    pub fn rotate_by(&self, other: Rotation2d) -> Self {
        Self::from_radians(wrap_angle(self.radians + other.radians))
    }

    pub fn plus(&self, other: Rotation2d) -> Self {
        self.rotate_by(other)
    }

    pub fn minus(&self, other: Rotation2d) -> Self {
        self.rotate_by(-other)
    }

    /// Scale the raw angle (no wrapping)
    pub fn times(&self, scalar: f64) -> Self {
        Self::from_radians(self.radians * scalar)
    }

    /// Same rotation with its angle wrapped to (-PI, PI]
    pub fn wrapped(&self) -> Self {
        Self::from_radians(wrap_angle(self.radians))
    }
}

impl Neg for Rotation2d {
    type Output = Rotation2d;

    fn neg(self) -> Self::Output {
        Rotation2d::from_radians(-self.radians)
    }
}

impl fmt::Display for Rotation2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad ({:.2}°)", self.radians, self.degrees())
    }
}

/// A 2-D vector in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Translation2d {
    pub x: f64,
    pub y: f64,
}

impl Translation2d {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate counter-clockwise about the origin
    pub fn rotate_by(&self, rotation: Rotation2d) -> Self {
        let (sin, cos) = rotation.radians().sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Euclidean length
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Direction from the origin, see `Rotation2d::from_components`
    pub fn angle(&self) -> Rotation2d {
        Rotation2d::from_components(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Translation2d {
    type Output = Translation2d;

    fn add(self, rhs: Translation2d) -> Self::Output {
        Translation2d::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Translation2d {
    type Output = Translation2d;

    fn sub(self, rhs: Translation2d) -> Self::Output {
        Translation2d::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Translation2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}

/// Chassis position and heading in the field frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2d {
    pub translation: Translation2d,
    pub rotation: Rotation2d,
}

impl Pose2d {
    pub fn new(x: f64, y: f64, heading: Rotation2d) -> Self {
        Self {
            translation: Translation2d::new(x, y),
            rotation: heading,
        }
    }

    pub fn x(&self) -> f64 {
        self.translation.x
    }

    pub fn y(&self) -> f64 {
        self.translation.y
    }
}

impl fmt::Display for Pose2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.4}, y: {:.4}, θ: {})", self.x(), self.y(), self.rotation)
    }
}
