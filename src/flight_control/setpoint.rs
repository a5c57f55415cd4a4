use super::common::vec3::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A position + yaw command for the autopilot, in local coordinates.
///
/// Setpoints are built once per control period and never modified afterwards.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Setpoint {
    position: Vec3<f64>,
    yaw: f64,
}

impl Setpoint {
    pub const fn new(position: Vec3<f64>, yaw: f64) -> Self { Self { position, yaw } }

    pub fn is_finite(&self) -> bool { self.position.is_finite() && self.yaw.is_finite() }

    /// The `(x, y, z, yaw)` tuple the autopilot link expects.
    pub const fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.position.x(), self.position.y(), self.position.z(), self.yaw)
    }
}

impl Display for Setpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} yaw {}", self.position, self.yaw)
    }
}

/// Wire representation of a [`Setpoint`] on the autopilot bridge.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct SetpointMessage {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f64,
}

impl From<Setpoint> for SetpointMessage {
    fn from(sp: Setpoint) -> Self {
        let (x, y, z, yaw) = sp.as_tuple();
        Self { x, y, z, yaw }
    }
}
