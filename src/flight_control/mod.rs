//! Flight domain values and the seams to the autopilot link and the target tracker.

pub(crate) mod common;
mod flight_phase;
mod setpoint;
mod setpoint_sink;
mod tracking;
mod tracking_source;
#[cfg(test)]
mod tests;

pub use common::vec3::Vec3;
pub use flight_phase::FlightPhase;
pub use setpoint::Setpoint;
pub use setpoint_sink::{SetpointSink, UdpSetpointSink};
pub use tracking::{TrackingError, TrackingEvent, TrackingMessage};
pub use tracking_source::{TrackingSource, UdpTrackingSource};
