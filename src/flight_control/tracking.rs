use super::common::vec3::Vec3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Raw tracker output as it arrives on the wire.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct TrackingMessage {
    /// `true` while the landing target is detected.
    pub tracking: bool,
    /// Target position estimate in local coordinates, if the tracker has one.
    pub position: Option<[f64; 3]>,
}

#[cfg(test)]
impl TrackingMessage {
    pub const fn acquired(position: Option<[f64; 3]>) -> Self { Self { tracking: true, position } }

    pub const fn lost() -> Self { Self { tracking: false, position: None } }
}

/// A validated tracking signal, delivered to exactly one controller.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TrackingEvent {
    tracking: bool,
    position: Option<Vec3<f64>>,
    received: DateTime<Utc>,
}

impl TrackingEvent {
    pub fn new(tracking: bool, position: Option<Vec3<f64>>) -> Self {
        Self { tracking, position, received: Utc::now() }
    }

    pub const fn is_tracking(&self) -> bool { self.tracking }

    pub const fn position(&self) -> Option<Vec3<f64>> { self.position }

    pub const fn received(&self) -> DateTime<Utc> { self.received }
}

#[derive(Debug, Display, PartialEq, Eq, Clone)]
pub enum TrackingError {
    #[strum(to_string = "invalid tracking event: {reason}")]
    InvalidTrackingEvent { reason: String },
    #[strum(to_string = "undecodable tracking message: {reason}")]
    Decode { reason: String },
    #[strum(to_string = "tracking link failed: {reason}")]
    Io { reason: String },
}

impl std::error::Error for TrackingError {}

impl TryFrom<TrackingMessage> for TrackingEvent {
    type Error = TrackingError;

    fn try_from(msg: TrackingMessage) -> Result<Self, Self::Error> {
        let position = msg.position.map(Vec3::from);
        if let Some(pos) = position {
            if !pos.is_finite() {
                return Err(TrackingError::InvalidTrackingEvent {
                    reason: format!("non-finite position estimate {pos}"),
                });
            }
        }
        if !msg.tracking && position.is_some() {
            return Err(TrackingError::InvalidTrackingEvent {
                reason: "position estimate without tracking lock".to_string(),
            });
        }
        Ok(TrackingEvent::new(msg.tracking, position))
    }
}
