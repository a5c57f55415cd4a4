use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink, TrackingEvent, Vec3};
use crate::phase_control::{
    commander::CommanderHandle,
    controller::{Controller, ControllerError, emit},
};
use crate::{info, phase};

/// Seeks the landing target.
///
/// Flies to a fixed point above the configured target position and leaves
/// the navigation to the autopilot. Once the tracker reports a lock the
/// mission moves on to [`FlightPhase::Descend`].
///
/// The setpoint is static, but it is still sent every period: the autopilot
/// treats a gap in setpoints as a lost offboard link.
pub struct SeekController {
    target_local_position: Vec3<f64>,
    target_seek_altitude: f64,
    commander: CommanderHandle,
}

impl SeekController {
    pub fn new(config: &LanderConfig, commander: CommanderHandle) -> Self {
        Self {
            target_local_position: config.target_local_position,
            target_seek_altitude: config.target_seek_altitude,
            commander,
        }
    }

    fn seek_point(&self) -> Vec3<f64> {
        self.target_local_position + Vec3::up(self.target_seek_altitude)
    }
}

impl Controller for SeekController {
    fn phase(&self) -> FlightPhase { FlightPhase::Seek }

    fn on_enter(&mut self) {
        info!("Seeking target at {}, approach point {}.", self.target_local_position, self.seek_point());
    }

    fn on_tracking_event(&mut self, event: &TrackingEvent) -> Result<(), ControllerError> {
        if !event.is_tracking() {
            return Ok(());
        }
        phase!("Target acquired while seeking.");
        self.commander
            .transition_to(FlightPhase::Descend)
            .map_err(|_| ControllerError::RejectedTransition { phase: FlightPhase::Descend })
    }

    fn on_tick(&mut self, sink: &dyn SetpointSink) -> Result<Setpoint, ControllerError> {
        // yaw is ignored by the autopilot in position mode
        emit(FlightPhase::Seek, sink, Setpoint::new(self.seek_point(), 0.0))
    }
}
