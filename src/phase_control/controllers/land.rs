use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink, TrackingEvent, Vec3};
use crate::info;
use crate::phase_control::controller::{Controller, ControllerError, emit};

/// Puts the vehicle down on the target. Tracking updates still refine the
/// touchdown point; the phase is never left on its own.
pub struct LandController {
    configured_target: Vec3<f64>,
    target: Vec3<f64>,
}

impl LandController {
    pub fn new(config: &LanderConfig) -> Self {
        Self { configured_target: config.target_local_position, target: config.target_local_position }
    }
}

impl Controller for LandController {
    fn phase(&self) -> FlightPhase { FlightPhase::Land }

    fn on_enter(&mut self) {
        self.target = self.configured_target;
        info!("Landing on {}.", self.target);
    }

    fn on_tracking_event(&mut self, event: &TrackingEvent) -> Result<(), ControllerError> {
        if let Some(pos) = event.position() {
            self.target = pos;
        }
        Ok(())
    }

    fn on_tick(&mut self, sink: &dyn SetpointSink) -> Result<Setpoint, ControllerError> {
        emit(FlightPhase::Land, sink, Setpoint::new(self.target, 0.0))
    }
}
