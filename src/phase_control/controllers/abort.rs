use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink, TrackingEvent, Vec3};
use crate::phase_control::controller::{Controller, ControllerError, emit};
use crate::warn;

pub struct AbortController {
    hold_point: Vec3<f64>,
}

impl AbortController {
    pub fn new(config: &LanderConfig) -> Self {
        Self { hold_point: config.target_local_position + Vec3::up(config.abort_altitude) }
    }
}

impl Controller for AbortController {
    fn phase(&self) -> FlightPhase { FlightPhase::Abort }

    fn on_enter(&mut self) {
        warn!("Mission aborted. Climbing to {} and holding.", self.hold_point);
    }

    fn on_tracking_event(&mut self, _: &TrackingEvent) -> Result<(), ControllerError> { Ok(()) }

    fn on_tick(&mut self, sink: &dyn SetpointSink) -> Result<Setpoint, ControllerError> {
        emit(FlightPhase::Abort, sink, Setpoint::new(self.hold_point, 0.0))
    }
}
