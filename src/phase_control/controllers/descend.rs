use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink, TrackingEvent, Vec3};
use crate::phase_control::{
    commander::CommanderHandle,
    controller::{Controller, ControllerError, emit},
};
use crate::{error, info, log, warn};

/// Descends over the tracked target.
///
/// The commanded height above the target starts at the seek altitude and is
/// lowered by `descent_rate` per second while the tracker holds its lock.
/// Without a lock the height is held. Once the handoff height is reached
/// with the target still tracked, the mission moves on to
/// [`FlightPhase::Land`]; losing the target for too long sends it back to
/// [`FlightPhase::Seek`].
pub struct DescendController {
    configured_target: Vec3<f64>,
    seek_altitude: f64,
    handoff_altitude: f64,
    step: f64,
    max_lost_ticks: u32,
    commander: CommanderHandle,
    target: Vec3<f64>,
    height: f64,
    tracking: bool,
    lost_ticks: u32,
    requested: Option<FlightPhase>,
}

impl DescendController {
    pub fn new(config: &LanderConfig, commander: CommanderHandle) -> Self {
        Self {
            configured_target: config.target_local_position,
            seek_altitude: config.target_seek_altitude,
            handoff_altitude: config.land_handoff_altitude.min(config.target_seek_altitude),
            step: config.descent_rate * config.control_period().as_secs_f64(),
            max_lost_ticks: config.max_lost_ticks,
            commander,
            target: config.target_local_position,
            height: config.target_seek_altitude,
            tracking: true,
            lost_ticks: 0,
            requested: None,
        }
    }

    /// Requests `next`. The same phase is asked for at most once per activation.
    fn request(&mut self, next: FlightPhase) -> Result<(), ControllerError> {
        self.requested = Some(next);
        self.commander
            .transition_to(next)
            .map_err(|_| ControllerError::RejectedTransition { phase: next })
    }
}

impl Controller for DescendController {
    fn phase(&self) -> FlightPhase { FlightPhase::Descend }

    fn on_enter(&mut self) {
        self.target = self.configured_target;
        self.height = self.seek_altitude;
        self.tracking = true;
        self.lost_ticks = 0;
        self.requested = None;
        info!("Descending from {} to {} above target.", self.height, self.handoff_altitude);
    }

    fn on_tracking_event(&mut self, event: &TrackingEvent) -> Result<(), ControllerError> {
        if event.is_tracking() {
            if !self.tracking {
                log!("Target reacquired after {} periods.", self.lost_ticks);
            }
            self.tracking = true;
            self.lost_ticks = 0;
            if let Some(pos) = event.position() {
                self.target = pos;
            }
        } else if self.tracking {
            warn!("Target lost at {} above target. Holding.", self.height);
            self.tracking = false;
        }
        Ok(())
    }

    fn on_tick(&mut self, sink: &dyn SetpointSink) -> Result<Setpoint, ControllerError> {
        if self.tracking {
            self.height = (self.height - self.step).max(self.handoff_altitude);
        } else {
            self.lost_ticks += 1;
        }
        let setpoint = emit(
            FlightPhase::Descend,
            sink,
            Setpoint::new(self.target + Vec3::up(self.height), 0.0),
        )?;

        let next = if !self.tracking && self.lost_ticks > self.max_lost_ticks {
            Some(FlightPhase::Seek)
        } else if self.tracking && self.height <= self.handoff_altitude {
            Some(FlightPhase::Land)
        } else {
            None
        };
        if let Some(next) = next.filter(|n| self.requested != Some(*n)) {
            if next == FlightPhase::Seek {
                warn!("Target lost for {} periods. Returning to seek.", self.lost_ticks);
            } else {
                info!("Handoff altitude reached over {}.", self.target);
            }
            // the setpoint is already out, a refused handover must not fail the period
            if let Err(e) = self.request(next) {
                error!("{e}");
            }
        }
        Ok(setpoint)
    }
}
