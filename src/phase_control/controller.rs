use super::commander::CommanderHandle;
use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink, TrackingEvent};
use strum_macros::Display;

/// Phase specific control strategy.
///
/// Exactly one controller is active at any time. The commander guarantees
/// that `on_enter` runs once per activation before any tick or tracking
/// event reaches the controller, and that callbacks never overlap. All
/// callbacks run while the commander is locked and therefore must return
/// quickly and never block.
///
/// Callbacks must not panic. Failures are reported as [`ControllerError`];
/// the commander logs them and keeps the loop running, while a panic takes
/// the control loop task down and stops the setpoint stream.
pub trait Controller: Send {
    /// The phase this controller is registered for.
    fn phase(&self) -> FlightPhase;

    /// Resets phase-local state on activation.
    fn on_enter(&mut self);

    /// Reacts to a tracker update. The only externally visible effect
    /// allowed is a transition request through the [`CommanderHandle`].
    fn on_tracking_event(&mut self, event: &TrackingEvent) -> Result<(), ControllerError>;

    /// Computes the setpoint for this control period and sends it.
    fn on_tick(&mut self, sink: &dyn SetpointSink) -> Result<Setpoint, ControllerError>;
}

/// Builds the controller for one phase.
pub type ControllerFactory =
    Box<dyn Fn(&LanderConfig, CommanderHandle) -> Box<dyn Controller> + Send + Sync>;

#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum ControllerError {
    #[strum(to_string = "{phase} computed a non-finite setpoint")]
    NonFiniteSetpoint { phase: FlightPhase },
    #[strum(to_string = "transition request to {phase} was rejected")]
    RejectedTransition { phase: FlightPhase },
}

impl std::error::Error for ControllerError {}

/// Sends `setpoint` if it is usable, the common tail of every `on_tick`.
pub(crate) fn emit(
    phase: FlightPhase,
    sink: &dyn SetpointSink,
    setpoint: Setpoint,
) -> Result<Setpoint, ControllerError> {
    if !setpoint.is_finite() {
        return Err(ControllerError::NonFiniteSetpoint { phase });
    }
    sink.send_setpoint(setpoint);
    Ok(setpoint)
}
