use crate::flight_control::{FlightPhase, Setpoint};
use strum_macros::Display;

/// Result of a successful `transition_to`.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy)]
pub enum Transition {
    #[strum(to_string = "{from} -> {to}")]
    Switched { from: FlightPhase, to: FlightPhase },
    #[strum(to_string = "already in {phase}")]
    Unchanged { phase: FlightPhase },
}

/// What one control period delivered, and to whom.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TickReport {
    /// The commander's phase during the tick.
    pub phase: FlightPhase,
    /// The phase of the controller that served the tick.
    pub served_by: FlightPhase,
    /// `None` if the controller failed this period.
    pub setpoint: Option<Setpoint>,
}

/// Published on every phase change.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PhaseStatus {
    pub phase: FlightPhase,
    pub transitions: u64,
}

/// Heartbeat state of the control loop.
#[derive(Debug, Display, PartialEq, Eq, Clone, Copy, Default)]
pub enum LoopHealth {
    #[default]
    #[strum(to_string = "nominal")]
    Nominal,
    /// The last period(s) were late, fewer than the alarm threshold in a row.
    #[strum(to_string = "stalled ({streak} in a row)")]
    Stalled { streak: u32 },
    /// Repeated consecutive stalls. Cleared by the next on-time tick.
    #[strum(to_string = "DEGRADED ({streak} stalls in a row)")]
    Degraded { streak: u32 },
}
