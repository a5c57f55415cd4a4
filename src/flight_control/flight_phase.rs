use strum_macros::{Display, EnumIter, EnumString};

/// The named stages of the landing mission.
///
/// The declaration order is the nominal mission order and defines `Ord`.
#[derive(
    Debug, Display, EnumString, EnumIter, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum FlightPhase {
    /// Fly to the configured target area and wait for the tracker to lock on.
    Seek,
    /// Descend over the tracked target.
    Descend,
    /// Final touchdown over the target.
    Land,
    /// Climb to a safe altitude and hold.
    Abort,
}

impl FlightPhase {
    /// Phases that end the mission. The state machine keeps running in them.
    pub const fn is_mission_terminal(self) -> bool { matches!(self, Self::Land | Self::Abort) }
}
