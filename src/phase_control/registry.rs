use super::{
    commander::{CommanderError, CommanderHandle},
    controller::{Controller, ControllerFactory},
    controllers::{AbortController, DescendController, LandController, SeekController},
};
use crate::config::LanderConfig;
use crate::flight_control::FlightPhase;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

struct PhaseEntry {
    factory: ControllerFactory,
    /// Every phase the controller may ever request.
    successors: Vec<FlightPhase>,
}

/// Static mapping from flight phase to the factory of its controller.
///
/// The registry is filled once before the commander is built and validated
/// there, so that an unknown phase is a startup error rather than something
/// found mid-flight.
#[derive(Default)]
pub struct PhaseRegistry {
    entries: BTreeMap<FlightPhase, PhaseEntry>,
}

impl PhaseRegistry {
    pub fn new() -> Self { Self::default() }

    /// The mission graph flown by the lander.
    ///
    /// ```text
    /// SEEK --tracking--> DESCEND --handoff altitude--> LAND
    ///   ^                   |
    ///   +---- track lost ---+
    /// ABORT: operator only, holds a safe altitude
    /// ```
    pub fn standard() -> Self {
        Self::new()
            .with(FlightPhase::Seek, &[FlightPhase::Descend], |cfg, handle| {
                Box::new(SeekController::new(cfg, handle))
            })
            .with(FlightPhase::Descend, &[FlightPhase::Seek, FlightPhase::Land], |cfg, handle| {
                Box::new(DescendController::new(cfg, handle))
            })
            .with(FlightPhase::Land, &[], |cfg, _| Box::new(LandController::new(cfg)))
            .with(FlightPhase::Abort, &[], |cfg, _| Box::new(AbortController::new(cfg)))
    }

    /// Registers (or replaces) the controller factory for `phase`.
    pub fn register<F>(&mut self, phase: FlightPhase, successors: &[FlightPhase], factory: F)
    where F: Fn(&LanderConfig, CommanderHandle) -> Box<dyn Controller> + Send + Sync + 'static {
        self.entries.insert(
            phase,
            PhaseEntry { factory: Box::new(factory), successors: successors.to_vec() },
        );
    }

    /// Builder style [`PhaseRegistry::register`].
    #[must_use]
    pub fn with<F>(mut self, phase: FlightPhase, successors: &[FlightPhase], factory: F) -> Self
    where F: Fn(&LanderConfig, CommanderHandle) -> Box<dyn Controller> + Send + Sync + 'static {
        self.register(phase, successors, factory);
        self
    }

    pub fn contains(&self, phase: FlightPhase) -> bool { self.entries.contains_key(&phase) }

    pub fn phases(&self) -> BTreeSet<FlightPhase> { self.entries.keys().copied().collect() }

    /// Checks that every phase the state machine can ever be asked to enter
    /// is registered: the initial phase, the externally required phases, and
    /// every declared successor of every registered phase.
    pub fn validate(
        &self,
        initial: FlightPhase,
        required: &[FlightPhase],
    ) -> Result<(), CommanderError> {
        let missing: BTreeSet<FlightPhase> = std::iter::once(initial)
            .chain(required.iter().copied())
            .chain(self.entries.values().flat_map(|e| e.successors.iter().copied()))
            .filter(|p| !self.contains(*p))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CommanderError::IncompleteRegistry { missing: missing.iter().join(", ") })
        }
    }

    /// Builds one controller per registered phase.
    pub(crate) fn instantiate(
        &self,
        config: &LanderConfig,
        handle: &CommanderHandle,
    ) -> Result<BTreeMap<FlightPhase, Box<dyn Controller>>, CommanderError> {
        let mut controllers = BTreeMap::new();
        for (phase, entry) in &self.entries {
            let controller = (entry.factory)(config, handle.clone());
            if controller.phase() != *phase {
                return Err(CommanderError::MismatchedController {
                    phase: *phase,
                    actual: controller.phase(),
                });
            }
            controllers.insert(*phase, controller);
        }
        Ok(controllers)
    }
}
