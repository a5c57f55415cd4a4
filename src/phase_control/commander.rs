use super::{
    controller::Controller,
    registry::PhaseRegistry,
    signal::{PhaseStatus, TickReport, Transition},
};
use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, SetpointSink, TrackingEvent};
use crate::{error, event, phase, warn};
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::{Mutex, mpsc, watch};

/// The commander as shared between the control loop, the event dispatcher and
/// the operator console. This mutex is the only synchronization domain for
/// the `(phase, controller)` pair.
pub type SharedCommander = Arc<Mutex<Commander>>;

#[derive(Debug, Display, PartialEq, Eq, Clone)]
pub enum CommanderError {
    #[strum(to_string = "no controller registered for phase {phase}")]
    UnknownPhase { phase: FlightPhase },
    #[strum(to_string = "phase registry is missing {missing}")]
    IncompleteRegistry { missing: String },
    #[strum(to_string = "factory for {phase} built a controller for {actual}")]
    MismatchedController { phase: FlightPhase, actual: FlightPhase },
    #[strum(to_string = "no active controller in phase {phase}")]
    NoActiveController { phase: FlightPhase },
    #[strum(to_string = "commander has shut down")]
    Shutdown,
}

impl std::error::Error for CommanderError {}

/// Non-owning handle through which controllers request phase changes.
///
/// Requests for unregistered phases are rejected right here. Accepted
/// requests are applied by the commander as soon as the callback that
/// issued them returns, still under the commander lock and in the order
/// they were issued.
#[derive(Clone)]
pub struct CommanderHandle {
    known: Arc<BTreeSet<FlightPhase>>,
    requests: mpsc::UnboundedSender<FlightPhase>,
}

impl CommanderHandle {
    pub fn transition_to(&self, next: FlightPhase) -> Result<(), CommanderError> {
        if !self.known.contains(&next) {
            return Err(CommanderError::UnknownPhase { phase: next });
        }
        self.requests.send(next).map_err(|_| CommanderError::Shutdown)
    }

    /// A handle not attached to any commander, exposing the request queue.
    #[cfg(test)]
    pub(crate) fn detached(
        known: &[FlightPhase],
    ) -> (Self, mpsc::UnboundedReceiver<FlightPhase>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { known: Arc::new(known.iter().copied().collect()), requests: tx }, rx)
    }
}

/// Owner of the flight phase and its controllers.
///
/// Every registered controller is built once at startup. The active
/// controller is looked up from `phase`, so there is no second field that
/// could disagree with it.
pub struct Commander {
    phase: FlightPhase,
    controllers: BTreeMap<FlightPhase, Box<dyn Controller>>,
    sink: Arc<dyn SetpointSink>,
    requests: mpsc::UnboundedReceiver<FlightPhase>,
    transitions: u64,
    status: watch::Sender<PhaseStatus>,
}

impl Commander {
    /// Upper bound on transitions applied in response to a single callback.
    const MAX_CHAINED_TRANSITIONS: usize = 8;

    /// Validates `registry`, builds all controllers and enters
    /// `config.initial_phase`.
    pub fn new(
        registry: &PhaseRegistry,
        config: &LanderConfig,
        sink: Arc<dyn SetpointSink>,
    ) -> Result<Self, CommanderError> {
        registry.validate(config.initial_phase, &config.required_phases)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = CommanderHandle { known: Arc::new(registry.phases()), requests: tx };
        let controllers = registry.instantiate(config, &handle)?;
        let initial = config.initial_phase;
        let (status, _) = watch::channel(PhaseStatus { phase: initial, transitions: 0 });
        let mut commander = Self {
            phase: initial,
            controllers,
            sink,
            requests: rx,
            transitions: 0,
            status,
        };
        commander.active_mut()?.on_enter();
        phase!("Starting in {initial}.");
        commander.drain_requests();
        Ok(commander)
    }

    pub fn phase(&self) -> FlightPhase { self.phase }

    pub fn transitions(&self) -> u64 { self.transitions }

    pub fn subscribe(&self) -> watch::Receiver<PhaseStatus> { self.status.subscribe() }

    /// Switches to `next` and enters its controller.
    ///
    /// Transition-to-self succeeds without re-entering. An unregistered
    /// phase leaves phase and controller untouched.
    pub fn transition_to(&mut self, next: FlightPhase) -> Result<Transition, CommanderError> {
        let transition = self.switch(next)?;
        self.drain_requests();
        Ok(transition)
    }

    /// Delivers one control period to the active controller.
    pub fn tick(&mut self) -> Result<TickReport, CommanderError> {
        let phase = self.phase;
        let controller = self
            .controllers
            .get_mut(&phase)
            .ok_or(CommanderError::NoActiveController { phase })?;
        let served_by = controller.phase();
        let setpoint = match controller.on_tick(self.sink.as_ref()) {
            Ok(sp) => Some(sp),
            Err(e) => {
                error!("{phase} controller failed to produce a setpoint: {e}");
                None
            }
        };
        self.drain_requests();
        Ok(TickReport { phase, served_by, setpoint })
    }

    /// Delivers a tracking event to whichever controller is active now.
    pub fn dispatch(&mut self, tracking_event: &TrackingEvent) -> Result<(), CommanderError> {
        let phase = self.phase;
        event!(
            "Tracking {} delivered to {phase} after {}ms.",
            if tracking_event.is_tracking() { "acquired" } else { "lost" },
            (Utc::now() - tracking_event.received()).num_milliseconds()
        );
        if let Err(e) = self.active_mut()?.on_tracking_event(tracking_event) {
            error!("{phase} controller failed to handle tracking event: {e}");
        }
        self.drain_requests();
        Ok(())
    }

    fn active_mut(&mut self) -> Result<&mut Box<dyn Controller>, CommanderError> {
        let phase = self.phase;
        self.controllers.get_mut(&phase).ok_or(CommanderError::NoActiveController { phase })
    }

    fn switch(&mut self, next: FlightPhase) -> Result<Transition, CommanderError> {
        if !self.controllers.contains_key(&next) {
            return Err(CommanderError::UnknownPhase { phase: next });
        }
        if next == self.phase {
            return Ok(Transition::Unchanged { phase: next });
        }
        let from = self.phase;
        self.phase = next;
        self.transitions += 1;
        self.active_mut()?.on_enter();
        phase!("{from} -> {next} (transition {}).", self.transitions);
        self.status.send_replace(PhaseStatus { phase: next, transitions: self.transitions });
        Ok(Transition::Switched { from, to: next })
    }

    fn drain_requests(&mut self) {
        let mut applied = 0;
        while let Ok(next) = self.requests.try_recv() {
            if applied >= Self::MAX_CHAINED_TRANSITIONS {
                error!(
                    "Dropping request for {next}: more than {} chained transitions.",
                    Self::MAX_CHAINED_TRANSITIONS
                );
                continue;
            }
            match self.switch(next) {
                Ok(Transition::Switched { .. }) => applied += 1,
                Ok(Transition::Unchanged { .. }) => {}
                Err(e) => warn!("Ignoring transition request: {e}"),
            }
        }
    }
}
