//! The flight-phase state machine: controllers per phase, the registry they
//! are built from, the commander owning the active one, and the two tasks
//! feeding it, the fixed-rate control loop and the tracking event dispatcher.

mod commander;
mod control_loop;
mod controller;
mod controllers;
mod event_dispatcher;
mod registry;
mod signal;

pub use commander::{Commander, SharedCommander};
pub use control_loop::ControlLoop;
pub use event_dispatcher::{EventDispatcher, TrackingListener, tracking_queue};
pub use registry::PhaseRegistry;
pub use signal::{LoopHealth, PhaseStatus, Transition};
