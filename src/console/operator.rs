use crate::flight_control::FlightPhase;
use crate::phase_control::{LoopHealth, PhaseStatus, SharedCommander, Transition};
use crate::{error, info, log, phase, warn};
use std::ops::ControlFlow;
use std::str::FromStr;
use strum_macros::Display;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperatorCommand {
    /// Force the state machine into a phase.
    Enter(FlightPhase),
    Status,
    Quit,
}

#[derive(Debug, Display, PartialEq, Eq, Clone)]
pub enum ConsoleError {
    #[strum(to_string = "unknown command '{input}'")]
    UnknownCommand { input: String },
}

impl std::error::Error for ConsoleError {}

impl FromStr for OperatorCommand {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim();
        if word.eq_ignore_ascii_case("status") {
            Ok(Self::Status)
        } else if word.eq_ignore_ascii_case("quit") || word.eq_ignore_ascii_case("exit") {
            Ok(Self::Quit)
        } else {
            FlightPhase::from_str(word)
                .map(Self::Enter)
                .map_err(|_| ConsoleError::UnknownCommand { input: word.to_string() })
        }
    }
}

pub struct OperatorConsole {
    commander: SharedCommander,
    status: watch::Receiver<PhaseStatus>,
    health: watch::Receiver<LoopHealth>,
}

impl OperatorConsole {
    pub fn new(
        commander: SharedCommander,
        status: watch::Receiver<PhaseStatus>,
        health: watch::Receiver<LoopHealth>,
    ) -> Self {
        Self { commander, status, health }
    }

    /// Reads commands from `input` until `quit`, end of input or cancellation.
    /// `quit` cancels `c_tok` for the whole process.
    pub async fn run<R>(self, input: R, c_tok: CancellationToken)
    where R: AsyncBufRead + Unpin {
        let mut lines = input.lines();
        info!("Operator console ready (seek, descend, land, abort, status, quit).");
        loop {
            let line = tokio::select! {
                () = c_tok.cancelled() => break,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    log!("Operator input closed.");
                    break;
                }
                Err(e) => {
                    error!("Reading operator input failed: {e}");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<OperatorCommand>() {
                Ok(cmd) => {
                    if self.execute(cmd).await.is_break() {
                        c_tok.cancel();
                        break;
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
    }

    pub async fn execute(&self, command: OperatorCommand) -> ControlFlow<()> {
        match command {
            OperatorCommand::Enter(next) => {
                match self.commander.lock().await.transition_to(next) {
                    Ok(Transition::Switched { from, to }) => {
                        phase!("Operator forced {from} -> {to}.");
                    }
                    Ok(Transition::Unchanged { phase }) => log!("Already in {phase}."),
                    Err(e) => warn!("Operator transition refused: {e}"),
                }
                ControlFlow::Continue(())
            }
            OperatorCommand::Status => {
                info!("{}", self.status_line());
                ControlFlow::Continue(())
            }
            OperatorCommand::Quit => {
                info!("Operator requested shutdown.");
                ControlFlow::Break(())
            }
        }
    }

    pub fn status_line(&self) -> String {
        let status = *self.status.borrow();
        let health = *self.health.borrow();
        let terminal = if status.phase.is_mission_terminal() { ", mission ended" } else { "" };
        format!(
            "Phase {}{terminal} after {} transitions, heartbeat {health}.",
            status.phase, status.transitions
        )
    }
}
