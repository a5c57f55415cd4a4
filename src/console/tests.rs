use super::operator::{ConsoleError, OperatorCommand, OperatorConsole};
use crate::config::LanderConfig;
use crate::flight_control::{FlightPhase, Setpoint, SetpointSink};
use crate::phase_control::{Commander, LoopHealth, PhaseRegistry, SharedCommander};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

struct NullSink;

impl SetpointSink for NullSink {
    fn send_setpoint(&self, _: Setpoint) {}
}

fn console() -> (OperatorConsole, SharedCommander, watch::Sender<LoopHealth>) {
    let commander =
        Commander::new(&PhaseRegistry::standard(), &LanderConfig::default(), Arc::new(NullSink))
            .unwrap();
    let status = commander.subscribe();
    let shared = Arc::new(Mutex::new(commander));
    let (health_tx, health_rx) = watch::channel(LoopHealth::Nominal);
    (OperatorConsole::new(Arc::clone(&shared), status, health_rx), shared, health_tx)
}

#[test]
fn test_parse_commands() {
    assert_eq!("abort".parse::<OperatorCommand>(), Ok(OperatorCommand::Enter(FlightPhase::Abort)));
    assert_eq!(
        " Descend \n".parse::<OperatorCommand>(),
        Ok(OperatorCommand::Enter(FlightPhase::Descend))
    );
    assert_eq!("STATUS".parse::<OperatorCommand>(), Ok(OperatorCommand::Status));
    assert_eq!("quit".parse::<OperatorCommand>(), Ok(OperatorCommand::Quit));
    assert_eq!(
        "hover".parse::<OperatorCommand>(),
        Err(ConsoleError::UnknownCommand { input: "hover".to_string() })
    );
}

#[tokio::test]
async fn test_console_forces_abort_and_quits() {
    let (console, shared, _health) = console();
    let c_tok = CancellationToken::new();
    let input: &[u8] = b"status\n\nfly\nabort\nabort\nquit\nseek\n";

    console.run(input, c_tok.clone()).await;

    assert!(c_tok.is_cancelled());
    let commander = shared.lock().await;
    assert_eq!(commander.phase(), FlightPhase::Abort);
    assert_eq!(commander.transitions(), 1);
}

#[tokio::test]
async fn test_end_of_input_does_not_shut_down() {
    let (console, shared, _health) = console();
    let c_tok = CancellationToken::new();

    console.run(&b"land\n"[..], c_tok.clone()).await;

    assert!(!c_tok.is_cancelled());
    assert_eq!(shared.lock().await.phase(), FlightPhase::Land);
}

#[tokio::test]
async fn test_status_line_reflects_phase_and_health() {
    let (console, _shared, health) = console();
    assert_eq!(console.status_line(), "Phase SEEK after 0 transitions, heartbeat nominal.");

    assert!(console.execute(OperatorCommand::Enter(FlightPhase::Abort)).await.is_continue());
    health.send_replace(LoopHealth::Degraded { streak: 3 });
    assert_eq!(
        console.status_line(),
        "Phase ABORT, mission ended after 1 transitions, heartbeat DEGRADED (3 stalls in a row)."
    );
}
