#![allow(clippy::similar_names)]
#![warn(clippy::builtin_type_shadow)]
mod config;
mod console;
mod flight_control;
mod logger;
mod phase_control;

use crate::config::LanderConfig;
use crate::console::OperatorConsole;
use crate::flight_control::{UdpSetpointSink, UdpTrackingSource};
use crate::phase_control::{
    Commander, ControlLoop, EventDispatcher, PhaseRegistry, SharedCommander, TrackingListener,
    tracking_queue,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = LanderConfig::from_env()
        .unwrap_or_else(|e| fatal!("Invalid lander configuration: {e}"));
    info!(
        "Target {} | seek {}m | handoff {}m | {:.1} Hz | tracker {} | autopilot {}",
        config.target_local_position,
        config.target_seek_altitude,
        config.land_handoff_altitude,
        config.control_rate_hz,
        config.tracker_addr,
        config.autopilot_addr
    );

    let sink = Arc::new(
        UdpSetpointSink::bind(config.autopilot_addr)
            .await
            .unwrap_or_else(|e| fatal!("Could not open autopilot link: {e}")),
    );
    let source = UdpTrackingSource::bind(config.tracker_addr)
        .await
        .unwrap_or_else(|e| fatal!("Could not listen for tracker on {}: {e}", config.tracker_addr));
    match source.local_addr() {
        Ok(addr) => info!("Listening for tracker messages on {addr}."),
        Err(e) => warn!("Tracker socket has no local address: {e}"),
    }

    let commander = Commander::new(&PhaseRegistry::standard(), &config, sink.clone())
        .unwrap_or_else(|e| fatal!("Could not start the phase commander: {e}"));
    let status_rx = commander.subscribe();
    let commander: SharedCommander = Arc::new(Mutex::new(commander));

    let c_tok = CancellationToken::new();
    let (tracking_tx, tracking_rx) = tracking_queue();
    let (control_loop, health_rx) = ControlLoop::new(Arc::clone(&commander), config.control_period());

    let listener_handle = tokio::spawn(TrackingListener::new(source, tracking_tx).run(c_tok.clone()));
    let dispatcher_handle =
        tokio::spawn(EventDispatcher::new(Arc::clone(&commander), tracking_rx).run(c_tok.clone()));
    let loop_handle = tokio::spawn(control_loop.run(c_tok.clone()));

    let console = OperatorConsole::new(Arc::clone(&commander), status_rx, health_rx);
    let console_tok = c_tok.clone();
    tokio::spawn(async move {
        console.run(tokio::io::BufReader::new(tokio::io::stdin()), console_tok).await;
    });

    let signal_tok = c_tok.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = signal_tok.cancelled() => {}
            res = tokio::signal::ctrl_c() => match res {
                Ok(()) => {
                    warn!("Interrupted. Shutting down after the current period.");
                    signal_tok.cancel();
                }
                Err(e) => error!("Could not listen for ctrl-c: {e}"),
            },
        }
    });

    let summary = loop_handle.await.unwrap_or_else(|e| fatal!("Control loop panicked: {e}"));
    let listened = listener_handle.await.unwrap_or_default();
    let dispatched = dispatcher_handle.await.unwrap_or_default();
    let (final_phase, transitions) = {
        let commander = commander.lock().await;
        (commander.phase(), commander.transitions())
    };
    info!(
        "Shut down in {final_phase} after {transitions} transitions. {} setpoints sent, {} dropped, {} stalled periods.",
        sink.sent(),
        sink.dropped(),
        summary.stalls
    );
    info!(
        "Tracking: {} received, {} undecodable, {} overflowed, {} link errors, {} delivered, {} invalid.",
        listened.delivered,
        listened.rejected,
        listened.overflowed,
        listened.link_errors,
        dispatched.delivered,
        dispatched.rejected
    );
    // the blocking stdin read of the console would otherwise hold the runtime open
    std::process::exit(0);
}
