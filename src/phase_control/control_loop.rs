use super::{
    commander::{CommanderError, SharedCommander},
    signal::LoopHealth,
};
use crate::{crit, error, fatal, info, log};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Tracks the setpoint heartbeat.
///
/// A period is stalled if it started later than `STALL_TOLERANCE` periods
/// after the previous one was delivered, or if delivering it took longer
/// than one period.
#[derive(Debug)]
pub struct HeartbeatMonitor {
    period: Duration,
    streak: u32,
    stalls: u64,
    health: LoopHealth,
}

impl HeartbeatMonitor {
    const STALL_TOLERANCE: f64 = 1.5;
    /// Consecutive stalls after which the operator is alarmed.
    pub const MAX_CONSECUTIVE_STALLS: u32 = 3;

    pub fn new(period: Duration) -> Self {
        Self { period, streak: 0, stalls: 0, health: LoopHealth::Nominal }
    }

    /// Records one delivered period.
    ///
    /// # Arguments
    /// * `gap` - Time since the previous period was delivered, `None` for the first.
    /// * `took` - Time spent delivering this period.
    ///
    /// # Returns
    /// The health after this period.
    pub fn record(&mut self, gap: Option<Duration>, took: Duration) -> LoopHealth {
        let late = gap.is_some_and(|g| g > self.period.mul_f64(Self::STALL_TOLERANCE));
        let slow = took > self.period;
        if late || slow {
            self.streak += 1;
            self.stalls += 1;
            crit!(
                "HeartbeatStall #{}: started {}ms after the last period and took {}ms (budget {}ms).",
                self.stalls,
                gap.unwrap_or_default().as_millis(),
                took.as_millis(),
                self.period.as_millis()
            );
            self.health = if self.streak >= Self::MAX_CONSECUTIVE_STALLS {
                if self.streak == Self::MAX_CONSECUTIVE_STALLS {
                    error!(
                        "{} consecutive heartbeat stalls, autopilot failsafe imminent!",
                        self.streak
                    );
                }
                LoopHealth::Degraded { streak: self.streak }
            } else {
                LoopHealth::Stalled { streak: self.streak }
            };
        } else {
            if self.streak > 0 {
                log!("Heartbeat recovered after {} stalled periods.", self.streak);
            }
            self.streak = 0;
            self.health = LoopHealth::Nominal;
        }
        self.health
    }

    pub fn stalls(&self) -> u64 { self.stalls }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct LoopSummary {
    pub ticks: u64,
    pub failed_ticks: u64,
    pub stalls: u64,
}

/// Drives the active controller at a fixed rate, independent of tracking
/// traffic.
pub struct ControlLoop {
    commander: SharedCommander,
    period: Duration,
    health: watch::Sender<LoopHealth>,
}

impl ControlLoop {
    pub fn new(commander: SharedCommander, period: Duration) -> (Self, watch::Receiver<LoopHealth>) {
        let (health, health_rx) = watch::channel(LoopHealth::Nominal);
        (Self { commander, period, health }, health_rx)
    }

    /// Runs until `c_tok` is cancelled.
    ///
    /// Cancellation is only observed between periods, so a period that has
    /// started is always delivered in full.
    pub async fn run(self, c_tok: CancellationToken) -> LoopSummary {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut monitor = HeartbeatMonitor::new(self.period);
        let mut summary = LoopSummary::default();
        let mut last_end: Option<Instant> = None;
        info!("Control loop running at {:.1} Hz.", 1.0 / self.period.as_secs_f64());

        loop {
            tokio::select! {
                biased;
                () = c_tok.cancelled() => break,
                _ = interval.tick() => {}
            }
            let start = Instant::now();
            let report = self.commander.lock().await.tick();
            match report {
                Ok(report) => {
                    if report.served_by != report.phase {
                        fatal!(
                            "{} tick served by the {} controller!",
                            report.phase,
                            report.served_by
                        );
                    }
                    summary.ticks += 1;
                    if report.setpoint.is_none() {
                        summary.failed_ticks += 1;
                    }
                }
                Err(CommanderError::NoActiveController { phase }) => {
                    fatal!("Control loop found no active controller in {phase}, heartbeat lost!")
                }
                Err(e) => error!("Tick failed: {e}"),
            }
            let end = Instant::now();
            let health = monitor.record(last_end.map(|last| start - last), end - start);
            self.health.send_if_modified(|current| {
                let changed = *current != health;
                *current = health;
                changed
            });
            last_end = Some(end);
        }
        summary.stalls = monitor.stalls();
        info!(
            "Control loop stopped after {} periods ({} failed, {} stalled).",
            summary.ticks, summary.failed_ticks, summary.stalls
        );
        summary
    }
}
