use super::setpoint::{Setpoint, SetpointMessage};
use crate::{error, event};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::UdpSocket;

/// Anything that accepts setpoints for the autopilot.
///
/// Sending is fire-and-forget: implementations must not block and must not
/// report failures to the caller. A sink that stops receiving setpoints for
/// longer than the autopilot's offboard timeout triggers its failsafe, which
/// is the concern of the control loop, not of the sink.
pub trait SetpointSink: Send + Sync {
    fn send_setpoint(&self, setpoint: Setpoint);
}

/// Sends bincode encoded [`SetpointMessage`]s to the autopilot bridge.
pub struct UdpSetpointSink {
    socket: UdpSocket,
    target: SocketAddr,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl UdpSetpointSink {
    /// Binds an ephemeral local socket for sending to `target`.
    pub async fn bind(target: SocketAddr) -> std::io::Result<Self> {
        let local: SocketAddr =
            if target.is_ipv4() { ([0, 0, 0, 0], 0).into() } else { ([0u16; 8], 0).into() };
        let socket = UdpSocket::bind(local).await?;
        Ok(Self { socket, target, sent: AtomicU64::new(0), dropped: AtomicU64::new(0) })
    }

    pub fn sent(&self) -> u64 { self.sent.load(Ordering::Relaxed) }

    pub fn dropped(&self) -> u64 { self.dropped.load(Ordering::Relaxed) }
}

impl SetpointSink for UdpSetpointSink {
    fn send_setpoint(&self, setpoint: Setpoint) {
        let msg = SetpointMessage::from(setpoint);
        let bytes = match bincode::serde::encode_to_vec(msg, bincode::config::standard()) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Could not encode setpoint {setpoint}: {e}");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };
        match self.socket.try_send_to(&bytes, self.target) {
            Ok(_) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                event!("Setpoint {setpoint} sent to {}.", self.target);
            }
            Err(e) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                error!("Setpoint to {} dropped ({dropped} total): {e}", self.target);
            }
        }
    }
}
