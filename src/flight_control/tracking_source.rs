use super::tracking::{TrackingError, TrackingMessage};
use crate::error;
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Producer of raw tracker output.
#[async_trait]
pub trait TrackingSource: Send {
    /// Waits for the next message.
    ///
    /// # Returns
    /// - `Some(Ok(msg))` for a decoded message.
    /// - `Some(Err(_))` for a message that could not be decoded or received.
    /// - `None` once the source is closed for good.
    async fn next_message(&mut self) -> Option<Result<TrackingMessage, TrackingError>>;
}

/// Receives bincode encoded [`TrackingMessage`]s, one per datagram.
pub struct UdpTrackingSource {
    socket: UdpSocket,
    buf: Vec<u8>,
    backoff: RecvBackoff,
}

/// Retry policy for a failing socket: a growing delay between attempts, and
/// after `MAX_FAILURES` consecutive failures the source closes.
#[derive(Debug, Default)]
pub(super) struct RecvBackoff {
    failures: u32,
}

impl RecvBackoff {
    const BASE_DELAY: Duration = Duration::from_millis(50);
    pub(super) const MAX_FAILURES: u32 = 5;

    /// # Returns
    /// The delay before the next attempt, `None` once the budget is spent.
    pub(super) fn on_failure(&mut self) -> Option<Duration> {
        self.failures += 1;
        (self.failures < Self::MAX_FAILURES)
            .then(|| Self::BASE_DELAY * 2_u32.pow(self.failures - 1))
    }

    pub(super) fn on_success(&mut self) { self.failures = 0; }
}

impl UdpTrackingSource {
    const MAX_DATAGRAM: usize = 512;

    pub async fn bind(addr: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket, buf: vec![0; Self::MAX_DATAGRAM], backoff: RecvBackoff::default() })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> { self.socket.local_addr() }

    fn decode(bytes: &[u8]) -> Result<TrackingMessage, TrackingError> {
        let (msg, used) = bincode::serde::decode_from_slice::<TrackingMessage, _>(
            bytes,
            bincode::config::standard(),
        )
        .map_err(|e| TrackingError::Decode { reason: e.to_string() })?;
        if used == bytes.len() {
            Ok(msg)
        } else {
            Err(TrackingError::Decode {
                reason: format!("{} trailing bytes", bytes.len() - used),
            })
        }
    }
}

#[async_trait]
impl TrackingSource for UdpTrackingSource {
    async fn next_message(&mut self) -> Option<Result<TrackingMessage, TrackingError>> {
        let received = self.socket.recv_from(&mut self.buf).await;
        match received {
            Ok((len, _)) => {
                self.backoff.on_success();
                Some(Self::decode(&self.buf[..len]))
            }
            Err(e) => {
                let Some(delay) = self.backoff.on_failure() else {
                    error!(
                        "Tracking link failed {} times in a row, closing: {e}",
                        RecvBackoff::MAX_FAILURES
                    );
                    return None;
                };
                tokio::time::sleep(delay).await;
                Some(Err(TrackingError::Io { reason: e.to_string() }))
            }
        }
    }
}
