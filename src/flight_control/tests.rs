use super::setpoint::SetpointMessage;
use super::tracking_source::RecvBackoff;
use super::{
    FlightPhase, Setpoint, TrackingError, TrackingEvent, TrackingMessage, TrackingSource,
    UdpTrackingSource, Vec3,
};
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::net::UdpSocket;

#[test]
fn test_flight_phase_order_and_names() {
    let phases: Vec<FlightPhase> = FlightPhase::iter().collect();
    assert_eq!(
        phases,
        vec![FlightPhase::Seek, FlightPhase::Descend, FlightPhase::Land, FlightPhase::Abort]
    );
    assert!(phases.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(FlightPhase::Descend.to_string(), "DESCEND");
    assert_eq!(FlightPhase::from_str("abort"), Ok(FlightPhase::Abort));
    assert!(FlightPhase::from_str("hover").is_err());
    assert!(FlightPhase::Land.is_mission_terminal());
    assert!(!FlightPhase::Seek.is_mission_terminal());
}

#[test]
fn test_setpoint_wire_form() {
    let sp = Setpoint::new(Vec3::new(1.0, -2.0, 15.0), 0.0);
    assert_eq!(sp.as_tuple(), (1.0, -2.0, 15.0, 0.0));
    assert_eq!(SetpointMessage::from(sp), SetpointMessage { x: 1.0, y: -2.0, z: 15.0, yaw: 0.0 });
    assert!(!Setpoint::new(Vec3::new(f64::NAN, 0.0, 0.0), 0.0).is_finite());
}

#[test]
fn test_tracking_validation() {
    let ok = TrackingEvent::try_from(TrackingMessage::acquired(Some([4.0, 2.0, 0.0]))).unwrap();
    assert!(ok.is_tracking());
    assert_eq!(ok.position(), Some(Vec3::new(4.0, 2.0, 0.0)));

    let lost = TrackingEvent::try_from(TrackingMessage::lost()).unwrap();
    assert!(!lost.is_tracking());
    assert_eq!(lost.position(), None);

    let nan = TrackingEvent::try_from(TrackingMessage::acquired(Some([f64::NAN, 0.0, 0.0])));
    assert!(matches!(nan, Err(TrackingError::InvalidTrackingEvent { .. })));

    let ghost = TrackingMessage { tracking: false, position: Some([1.0, 1.0, 0.0]) };
    assert!(matches!(
        TrackingEvent::try_from(ghost),
        Err(TrackingError::InvalidTrackingEvent { .. })
    ));
}

#[tokio::test]
async fn test_udp_tracking_source_decodes_datagrams() {
    let mut source = UdpTrackingSource::bind(([127, 0, 0, 1], 0).into()).await.unwrap();
    let addr = source.local_addr().unwrap();
    let sender = UdpSocket::bind(("127.0.0.1", 0)).await.unwrap();

    let msg = TrackingMessage::acquired(Some([1.5, -0.5, 0.0]));
    let bytes = bincode::serde::encode_to_vec(msg, bincode::config::standard()).unwrap();
    sender.send_to(&bytes, addr).await.unwrap();
    assert_eq!(source.next_message().await, Some(Ok(msg)));

    sender.send_to(&[0xff, 0xff, 0xff], addr).await.unwrap();
    assert!(matches!(source.next_message().await, Some(Err(TrackingError::Decode { .. }))));
}

#[test]
fn test_recv_backoff_grows_then_gives_up() {
    let mut backoff = RecvBackoff::default();
    let delays: Vec<Option<Duration>> =
        (0..RecvBackoff::MAX_FAILURES).map(|_| backoff.on_failure()).collect();
    assert_eq!(
        delays,
        vec![
            Some(Duration::from_millis(50)),
            Some(Duration::from_millis(100)),
            Some(Duration::from_millis(200)),
            Some(Duration::from_millis(400)),
            None
        ]
    );

    backoff.on_success();
    assert_eq!(backoff.on_failure(), Some(Duration::from_millis(50)));
}
