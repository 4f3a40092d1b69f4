mod support;

use panocam::app_config::OrchestratorConfig;
use panocam::device::link::GyroSample;
use panocam::errors::CamError;
use panocam::session::manager::{ConnectionState, SessionManager};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use support::{CountingSink, FakeDeviceState, FakeTransport};

fn manager_with(transport: FakeTransport) -> (SessionManager, Arc<FakeDeviceState>) {
    let state = Arc::clone(&transport.state);
    let manager = SessionManager::new(Box::new(transport), OrchestratorConfig::default());
    (manager, state)
}

#[tokio::test]
async fn discovery_reports_the_available_device() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let devices = manager.discover().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].serial_number, "SN1");
}

#[tokio::test]
async fn open_transitions_to_open_and_close_is_idempotent() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);

    let session = manager.open(&descriptor).await.unwrap();
    assert_eq!(session.state().await, ConnectionState::Open);
    assert!(manager.is_connected(&session).await);

    manager.close(&session).await;
    assert_eq!(session.state().await, ConnectionState::Closed);
    assert!(!manager.is_connected(&session).await);

    // Repeated closes never raise.
    manager.close(&session).await;
    manager.close(&session).await;
    assert_eq!(session.state().await, ConnectionState::Closed);
}

#[tokio::test]
async fn only_one_session_may_be_open_at_a_time() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);

    let session = manager.open(&descriptor).await.unwrap();
    let second = manager.open(&descriptor).await;
    assert!(matches!(second, Err(CamError::Conflict(_))));

    manager.close(&session).await;
    let reopened = manager.open(&descriptor).await.unwrap();
    assert_eq!(reopened.state().await, ConnectionState::Open);
}

#[tokio::test]
async fn a_stale_session_never_frees_a_newer_sessions_slot() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);

    let first = manager.open(&descriptor).await.unwrap();
    manager.close(&first).await;
    let second = manager.open(&descriptor).await.unwrap();

    // Closing or dropping the already-closed first session again is a
    // no-op and must leave the second session's slot alone.
    manager.close(&first).await;
    drop(first);

    let third = manager.open(&descriptor).await;
    assert!(matches!(third, Err(CamError::Conflict(_))));
    assert_eq!(second.state().await, ConnectionState::Open);

    // The slot frees normally once the live session closes.
    manager.close(&second).await;
    assert!(manager.open(&descriptor).await.is_ok());
}

#[tokio::test]
async fn dropping_a_session_frees_the_single_session_slot() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);

    let session = manager.open(&descriptor).await.unwrap();
    drop(session);
    let reopened = manager.open(&descriptor).await;
    assert!(reopened.is_ok());
}

#[tokio::test]
async fn unreachable_device_yields_a_connection_error() {
    let (manager, state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);

    state.refuse_connect.store(true, Ordering::SeqCst);
    let result = manager.open(&descriptor).await;
    assert!(matches!(result, Err(CamError::Connection(_))));

    // The failed open must not leak the single-session slot.
    state.refuse_connect.store(false, Ordering::SeqCst);
    assert!(manager.open(&descriptor).await.is_ok());
}

#[tokio::test]
async fn clock_sync_records_the_synced_epoch() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();

    assert!(manager.sync_clock(&session, 1_700_000_000).await);
    assert_eq!(session.last_clock_sync().await, Some(1_700_000_000));
}

#[tokio::test]
async fn clock_sync_now_uses_the_current_wall_clock() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();

    assert!(manager.sync_clock_now(&session).await);
    let synced = session.last_clock_sync().await.unwrap();
    assert!(synced > 1_700_000_000);
}

#[tokio::test]
async fn clock_sync_failure_never_invalidates_the_session() {
    let (manager, state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();

    state.reject_clock_sync.store(true, Ordering::SeqCst);
    assert!(!manager.sync_clock(&session, 1_700_000_000).await);
    assert_eq!(session.last_clock_sync().await, None);
    // Best-effort side channel: the session stays usable.
    assert!(manager.is_connected(&session).await);
}

#[tokio::test]
async fn clock_sync_retries_the_configured_number_of_times() {
    let transport = FakeTransport::single("SN1");
    let state = Arc::clone(&transport.state);
    let config = OrchestratorConfig {
        clock_sync_retries: 2,
        ..OrchestratorConfig::default()
    };
    let manager = SessionManager::new(Box::new(transport), config);
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();

    state.reject_clock_sync.store(true, Ordering::SeqCst);
    let before = state.executes();
    assert!(!manager.sync_clock(&session, 42).await);
    assert_eq!(state.executes() - before, 3); // initial attempt + 2 retries
}

#[tokio::test]
async fn registered_sink_receives_pushed_telemetry() {
    let (manager, state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();

    let sink = Arc::new(CountingSink::default());
    let sink_capability: Arc<dyn panocam::device::link::StreamSink> = sink.clone();
    manager
        .register_stream_sink(&session, sink_capability)
        .await
        .unwrap();

    state.emit_gyro(&[GyroSample {
        timestamp: 1,
        gx: 0.0,
        gy: 0.1,
        gz: 0.2,
        ax: 0.0,
        ay: 0.0,
        az: 9.8,
    }]);
    assert_eq!(sink.gyro.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sink_registration_requires_an_open_session() {
    let (manager, _state) = manager_with(FakeTransport::single("SN1"));
    let descriptor = manager.discover().await.unwrap().remove(0);
    let session = manager.open(&descriptor).await.unwrap();
    manager.close(&session).await;

    let sink: Arc<dyn panocam::device::link::StreamSink> = Arc::new(CountingSink::default());
    let result = manager.register_stream_sink(&session, sink).await;
    assert!(matches!(result, Err(CamError::InvalidState(_))));
}
