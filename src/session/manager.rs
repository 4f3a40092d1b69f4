use crate::app_config::OrchestratorConfig;
use crate::device::descriptor::{CameraType, DeviceDescriptor};
use crate::device::link::{DeviceLink, DeviceTransport, LinkCommand, LinkResponse, StreamSink};
use crate::errors::CamError;
use crate::session::settings::{TimelapseMode, TimelapseParam};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

pub(crate) struct SessionInner {
    pub(crate) state: ConnectionState,
    pub(crate) link: Box<dyn DeviceLink>,
    pub(crate) last_clock_sync: Option<i64>,
    /// Options pushed to the device via SetTimelapseOption, per mode.
    pub(crate) configured_timelapse: HashMap<TimelapseMode, TimelapseParam>,
    pub(crate) active_timelapse: HashSet<TimelapseMode>,
}

impl SessionInner {
    pub(crate) fn require_open(&self) -> Result<(), CamError> {
        if self.state == ConnectionState::Open {
            Ok(())
        } else {
            Err(CamError::InvalidState(format!(
                "Operation requires an open session, but state is {:?}.",
                self.state
            )))
        }
    }

    /// Run one link round trip with a bounded wait. A connection-level
    /// failure demotes the session to Closed; the link is gone.
    pub(crate) async fn execute_bounded(
        &mut self,
        command: LinkCommand,
        bound: Duration,
    ) -> Result<LinkResponse, CamError> {
        match tokio::time::timeout(bound, self.link.execute(command)).await {
            Err(_) => Err(CamError::Timeout(format!(
                "Device round trip exceeded the {:?} bound.",
                bound
            ))),
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                if e.is_fatal() {
                    warn!("💔 Device link failed fatally; session is now closed: {}", e);
                    self.state = ConnectionState::Closed;
                }
                Err(e)
            }
        }
    }
}

/// Exclusive owner of one connected device link. Passed explicitly to every
/// orchestration call; command access is serialized through the inner mutex
/// because the link permits a single in-flight command.
pub struct Session {
    descriptor: DeviceDescriptor,
    pub(crate) inner: Mutex<SessionInner>,
    open_guard: Arc<AtomicBool>,
    guard_released: AtomicBool,
}

impl Session {
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn camera_type(&self) -> CameraType {
        self.descriptor.camera_type
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    pub async fn last_clock_sync(&self) -> Option<i64> {
        self.inner.lock().await.last_clock_sync
    }

    /// Releases the single-session slot at most once. A stale session that
    /// is closed or dropped again after a newer session re-acquired the
    /// slot must not free it out from under that session.
    pub(crate) fn release_guard(&self) {
        if !self.guard_released.swap(true, Ordering::AcqRel) {
            self.open_guard.store(false, Ordering::Release);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // A dropped session frees the single-session slot even without an
        // explicit close.
        self.release_guard();
    }
}

pub struct SessionManager {
    transport: Box<dyn DeviceTransport>,
    config: OrchestratorConfig,
    session_open: Arc<AtomicBool>,
}

impl SessionManager {
    pub fn new(transport: Box<dyn DeviceTransport>, config: OrchestratorConfig) -> Self {
        SessionManager {
            transport,
            config,
            session_open: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn discover(&self) -> Result<Vec<DeviceDescriptor>, CamError> {
        debug!("🔍 Discovering available devices...");
        let start_time = Instant::now();
        let devices = self.transport.discover().await?;
        for descriptor in &devices {
            info!("  {}", descriptor);
        }
        info!(
            "✅ Discovery found {} device(s) in {:?}.",
            devices.len(),
            start_time.elapsed()
        );
        Ok(devices)
    }

    /// Open the one allowed session. Fails with `Connection` when the link
    /// cannot be established and `Conflict` when a session is already open.
    pub async fn open(&self, descriptor: &DeviceDescriptor) -> Result<Session, CamError> {
        if self
            .session_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CamError::Conflict(
                "A device session is already open in this process.".to_string(),
            ));
        }

        debug!(
            "🔌 Opening session for '{}' (state: {:?} -> {:?})...",
            descriptor.serial_number,
            ConnectionState::Disconnected,
            ConnectionState::Connecting
        );
        let start_time = Instant::now();
        let connect_result = tokio::time::timeout(
            self.config.command_timeout(),
            self.transport.connect(descriptor),
        )
        .await
        .unwrap_or_else(|_| {
            Err(CamError::Connection(format!(
                "Connecting to '{}' exceeded the {:?} bound.",
                descriptor.serial_number,
                self.config.command_timeout()
            )))
        });
        let link = match connect_result {
            Ok(link) => link,
            Err(e) => {
                self.session_open.store(false, Ordering::Release);
                return Err(CamError::Connection(format!(
                    "Failed to open camera '{}': {}",
                    descriptor.serial_number, e
                )));
            }
        };

        info!(
            "✅ Succeeded to open camera '{}' in {:?}. http base url: {}",
            descriptor.serial_number,
            start_time.elapsed(),
            link.http_base_url()
        );

        Ok(Session {
            descriptor: descriptor.clone(),
            inner: Mutex::new(SessionInner {
                state: ConnectionState::Open,
                link,
                last_clock_sync: None,
                configured_timelapse: HashMap::new(),
                active_timelapse: HashSet::new(),
            }),
            open_guard: Arc::clone(&self.session_open),
            guard_released: AtomicBool::new(false),
        })
    }

    /// Idempotent: closing an already-closed session is a no-op.
    pub async fn close(&self, session: &Session) {
        let mut inner = session.inner.lock().await;
        match inner.state {
            ConnectionState::Open | ConnectionState::Connecting => {
                debug!(
                    "🔌 Closing session for '{}'.",
                    session.descriptor.serial_number
                );
                inner.link.disconnect().await;
                inner.state = ConnectionState::Closed;
                info!("✅ Session for '{}' closed.", session.descriptor.serial_number);
            }
            ConnectionState::Closed | ConnectionState::Disconnected => {
                debug!(
                    "Session for '{}' already closed; nothing to do.",
                    session.descriptor.serial_number
                );
            }
        }
        session.release_guard();
    }

    pub async fn is_connected(&self, session: &Session) -> bool {
        session.inner.lock().await.state == ConnectionState::Open
    }

    /// Sync the camera clock to the current wall clock, typically right
    /// after open.
    pub async fn sync_clock_now(&self, session: &Session) -> bool {
        self.sync_clock(session, crate::common::timestamp_utils::current_epoch_secs())
            .await
    }

    /// Best-effort clock sync; the one command with a sanctioned automatic
    /// retry. Failure is logged and never invalidates the session.
    pub async fn sync_clock(&self, session: &Session, epoch_secs: i64) -> bool {
        let mut inner = session.inner.lock().await;
        if inner.require_open().is_err() {
            warn!("⏲️ Skipping clock sync: session is not open.");
            return false;
        }

        let attempts = 1 + self.config.clock_sync_retries;
        for attempt in 1..=attempts {
            match inner
                .execute_bounded(
                    LinkCommand::SyncClock { epoch_secs },
                    self.config.command_timeout(),
                )
                .await
            {
                Ok(LinkResponse::Ack) => {
                    inner.last_clock_sync = Some(epoch_secs);
                    info!("⏲️ Camera clock synced to epoch {}.", epoch_secs);
                    return true;
                }
                Ok(other) => {
                    warn!(
                        "⏲️ Clock sync attempt {}/{} got unexpected response {:?}.",
                        attempt, attempts, other
                    );
                }
                Err(e) => {
                    warn!("⏲️ Clock sync attempt {}/{} failed: {}", attempt, attempts, e);
                    if e.is_fatal() {
                        break;
                    }
                }
            }
        }
        warn!("⏲️ Clock sync gave up after {} attempt(s); session remains valid.", attempts);
        false
    }

    /// Inject the telemetry sink capability. The push channel it feeds is
    /// independent of command dispatch.
    pub async fn register_stream_sink(
        &self,
        session: &Session,
        sink: Arc<dyn StreamSink>,
    ) -> Result<(), CamError> {
        let mut inner = session.inner.lock().await;
        inner.require_open()?;
        inner.link.register_stream_sink(sink);
        debug!(
            "📡 Stream sink registered for '{}'.",
            session.descriptor.serial_number
        );
        Ok(())
    }
}
