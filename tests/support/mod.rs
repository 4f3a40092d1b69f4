// Shared in-memory capabilities for integration tests: a scripted device
// transport/link and a counting stitch engine.
#![allow(dead_code)]

use async_trait::async_trait;
use panocam::device::descriptor::{CameraType, DeviceDescriptor, LensType};
use panocam::device::link::{
    DeviceLink, DeviceTransport, ExposureEvent, GyroSample, LinkCommand, LinkResponse, StreamSink,
};
use panocam::device::media_url::MediaUrl;
use panocam::errors::CamError;
use panocam::session::settings::{
    BatteryStatus, CaptureSettings, CaptureStatus, CardState, ExposureSettings, FunctionMode,
    PowerType, StorageStatus,
};
use panocam::stitch::config::StitchJobConfig;
use panocam::stitch::runner::{EngineError, ProgressFn, StitchEngine};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backing state for one fake camera, shared between the transport and the
/// links it hands out so tests can script and inspect behavior.
pub struct FakeDeviceState {
    pub files: Mutex<Vec<String>>,
    pub photo_counter: AtomicUsize,
    pub execute_count: AtomicUsize,
    pub exposure: Mutex<HashMap<FunctionMode, ExposureSettings>>,
    pub capture: Mutex<HashMap<FunctionMode, CaptureSettings>>,
    pub capturing: AtomicBool,
    pub execute_delay: Mutex<Duration>,
    pub connection_down: AtomicBool,
    pub refuse_connect: AtomicBool,
    pub reject_clock_sync: AtomicBool,
    pub sink: Mutex<Option<Arc<dyn StreamSink>>>,
}

impl FakeDeviceState {
    fn new() -> Arc<Self> {
        Arc::new(FakeDeviceState {
            files: Mutex::new(Vec::new()),
            photo_counter: AtomicUsize::new(0),
            execute_count: AtomicUsize::new(0),
            exposure: Mutex::new(HashMap::new()),
            capture: Mutex::new(HashMap::new()),
            capturing: AtomicBool::new(false),
            execute_delay: Mutex::new(Duration::ZERO),
            connection_down: AtomicBool::new(false),
            refuse_connect: AtomicBool::new(false),
            reject_clock_sync: AtomicBool::new(false),
            sink: Mutex::new(None),
        })
    }

    pub fn executes(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    pub fn set_execute_delay(&self, delay: Duration) {
        *self.execute_delay.lock().unwrap() = delay;
    }

    pub fn drop_connection(&self) {
        self.connection_down.store(true, Ordering::SeqCst);
    }

    /// Push telemetry through whatever sink is registered.
    pub fn emit_gyro(&self, samples: &[GyroSample]) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.on_gyro_data(samples);
        }
    }

    pub fn emit_exposure(&self, event: ExposureEvent) {
        if let Some(sink) = self.sink.lock().unwrap().as_ref() {
            sink.on_exposure_data(event);
        }
    }
}

pub struct FakeLink {
    state: Arc<FakeDeviceState>,
}

#[async_trait]
impl DeviceLink for FakeLink {
    async fn execute(&mut self, command: LinkCommand) -> Result<LinkResponse, CamError> {
        self.state.execute_count.fetch_add(1, Ordering::SeqCst);
        let delay = *self.state.execute_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.state.connection_down.load(Ordering::SeqCst) {
            return Err(CamError::Connection("link dropped".to_string()));
        }

        let response = match command {
            LinkCommand::TakePhoto => {
                let n = self.state.photo_counter.fetch_add(1, Ordering::SeqCst) + 1;
                let url = format!("http://cam/DCIM/IMG_{:04}.insp", n);
                self.state.files.lock().unwrap().push(url.clone());
                LinkResponse::Media(MediaUrl::new(vec![url]))
            }
            LinkCommand::ListFiles => {
                LinkResponse::Files(self.state.files.lock().unwrap().clone())
            }
            LinkCommand::DeleteFile { remote_path } => {
                let mut files = self.state.files.lock().unwrap();
                match files.iter().position(|f| f == &remote_path) {
                    Some(idx) => {
                        files.remove(idx);
                        LinkResponse::Ack
                    }
                    None => LinkResponse::Rejected,
                }
            }
            LinkCommand::DownloadFile { remote_path, .. } => {
                if remote_path.contains("corrupt") {
                    return Err(CamError::Transfer("stream interrupted".to_string()));
                }
                LinkResponse::Ack
            }
            LinkCommand::GetExposureSettings { mode } => {
                let stored = self.state.exposure.lock().unwrap().get(&mode).copied();
                LinkResponse::Exposure(
                    stored.unwrap_or_else(|| ExposureSettings::new(
                        panocam::session::settings::ExposureMode::Auto,
                    )),
                )
            }
            LinkCommand::SetExposureSettings { mode, settings } => {
                self.state.exposure.lock().unwrap().insert(mode, settings);
                LinkResponse::Ack
            }
            LinkCommand::GetCaptureSettings { mode } => {
                let stored = self.state.capture.lock().unwrap().get(&mode).cloned();
                LinkResponse::Capture(stored.unwrap_or_default())
            }
            LinkCommand::SetCaptureSettings { mode, settings } => {
                self.state.capture.lock().unwrap().insert(mode, settings);
                LinkResponse::Ack
            }
            LinkCommand::GetCaptureStatus => {
                if self.state.capturing.load(Ordering::SeqCst) {
                    LinkResponse::Status(CaptureStatus::Capturing)
                } else {
                    LinkResponse::Status(CaptureStatus::NotCapturing)
                }
            }
            LinkCommand::SetTimelapseOption { .. } => LinkResponse::Ack,
            LinkCommand::StartTimelapse { .. } => {
                self.state.capturing.store(true, Ordering::SeqCst);
                LinkResponse::Ack
            }
            LinkCommand::StopTimelapse { .. } => {
                self.state.capturing.store(false, Ordering::SeqCst);
                let url = "http://cam/DCIM/VID_0001_tl.insp".to_string();
                self.state.files.lock().unwrap().push(url.clone());
                LinkResponse::Media(MediaUrl::new(vec![url]))
            }
            LinkCommand::GetBatteryStatus => LinkResponse::Battery(BatteryStatus {
                power_type: PowerType::Battery,
                battery_level: 85,
                battery_scale: 100,
            }),
            LinkCommand::GetStorageState => LinkResponse::Storage(StorageStatus {
                free_space: 28_000_000_000,
                total_space: 32_000_000_000,
                state: CardState::Normal,
            }),
            LinkCommand::SyncClock { .. } => {
                if self.state.reject_clock_sync.load(Ordering::SeqCst) {
                    LinkResponse::Rejected
                } else {
                    LinkResponse::Ack
                }
            }
        };
        Ok(response)
    }

    async fn disconnect(&mut self) {
        self.state.connection_down.store(true, Ordering::SeqCst);
    }

    fn register_stream_sink(&mut self, sink: Arc<dyn StreamSink>) {
        *self.state.sink.lock().unwrap() = Some(sink);
    }

    fn http_base_url(&self) -> String {
        "http://cam".to_string()
    }
}

pub struct FakeTransport {
    pub descriptor: DeviceDescriptor,
    pub state: Arc<FakeDeviceState>,
}

impl FakeTransport {
    pub fn single(serial: &str) -> Self {
        FakeTransport::with_camera(serial, CameraType::X3)
    }

    pub fn with_camera(serial: &str, camera_type: CameraType) -> Self {
        FakeTransport {
            descriptor: DeviceDescriptor {
                serial_number: serial.to_string(),
                camera_type,
                lens_type: LensType::PanoDefault,
            },
            state: FakeDeviceState::new(),
        }
    }
}

#[async_trait]
impl DeviceTransport for FakeTransport {
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>, CamError> {
        Ok(vec![self.descriptor.clone()])
    }

    async fn connect(&self, _descriptor: &DeviceDescriptor) -> Result<Box<dyn DeviceLink>, CamError> {
        if self.state.refuse_connect.load(Ordering::SeqCst) {
            return Err(CamError::Connection("device unreachable".to_string()));
        }
        // A fresh connection revives a previously dropped link.
        self.state.connection_down.store(false, Ordering::SeqCst);
        Ok(Box::new(FakeLink {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Counts telemetry deliveries.
#[derive(Default)]
pub struct CountingSink {
    pub video: AtomicUsize,
    pub audio: AtomicUsize,
    pub gyro: AtomicUsize,
    pub exposure: AtomicUsize,
}

impl StreamSink for CountingSink {
    fn on_video_data(&self, _data: &[u8], _timestamp: i64, _stream_index: u8) {
        self.video.fetch_add(1, Ordering::SeqCst);
    }
    fn on_audio_data(&self, _data: &[u8], _timestamp: i64) {
        self.audio.fetch_add(1, Ordering::SeqCst);
    }
    fn on_gyro_data(&self, _samples: &[GyroSample]) {
        self.gyro.fetch_add(1, Ordering::SeqCst);
    }
    fn on_exposure_data(&self, _event: ExposureEvent) {
        self.exposure.fetch_add(1, Ordering::SeqCst);
    }
}

/// Engine that records invocations and can be scripted to fail or stall.
pub struct FakeEngine {
    pub runs: AtomicUsize,
    pub fail_with: Mutex<Option<EngineError>>,
    pub run_delay: Mutex<Duration>,
    pub last_progress: Mutex<Option<f32>>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeEngine {
            runs: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            run_delay: Mutex::new(Duration::ZERO),
            last_progress: Mutex::new(None),
        })
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StitchEngine for FakeEngine {
    async fn run(
        &self,
        _config: &StitchJobConfig,
        progress: &ProgressFn,
    ) -> Result<(), EngineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let delay = *self.run_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fail_with.lock().unwrap().clone() {
            return Err(err);
        }
        progress(0.5);
        progress(1.0);
        *self.last_progress.lock().unwrap() = Some(1.0);
        Ok(())
    }
}
