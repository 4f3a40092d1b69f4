use crate::device::descriptor::DeviceDescriptor;
use crate::device::media_url::MediaUrl;
use crate::errors::CamError;
use crate::session::settings::{
    BatteryStatus, CaptureSettings, CaptureStatus, ExposureSettings, FunctionMode, StorageStatus,
    TimelapseMode, TimelapseParam,
};
use async_trait::async_trait;
use std::sync::Arc;

// --- Telemetry payloads pushed on the stream channel ---

#[derive(Debug, Clone, Copy)]
pub struct GyroSample {
    pub timestamp: i64,
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ExposureEvent {
    pub timestamp: i64,
    pub exposure_time_secs: f64,
}

/// Telemetry sink capability, one method per event kind. Callbacks arrive on
/// the link's own push channel and must not be blocked by command dispatch;
/// a slow sink may drop or buffer at its own discretion, never by stalling
/// the link.
pub trait StreamSink: Send + Sync {
    fn on_video_data(&self, data: &[u8], timestamp: i64, stream_index: u8);
    fn on_audio_data(&self, data: &[u8], timestamp: i64);
    fn on_gyro_data(&self, samples: &[GyroSample]);
    fn on_exposure_data(&self, event: ExposureEvent);
}

// --- Request/response command surface ---

#[derive(Debug, Clone, PartialEq)]
pub enum LinkCommand {
    TakePhoto,
    ListFiles,
    DeleteFile { remote_path: String },
    DownloadFile { remote_path: String, local_path: String },
    GetExposureSettings { mode: FunctionMode },
    SetExposureSettings { mode: FunctionMode, settings: ExposureSettings },
    GetCaptureSettings { mode: FunctionMode },
    SetCaptureSettings { mode: FunctionMode, settings: CaptureSettings },
    GetCaptureStatus,
    SetTimelapseOption { param: TimelapseParam },
    StartTimelapse { mode: TimelapseMode },
    StopTimelapse { mode: TimelapseMode },
    GetBatteryStatus,
    GetStorageState,
    SyncClock { epoch_secs: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkResponse {
    Ack,
    Rejected,
    Media(MediaUrl),
    Files(Vec<String>),
    Exposure(ExposureSettings),
    Capture(CaptureSettings),
    Status(CaptureStatus),
    Battery(BatteryStatus),
    Storage(StorageStatus),
}

/// One connected device handle. Exactly one command may be in flight at a
/// time; the session layer serializes callers before touching this.
#[async_trait]
pub trait DeviceLink: Send {
    async fn execute(&mut self, command: LinkCommand) -> Result<LinkResponse, CamError>;
    async fn disconnect(&mut self);
    fn register_stream_sink(&mut self, sink: Arc<dyn StreamSink>);
    fn http_base_url(&self) -> String;
}

/// Discovery and connection capability; the wire protocol behind it is
/// opaque to the orchestrator.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>, CamError>;
    async fn connect(&self, descriptor: &DeviceDescriptor) -> Result<Box<dyn DeviceLink>, CamError>;
}
