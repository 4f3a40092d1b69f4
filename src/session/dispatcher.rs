use crate::app_config::OrchestratorConfig;
use crate::common::file_utils;
use crate::device::link::{LinkCommand, LinkResponse};
use crate::device::media_url::MediaUrl;
use crate::errors::CamError;
use crate::session::manager::Session;
use crate::session::settings::{
    BatteryStatus, CaptureSettings, CaptureStatus, ExposureSettings, FunctionMode, StorageStatus,
    TimelapseMode, TimelapseParam,
};
use log::{debug, info, warn};
use std::path::Path;
use std::time::Duration;

fn unexpected(context: &str, response: LinkResponse) -> CamError {
    CamError::Unexpected(format!("{} got unexpected response {:?}.", context, response))
}

/// Translates high-level capture intents into validated link requests.
/// Stateless apart from the round-trip bound; all session state lives on the
/// `Session` it is handed. Validation and state errors never reach the
/// device.
#[derive(Clone)]
pub struct CaptureCommandDispatcher {
    command_timeout: Duration,
}

impl CaptureCommandDispatcher {
    pub fn new(config: &OrchestratorConfig) -> Self {
        CaptureCommandDispatcher {
            command_timeout: config.command_timeout(),
        }
    }

    /// One serialized, bounded round trip. The inner mutex is the
    /// mutual-exclusion guard for the link's single in-flight command.
    async fn command(
        &self,
        session: &Session,
        command: LinkCommand,
    ) -> Result<LinkResponse, CamError> {
        let result = {
            let mut inner = session.inner.lock().await;
            inner.require_open()?;
            inner.execute_bounded(command, self.command_timeout).await
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                session.release_guard();
            }
        }
        result
    }

    pub async fn take_photo(&self, session: &Session) -> Result<MediaUrl, CamError> {
        match self.command(session, LinkCommand::TakePhoto).await? {
            LinkResponse::Media(url) => {
                if url.is_empty() || !url.is_single_origin() {
                    return Err(CamError::Capture(
                        "Camera returned no single-origin url for the photo.".to_string(),
                    ));
                }
                info!("📸 Take picture done: {}", url.single_origin().unwrap_or_default());
                Ok(url)
            }
            LinkResponse::Rejected => Err(CamError::Capture(
                "Camera rejected the take-photo command.".to_string(),
            )),
            other => Err(unexpected("TakePhoto", other)),
        }
    }

    pub async fn get_file_list(&self, session: &Session) -> Result<Vec<String>, CamError> {
        match self.command(session, LinkCommand::ListFiles).await? {
            LinkResponse::Files(files) => {
                debug!("📂 Camera reports {} file(s).", files.len());
                Ok(files)
            }
            other => Err(unexpected("GetFileList", other)),
        }
    }

    /// `Ok(false)` on remote rejection; never a crash.
    pub async fn delete_file(&self, session: &Session, remote_path: &str) -> Result<bool, CamError> {
        let cmd = LinkCommand::DeleteFile {
            remote_path: remote_path.to_string(),
        };
        match self.command(session, cmd).await? {
            LinkResponse::Ack => Ok(true),
            LinkResponse::Rejected => {
                warn!("🗑️ Camera rejected deletion of '{}'.", remote_path);
                Ok(false)
            }
            other => Err(unexpected("DeleteFile", other)),
        }
    }

    /// Streams a camera file to a local path. A transport interruption is
    /// reported as `Ok(false)`; a truncated file may remain on disk and the
    /// caller is responsible for cleanup.
    pub async fn download_file(
        &self,
        session: &Session,
        remote_path: &str,
        local_path: &str,
    ) -> Result<bool, CamError> {
        file_utils::ensure_parent_directory(Path::new(local_path))?;
        let cmd = LinkCommand::DownloadFile {
            remote_path: remote_path.to_string(),
            local_path: local_path.to_string(),
        };
        match self.command(session, cmd).await {
            Ok(LinkResponse::Ack) => {
                info!("⬇️ Download '{}' -> '{}' succeed.", remote_path, local_path);
                Ok(true)
            }
            Ok(LinkResponse::Rejected) => {
                warn!("⬇️ Camera rejected download of '{}'.", remote_path);
                Ok(false)
            }
            Ok(other) => Err(unexpected("DownloadFile", other)),
            Err(CamError::Transfer(reason)) => {
                warn!(
                    "⬇️ Download of '{}' interrupted ({}); a truncated file may remain at '{}'.",
                    remote_path, reason, local_path
                );
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// `None` when the camera body does not support the function mode; no
    /// link round trip happens in that case.
    pub async fn get_exposure_settings(
        &self,
        session: &Session,
        mode: FunctionMode,
    ) -> Result<Option<ExposureSettings>, CamError> {
        if !session.camera_type().supports_function_mode(mode) {
            debug!(
                "Camera type {:?} does not support {:?}; skipping exposure query.",
                session.camera_type(),
                mode
            );
            return Ok(None);
        }
        match self
            .command(session, LinkCommand::GetExposureSettings { mode })
            .await?
        {
            LinkResponse::Exposure(settings) => Ok(Some(settings)),
            LinkResponse::Rejected => Ok(None),
            other => Err(unexpected("GetExposureSettings", other)),
        }
    }

    /// EV bias domain is validated before dispatch; an out-of-range value
    /// never reaches the device.
    pub async fn set_exposure_settings(
        &self,
        session: &Session,
        mode: FunctionMode,
        settings: &ExposureSettings,
    ) -> Result<bool, CamError> {
        settings.validate()?;
        if !session.camera_type().supports_function_mode(mode) {
            return Err(CamError::Validation(format!(
                "Camera type {:?} does not support function mode {:?}.",
                session.camera_type(),
                mode
            )));
        }
        let cmd = LinkCommand::SetExposureSettings {
            mode,
            settings: *settings,
        };
        match self.command(session, cmd).await? {
            LinkResponse::Ack => Ok(true),
            LinkResponse::Rejected => Ok(false),
            other => Err(unexpected("SetExposureSettings", other)),
        }
    }

    pub async fn get_capture_settings(
        &self,
        session: &Session,
        mode: FunctionMode,
    ) -> Result<CaptureSettings, CamError> {
        match self
            .command(session, LinkCommand::GetCaptureSettings { mode })
            .await?
        {
            LinkResponse::Capture(settings) => Ok(settings),
            other => Err(unexpected("GetCaptureSettings", other)),
        }
    }

    /// Per-field validation already happened when the map was populated;
    /// an empty settings map is a caller mistake caught here.
    pub async fn set_capture_settings(
        &self,
        session: &Session,
        mode: FunctionMode,
        settings: &CaptureSettings,
    ) -> Result<bool, CamError> {
        if settings.is_empty() {
            return Err(CamError::Validation(
                "Capture settings contain no adjustments to apply.".to_string(),
            ));
        }
        let cmd = LinkCommand::SetCaptureSettings {
            mode,
            settings: settings.clone(),
        };
        match self.command(session, cmd).await? {
            LinkResponse::Ack => Ok(true),
            LinkResponse::Rejected => Ok(false),
            other => Err(unexpected("SetCaptureSettings", other)),
        }
    }

    pub async fn get_capture_status(&self, session: &Session) -> Result<CaptureStatus, CamError> {
        match self.command(session, LinkCommand::GetCaptureStatus).await? {
            LinkResponse::Status(status) => Ok(status),
            other => Err(unexpected("GetCaptureStatus", other)),
        }
    }

    /// Push a timelapse option to the device and record it for the mode.
    /// Configuration failure leaves no recorded option, so a subsequent
    /// start is prevented.
    pub async fn set_timelapse_option(
        &self,
        session: &Session,
        param: TimelapseParam,
    ) -> Result<bool, CamError> {
        param.validate()?;
        let result = {
            let mut inner = session.inner.lock().await;
            inner.require_open()?;
            let response = inner
                .execute_bounded(LinkCommand::SetTimelapseOption { param }, self.command_timeout)
                .await;
            match response {
                Ok(LinkResponse::Ack) => {
                    inner.configured_timelapse.insert(param.mode, param);
                    Ok(true)
                }
                Ok(LinkResponse::Rejected) => Ok(false),
                Ok(other) => Err(unexpected("SetTimelapseOption", other)),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                session.release_guard();
            }
        }
        result
    }

    /// Starting twice for the same mode is a conflict; the running
    /// timelapse's parameters stay untouched.
    pub async fn start_timelapse(
        &self,
        session: &Session,
        mode: TimelapseMode,
    ) -> Result<bool, CamError> {
        let result = {
            let mut inner = session.inner.lock().await;
            inner.require_open()?;
            if inner.active_timelapse.contains(&mode) {
                return Err(CamError::Conflict(format!(
                    "A {:?} timelapse is already running.",
                    mode
                )));
            }
            if !inner.configured_timelapse.contains_key(&mode) {
                return Err(CamError::InvalidState(format!(
                    "No timelapse option configured for {:?}; set the option first.",
                    mode
                )));
            }
            let response = inner
                .execute_bounded(LinkCommand::StartTimelapse { mode }, self.command_timeout)
                .await;
            match response {
                Ok(LinkResponse::Ack) => {
                    inner.active_timelapse.insert(mode);
                    info!("⏱️ {:?} timelapse started.", mode);
                    Ok(true)
                }
                Ok(LinkResponse::Rejected) => Ok(false),
                Ok(other) => Err(unexpected("StartTimelapse", other)),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                session.release_guard();
            }
        }
        result
    }

    /// Stopping a mode with nothing running returns an empty `MediaUrl`
    /// without a device round trip.
    pub async fn stop_timelapse(
        &self,
        session: &Session,
        mode: TimelapseMode,
    ) -> Result<MediaUrl, CamError> {
        let result = {
            let mut inner = session.inner.lock().await;
            inner.require_open()?;
            if !inner.active_timelapse.contains(&mode) {
                debug!("⏱️ No {:?} timelapse active; nothing to stop.", mode);
                return Ok(MediaUrl::empty());
            }
            let response = inner
                .execute_bounded(LinkCommand::StopTimelapse { mode }, self.command_timeout)
                .await;
            match response {
                Ok(LinkResponse::Media(url)) => {
                    inner.active_timelapse.remove(&mode);
                    info!("⏱️ {:?} timelapse stopped ({} url(s)).", mode, url.origins().len());
                    Ok(url)
                }
                Ok(other) => Err(unexpected("StopTimelapse", other)),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = &result {
            if e.is_fatal() {
                session.release_guard();
            }
        }
        result
    }

    /// Snapshot, fetched fresh on every call; fails fast while disconnected.
    pub async fn get_battery_status(&self, session: &Session) -> Result<BatteryStatus, CamError> {
        match self.command(session, LinkCommand::GetBatteryStatus).await? {
            LinkResponse::Battery(status) => Ok(status),
            LinkResponse::Rejected => Err(CamError::Unexpected(
                "Camera rejected the battery status query.".to_string(),
            )),
            other => Err(unexpected("GetBatteryStatus", other)),
        }
    }

    pub async fn get_storage_state(&self, session: &Session) -> Result<StorageStatus, CamError> {
        match self.command(session, LinkCommand::GetStorageState).await? {
            LinkResponse::Storage(status) => Ok(status),
            other => Err(unexpected("GetStorageState", other)),
        }
    }
}
