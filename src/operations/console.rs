use crate::common::file_utils;
use crate::errors::CamError;
use crate::operations::stitch_op::{self, StitchRequest};
use crate::session::dispatcher::CaptureCommandDispatcher;
use crate::session::manager::{Session, SessionManager};
use crate::session::settings::{
    CaptureSettings, CaptureStatus, ExposureSettings, FunctionMode, TimelapseMode, TimelapseParam,
};
use crate::stitch::runner::StitchJobRunner;
use log::{error, info};
use std::time::Instant;

/// Discrete operator intents, one per capture/stitch operation. A front end
/// translates whatever it parses into these.
#[derive(Debug, Clone)]
pub enum Intent {
    TakePhoto,
    TakePhotoAndDownload,
    ListFiles,
    DeleteFile { remote_path: String },
    DownloadFile { remote_path: String, local_path: String },
    DownloadAll,
    DeleteAll,
    ShowExposure { mode: FunctionMode },
    SetEvBias { bias: i32 },
    ApplyCaptureSettings { mode: FunctionMode, settings: CaptureSettings },
    CaptureStatus,
    StartTimelapse { param: TimelapseParam },
    StopTimelapse { mode: TimelapseMode },
    BatteryStatus,
    StorageState,
    Stitch { request: StitchRequest },
    Exit,
}

/// One human-readable result per intent; failures are reported, never
/// panicked on.
#[derive(Debug, Clone)]
pub struct IntentOutcome {
    pub ok: bool,
    pub fatal: bool,
    pub message: String,
}

impl IntentOutcome {
    fn success(message: impl Into<String>) -> Self {
        IntentOutcome {
            ok: true,
            fatal: false,
            message: message.into(),
        }
    }

    fn failure(error: &CamError) -> Self {
        IntentOutcome {
            ok: false,
            fatal: error.is_fatal(),
            message: error.to_string(),
        }
    }
}

fn outcome_from(result: Result<String, CamError>) -> IntentOutcome {
    match result {
        Ok(message) => IntentOutcome::success(message),
        Err(e) => IntentOutcome::failure(&e),
    }
}

/// Thin operator surface over one open session plus the stitch runner.
/// Owns the session for its lifetime and closes it on exit or on
/// unrecoverable connection loss.
pub struct OperatorConsole {
    manager: SessionManager,
    dispatcher: CaptureCommandDispatcher,
    runner: StitchJobRunner,
    session: Session,
}

impl OperatorConsole {
    pub fn new(
        manager: SessionManager,
        dispatcher: CaptureCommandDispatcher,
        runner: StitchJobRunner,
        session: Session,
    ) -> Self {
        OperatorConsole {
            manager,
            dispatcher,
            runner,
            session,
        }
    }

    /// Drive the console over a stream of intents. Terminates on an
    /// explicit `Exit`, on a fatal connection loss, or when the intents run
    /// out; the session is closed cleanly in every case.
    pub async fn run<I>(self, intents: I) -> Vec<IntentOutcome>
    where
        I: IntoIterator<Item = Intent>,
    {
        let run_start_time = Instant::now();
        let mut outcomes = Vec::new();
        for intent in intents {
            if matches!(intent, Intent::Exit) {
                outcomes.push(IntentOutcome::success("Session closed; goodbye."));
                break;
            }
            let outcome = self.handle_intent(&intent).await;
            if outcome.ok {
                info!("✅ {:?}: {}", intent, outcome.message);
            } else {
                error!("❌ {:?}: {}", intent, outcome.message);
            }
            let fatal = outcome.fatal;
            outcomes.push(outcome);
            if fatal {
                error!("💔 Unrecoverable connection loss; terminating the session.");
                break;
            }
        }
        self.manager.close(&self.session).await;
        info!("🏁 Operator console finished in {:?}.", run_start_time.elapsed());
        outcomes
    }

    pub async fn handle_intent(&self, intent: &Intent) -> IntentOutcome {
        match intent {
            Intent::TakePhoto => outcome_from(self.take_photo().await),
            Intent::TakePhotoAndDownload => outcome_from(self.take_photo_and_download().await),
            Intent::ListFiles => outcome_from(self.list_files().await),
            Intent::DeleteFile { remote_path } => outcome_from(self.delete_file(remote_path).await),
            Intent::DownloadFile {
                remote_path,
                local_path,
            } => outcome_from(self.download_file(remote_path, local_path).await),
            Intent::DownloadAll => outcome_from(self.download_all().await),
            Intent::DeleteAll => outcome_from(self.delete_all().await),
            Intent::ShowExposure { mode } => outcome_from(self.show_exposure(*mode).await),
            Intent::SetEvBias { bias } => outcome_from(self.set_ev_bias(*bias).await),
            Intent::ApplyCaptureSettings { mode, settings } => {
                outcome_from(self.apply_capture_settings(*mode, settings).await)
            }
            Intent::CaptureStatus => outcome_from(self.capture_status().await),
            Intent::StartTimelapse { param } => outcome_from(self.start_timelapse(*param).await),
            Intent::StopTimelapse { mode } => outcome_from(self.stop_timelapse(*mode).await),
            Intent::BatteryStatus => outcome_from(self.battery_status().await),
            Intent::StorageState => outcome_from(self.storage_state().await),
            Intent::Stitch { request } => outcome_from(self.stitch(request).await),
            Intent::Exit => IntentOutcome::success("Session closed; goodbye."),
        }
    }

    async fn take_photo(&self) -> Result<String, CamError> {
        let url = self.dispatcher.take_photo(&self.session).await?;
        Ok(format!(
            "Take picture done: {}",
            url.single_origin().unwrap_or_default()
        ))
    }

    async fn take_photo_and_download(&self) -> Result<String, CamError> {
        let url = self.dispatcher.take_photo(&self.session).await?;
        let remote = url
            .single_origin()
            .ok_or_else(|| CamError::Capture("No single-origin url to download.".to_string()))?
            .to_string();
        let local_name = file_utils::generate_timestamped_filename(
            &self.session.descriptor().serial_number,
            "%Y%m%d_%H%M%S",
            "jpg",
        );
        let local_path = format!(
            "{}/{}",
            self.manager.config().download_directory.trim_end_matches('/'),
            local_name
        );
        if self
            .dispatcher
            .download_file(&self.session, &remote, &local_path)
            .await?
        {
            Ok(format!("Download {} succeed.", local_name))
        } else {
            Ok(format!("Download {} failed.", local_name))
        }
    }

    async fn list_files(&self) -> Result<String, CamError> {
        let files = self.dispatcher.get_file_list(&self.session).await?;
        if files.is_empty() {
            return Ok("Camera holds no files.".to_string());
        }
        Ok(files
            .iter()
            .map(|f| format!("File: {}", f))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn delete_file(&self, remote_path: &str) -> Result<String, CamError> {
        if self.dispatcher.delete_file(&self.session, remote_path).await? {
            Ok(format!("Deletion of '{}' succeed.", remote_path))
        } else {
            Ok(format!("Camera rejected deletion of '{}'.", remote_path))
        }
    }

    async fn download_file(&self, remote_path: &str, local_path: &str) -> Result<String, CamError> {
        if self
            .dispatcher
            .download_file(&self.session, remote_path, local_path)
            .await?
        {
            Ok(format!("Download '{}' succeed.", remote_path))
        } else {
            Ok(format!("Download '{}' failed.", remote_path))
        }
    }

    async fn download_all(&self) -> Result<String, CamError> {
        let files = self.dispatcher.get_file_list(&self.session).await?;
        let base = self.manager.config().download_directory.clone();
        file_utils::ensure_output_directory(&base)?;
        let mut downloaded = 0usize;
        for file in &files {
            let relative = file_utils::remote_relative_path(file);
            let local_path = format!("{}/{}", base.trim_end_matches('/'), relative);
            if self
                .dispatcher
                .download_file(&self.session, file, &local_path)
                .await?
            {
                downloaded += 1;
            }
        }
        Ok(format!("Downloaded {}/{} file(s).", downloaded, files.len()))
    }

    async fn delete_all(&self) -> Result<String, CamError> {
        let files = self.dispatcher.get_file_list(&self.session).await?;
        let mut deleted = 0usize;
        for file in &files {
            if self.dispatcher.delete_file(&self.session, file).await? {
                deleted += 1;
            }
        }
        Ok(format!("Deleted {}/{} file(s).", deleted, files.len()))
    }

    async fn show_exposure(&self, mode: FunctionMode) -> Result<String, CamError> {
        match self
            .dispatcher
            .get_exposure_settings(&self.session, mode)
            .await?
        {
            Some(settings) => Ok(format!(
                "EVBias: {}  ISO: {}  speed: {}",
                settings.ev_bias, settings.iso, settings.shutter
            )),
            None => Ok(format!(
                "Exposure settings unavailable for {:?} on this camera.",
                mode
            )),
        }
    }

    async fn set_ev_bias(&self, bias: i32) -> Result<String, CamError> {
        let mut settings =
            ExposureSettings::new(self.session.camera_type().default_exposure_program());
        settings.ev_bias = bias;
        if self
            .dispatcher
            .set_exposure_settings(&self.session, FunctionMode::NormalImage, &settings)
            .await?
        {
            let applied = self
                .dispatcher
                .get_exposure_settings(&self.session, FunctionMode::NormalImage)
                .await?;
            match applied {
                Some(s) => Ok(format!(
                    "Exposure applied: ISO {}, speed {}, mode {:?}.",
                    s.iso, s.shutter, s.mode
                )),
                None => Ok("Exposure applied.".to_string()),
            }
        } else {
            Ok("Camera rejected the exposure settings.".to_string())
        }
    }

    async fn apply_capture_settings(
        &self,
        mode: FunctionMode,
        settings: &CaptureSettings,
    ) -> Result<String, CamError> {
        if self
            .dispatcher
            .set_capture_settings(&self.session, mode, settings)
            .await?
        {
            Ok("Capture settings applied.".to_string())
        } else {
            Ok("Camera rejected the capture settings.".to_string())
        }
    }

    async fn capture_status(&self) -> Result<String, CamError> {
        match self.dispatcher.get_capture_status(&self.session).await? {
            CaptureStatus::NotCapturing => Ok("Current status: not capturing.".to_string()),
            CaptureStatus::Capturing => Ok("Current status: capturing.".to_string()),
        }
    }

    async fn start_timelapse(&self, param: TimelapseParam) -> Result<String, CamError> {
        if !self
            .dispatcher
            .set_timelapse_option(&self.session, param)
            .await?
        {
            // Option configuration failed; the start never happens.
            return Ok(format!(
                "Camera rejected the timelapse option for {:?}; not starting.",
                param.mode
            ));
        }
        if self
            .dispatcher
            .start_timelapse(&self.session, param.mode)
            .await?
        {
            Ok(format!("{:?} timelapse started.", param.mode))
        } else {
            Ok(format!("Camera refused to start the {:?} timelapse.", param.mode))
        }
    }

    async fn stop_timelapse(&self, mode: TimelapseMode) -> Result<String, CamError> {
        let url = self.dispatcher.stop_timelapse(&self.session, mode).await?;
        if url.is_empty() {
            return Ok(format!("No {:?} timelapse was running.", mode));
        }
        let urls = url
            .origins()
            .iter()
            .map(|u| format!("Url: {}", u))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(format!("Stop timelapse success.\n{}", urls))
    }

    async fn battery_status(&self) -> Result<String, CamError> {
        let status = self.dispatcher.get_battery_status(&self.session).await?;
        Ok(format!(
            "PowerType: {:?}  Battery level: {}/{}",
            status.power_type, status.battery_level, status.battery_scale
        ))
    }

    async fn storage_state(&self) -> Result<String, CamError> {
        let status = self.dispatcher.get_storage_state(&self.session).await?;
        Ok(format!(
            "Free space: {}  Total space: {}  State: {:?}",
            status.free_space, status.total_space, status.state
        ))
    }

    async fn stitch(&self, request: &StitchRequest) -> Result<String, CamError> {
        let job = stitch_op::build_job(request, self.manager.config())?;
        let output = job.output().to_string();
        let handle = self.runner.submit(job)?;
        let outcome = self.runner.await_job(handle).await;
        match outcome {
            crate::stitch::runner::JobOutcome::Success => {
                Ok(format!("Stitching succeeded: '{}'.", output))
            }
            crate::stitch::runner::JobOutcome::Failure(reason) => {
                Ok(format!("Stitching failed for '{}': {}", output, reason))
            }
        }
    }
}
