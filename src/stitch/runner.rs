use crate::errors::CamError;
use crate::stitch::config::{InputKind, StitchJobConfig};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Progress fraction in [0, 1], reported by the engine as it works.
pub type ProgressFn = dyn Fn(f32) + Send + Sync;

/// Error reported by the stitch engine capability. Codes follow the
/// engine's own numbering and are mapped into the orchestrator taxonomy.
#[derive(Debug, Clone)]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub const BAD_INPUT: i32 = 1;
    pub const IO: i32 = 2;
    pub const DEADLINE: i32 = 3;
}

fn map_engine_error(err: EngineError) -> CamError {
    match err.code {
        EngineError::BAD_INPUT => CamError::Config(err.message),
        EngineError::IO => CamError::Transfer(err.message),
        EngineError::DEADLINE => CamError::Timeout(err.message),
        code => CamError::Unexpected(format!("Engine error code {}: {}", code, err.message)),
    }
}

/// The pixel-processing capability. The runner never looks inside it.
#[async_trait]
pub trait StitchEngine: Send + Sync + 'static {
    async fn run(&self, config: &StitchJobConfig, progress: &ProgressFn)
        -> Result<(), EngineError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failure(String),
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Success)
    }
}

/// Releases the per-output reservation on every exit path, including task
/// abort, because it rides inside the job future.
struct OutputReservation {
    outputs: Arc<Mutex<HashSet<String>>>,
    output: String,
}

impl Drop for OutputReservation {
    fn drop(&mut self) {
        let mut set = self
            .outputs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.output);
    }
}

pub struct JobHandle {
    task: JoinHandle<Result<(), CamError>>,
    output: String,
}

impl JobHandle {
    pub fn output(&self) -> &str {
        &self.output
    }
}

/// Submits locked job descriptors to the engine, one background task per
/// job, independent of any device session.
pub struct StitchJobRunner {
    engine: Arc<dyn StitchEngine>,
    active_outputs: Arc<Mutex<HashSet<String>>>,
}

impl StitchJobRunner {
    pub fn new(engine: Arc<dyn StitchEngine>) -> Self {
        StitchJobRunner {
            engine,
            active_outputs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// `Conflict` while another job is still writing the same output path.
    pub fn submit(&self, config: StitchJobConfig) -> Result<JobHandle, CamError> {
        let output = config.output().to_string();
        {
            let mut set = self
                .active_outputs
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !set.insert(output.clone()) {
                return Err(CamError::Conflict(format!(
                    "A stitch job is already writing '{}'.",
                    output
                )));
            }
        }
        let reservation = OutputReservation {
            outputs: Arc::clone(&self.active_outputs),
            output: output.clone(),
        };

        info!(
            "🧵 Submitting stitch job: {} input(s) -> '{}' ({:?}, {:?}, {}x{}).",
            config.inputs().len(),
            output,
            config.algorithm(),
            config.hdr(),
            config.resolution().width,
            config.resolution().height
        );

        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move {
            let _reservation = reservation;
            let start_time = Instant::now();

            if config.kind() == InputKind::Unsupported {
                warn!(
                    "🧵 Input kind for '{}' is unsupported; reporting success without stitching.",
                    config.output()
                );
                return Ok(());
            }

            let output_for_log = config.output().to_string();
            let progress = move |fraction: f32| {
                debug!(
                    "🧵 Stitch progress for '{}': {:.0}%",
                    output_for_log,
                    fraction * 100.0
                );
            };
            let result = engine.run(&config, &progress).await.map_err(map_engine_error);
            match &result {
                Ok(()) => info!(
                    "✅ Stitching succeeded for '{}' in {:?}.",
                    config.output(),
                    start_time.elapsed()
                ),
                Err(e) => warn!(
                    "❌ Stitching failed for '{}' after {:?}: {}",
                    config.output(),
                    start_time.elapsed(),
                    e
                ),
            }
            result
        });

        Ok(JobHandle { task, output })
    }

    pub async fn await_job(&self, handle: JobHandle) -> JobOutcome {
        match handle.task.await {
            Ok(Ok(())) => JobOutcome::Success,
            Ok(Err(e)) => JobOutcome::Failure(e.to_string()),
            Err(join_err) if join_err.is_cancelled() => {
                JobOutcome::Failure("Job was cancelled before completion.".to_string())
            }
            Err(join_err) => JobOutcome::Failure(format!("Job task failed: {}", join_err)),
        }
    }

    /// Best-effort cancellation: a signal, not guaranteed preemption. The
    /// output reservation is released when the job future is dropped.
    pub fn cancel(&self, handle: &JobHandle) {
        warn!("🧵 Cancelling stitch job for '{}'.", handle.output);
        handle.task.abort();
    }

    pub async fn await_all(&self, handles: Vec<JobHandle>) -> Vec<JobOutcome> {
        join_all(handles.into_iter().map(|h| self.await_job(h))).await
    }
}
