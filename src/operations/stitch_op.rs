use crate::app_config::OrchestratorConfig;
use crate::errors::CamError;
use crate::stitch::config::{AlgorithmMode, HdrMode, StitchJobBuilder, StitchJobConfig};

/// Flag-level stitch request, as a front end would parse it. Translation
/// into the builder state machine happens here so no flag handling leaks
/// into the core.
#[derive(Debug, Clone)]
pub struct StitchRequest {
    pub inputs: Vec<String>,
    pub output: String,
    pub algorithm: AlgorithmMode,
    pub hdr: HdrMode,
    /// None falls back to the configured default resolution.
    pub resolution: Option<(u32, u32)>,
    pub flow_state: bool,
    pub denoise: bool,
    pub cuda: bool,
    pub stitch_fusion: bool,
    pub direction_lock: bool,
    pub color_plus: bool,
    pub color_plus_model: Option<String>,
    pub gpu_device: u32,
}

impl StitchRequest {
    pub fn new(inputs: Vec<String>, output: impl Into<String>) -> Self {
        StitchRequest {
            inputs,
            output: output.into(),
            algorithm: AlgorithmMode::Template,
            hdr: HdrMode::None,
            resolution: None,
            flow_state: true,
            denoise: true,
            cuda: false,
            stitch_fusion: true,
            direction_lock: true,
            color_plus: false,
            color_plus_model: None,
            gpu_device: 0,
        }
    }
}

pub fn build_job(
    request: &StitchRequest,
    config: &OrchestratorConfig,
) -> Result<StitchJobConfig, CamError> {
    let (width, height) = request.resolution.unwrap_or((
        config.default_output_width,
        config.default_output_height,
    ));

    let mut builder = StitchJobBuilder::new();
    builder.set_inputs(request.inputs.iter().cloned())?;
    builder.set_output(request.output.clone())?;
    builder.set_algorithm(request.algorithm)?;
    builder.set_hdr(request.hdr)?;
    builder.set_resolution(width, height)?;
    builder.enable_flow_state(request.flow_state)?;
    builder.enable_denoise(request.denoise)?;
    builder.enable_cuda(request.cuda)?;
    builder.enable_stitch_fusion(request.stitch_fusion)?;
    builder.enable_direction_lock(request.direction_lock)?;
    builder.enable_color_plus(request.color_plus, request.color_plus_model.clone())?;
    builder.set_gpu_device(request.gpu_device)?;
    builder.lock()
}
