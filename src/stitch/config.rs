use crate::common::file_utils;
use crate::errors::CamError;
use log::warn;
use std::path::Path;

// TEMPLATE (fast, coarse), OPTFLOW (slow, best), DYNAMICSTITCH (fast, decent)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmMode {
    Template,
    OptFlow,
    DynamicStitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrMode {
    None,
    SingleImage,
    MultiImageMbb,
    MultiImageMpl,
}

/// Kind detected from the first input's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    StillImage,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputResolution {
    pub width: u32,
    pub height: u32,
}

impl Default for OutputResolution {
    fn default() -> Self {
        OutputResolution {
            width: 1920,
            height: 960,
        }
    }
}

fn extension_lowercase(path: &str) -> String {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Immutable, executable job descriptor. Only `StitchJobBuilder::lock`
/// produces one.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchJobConfig {
    inputs: Vec<String>,
    output: String,
    kind: InputKind,
    algorithm: AlgorithmMode,
    hdr: HdrMode,
    resolution: OutputResolution,
    flow_state: bool,
    denoise: bool,
    cuda: bool,
    stitch_fusion: bool,
    direction_lock: bool,
    color_plus_model: Option<String>,
    gpu_device: u32,
}

impl StitchJobConfig {
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }
    pub fn output(&self) -> &str {
        &self.output
    }
    pub fn kind(&self) -> InputKind {
        self.kind
    }
    pub fn algorithm(&self) -> AlgorithmMode {
        self.algorithm
    }
    pub fn hdr(&self) -> HdrMode {
        self.hdr
    }
    pub fn resolution(&self) -> OutputResolution {
        self.resolution
    }
    pub fn flow_state(&self) -> bool {
        self.flow_state
    }
    pub fn denoise(&self) -> bool {
        self.denoise
    }
    pub fn cuda(&self) -> bool {
        self.cuda
    }
    pub fn stitch_fusion(&self) -> bool {
        self.stitch_fusion
    }
    pub fn direction_lock(&self) -> bool {
        self.direction_lock
    }
    /// Some(model path) when color plus survived normalization.
    pub fn color_plus_model(&self) -> Option<&str> {
        self.color_plus_model.as_deref()
    }
    pub fn gpu_device(&self) -> u32 {
        self.gpu_device
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Configuring,
    Locked,
}

/// Builder/validator for stitch jobs. Setters are only usable before
/// `lock()`; afterwards every mutation fails with `Locked`.
#[derive(Debug, Clone)]
pub struct StitchJobBuilder {
    state: BuilderState,
    inputs: Vec<String>,
    output: Option<String>,
    algorithm: AlgorithmMode,
    hdr: HdrMode,
    resolution: OutputResolution,
    flow_state: bool,
    denoise: bool,
    cuda: bool,
    stitch_fusion: bool,
    direction_lock: bool,
    color_plus: bool,
    color_plus_model: Option<String>,
    gpu_device: u32,
}

impl Default for StitchJobBuilder {
    fn default() -> Self {
        StitchJobBuilder {
            state: BuilderState::Configuring,
            inputs: Vec::new(),
            output: None,
            algorithm: AlgorithmMode::Template,
            hdr: HdrMode::None,
            resolution: OutputResolution::default(),
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

impl StitchJobBuilder {
    pub fn new() -> Self {
        StitchJobBuilder::default()
    }

    fn require_configuring(&self) -> Result<(), CamError> {
        if self.state == BuilderState::Locked {
            return Err(CamError::Locked(
                "Stitch job is locked; mutation is no longer allowed.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn set_inputs<I, S>(&mut self, inputs: I) -> Result<&mut Self, CamError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.require_configuring()?;
        self.inputs = inputs.into_iter().map(Into::into).collect();
        Ok(self)
    }

    pub fn set_output(&mut self, output: impl Into<String>) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.output = Some(output.into());
        Ok(self)
    }

    pub fn set_algorithm(&mut self, algorithm: AlgorithmMode) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.algorithm = algorithm;
        Ok(self)
    }

    pub fn set_hdr(&mut self, hdr: HdrMode) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.hdr = hdr;
        Ok(self)
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        if width == 0 || height == 0 {
            return Err(CamError::Validation(format!(
                "Output resolution {}x{} is not positive.",
                width, height
            )));
        }
        self.resolution = OutputResolution { width, height };
        Ok(self)
    }

    pub fn enable_flow_state(&mut self, enabled: bool) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.flow_state = enabled;
        Ok(self)
    }

    pub fn enable_denoise(&mut self, enabled: bool) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.denoise = enabled;
        Ok(self)
    }

    pub fn enable_cuda(&mut self, enabled: bool) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.cuda = enabled;
        Ok(self)
    }

    pub fn enable_stitch_fusion(&mut self, enabled: bool) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.stitch_fusion = enabled;
        Ok(self)
    }

    pub fn enable_direction_lock(&mut self, enabled: bool) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.direction_lock = enabled;
        Ok(self)
    }

    pub fn enable_color_plus(
        &mut self,
        enabled: bool,
        model_path: Option<String>,
    ) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.color_plus = enabled;
        self.color_plus_model = model_path;
        Ok(self)
    }

    pub fn set_gpu_device(&mut self, index: u32) -> Result<&mut Self, CamError> {
        self.require_configuring()?;
        self.gpu_device = index;
        Ok(self)
    }

    /// Validate, normalize, and freeze. On success the builder transitions
    /// to Locked and only the returned descriptor remains usable.
    pub fn lock(&mut self) -> Result<StitchJobConfig, CamError> {
        self.require_configuring()?;

        if self.inputs.is_empty() {
            return Err(CamError::Config("no inputs".to_string()));
        }
        let output = match self.output.as_deref() {
            Some(o) if !o.is_empty() => o.to_string(),
            _ => return Err(CamError::Config("no output".to_string())),
        };

        let first_ext = extension_lowercase(&self.inputs[0]);
        for input in &self.inputs[1..] {
            if extension_lowercase(input) != first_ext {
                return Err(CamError::Config(format!(
                    "Mixed input extensions: '{}' does not match '.{}'.",
                    input, first_ext
                )));
            }
        }
        let kind = match first_ext.as_str() {
            "insp" | "jpg" | "jpeg" => InputKind::StillImage,
            other => {
                warn!(
                    "🧵 Input extension '.{}' is not a recognized still-image format; the job will perform no stitching work.",
                    other
                );
                InputKind::Unsupported
            }
        };

        // Color plus degrades gracefully instead of failing the lock.
        let color_plus_model = if self.color_plus {
            match self.color_plus_model.as_deref() {
                Some(model) if !model.is_empty() => Some(model.to_string()),
                _ => {
                    warn!("🧵 Color plus enabled without a model path; disabling the flag.");
                    None
                }
            }
        } else {
            None
        };

        file_utils::ensure_parent_directory(Path::new(&output))
            .map_err(|e| CamError::Config(format!("Output path is not writable: {}", e)))?;

        self.state = BuilderState::Locked;
        Ok(StitchJobConfig {
            inputs: self.inputs.clone(),
            output,
            kind,
            algorithm: self.algorithm,
            hdr: self.hdr,
            resolution: self.resolution,
            flow_state: self.flow_state,
            denoise: self.denoise,
            cuda: self.cuda,
            stitch_fusion: self.stitch_fusion,
            direction_lock: self.direction_lock,
            color_plus_model,
            gpu_device: self.gpu_device,
        })
    }
}
