use crate::device::descriptor::CameraType;
use crate::errors::CamError;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// Camera function mode that parameterizes the exposure/capture get/set
/// pairs. Not every camera body supports every mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionMode {
    NormalImage,
    NormalVideo,
    HdrImage,
    TimelapseVideo,
}

impl CameraType {
    pub fn supports_function_mode(&self, mode: FunctionMode) -> bool {
        match (self, mode) {
            // First-generation bodies predate HDR photo and mobile timelapse.
            (CameraType::OneX, FunctionMode::HdrImage) => false,
            (CameraType::OneX, FunctionMode::TimelapseVideo) => false,
            (CameraType::Unknown, _) => false,
            _ => true,
        }
    }

    /// The auto program the body expects; the X3 wants FULL_AUTO where the
    /// older line takes plain AUTO.
    pub fn default_exposure_program(&self) -> ExposureMode {
        match self {
            CameraType::X3 => ExposureMode::FullAuto,
            _ => ExposureMode::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureMode {
    Auto,
    FullAuto,
    Manual,
    IsoPriority,
    ShutterPriority,
}

/// Positive rational seconds, e.g. 1/120 s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutterSpeed {
    num: u32,
    den: u32,
}

impl ShutterSpeed {
    pub fn new(num: u32, den: u32) -> Result<Self, CamError> {
        if num == 0 || den == 0 {
            return Err(CamError::Validation(format!(
                "Shutter speed {}/{} s is not a positive rational.",
                num, den
            )));
        }
        Ok(ShutterSpeed { num, den })
    }

    pub fn as_secs_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for ShutterSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} s", self.num, self.den)
    }
}

pub const EV_BIAS_DOMAIN: RangeInclusive<i32> = -80..=80;

// range -80 ~ 80, default 0, step 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureSettings {
    pub mode: ExposureMode,
    pub ev_bias: i32,
    pub iso: u32,
    pub shutter: ShutterSpeed,
}

impl ExposureSettings {
    pub fn new(mode: ExposureMode) -> Self {
        ExposureSettings {
            mode,
            ev_bias: 0,
            iso: 800,
            shutter: ShutterSpeed { num: 1, den: 120 },
        }
    }

    /// Domain check performed before any value is sent to the device.
    pub fn validate(&self) -> Result<(), CamError> {
        if !EV_BIAS_DOMAIN.contains(&self.ev_bias) {
            return Err(CamError::Validation(format!(
                "EV bias {} outside domain [{}, {}].",
                self.ev_bias,
                EV_BIAS_DOMAIN.start(),
                EV_BIAS_DOMAIN.end()
            )));
        }
        if self.iso == 0 {
            return Err(CamError::Validation("ISO must be positive.".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteBalance {
    Auto,
    K2700,
    K4000,
    K5000,
    K6500,
    K7500,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AdjustField {
    Saturation,
    Brightness,
    Contrast,
    Sharpness,
}

impl AdjustField {
    pub fn domain(&self) -> RangeInclusive<i64> {
        match self {
            AdjustField::Saturation => -100..=100,
            AdjustField::Brightness => -255..=255,
            AdjustField::Contrast => 0..=100,
            AdjustField::Sharpness => 0..=6,
        }
    }
}

/// Keyed adjustment map. Invalid values never make it into the map, so a
/// populated CaptureSettings is always safe to dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSettings {
    values: BTreeMap<AdjustField, i64>,
    white_balance: Option<WhiteBalance>,
}

impl CaptureSettings {
    pub fn new() -> Self {
        CaptureSettings::default()
    }

    pub fn set_value(&mut self, field: AdjustField, value: i64) -> Result<(), CamError> {
        let domain = field.domain();
        if !domain.contains(&value) {
            return Err(CamError::Validation(format!(
                "{:?} value {} outside domain [{}, {}].",
                field,
                value,
                domain.start(),
                domain.end()
            )));
        }
        self.values.insert(field, value);
        Ok(())
    }

    pub fn value(&self, field: AdjustField) -> Option<i64> {
        self.values.get(&field).copied()
    }

    pub fn set_white_balance(&mut self, wb: WhiteBalance) {
        self.white_balance = Some(wb);
    }

    pub fn white_balance(&self) -> Option<WhiteBalance> {
        self.white_balance
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.white_balance.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimelapseMode {
    TimelapseVideo,
    TimelapseImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelapseParam {
    pub mode: TimelapseMode,
    /// Seconds; -1 means run until explicitly stopped.
    pub duration_secs: i64,
    pub interval_ms: u32,
    pub accelerate_frequency: u32,
}

impl TimelapseParam {
    pub fn validate(&self) -> Result<(), CamError> {
        if self.duration_secs != -1 && self.duration_secs <= 0 {
            return Err(CamError::Validation(format!(
                "Timelapse duration {} must be positive or -1 for unbounded.",
                self.duration_secs
            )));
        }
        if self.interval_ms == 0 {
            return Err(CamError::Validation(
                "Timelapse interval must be positive.".to_string(),
            ));
        }
        if self.accelerate_frequency == 0 {
            return Err(CamError::Validation(
                "Timelapse accelerate frequency must be positive.".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    NotCapturing,
    Capturing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerType {
    Battery,
    Adapter,
}

/// Point-in-time snapshot; every query re-fetches from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub power_type: PowerType,
    pub battery_level: u32,
    pub battery_scale: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Normal,
    NoCard,
    WriteProtected,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStatus {
    pub free_space: u64,
    pub total_space: u64,
    pub state: CardState,
}
