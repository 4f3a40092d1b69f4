use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraType {
    OneX,
    OneR,
    OneX2,
    X3,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensType {
    PanoDefault,
    Wide,
    Unknown,
}

/// Produced by discovery, consumed once to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub serial_number: String,
    pub camera_type: CameraType,
    pub lens_type: LensType,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Serial:{}\tCamera type:{:?}\tLens type:{:?}",
            self.serial_number, self.camera_type, self.lens_type
        )
    }
}
