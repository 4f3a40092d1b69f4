pub mod descriptor;
pub mod link;
pub mod media_url;

pub use descriptor::{CameraType, DeviceDescriptor, LensType};
pub use link::{DeviceLink, DeviceTransport, StreamSink};
pub use media_url::MediaUrl;
