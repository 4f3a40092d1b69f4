pub mod app_config;
pub mod common;
pub mod config_loader;
pub mod device;
pub mod errors;
pub mod operations;
pub mod session;
pub mod stitch;

pub use app_config::OrchestratorConfig;
pub use errors::CamError;
