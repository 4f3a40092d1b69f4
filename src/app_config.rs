use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct OrchestratorConfig {
    pub command_timeout_secs: u64,        // bound for every device round trip
    pub clock_sync_retries: u32,          // clock sync is the only auto-retried command
    pub default_output_width: u32,        // stitch output defaults
    pub default_output_height: u32,
    pub download_directory: String,       // base dir for files pulled off the camera
    pub log_level: Option<String>,        // optional; CLI/env may take precedence
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            command_timeout_secs: 10,
            clock_sync_retries: 2,
            default_output_width: 1920,
            default_output_height: 960,
            download_directory: "./downloads".to_string(),
            log_level: Some("info".to_string()),
        }
    }
}

impl OrchestratorConfig {
    pub fn command_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.command_timeout_secs)
    }
}
