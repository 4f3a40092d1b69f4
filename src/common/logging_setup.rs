use crate::app_config::OrchestratorConfig;
use env_logger::Builder;
use log::LevelFilter;

pub fn initialize_logging(config: Option<&OrchestratorConfig>, level_override: Option<&str>) {
    let mut builder = Builder::new();

    // Determine log level from explicit override, then config, then default
    let log_level_str = level_override
        .map(|s| s.to_string())
        .or_else(|| config.and_then(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    match log_level_str.to_lowercase().as_str() {
        "error" => builder.filter_level(LevelFilter::Error),
        "warn" => builder.filter_level(LevelFilter::Warn),
        "info" => builder.filter_level(LevelFilter::Info),
        "debug" => builder.filter_level(LevelFilter::Debug),
        "trace" => builder.filter_level(LevelFilter::Trace),
        s => {
            log::warn!("Unrecognized log level '{}', defaulting to info.", s);
            builder.filter_level(LevelFilter::Info)
        }
    };

    builder.try_init().unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Logging might not work as expected.", e);
    });
}
