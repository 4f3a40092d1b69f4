use chrono::{DateTime, Local, Utc};

// Get current local timestamp as a formatted string
pub fn current_local_timestamp_str(format_str: &str) -> String {
    let now: DateTime<Local> = Local::now();
    now.format(format_str).to_string()
}

// Current wall clock as epoch seconds; fed to the camera clock sync command.
pub fn current_epoch_secs() -> i64 {
    Utc::now().timestamp()
}
