use crate::common::timestamp_utils;
use crate::errors::CamError;
use log::debug;
use std::path::{Path, PathBuf};

pub fn generate_timestamped_filename(
    base_name: &str,      // e.g., camera serial
    timestamp_format: &str,
    extension: &str,      // e.g., "jpg", "insp"
) -> String {
    let timestamp = timestamp_utils::current_local_timestamp_str(timestamp_format);
    format!("{}_{}.{}", base_name, timestamp, extension)
}

pub fn ensure_output_directory(dir_path_str: &str) -> Result<PathBuf, CamError> {
    let dir_path = PathBuf::from(dir_path_str);
    if !dir_path.exists() {
        debug!(
            "Output directory '{}' does not exist, attempting to create it.",
            dir_path.display()
        );
        std::fs::create_dir_all(&dir_path).map_err(|e| {
            CamError::Transfer(format!(
                "Failed to create output directory '{}': {}",
                dir_path.display(),
                e
            ))
        })?;
    } else if !dir_path.is_dir() {
        return Err(CamError::Transfer(format!(
            "Output path '{}' exists but is not a directory.",
            dir_path.display()
        )));
    }
    Ok(dir_path)
}

/// Ensure the parent directory of a file target exists before a download or
/// a stitch output is written there.
pub fn ensure_parent_directory(file_path: &Path) -> Result<(), CamError> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CamError::Transfer(format!(
                    "Failed to create parent directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

/// Strip the scheme and host from a capture url, keeping the on-camera
/// path so downloads mirror the camera's directory layout locally,
/// e.g. "http://cam/DCIM/IMG_0001.insp" -> "DCIM/IMG_0001.insp". Two files
/// with the same basename in different camera directories thus land in
/// different local files.
pub fn remote_relative_path(url: &str) -> String {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let path = without_scheme
        .split_once('/')
        .map(|(_, p)| p)
        .unwrap_or(without_scheme);
    path.trim_start_matches('/').to_string()
}
