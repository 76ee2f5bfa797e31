//! Cached downloads of engine models and trained data

use crate::error::CaptchaError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Per-user cache directory for this tool, optionally with a subdirectory
pub fn cache_dir(sub: Option<&str>) -> PathBuf {
    let base = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("captcha-digits");
    match sub {
        Some(sub) => base.join(sub),
        None => base,
    }
}

/// Return `dir/filename`, downloading it from `url` first if it is missing
pub fn ensure_cached(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, CaptchaError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        CaptchaError::Initialization(format!("Failed to create cache directory: {}", e))
    })?;

    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::info!("Using cached {} from {:?}", filename, dir);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
fn download_file(url: &str, path: &Path) -> Result<(), CaptchaError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| CaptchaError::Initialization(format!("Failed to download {}: {}", url, e)))?;

    let buffer = response.into_body().read_to_vec().map_err(|e| {
        CaptchaError::Initialization(format!("Failed to read download response: {}", e))
    })?;

    // Only a complete download gets the final name
    let partial = partial_path(path);
    let mut file = File::create(&partial).map_err(|e| {
        CaptchaError::Initialization(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        CaptchaError::Initialization(format!("Failed to write {:?}: {}", partial, e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        CaptchaError::Initialization(format!("Failed to store {:?}: {}", path, e))
    })?;

    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
