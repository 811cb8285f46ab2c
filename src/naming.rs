use anyhow::{Context, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const TEMP_BASE_NAME: &str = "timelapse-temp";
const SAVE_BASE_NAME: &str = "timelapse-save";
const EXTENSION: &str = ".mp4";

/// Pick `<parent>/<base>-<random><ext>` that does not exist yet
pub fn next_name(parent: &Path, base: &str, extension: &str) -> Result<PathBuf> {
    let parent = std::path::absolute(parent)
        .with_context(|| format!("Failed to resolve directory: {:?}", parent))?;

    loop {
        let candidate = parent.join(format!("{}-{}{}", base, random_suffix(), extension));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
}

/// Fresh capture path in the OS temp directory
pub fn temporary_recording_file() -> Result<PathBuf> {
    next_name(&std::env::temp_dir(), TEMP_BASE_NAME, EXTENSION)
}

/// Fresh save path in `save_dir`, creating the directory if needed
pub fn new_save_file(save_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(save_dir)
        .with_context(|| format!("Failed to create save directory: {:?}", save_dir))?;

    next_name(save_dir, SAVE_BASE_NAME, EXTENSION)
}

fn random_suffix() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);

    let mut suffix = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(suffix, "{:02x}", byte);
    }
    suffix
}
