use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use coal_signoff::form::decode::{media_type_for, Upload};

pub const IMAGE_FILTER: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Read picked files. The media type comes from the extension, as a
/// browser file input would report it.
pub fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths.iter().map(|p| read_upload(p)).collect()
}

pub fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_string();
    let media_type = media_type_for(&file_name).unwrap_or("application/octet-stream");
    Ok(Upload::new(file_name, media_type, bytes))
}

pub fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
