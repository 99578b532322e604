//! アップロードされた画像の受け入れ判定とデコード

use std::path::Path;

use image::DynamicImage;

use crate::error::{Result, SignoffError};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// One selected file, as handed over by a file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    /// 宣言されたメディアタイプ（空なら拡張子から推定）
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SignoffError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self {
            media_type: media_type_for(&file_name).unwrap_or_default().to_string(),
            file_name,
            bytes,
        })
    }

    /// Image acceptance check. Only the declared type is inspected; the
    /// content is not sniffed.
    pub fn is_image(&self) -> bool {
        let declared = self.media_type.trim();
        if declared.is_empty() {
            return media_type_for(&self.file_name).is_some();
        }
        declared.to_ascii_lowercase().starts_with("image/")
    }
}

/// 拡張子からメディアタイプを推定
pub fn media_type_for(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())?;
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "image/webp",
    })
}

/// Original blob plus its decoded form. `decoded` is `None` when the data
/// could not be decoded; the entry is still kept and degrades to a
/// placeholder at export.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub decoded: Option<DynamicImage>,
}

impl StoredImage {
    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }
}

pub fn decode_upload(upload: Upload) -> StoredImage {
    let decoded = match image::load_from_memory(&upload.bytes) {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(file = %upload.file_name, error = %e, "image decode failed");
            None
        }
    };
    StoredImage {
        file_name: upload.file_name,
        media_type: upload.media_type,
        bytes: upload.bytes,
        decoded,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_is_image_by_media_type() {
        assert!(Upload::new("a.bin", "image/jpeg", vec![]).is_image());
        assert!(Upload::new("a.bin", "IMAGE/PNG", vec![]).is_image());
        assert!(!Upload::new("a.png", "application/pdf", vec![]).is_image());
        assert!(!Upload::new("notes.txt", "text/plain", vec![]).is_image());
    }

    #[test]
    fn test_is_image_guesses_from_extension() {
        assert!(Upload::new("IMG_0001.JPG", "", vec![]).is_image());
        assert!(!Upload::new("readme", "", vec![]).is_image());
        assert_eq!(media_type_for("x.webp"), Some("image/webp"));
        assert_eq!(media_type_for("x.tiff"), None);
    }

    #[test]
    fn test_decode_keeps_original_bytes() {
        let upload = png_upload("a.png", 128);
        let bytes = upload.bytes.clone();
        let stored = decode_upload(upload);
        assert!(stored.is_decoded());
        assert_eq!(stored.bytes, bytes);
        assert_eq!(stored.decoded.as_ref().map(|d| d.width()), Some(8));
    }

    #[test]
    fn test_corrupt_image_is_kept_undecoded() {
        let stored = decode_upload(Upload::new("bad.jpg", "image/jpeg", b"garbage".to_vec()));
        assert!(!stored.is_decoded());
        assert_eq!(stored.file_name, "bad.jpg");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = Upload::from_path(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, SignoffError::FileNotFound(_)));
    }
}
