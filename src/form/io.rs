//! フォームのJSONファイル入出力
//!
//! CLIの `init` / `export` が使う。画像はパスで参照し、相対パスは
//! JSONファイルのあるディレクトリを基準に解決する。

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use signoff_common::{find_template, FormFields, SignatureRole, Status, Template};

use super::decode::Upload;
use super::{intake, FormStore};
use crate::error::{Result, SignoffError};
use crate::signature::{EncodedSignature, SignatureUpdate};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnswerEntry {
    pub status: Status,
    pub remark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFile {
    pub template: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerEntry>,
    #[serde(default)]
    pub photos: Vec<PathBuf>,
    /// role → PNGファイルのパス、または `data:image/png;base64,...`
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,
}

/// Skeleton for `template`: every item listed with an empty answer.
pub fn blank_form_file(template: &Template, fields: &FormFields) -> FormFile {
    FormFile {
        template: template.key.clone(),
        fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        answers: template
            .items()
            .map(|item| (item.id.clone(), AnswerEntry::default()))
            .collect(),
        photos: Vec::new(),
        signatures: SignatureRole::ALL
            .iter()
            .map(|role| (role.key().to_string(), String::new()))
            .collect(),
    }
}

pub fn write_form_file(path: &Path, file: &FormFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(file)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read_form_file(path: &Path) -> Result<FormFile> {
    if !path.exists() {
        return Err(SignoffError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Build a store from a form file. `base_fields` are the defaults the file's
/// fields are written over.
///
/// Unknown templates, item ids and signature roles are errors. Missing or
/// undecodable images are logged and skipped.
pub async fn load_form_file(path: &Path, base_fields: FormFields) -> Result<FormStore> {
    let file = read_form_file(path)?;
    let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    build_store(file, &base_dir, base_fields).await
}

pub async fn build_store(file: FormFile, base_dir: &Path, base_fields: FormFields) -> Result<FormStore> {
    let template = find_template(&file.template)
        .ok_or_else(|| SignoffError::TemplateNotFound(file.template.clone()))?;
    let mut store = FormStore::with_fields(template, base_fields);

    for (name, value) in &file.fields {
        store.set_field(name, value.as_str());
    }

    for (id, entry) in file.answers {
        store.set_status(&id, entry.status)?;
        store.set_remark(&id, entry.remark)?;
        if let Some(evidence) = entry.evidence {
            if let Some(upload) = read_upload(&resolve(base_dir, &evidence)) {
                intake::attach_evidence(&mut store, &id, upload).await?;
            }
        }
    }

    let uploads = file
        .photos
        .iter()
        .filter_map(|p| read_upload(&resolve(base_dir, p)))
        .collect();
    intake::add_photos(&mut store, uploads).await;

    for (key, value) in &file.signatures {
        let role: SignatureRole = key.parse()?;
        if value.trim().is_empty() {
            continue;
        }
        match load_signature(value, base_dir) {
            Ok(sig) => store.set_signature(role, SignatureUpdate::Signed(sig)),
            Err(e) => tracing::warn!(role = role.key(), error = %e, "signature skipped"),
        }
    }

    Ok(store)
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}

fn read_upload(path: &Path) -> Option<Upload> {
    match Upload::from_path(path) {
        Ok(upload) => Some(upload),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "image skipped");
            None
        }
    }
}

/// Data URL or file path → PNG signature. Non-PNG images are re-encoded.
pub fn load_signature(value: &str, base_dir: &Path) -> Result<EncodedSignature> {
    let value = value.trim();
    let bytes = if let Some(rest) = value.strip_prefix("data:") {
        let (_, data) = rest
            .split_once(";base64,")
            .ok_or_else(|| SignoffError::InvalidSignature("base64のdata URLではありません".into()))?;
        STANDARD
            .decode(data.trim())
            .map_err(|e| SignoffError::InvalidSignature(e.to_string()))?
    } else {
        let path = resolve(base_dir, Path::new(value));
        if !path.exists() {
            return Err(SignoffError::FileNotFound(path.display().to_string()));
        }
        std::fs::read(&path)?
    };

    if let Ok(sig) = EncodedSignature::from_png(bytes.clone()) {
        return Ok(sig);
    }
    let image = image::load_from_memory(&bytes)
        .map_err(|e| SignoffError::ImageDecode(format!("署名: {}", e)))?;
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| SignoffError::ImageDecode(format!("署名PNG変換: {}", e)))?;
    EncodedSignature::from_png(png)
}

#[cfg(test)]
mod tests {
    use super::super::decode::test_support::png_bytes;
    use super::*;
    use tempfile::tempdir;

    fn floor() -> &'static Template {
        find_template("floor").expect("floor")
    }

    #[test]
    fn test_blank_form_lists_every_item() {
        let file = blank_form_file(floor(), &FormFields::default());
        assert_eq!(file.template, "floor");
        assert_eq!(file.answers.len(), floor().item_count());
        assert_eq!(file.signatures.len(), 3);
        assert_eq!(file.fields.get("preparedBy").map(String::as_str), Some("Engineering KPP"));
    }

    #[test]
    fn test_form_file_json_shape() {
        let json = r#"{
            "template": "roof",
            "fields": { "pit": "Pit 2" },
            "answers": { "A1": { "status": "Y", "remark": "clean" } },
            "photos": ["p1.jpg"]
        }"#;
        let file: FormFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.answers["A1"].status, Status::Yes);
        assert_eq!(file.answers["A1"].evidence, None);
        assert!(file.signatures.is_empty());
    }

    #[tokio::test]
    async fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), png_bytes(8, 8, 10)).unwrap();
        std::fs::write(dir.path().join("b.png"), png_bytes(8, 8, 20)).unwrap();
        std::fs::write(dir.path().join("sig.png"), png_bytes(35, 18, 255)).unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"not an image").unwrap();

        let mut file = blank_form_file(floor(), &FormFields::default());
        file.fields.insert("pit".into(), "Pit 7".into());
        file.answers.insert(
            "B1".into(),
            AnswerEntry {
                status: Status::NotAvailable,
                remark: "wet".into(),
                evidence: Some("a.png".into()),
            },
        );
        file.photos = vec!["a.png".into(), "readme.txt".into(), "missing.png".into(), "b.png".into()];
        file.signatures.insert("preparer".into(), "sig.png".into());
        let path = dir.path().join("form.json");
        write_form_file(&path, &file).unwrap();

        let store = load_form_file(&path, FormFields::default()).await.unwrap();
        assert_eq!(store.fields().get("pit"), "Pit 7");
        assert_eq!(store.answer("B1").unwrap().status, Status::NotAvailable);
        assert!(store.evidence("B1").is_some());
        let names: Vec<_> = store.photos().iter().map(|p| p.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(store.signatures().filled(), [false, true, false]);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_errors() {
        let dir = tempdir().unwrap();
        let mut file = blank_form_file(floor(), &FormFields::default());
        file.answers.insert("Z9".into(), AnswerEntry::default());
        let err = build_store(file, dir.path(), FormFields::default()).await.err();
        assert!(matches!(err, Some(SignoffError::UnknownItem(_))));

        let mut file = blank_form_file(floor(), &FormFields::default());
        file.template = "ceiling".into();
        let err = build_store(file, dir.path(), FormFields::default()).await.err();
        assert!(matches!(err, Some(SignoffError::TemplateNotFound(_))));

        let mut file = blank_form_file(floor(), &FormFields::default());
        file.signatures.insert("witness".into(), String::new());
        let err = build_store(file, dir.path(), FormFields::default()).await.err();
        assert!(matches!(
            err,
            Some(SignoffError::Common(signoff_common::Error::UnknownRole(_)))
        ));
    }

    #[test]
    fn test_signature_from_data_url() {
        let png = png_bytes(4, 4, 0);
        let url = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let sig = load_signature(&url, Path::new(".")).unwrap();
        assert_eq!(sig.as_png(), png.as_slice());
        assert!(load_signature("data:image/png,abc", Path::new(".")).is_err());
    }
}
