use crate::error::{Result, SignoffError};
use crate::export::PdfQuality;
use serde::{Deserialize, Serialize};
use signoff_common::FormFields;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// ヘッダー左のロゴ画像
    pub logo_left: Option<PathBuf>,
    /// ヘッダー右のロゴ画像
    pub logo_right: Option<PathBuf>,
    /// PDFの出力先（未指定ならカレント）
    pub output_dir: Option<PathBuf>,
    pub pdf_quality: PdfQuality,
    /// 新しいフォームに入れておく既定値（project, preparedBy など）
    pub default_fields: BTreeMap<String, String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SignoffError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("coal-signoff").join("config.json"))
    }

    /// Built-in defaults overlaid with `default_fields`.
    pub fn initial_fields(&self) -> FormFields {
        let mut fields = FormFields::default();
        fields.merge(&FormFields::from(self.default_fields.clone()));
        fields
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{ "logoLeft": null, "pdf_quality": "low" }"#)
            .expect("parse config");
        assert!(config.logo_left.is_none());
        assert!(matches!(config.pdf_quality, PdfQuality::Low));
        assert!(config.default_fields.is_empty());
    }

    #[test]
    fn test_initial_fields_overlay() {
        let mut config = Config::default();
        config
            .default_fields
            .insert("project".to_string(), "Rantau North".to_string());
        let fields = config.initial_fields();
        assert_eq!(fields.get("project"), "Rantau North");
        assert_eq!(fields.get("preparedBy"), "Engineering KPP");
    }

    #[test]
    fn test_output_dir_default() {
        assert_eq!(Config::default().output_dir(), PathBuf::from("."));
    }
}
