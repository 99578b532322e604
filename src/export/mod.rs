pub mod pdf;

use crate::config::Config;
use crate::error::Result;
use crate::form::FormStore;
use chrono::NaiveDate;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use signoff_common::export::pdf_core::ImageSlot;
use signoff_common::{compose, report_file_name, SignatureRole, Template};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfQuality {
    /// 高品質: 1400px
    High,
    /// 中品質: 800px（デフォルト）
    #[default]
    Medium,
    /// 低品質: 500px
    Low,
}

impl PdfQuality {
    /// 最大ピクセル幅
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}

/// Decoded images for every [`ImageSlot`] of a plan. `None` means the
/// slot degrades to its fallback.
#[derive(Debug, Clone, Default)]
pub struct ReportAssets {
    pub logo_left: Option<DynamicImage>,
    pub logo_right: Option<DynamicImage>,
    pub photos: Vec<Option<DynamicImage>>,
    /// `SignatureRole::index()` 順
    pub signatures: [Option<DynamicImage>; 3],
}

impl ReportAssets {
    pub fn collect(store: &FormStore, config: &Config) -> Self {
        let mut signatures: [Option<DynamicImage>; 3] = Default::default();
        for role in SignatureRole::ALL {
            if let Some(sig) = store.signatures().get(role) {
                match sig.decode() {
                    Ok(img) => signatures[role.index()] = Some(img),
                    Err(e) => tracing::warn!(role = role.key(), error = %e, "signature not decodable"),
                }
            }
        }

        Self {
            logo_left: config.logo_left.as_deref().and_then(load_logo),
            logo_right: config.logo_right.as_deref().and_then(load_logo),
            photos: store.photos().iter().map(|p| p.decoded.clone()).collect(),
            signatures,
        }
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&DynamicImage> {
        match slot {
            ImageSlot::LogoLeft => self.logo_left.as_ref(),
            ImageSlot::LogoRight => self.logo_right.as_ref(),
            ImageSlot::Photo(i) => self.photos.get(i).and_then(Option::as_ref),
            ImageSlot::Signature(role) => self.signatures[role.index()].as_ref(),
        }
    }
}

fn load_logo(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(img) => Some(img),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "logo not loaded");
            None
        }
    }
}

/// `<title>_<YYYY-MM-DD>.pdf`
pub fn output_file_name(template: &Template, date: NaiveDate) -> String {
    report_file_name(&template.title, &date.format("%Y-%m-%d").to_string())
}

/// Compose and render the report to PDF bytes.
pub fn render_report(store: &FormStore, config: &Config, pdf_quality: PdfQuality) -> Result<Vec<u8>> {
    let plan = compose(&store.report_input());
    tracing::info!(
        template = %store.template().key,
        pages = plan.page_count(),
        photos = store.photos().len(),
        "composing report"
    );
    let assets = ReportAssets::collect(store, config);
    pdf::render_pdf(&plan, &assets, pdf_quality)
}

/// Render and write `<output_dir>/<title>_<date>.pdf`. Returns the written path.
pub fn export_report(
    store: &FormStore,
    config: &Config,
    output_dir: &Path,
    date: NaiveDate,
    pdf_quality: PdfQuality,
) -> Result<PathBuf> {
    let bytes = render_report(store, config, pdf_quality)?;

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(output_file_name(store.template(), date));
    std::fs::write(&output_path, bytes)?;
    Ok(output_path)
}
