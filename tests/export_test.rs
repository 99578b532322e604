//! PDF出力の統合テスト

use chrono::NaiveDate;
use coal_signoff::config::Config;
use coal_signoff::export::{export_report, render_report, PdfQuality};
use coal_signoff::form::{FormStore, Upload};
use coal_signoff::pointer::SurfacePoint;
use coal_signoff::signature::StrokeRecorder;
use image::{ImageFormat, Rgb, RgbImage};
use signoff_common::{compose, find_template, SignatureRole, Status};
use std::io::Cursor;
use tempfile::tempdir;

fn png_upload(name: &str, width: u32, height: u32) -> Upload {
    let img = RgbImage::from_pixel(width, height, Rgb([90, 120, 150]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode png");
    Upload::new(name, "image/png", bytes)
}

fn signed_store(template: &str) -> FormStore {
    let mut store = FormStore::new(find_template(template).expect("template"));
    for role in SignatureRole::ALL {
        let mut recorder = StrokeRecorder::default();
        recorder.begin(SurfacePoint::new(20.0, 90.0));
        recorder.extend(SurfacePoint::new(180.0, 40.0));
        recorder.extend(SurfacePoint::new(320.0, 120.0));
        let update = recorder.end().expect("encode").expect("stroke");
        store.set_signature(role, update);
    }
    store
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 7).expect("date")
}

fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

#[test]
fn test_export_with_zero_to_three_photos() {
    let dir = tempdir().expect("Failed to create temp dir");

    for count in 0..=3 {
        let mut store = signed_store("floor");
        store.add_uploads((0..count).map(|i| png_upload(&format!("{i}.png"), 64, 48)).collect());
        assert_eq!(store.photos().len(), count);

        let out = dir.path().join(format!("photos_{count}"));
        let result = export_report(&store, &Config::default(), &out, date(), PdfQuality::Low);
        assert!(result.is_ok(), "PDF生成に失敗 ({}枚): {:?}", count, result.err());

        let path = result.unwrap();
        let bytes = std::fs::read(&path).expect("read pdf");
        assert!(is_pdf(&bytes), "PDFヘッダーがない");
    }
}

#[test]
fn test_export_with_empty_answers() {
    let store = FormStore::new(find_template("combined").expect("combined"));
    assert!(store.answers().values().all(|a| !a.status.is_set()));

    let bytes = render_report(&store, &Config::default(), PdfQuality::Medium).expect("render");
    assert!(is_pdf(&bytes));

    // 全項目の行があり、ステータス欄はプレースホルダー
    let plan = compose(&store.report_input());
    let dashes = plan.texts().filter(|t| t.text == "-").count();
    assert_eq!(dashes, store.template().item_count() * 2);
}

#[test]
fn test_export_survives_corrupt_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    let mut store = signed_store("roof");
    store.add_uploads(vec![
        Upload::new("broken.jpg", "image/jpeg", b"not really a jpeg".to_vec()),
        png_upload("ok.png", 40, 30),
    ]);
    assert_eq!(store.photos().len(), 2);
    assert!(!store.photos()[0].is_decoded());

    let config = Config {
        logo_left: Some(dir.path().join("missing_logo.png")),
        ..Config::default()
    };
    let result = export_report(&store, &config, dir.path(), date(), PdfQuality::High);
    assert!(result.is_ok(), "画像エラーで中断された: {:?}", result.err());
}

#[test]
fn test_export_with_logos_and_long_remarks() {
    let dir = tempdir().expect("Failed to create temp dir");
    let logo = dir.path().join("logo.png");
    RgbImage::from_pixel(50, 30, Rgb([200, 30, 30]))
        .save(&logo)
        .expect("save logo");

    let mut store = signed_store("combined");
    let ids: Vec<String> = store.template().items().map(|i| i.id.clone()).collect();
    for (i, id) in ids.iter().enumerate() {
        store.set_status(id, Status::CHOICES[i % 3]).unwrap();
        store
            .set_remark(id, "Remark panjang untuk menguji pembungkusan teks di kolom keterangan. ".repeat(3))
            .unwrap();
    }
    store.set_field("photoNote", "Catatan foto ".repeat(40));

    let config = Config {
        logo_left: Some(logo.clone()),
        logo_right: Some(logo),
        ..Config::default()
    };
    let plan = compose(&store.report_input());
    assert!(plan.page_count() > 1);

    let bytes = render_report(&store, &config, PdfQuality::Medium).expect("render");
    assert!(is_pdf(&bytes));
}

#[test]
fn test_export_file_name_pattern() {
    let dir = tempdir().expect("Failed to create temp dir");

    for key in ["floor", "roof", "combined"] {
        let store = FormStore::new(find_template(key).expect("template"));
        let path = export_report(&store, &Config::default(), dir.path(), date(), PdfQuality::Low)
            .expect("export");
        let name = path.file_name().and_then(|n| n.to_str()).expect("file name");

        // 空白は "_"、パス区切りなどは "-"
        let expected_title = store
            .template()
            .title
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "-");
        assert_eq!(name, format!("{}_2025-03-07.pdf", expected_title));
        assert!(!name.contains(char::is_whitespace));
        assert_eq!(path.parent(), Some(dir.path()));
    }

    let roof = FormStore::new(find_template("roof").expect("roof"));
    let path = export_report(&roof, &Config::default(), dir.path(), date(), PdfQuality::Low).expect("export");
    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some("Berita_Acara_Expose_-_Roof_Inspection_2025-03-07.pdf")
    );
}

#[test]
fn test_pdf_quality_options() {
    let mut store = FormStore::new(find_template("floor").expect("floor"));
    store.add_uploads(vec![png_upload("big.png", 1600, 900)]);

    for quality in [PdfQuality::Low, PdfQuality::Medium, PdfQuality::High] {
        let bytes = render_report(&store, &Config::default(), quality);
        assert!(bytes.is_ok(), "品質 {} で失敗: {:?}", quality, bytes.err());
    }
}
