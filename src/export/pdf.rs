//! printpdf による描画
//!
//! `DocumentPlan` の座標は上端基準のmm。PDFは下端基準なのでここで反転する。

use super::{PdfQuality, ReportAssets};
use crate::error::{Result, SignoffError};
use ::image::{DynamicImage, GenericImageView, Rgba, RgbImage};
use printpdf::path::PaintMode;
use printpdf::*;
use signoff_common::export::pdf_core::{
    Align, DocumentPlan, DrawOp, Fallback, ImageOp, LineOp, RectOp, TextOp,
};
use signoff_common::layout::text_width_mm;
use std::io::BufWriter;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

pub fn render_pdf(plan: &DocumentPlan, assets: &ReportAssets, quality: PdfQuality) -> Result<Vec<u8>> {
    let page_w = plan.page_width_mm;
    let page_h = plan.page_height_mm;
    let (doc, page1, layer1) = PdfDocument::new(&plan.title, Mm(page_w), Mm(page_h), "Layer 1");

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SignoffError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SignoffError::PdfGeneration(format!("フォント追加エラー: {:?}", e)))?,
    };

    for (index, page) in plan.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (p, l) = doc.add_page(Mm(page_w), Mm(page_h), "Layer 1");
            doc.get_page(p).get_layer(l)
        };

        for op in &page.ops {
            match op {
                DrawOp::Text(t) => draw_text(&layer, &fonts, t, page_h),
                DrawOp::Line(l) => draw_line(&layer, l, page_h),
                DrawOp::Rect(r) => draw_rect(&layer, r, page_h),
                DrawOp::Image(img) => draw_image(&layer, &fonts, img, assets, quality, page_h),
            }
        }
    }

    // 保存
    let mut writer = BufWriter::new(Vec::new());
    doc.save(&mut writer)
        .map_err(|e| SignoffError::PdfGeneration(format!("PDF保存エラー: {:?}", e)))?;
    writer
        .into_inner()
        .map_err(|e| SignoffError::PdfGeneration(format!("PDF保存エラー: {}", e)))
}

// ============================================
// 基本図形
// ============================================

/// Built-in fonts only cover WinAnsi; keep the text plain ASCII.
fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '–' | '—' => '-',
            '‘' | '’' => '\'',
            '“' | '”' => '"',
            c if c.is_ascii() => c,
            _ => '?',
        })
        .collect()
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, op: &TextOp, page_h: f32) {
    let text = pdf_text(&op.text);
    let width = text_width_mm(&text, op.size, op.bold);
    let x = match op.align {
        Align::Left => op.x,
        Align::Center => op.x - width / 2.0,
        Align::Right => op.x - width,
    };
    let font = if op.bold { &fonts.bold } else { &fonts.regular };
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.use_text(text, op.size, Mm(x), Mm(page_h - op.y), font);
}

fn draw_line(layer: &PdfLayerReference, op: &LineOp, page_h: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(signoff_common::layout::mm_to_pt(op.width));
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(op.x1), Mm(page_h - op.y1)), false),
            (Point::new(Mm(op.x2), Mm(page_h - op.y2)), false),
        ],
        is_closed: false,
    });
}

fn draw_rect(layer: &PdfLayerReference, op: &RectOp, page_h: f32) {
    let bottom = page_h - op.y - op.h;
    let top = page_h - op.y;

    if let Some(gray) = op.fill_gray {
        layer.set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
        layer.add_rect(
            Rect::new(Mm(op.x), Mm(bottom), Mm(op.x + op.w), Mm(top)).with_mode(PaintMode::Fill),
        );
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    }

    if let Some(stroke) = op.stroke_mm {
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(signoff_common::layout::mm_to_pt(stroke));
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(op.x), Mm(bottom)), false),
                (Point::new(Mm(op.x + op.w), Mm(bottom)), false),
                (Point::new(Mm(op.x + op.w), Mm(top)), false),
                (Point::new(Mm(op.x), Mm(top)), false),
            ],
            is_closed: true,
        });
    }
}

// ============================================
// 画像
// ============================================

fn draw_image(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    op: &ImageOp,
    assets: &ReportAssets,
    quality: PdfQuality,
    page_h: f32,
) {
    let placed = match assets.get(op.slot) {
        Some(img) => place_image(layer, img, op, quality, page_h),
        None => false,
    };
    if placed {
        return;
    }

    tracing::warn!(slot = ?op.slot, "image unavailable, drawing placeholder");
    match &op.fallback {
        Fallback::Text(t) => draw_text(layer, fonts, t, page_h),
        Fallback::Line(l) => draw_line(layer, l, page_h),
    }
}

/// Stretch the image to the planned box. Returns false when the image has
/// no pixels or the box is degenerate.
fn place_image(
    layer: &PdfLayerReference,
    img: &DynamicImage,
    op: &ImageOp,
    quality: PdfQuality,
    page_h: f32,
) -> bool {
    if op.w <= 0.0 || op.h <= 0.0 {
        return false;
    }
    let rgb = flatten_on_white(&downscale(img, quality.max_width()));
    let (width_px, height_px) = rgb.dimensions();
    if width_px == 0 || height_px == 0 {
        return false;
    }

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4) で幅を合わせ、高さは縦倍率で合わせる
    let dpi = width_px as f32 / (op.w / 25.4);
    let natural_h_mm = height_px as f32 / dpi * 25.4;

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(op.x)),
            translate_y: Some(Mm(page_h - op.y - op.h)),
            dpi: Some(dpi),
            scale_y: Some(op.h / natural_h_mm),
            ..Default::default()
        },
    );
    true
}

fn downscale(img: &DynamicImage, max_width: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_width {
        return img.clone();
    }
    let new_height = ((height as f64) * (max_width as f64) / (width as f64)).round().max(1.0) as u32;
    img.resize_exact(max_width, new_height, ::image::imageops::FilterType::Triangle)
}

/// 透過部分を白背景で合成
fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let over = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, ::image::Rgb([over(r), over(g), over(b)]));
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::RgbaImage;

    #[test]
    fn test_pdf_text_is_ascii() {
        assert_eq!(pdf_text("PT BRE – PT KPP"), "PT BRE - PT KPP");
        assert_eq!(pdf_text("Daftar periksa ✓"), "Daftar periksa ?");
        assert!(pdf_text("héllo").is_ascii());
    }

    #[test]
    fn test_flatten_transparent_to_white() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0])));
        let rgb = flatten_on_white(&img);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_render_filled_and_stroked_cells() {
        use signoff_common::export::pdf_core::PagePlan;

        let cell = |fill_gray, stroke_mm| {
            DrawOp::Rect(RectOp {
                x: 14.0,
                y: 85.0,
                w: 30.0,
                h: 8.0,
                fill_gray,
                stroke_mm,
            })
        };
        let plan = DocumentPlan {
            title: "Cells".to_string(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            pages: vec![PagePlan {
                ops: vec![
                    cell(Some(0.9), Some(0.1)),
                    cell(None, Some(0.1)),
                    cell(Some(0.5), None),
                    DrawOp::Line(LineOp { x1: 20.0, y1: 200.0, x2: 80.0, y2: 200.0, width: 0.2 }),
                    DrawOp::Text(TextOp {
                        x: 105.0,
                        y: 18.0,
                        size: 14.0,
                        bold: true,
                        align: Align::Center,
                        text: "Judul".to_string(),
                    }),
                ],
            }],
        };

        let bytes = render_pdf(&plan, &ReportAssets::default(), PdfQuality::Low).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_downscale_respects_max_width() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(1000, 500));
        let small = downscale(&img, 500);
        assert_eq!(small.dimensions(), (500, 250));
        let kept = downscale(&img, 1400);
        assert_eq!(kept.dimensions(), (1000, 500));
    }
}
