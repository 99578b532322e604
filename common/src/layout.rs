//! レイアウト設定モジュール
//!
//! mm基準のレイアウト定義（Source of Truth）。
//! 座標はすべてページ左上を原点としたmm値で、PDF描画側で反転する。

// ============================================
// ページ・余白（mm）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

pub const MARGIN_MM: f32 = 14.0;
pub const USABLE_WIDTH_MM: f32 = A4_WIDTH_MM - MARGIN_MM * 2.0; // 182mm

/// 本文の下限（これより下は次ページ）
pub const CONTENT_BOTTOM_MM: f32 = A4_HEIGHT_MM - MARGIN_MM;
/// 2ページ目以降の開始位置
pub const CONTINUATION_TOP_MM: f32 = MARGIN_MM;

/// ページ番号のベースライン
pub const FOOTER_Y_MM: f32 = A4_HEIGHT_MM - 10.0;
pub const FOOTER_FONT_PT: f32 = 8.0;

// ============================================
// ヘッダー
// ============================================

pub const LOGO_Y_MM: f32 = 8.0;
pub const LOGO_WIDTH_MM: f32 = 25.0;
pub const LOGO_HEIGHT_MM: f32 = 15.0;
pub const LOGO_LEFT_X_MM: f32 = MARGIN_MM;
pub const LOGO_RIGHT_X_MM: f32 = A4_WIDTH_MM - MARGIN_MM - LOGO_WIDTH_MM;
pub const LOGO_LEFT_FALLBACK: &str = "[LOGO BRE]";
pub const LOGO_RIGHT_FALLBACK: &str = "[LOGO KPP]";

pub const TITLE_Y_MM: f32 = 18.0;
pub const TITLE_FONT_PT: f32 = 14.0;
pub const SUBTITLE_Y_MM: f32 = 25.0;
pub const SUBTITLE_LINE_MM: f32 = 5.0;
pub const SUBTITLE_FONT_PT: f32 = 12.0;

pub const META_Y_MM: f32 = 40.0;
pub const META_LINE_MM: f32 = 4.0;
pub const META_FONT_PT: f32 = 9.0;
pub const META_RIGHT_X_MM: f32 = A4_WIDTH_MM - MARGIN_MM - 50.0;
/// 未入力欄の代わりに出力する下線
pub const BLANK_VALUE: &str = "___________";

pub const LEGEND_Y_MM: f32 = 65.0;
pub const LEGEND_INDENT_MM: f32 = 5.0;

// ============================================
// チェック表
// ============================================

pub const TABLE_Y_MM: f32 = 85.0;
pub const TABLE_FONT_PT: f32 = 7.0;
pub const TABLE_PADDING_MM: f32 = 1.5;
pub const TABLE_LINE_WIDTH_MM: f32 = 0.1;
pub const HEADER_GRAY: f32 = 220.0 / 255.0;

/// 列幅（mm）: No / Check List Items / ENG KPP / PRO KPP / BRE / Remark
pub const CHECKLIST_COLUMNS_MM: [f32; 6] = [8.0, 85.0, 12.0, 12.0, 12.0, 48.0];

pub const CHECKLIST_HEADERS: [&str; 6] = [
    "No",
    "Check List Items",
    "ENG KPP",
    "PRO KPP",
    "BRE",
    "Remark/ Keterangan",
];

// ============================================
// 写真欄
// ============================================

pub const PHOTO_SECTION_GAP_MM: f32 = 3.0;
pub const PHOTO_SECTION_TITLE: &str = "Foto Floor Batubara";
pub const PHOTO_HEADERS: [&str; 2] = ["Foto Floor Batubara", "Note"];
pub const PHOTO_HEADER_COLUMNS_MM: [f32; 2] = [100.0, 80.0];
pub const PHOTO_HEADER_HEIGHT_MM: f32 = 6.0;
pub const PHOTO_HEADER_FONT_PT: f32 = 6.0;
/// 写真と写真の間隔
pub const PHOTO_GAP_MM: f32 = 5.0;
/// 写真欄として確保する高さ（ヘッダー下から）
pub const PHOTO_AREA_HEIGHT_MM: f32 = 25.0;
pub const MAX_GENERAL_PHOTOS: usize = 3;
pub const NO_PHOTO_TEXT: &str = "Belum ada foto";
pub const PHOTO_ERROR_TEXT: &str = "Error loading photo";

pub const NOTE_X_MM: f32 = MARGIN_MM + 115.0;
pub const NOTE_WRAP_MM: f32 = 65.0;
pub const NOTE_FONT_PT: f32 = 7.0;

// ============================================
// 署名欄
// ============================================

pub const SIGNATURE_HEADING: &str = "Tanda Tangan";
pub const SIGNATURE_GAP_MM: f32 = 5.0;
pub const SIGNATURE_CELL_WIDTH_MM: f32 = (A4_WIDTH_MM - MARGIN_MM * 2.0 - 10.0) / 3.0;
pub const SIGNATURE_IMAGE_HEIGHT_MM: f32 = 12.0;
/// 見出しから署名欄末尾までの高さ
pub const SIGNATURE_BLOCK_HEIGHT_MM: f32 = 32.0;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// 行間係数
pub const LINE_HEIGHT_FACTOR: f32 = 1.15;

#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}

/// 1行の高さ（mm）
#[inline]
pub fn line_height_mm(size_pt: f32) -> f32 {
    pt_to_mm(size_pt) * LINE_HEIGHT_FACTOR
}

// ============================================
// 文字幅（Helvetica近似）
// ============================================

/// Helvetica advance widths for ASCII 0x20..=0x7E, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const BOLD_FACTOR: f32 = 1.07;

fn char_width_units(c: char) -> u16 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        HELVETICA_WIDTHS[(code - 0x20) as usize]
    } else {
        556
    }
}

/// Approximate rendered width of `text` in mm.
pub fn text_width_mm(text: &str, size_pt: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(|c| char_width_units(c) as u32).sum();
    let width = pt_to_mm(units as f32 / 1000.0 * size_pt);
    if bold {
        width * BOLD_FACTOR
    } else {
        width
    }
}

/// Split `text` into lines no wider than `width_mm`.
///
/// Explicit newlines always break. Words wider than the column are broken
/// by character.
pub fn wrap_text(text: &str, width_mm: f32, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if text_width_mm(&candidate, size_pt, false) <= width_mm {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width_mm(word, size_pt, false) <= width_mm {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width_mm(&current, size_pt, false) > width_mm && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

// ============================================
// 写真ギャラリー
// ============================================

/// 写真の配置（ギャラリー左端からのオフセット付き）
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoGallery {
    pub photo_width_mm: f32,
    pub photo_height_mm: f32,
    /// 各写真の左端X座標（mm）
    pub xs_mm: Vec<f32>,
}

impl PhotoGallery {
    pub fn total_width_mm(&self) -> f32 {
        let n = self.xs_mm.len() as f32;
        if n == 0.0 {
            0.0
        } else {
            self.photo_width_mm * n + PHOTO_GAP_MM * (n - 1.0)
        }
    }
}

/// 写真サイズ: 枚数が多いほど小さくする
pub fn photo_size_mm(count: usize) -> (f32, f32) {
    match count.min(MAX_GENERAL_PHOTOS) {
        0 | 1 => (45.0, 25.0),
        2 => (35.0, 25.0),
        _ => (25.0, 20.0),
    }
}

/// Lay out `count` photos (clamped to 3) centred under the left photo
/// header column.
pub fn photo_gallery(count: usize) -> PhotoGallery {
    let count = count.min(MAX_GENERAL_PHOTOS);
    let (w, h) = photo_size_mm(count);
    let center = MARGIN_MM + PHOTO_HEADER_COLUMNS_MM[0] / 2.0;
    let total = if count == 0 {
        0.0
    } else {
        w * count as f32 + PHOTO_GAP_MM * (count as f32 - 1.0)
    };
    let start = center - total / 2.0;

    PhotoGallery {
        photo_width_mm: w,
        photo_height_mm: h,
        xs_mm: (0..count).map(|i| start + i as f32 * (w + PHOTO_GAP_MM)).collect(),
    }
}

/// 署名欄のX座標
pub fn signature_cell_x_mm(index: usize) -> f32 {
    MARGIN_MM + index as f32 * (SIGNATURE_CELL_WIDTH_MM + SIGNATURE_GAP_MM)
}

/// 列の左端X座標
pub fn column_x_mm(widths: &[f32], index: usize) -> f32 {
    MARGIN_MM + widths.iter().take(index).sum::<f32>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        assert!((USABLE_WIDTH_MM - 182.0).abs() < 0.01);
        let table: f32 = CHECKLIST_COLUMNS_MM.iter().sum();
        assert!(table <= USABLE_WIDTH_MM);
        let photo: f32 = PHOTO_HEADER_COLUMNS_MM.iter().sum();
        assert!(photo <= USABLE_WIDTH_MM);
        assert!((SIGNATURE_CELL_WIDTH_MM - 57.33).abs() < 0.01);
    }

    #[test]
    fn test_conversion() {
        assert!((MM_TO_PT - 2.835).abs() < 0.01);
        assert!((mm_to_pt(10.0) - 28.35).abs() < 0.1);
        assert!((pt_to_mm(mm_to_pt(12.5)) - 12.5).abs() < 0.001);
    }

    #[test]
    fn test_text_width_scales_with_size() {
        let small = text_width_mm("Foto Floor", 6.0, false);
        let large = text_width_mm("Foto Floor", 12.0, false);
        assert!((large - small * 2.0).abs() < 0.001);
        assert!(text_width_mm("Foto", 9.0, true) > text_width_mm("Foto", 9.0, false));
        assert_eq!(text_width_mm("", 9.0, false), 0.0);
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "Survey data for coal floor have been taken by surveyor (marked with tape)";
        let lines = wrap_text(text, 30.0, 7.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width_mm(line, 7.0, false) <= 30.0, "too wide: {}", line);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_explicit_newlines() {
        let lines = wrap_text("first\nsecond", 100.0, 7.0);
        assert_eq!(lines, vec!["first", "second"]);
        assert_eq!(wrap_text("", 100.0, 7.0), vec![String::new()]);
    }

    #[test]
    fn test_wrap_text_breaks_long_words() {
        let lines = wrap_text(&"W".repeat(60), 20.0, 7.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 60);
    }

    #[test]
    fn test_photo_size_shrinks_with_count() {
        let one = photo_gallery(1);
        let two = photo_gallery(2);
        let three = photo_gallery(3);
        assert!(one.photo_width_mm >= two.photo_width_mm);
        assert!(two.photo_width_mm >= three.photo_width_mm);
        assert_eq!(photo_gallery(7), three);
        assert!(photo_gallery(0).xs_mm.is_empty());
    }

    #[test]
    fn test_photo_gallery_centered_without_overlap() {
        let center = MARGIN_MM + PHOTO_HEADER_COLUMNS_MM[0] / 2.0;
        for count in 1..=3 {
            let gallery = photo_gallery(count);
            assert_eq!(gallery.xs_mm.len(), count);
            for pair in gallery.xs_mm.windows(2) {
                assert!(pair[0] + gallery.photo_width_mm <= pair[1]);
            }
            let left = gallery.xs_mm[0];
            let right = gallery.xs_mm[count - 1] + gallery.photo_width_mm;
            assert!(((left + right) / 2.0 - center).abs() < 0.001);
            assert!((right - left - gallery.total_width_mm()).abs() < 0.001);
        }
    }

    #[test]
    fn test_signature_cells_fit_page() {
        let last = signature_cell_x_mm(2) + SIGNATURE_CELL_WIDTH_MM;
        assert!(last <= A4_WIDTH_MM - MARGIN_MM + 0.01);
    }

    #[test]
    fn test_column_x() {
        assert_eq!(column_x_mm(&CHECKLIST_COLUMNS_MM, 0), MARGIN_MM);
        assert_eq!(column_x_mm(&CHECKLIST_COLUMNS_MM, 2), MARGIN_MM + 93.0);
    }
}
