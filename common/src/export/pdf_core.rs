//! PDF export core shared by the CLI and the desktop form.
//!
//! フォームの状態から「描画命令のページ列」を組み立てる（純粋関数）。
//! PDFライブラリには依存せず、実際の描画はルートクレートの `export::pdf` が行う。

use std::collections::BTreeMap;

use crate::layout::*;
use crate::types::{
    AnswerRecord, FormFields, SignatureRole, Status, Template, FIELD_BLOCK, FIELD_DATE, FIELD_DAY,
    FIELD_PHOTO_NOTE, FIELD_RL, FIELD_SEAM, FIELD_TIME,
};

// ============================================
// 描画命令
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// `y` is the baseline, in mm from the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
    pub align: Align,
    pub text: String,
}

impl TextOp {
    /// Left edge after alignment.
    pub fn left_mm(&self) -> f32 {
        let width = text_width_mm(&self.text, self.size, self.bold);
        match self.align {
            Align::Left => self.x,
            Align::Center => self.x - width / 2.0,
            Align::Right => self.x - width,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineOp {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
}

/// 矩形（`y` は上辺）
#[derive(Debug, Clone, PartialEq)]
pub struct RectOp {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// グレー塗り（0.0=黒, 1.0=白）
    pub fill_gray: Option<f32>,
    /// 枠線の太さ（mm）
    pub stroke_mm: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    LogoLeft,
    LogoRight,
    Photo(usize),
    Signature(SignatureRole),
}

/// 画像が配置できなかった場合の代替描画
#[derive(Debug, Clone, PartialEq)]
pub enum Fallback {
    Text(TextOp),
    Line(LineOp),
}

/// 画像（`y` は上辺）
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOp {
    pub slot: ImageSlot,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub fallback: Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextOp),
    Line(LineOp),
    Rect(RectOp),
    Image(ImageOp),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePlan {
    pub ops: Vec<DrawOp>,
}

impl PagePlan {
    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(t) => Some(t),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageOp> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image(i) => Some(i),
            _ => None,
        })
    }
}

/// 固定サイズ（A4縦）のページ列
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPlan {
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub pages: Vec<PagePlan>,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageOp> {
        self.pages.iter().flat_map(|p| p.images())
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextOp> {
        self.pages.iter().flat_map(|p| p.texts())
    }
}

// ============================================
// 入力
// ============================================

/// Everything the compositor reads. Images are referenced by slot only;
/// the renderer resolves them.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub template: &'a Template,
    pub fields: &'a FormFields,
    pub answers: &'a BTreeMap<String, AnswerRecord>,
    pub photo_count: usize,
    /// `SignatureRole::index()` 順
    pub signed: [bool; 3],
}

/// 凡例（3行）
pub const LEGEND_TITLE: &str = "Give mark (Beri tanda):";
pub const LEGEND_LINES: [&str; 3] = [
    "Y (Yes) = Actual condition is accepted (Kondisi penambangan telah sesuai prosedur)",
    "N (No) = Actual condition is not accepted (Kondisi penambangan tidak sesuai prosedur)",
    "N/A (Not Available) = No description/data available (Tidak ada deskripsi yang tersedia)",
];

/// One row of the checklist table, before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistRow {
    pub number: usize,
    pub item_id: String,
    pub text: String,
    /// ENG KPP / PRO KPP / BRE
    pub status_cells: [String; 3],
    pub remark: String,
}

/// Status columns of one row.
///
/// The report has three reviewer columns but the form captures a single
/// status per item: ENG KPP and PRO KPP both print that status and BRE is
/// left blank for a handwritten mark.
pub fn checklist_status_cells(status: Status) -> [String; 3] {
    [status.mark().to_string(), status.mark().to_string(), String::new()]
}

/// Flatten the template into numbered rows (1..N, continuous across groups).
pub fn checklist_rows(template: &Template, answers: &BTreeMap<String, AnswerRecord>) -> Vec<ChecklistRow> {
    template
        .items()
        .enumerate()
        .map(|(i, item)| {
            let answer = answers.get(&item.id);
            let status = answer.map(|a| a.status).unwrap_or_default();
            ChecklistRow {
                number: i + 1,
                item_id: item.id.clone(),
                text: format!("{}\n{}", item.text, item.subtext),
                status_cells: checklist_status_cells(status),
                remark: answer.map(|a| a.remark.clone()).unwrap_or_default(),
            }
        })
        .collect()
}

/// "2025-03-07" → "07-03-2025"。それ以外の形式はそのまま返す
pub fn format_date_dmy(value: &str) -> String {
    let parts: Vec<&str> = value.trim().split('-').collect();
    let numeric = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_digit());
    if parts.len() == 3 && numeric(parts[0], 4) && numeric(parts[1], 2) && numeric(parts[2], 2) {
        format!("{}-{}-{}", parts[2], parts[1], parts[0])
    } else {
        value.to_string()
    }
}

/// `<title with whitespace runs as "_">_<YYYY-MM-DD>.pdf`
///
/// Path separators and characters most file systems reject are replaced
/// with `-` so the name is always a single file name.
pub fn report_file_name(title: &str, iso_date: &str) -> String {
    let normalized: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            _ => c,
        })
        .collect();
    format!("{}_{}.pdf", normalized, iso_date)
}

// ============================================
// 組版
// ============================================

struct Composer {
    pages: Vec<PagePlan>,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: vec![PagePlan::default()],
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn new_page(&mut self) {
        self.pages.push(PagePlan::default());
    }

    fn text(&mut self, x: f32, y: f32, size: f32, bold: bool, align: Align, text: impl Into<String>) {
        self.push(DrawOp::Text(TextOp {
            x,
            y,
            size,
            bold,
            align,
            text: text.into(),
        }));
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        self.push(DrawOp::Line(LineOp { x1, y1, x2, y2, width }));
    }

    fn cell(&mut self, x: f32, y: f32, w: f32, h: f32, fill_gray: Option<f32>) {
        self.push(DrawOp::Rect(RectOp {
            x,
            y,
            w,
            h,
            fill_gray,
            stroke_mm: Some(TABLE_LINE_WIDTH_MM),
        }));
    }

    fn image(&mut self, slot: ImageSlot, x: f32, y: f32, w: f32, h: f32, fallback: Fallback) {
        self.push(DrawOp::Image(ImageOp { slot, x, y, w, h, fallback }));
    }
}

/// Lay out the whole report.
pub fn compose(input: &ReportInput<'_>) -> DocumentPlan {
    let mut c = Composer::new();

    compose_header(&mut c, input);
    let table_end = compose_checklist(&mut c, input);
    let section_end = compose_photo_section(&mut c, input, table_end);
    compose_signatures(&mut c, input, section_end);
    stamp_page_numbers(&mut c);

    DocumentPlan {
        title: input.template.title.clone(),
        page_width_mm: A4_WIDTH_MM,
        page_height_mm: A4_HEIGHT_MM,
        pages: c.pages,
    }
}

fn compose_header(c: &mut Composer, input: &ReportInput<'_>) {
    let template = input.template;

    // ロゴ（左右独立）
    c.image(
        ImageSlot::LogoLeft,
        LOGO_LEFT_X_MM,
        LOGO_Y_MM,
        LOGO_WIDTH_MM,
        LOGO_HEIGHT_MM,
        Fallback::Text(TextOp {
            x: LOGO_LEFT_X_MM,
            y: 15.0,
            size: 8.0,
            bold: false,
            align: Align::Left,
            text: LOGO_LEFT_FALLBACK.to_string(),
        }),
    );
    c.image(
        ImageSlot::LogoRight,
        LOGO_RIGHT_X_MM,
        LOGO_Y_MM,
        LOGO_WIDTH_MM,
        LOGO_HEIGHT_MM,
        Fallback::Text(TextOp {
            x: A4_WIDTH_MM - MARGIN_MM - 20.0,
            y: 15.0,
            size: 8.0,
            bold: false,
            align: Align::Left,
            text: LOGO_RIGHT_FALLBACK.to_string(),
        }),
    );

    let center = A4_WIDTH_MM / 2.0;
    c.text(center, TITLE_Y_MM, TITLE_FONT_PT, true, Align::Center, template.title.as_str());
    for (i, line) in template.subtitle_lines().enumerate() {
        c.text(
            center,
            SUBTITLE_Y_MM + i as f32 * SUBTITLE_LINE_MM,
            SUBTITLE_FONT_PT,
            true,
            Align::Center,
            line,
        );
    }

    // 左: Date / Time / Day、右: Seam / Block / RL
    let fields = input.fields;
    let value = |name: &str| fields.value(name).unwrap_or(BLANK_VALUE).to_string();
    let date = fields
        .value(FIELD_DATE)
        .map(format_date_dmy)
        .unwrap_or_else(|| BLANK_VALUE.to_string());
    let left = [
        format!("Date: {}", date),
        format!("Time: {}", value(FIELD_TIME)),
        format!("Day: {}", value(FIELD_DAY)),
    ];
    let right = [
        format!("Seam: {}", value(FIELD_SEAM)),
        format!("Block: {}", value(FIELD_BLOCK)),
        format!("RL: {}", value(FIELD_RL)),
    ];
    for (i, (l, r)) in left.into_iter().zip(right).enumerate() {
        let y = META_Y_MM + i as f32 * META_LINE_MM;
        c.text(MARGIN_MM, y, META_FONT_PT, false, Align::Left, l);
        c.text(META_RIGHT_X_MM, y, META_FONT_PT, false, Align::Left, r);
    }

    c.text(MARGIN_MM, LEGEND_Y_MM, 10.0, true, Align::Left, LEGEND_TITLE);
    for (i, line) in LEGEND_LINES.iter().enumerate() {
        c.text(
            MARGIN_MM + LEGEND_INDENT_MM,
            LEGEND_Y_MM + 5.0 + i as f32 * 4.0,
            META_FONT_PT,
            false,
            Align::Left,
            *line,
        );
    }
}

/// Wrapped text of each column plus the row height.
struct LaidOutRow {
    cells: Vec<(Vec<String>, Align)>,
    height: f32,
}

impl LaidOutRow {
    fn from_cells(cells: Vec<(Vec<String>, Align)>) -> Self {
        let max_lines = cells.iter().map(|(lines, _)| lines.len()).max().unwrap_or(1).max(1);
        Self {
            cells,
            height: max_lines as f32 * line_height_mm(TABLE_FONT_PT) + TABLE_PADDING_MM * 2.0,
        }
    }

    /// Split off the first `max_lines` wrapped lines of every cell; `self`
    /// keeps the rest.
    fn take_lines(&mut self, max_lines: usize) -> LaidOutRow {
        let head = self
            .cells
            .iter_mut()
            .map(|(lines, align)| {
                let n = max_lines.min(lines.len());
                (lines.drain(..n).collect(), *align)
            })
            .collect();
        *self = LaidOutRow::from_cells(std::mem::take(&mut self.cells));
        LaidOutRow::from_cells(head)
    }
}

/// 高さ `available` に収まる行数
fn lines_that_fit(available: f32) -> usize {
    let lines = (available - TABLE_PADDING_MM * 2.0) / line_height_mm(TABLE_FONT_PT);
    if lines < 1.0 {
        0
    } else {
        lines.floor() as usize
    }
}

fn lay_out_row(cells: &[(&str, Align)]) -> LaidOutRow {
    LaidOutRow::from_cells(
        cells
            .iter()
            .zip(CHECKLIST_COLUMNS_MM.iter())
            .map(|((text, align), width)| {
                (wrap_text(text, width - TABLE_PADDING_MM * 2.0, TABLE_FONT_PT), *align)
            })
            .collect(),
    )
}

fn draw_row(c: &mut Composer, row: &LaidOutRow, top: f32, bold: bool, fill_gray: Option<f32>) {
    let lh = line_height_mm(TABLE_FONT_PT);
    let ascent = pt_to_mm(TABLE_FONT_PT) * 0.75;

    for (index, (lines, align)) in row.cells.iter().enumerate() {
        let x = column_x_mm(&CHECKLIST_COLUMNS_MM, index);
        let w = CHECKLIST_COLUMNS_MM[index];
        c.cell(x, top, w, row.height, fill_gray);

        // 縦方向は中央寄せ
        let block = lines.len() as f32 * lh;
        let first_baseline = top + (row.height - block) / 2.0 + ascent;
        let text_x = match align {
            Align::Left => x + TABLE_PADDING_MM,
            Align::Center => x + w / 2.0,
            Align::Right => x + w - TABLE_PADDING_MM,
        };
        for (k, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            c.text(
                text_x,
                first_baseline + k as f32 * lh,
                TABLE_FONT_PT,
                bold,
                *align,
                line.as_str(),
            );
        }
    }
}

fn checklist_header_row() -> LaidOutRow {
    let cells: Vec<(&str, Align)> = CHECKLIST_HEADERS.iter().map(|h| (*h, Align::Center)).collect();
    lay_out_row(&cells)
}

/// Returns the y coordinate of the table's bottom edge on the last page.
fn compose_checklist(c: &mut Composer, input: &ReportInput<'_>) -> f32 {
    let header = checklist_header_row();
    let mut y = TABLE_Y_MM;
    draw_row(c, &header, y, true, Some(HEADER_GRAY));
    y += header.height;

    let continue_on_new_page = |c: &mut Composer| {
        c.new_page();
        draw_row(c, &header, CONTINUATION_TOP_MM, true, Some(HEADER_GRAY));
        CONTINUATION_TOP_MM + header.height
    };
    let fresh_page_room = CONTENT_BOTTOM_MM - CONTINUATION_TOP_MM - header.height;

    for row in checklist_rows(input.template, input.answers) {
        let number = row.number.to_string();
        let mut laid_out = lay_out_row(&[
            (number.as_str(), Align::Center),
            (row.text.as_str(), Align::Left),
            (row.status_cells[0].as_str(), Align::Center),
            (row.status_cells[1].as_str(), Align::Center),
            (row.status_cells[2].as_str(), Align::Center),
            (row.remark.as_str(), Align::Left),
        ]);

        // 1ページに収まる行は次ページへ送り、収まらない行は行単位で分割する
        if y + laid_out.height > CONTENT_BOTTOM_MM && laid_out.height <= fresh_page_room {
            y = continue_on_new_page(c);
        }
        while y + laid_out.height > CONTENT_BOTTOM_MM {
            let fit = lines_that_fit(CONTENT_BOTTOM_MM - y);
            if fit > 0 {
                let head = laid_out.take_lines(fit);
                draw_row(c, &head, y, false, None);
            }
            y = continue_on_new_page(c);
        }
        draw_row(c, &laid_out, y, false, None);
        y += laid_out.height;
    }

    y
}

/// Returns the y coordinate where the photo section ends.
fn compose_photo_section(c: &mut Composer, input: &ReportInput<'_>, table_end: f32) -> f32 {
    let note_lines = input
        .fields
        .value(FIELD_PHOTO_NOTE)
        .map(|note| wrap_text(note, NOTE_WRAP_MM, NOTE_FONT_PT))
        .unwrap_or_default();
    let note_lh = line_height_mm(NOTE_FONT_PT);
    let area = PHOTO_AREA_HEIGHT_MM.max(3.0 + note_lines.len() as f32 * note_lh + 2.0);
    let section_height = PHOTO_SECTION_GAP_MM + PHOTO_HEADER_HEIGHT_MM + 0.5 + area;

    let mut top = table_end + PHOTO_SECTION_GAP_MM;
    if top + section_height > CONTENT_BOTTOM_MM {
        c.new_page();
        top = CONTINUATION_TOP_MM;
    }

    c.text(MARGIN_MM, top + 1.0, 9.0, true, Align::Left, PHOTO_SECTION_TITLE);

    // 本文なしのヘッダーだけの表
    let header_y = top + 3.0;
    for (i, label) in PHOTO_HEADERS.iter().enumerate() {
        let x = column_x_mm(&PHOTO_HEADER_COLUMNS_MM, i);
        let w = PHOTO_HEADER_COLUMNS_MM[i];
        c.cell(x, header_y, w, PHOTO_HEADER_HEIGHT_MM, Some(HEADER_GRAY));
        c.text(
            x + w / 2.0,
            header_y + PHOTO_HEADER_HEIGHT_MM / 2.0 + pt_to_mm(PHOTO_HEADER_FONT_PT) * 0.35,
            PHOTO_HEADER_FONT_PT,
            true,
            Align::Center,
            *label,
        );
    }

    let content_y = header_y + PHOTO_HEADER_HEIGHT_MM + 0.5;
    if input.photo_count == 0 {
        c.text(MARGIN_MM + 25.0, content_y + 10.0, 8.0, false, Align::Left, NO_PHOTO_TEXT);
    } else {
        let gallery = photo_gallery(input.photo_count);
        for (i, x) in gallery.xs_mm.iter().enumerate() {
            c.image(
                ImageSlot::Photo(i),
                *x,
                content_y,
                gallery.photo_width_mm,
                gallery.photo_height_mm,
                Fallback::Text(TextOp {
                    x: *x,
                    y: content_y + gallery.photo_height_mm / 2.0,
                    size: 6.0,
                    bold: false,
                    align: Align::Left,
                    text: PHOTO_ERROR_TEXT.to_string(),
                }),
            );
        }
    }

    for (k, line) in note_lines.iter().enumerate() {
        c.text(
            NOTE_X_MM,
            content_y + 3.0 + k as f32 * note_lh,
            NOTE_FONT_PT,
            false,
            Align::Left,
            line.as_str(),
        );
    }

    content_y + area
}

fn compose_signatures(c: &mut Composer, input: &ReportInput<'_>, section_end: f32) {
    let mut sign_y = section_end + SIGNATURE_GAP_MM;
    if sign_y - 4.0 + SIGNATURE_BLOCK_HEIGHT_MM > CONTENT_BOTTOM_MM {
        c.new_page();
        sign_y = CONTINUATION_TOP_MM + 8.0;
    }

    c.text(MARGIN_MM, sign_y - 4.0, 9.0, true, Align::Left, SIGNATURE_HEADING);

    for role in SignatureRole::ALL {
        let x = signature_cell_x_mm(role.index());
        let w = SIGNATURE_CELL_WIDTH_MM;
        c.text(x + 3.0, sign_y + 4.0, 8.0, false, Align::Left, role.label());

        let ruled_line = LineOp {
            x1: x + 6.0,
            y1: sign_y + 20.0,
            x2: x + w - 6.0,
            y2: sign_y + 20.0,
            width: 0.2,
        };
        if input.signed[role.index()] {
            c.image(
                ImageSlot::Signature(role),
                x + 6.0,
                sign_y + 7.0,
                w - 12.0,
                SIGNATURE_IMAGE_HEIGHT_MM,
                Fallback::Line(ruled_line),
            );
        } else {
            c.line(ruled_line.x1, ruled_line.y1, ruled_line.x2, ruled_line.y2, ruled_line.width);
        }

        let caption = input
            .fields
            .value(role.name_field())
            .unwrap_or(role.default_position());
        c.text(x + 3.0, sign_y + 24.0, 8.0, true, Align::Left, caption);
    }
}

/// ページ数が確定した後で全ページに「Halaman X / N」を付ける
fn stamp_page_numbers(c: &mut Composer) {
    let total = c.pages.len();
    for (i, page) in c.pages.iter_mut().enumerate() {
        page.ops.push(DrawOp::Text(TextOp {
            x: A4_WIDTH_MM - MARGIN_MM,
            y: FOOTER_Y_MM,
            size: FOOTER_FONT_PT,
            bold: false,
            align: Align::Right,
            text: format!("Halaman {} / {}", i + 1, total),
        }));
    }
}
