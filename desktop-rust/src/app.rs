use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Context;
use chrono::Local;
use eframe::egui::{self, Color32, RichText};
use eframe::egui::{FontData, FontDefinitions, FontFamily};

use coal_signoff::config::Config;
use coal_signoff::export::{output_file_name, render_report, PdfQuality};
use coal_signoff::form::intake::accept_images;
use coal_signoff::form::{decode_upload, FormStore};
use coal_signoff::signature::SignatureUpdate;
use signoff_common::types::KNOWN_FIELDS;
use signoff_common::{catalog, find_template, SignatureRole, Status, DEFAULT_TEMPLATE};

use crate::io::{read_upload, read_uploads, write_pdf, IMAGE_FILTER};
use crate::model::{StatusKind, StatusLine, UiMessage};
use crate::signature_pad::SignaturePad;

const PAD_WIDTH: f32 = 300.0;
const THUMB_SIZE: [u32; 2] = [160, 120];

pub struct SignoffApp {
    config: Config,
    store: FormStore,
    pads: Vec<SignaturePad>,
    pdf_quality: PdfQuality,
    status: Option<StatusLine>,
    tx: Sender<UiMessage>,
    rx: Receiver<UiMessage>,
    inflight: usize,
    /// `store.photos()` と同じ並び（デコード失敗は None）
    thumbs: Vec<Option<egui::TextureHandle>>,
    thumbs_dirty: bool,
}

impl SignoffApp {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let template = find_template(DEFAULT_TEMPLATE)
            .or_else(|| catalog().first())
            .context("template catalog is empty")?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            store: FormStore::with_fields(template, config.initial_fields()),
            pdf_quality: config.pdf_quality,
            config,
            pads: SignatureRole::ALL.iter().map(|r| SignaturePad::new(*r)).collect(),
            status: None,
            tx,
            rx,
            inflight: 0,
            thumbs: Vec::new(),
            thumbs_dirty: true,
        })
    }

    // ============================================
    // テンプレート
    // ============================================

    fn select_template(&mut self, key: &str) {
        if key == self.store.template().key {
            return;
        }
        match self.store.select_template(key) {
            Ok(()) => {
                for pad in &mut self.pads {
                    pad.reset();
                }
                self.thumbs_dirty = true;
                self.status = Some(StatusLine::info(format!("Template: {}", key)));
            }
            Err(err) => self.status = Some(StatusLine::error(err.to_string())),
        }
    }

    // ============================================
    // 画像の読み込み（別スレッドでデコード）
    // ============================================

    fn pick_photos(&mut self) {
        let Some(paths) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_FILTER)
            .pick_files()
        else {
            return;
        };
        let uploads = match read_uploads(&paths) {
            Ok(uploads) => uploads,
            Err(err) => {
                self.status = Some(StatusLine::error(format!("{err:#}")));
                return;
            }
        };

        let ticket = self.store.begin_photo_batch();
        let sender = self.tx.clone();
        self.inflight += 1;
        std::thread::spawn(move || {
            let images = accept_images(uploads).into_iter().map(decode_upload).collect();
            let _ = sender.send(UiMessage::PhotosDecoded { ticket, images });
        });
    }

    fn pick_evidence(&mut self, item_id: &str) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_FILTER)
            .pick_file()
        else {
            return;
        };
        let upload = match read_upload(&path) {
            Ok(upload) => upload,
            Err(err) => {
                self.status = Some(StatusLine::error(format!("{err:#}")));
                return;
            }
        };
        match self.store.begin_evidence(item_id, &upload) {
            Ok(Some(ticket)) => {
                let sender = self.tx.clone();
                self.inflight += 1;
                std::thread::spawn(move || {
                    let image = decode_upload(upload);
                    let _ = sender.send(UiMessage::EvidenceDecoded { ticket, image });
                });
            }
            Ok(None) => {}
            Err(err) => self.status = Some(StatusLine::error(err.to_string())),
        }
    }

    fn load_signature(&mut self, index: usize) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", IMAGE_FILTER)
            .pick_file()
        else {
            return;
        };
        let pad = &self.pads[index];
        let role = pad.role;
        let ticket = pad.recorder.restore_ticket();
        let sender = self.tx.clone();
        self.inflight += 1;
        std::thread::spawn(move || {
            let image = image::open(&path).map_err(|e| format!("{}: {e}", path.display()));
            let _ = sender.send(UiMessage::SignatureLoaded { role, ticket, image });
        });
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.inflight = self.inflight.saturating_sub(1);
            match msg {
                UiMessage::PhotosDecoded { ticket, images } => {
                    let failed = images.iter().filter(|i| !i.is_decoded()).count();
                    if self.store.complete_photos(ticket, images) {
                        self.thumbs_dirty = true;
                        if failed > 0 {
                            self.status = Some(StatusLine::error(format!("{failed} photo(s) could not be decoded")));
                        }
                    }
                }
                UiMessage::EvidenceDecoded { ticket, image } => {
                    let item = ticket.item_id().to_string();
                    if self.store.complete_evidence(ticket, image) {
                        self.status = Some(StatusLine::info(format!("Evidence attached: {item}")));
                    }
                }
                UiMessage::SignatureLoaded { role, ticket, image } => {
                    let image = match image {
                        Ok(image) => image,
                        Err(err) => {
                            self.status = Some(StatusLine::error(err));
                            continue;
                        }
                    };
                    let pad = &mut self.pads[role.index()];
                    if pad.recorder.apply_restore(ticket, &image) {
                        pad.mark_dirty();
                        match pad.recorder.snapshot_png() {
                            Ok(sig) => self.store.set_signature(role, SignatureUpdate::Signed(sig)),
                            Err(err) => self.status = Some(StatusLine::error(err.to_string())),
                        }
                    }
                }
            }
        }
    }

    fn refresh_thumbs(&mut self, ctx: &egui::Context) {
        if !self.thumbs_dirty {
            return;
        }
        self.thumbs = self
            .store
            .photos()
            .iter()
            .enumerate()
            .map(|(i, photo)| {
                let thumb = photo.decoded.as_ref()?.thumbnail(THUMB_SIZE[0], THUMB_SIZE[1]);
                let size = [thumb.width() as usize, thumb.height() as usize];
                let pixels = thumb.to_rgba8().into_raw();
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
                Some(ctx.load_texture(format!("photo_{i}"), color_image, egui::TextureOptions::default()))
            })
            .collect();
        self.thumbs_dirty = false;
    }

    // ============================================
    // エクスポート
    // ============================================

    fn run_export(&mut self) {
        let today = Local::now().date_naive();
        let default_name = output_file_name(self.store.template(), today);
        let mut dialog = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(default_name.as_str());
        if let Some(dir) = &self.config.output_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        let result = render_report(&self.store, &self.config, self.pdf_quality)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| write_pdf(&path, &bytes));
        self.status = Some(match result {
            Ok(()) => StatusLine::info(format!("Saved {}", path.display())),
            Err(err) => StatusLine::error(format!("Export failed: {err:#}")),
        });
    }

    // ============================================
    // 画面
    // ============================================

    fn render_fields(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("fields").num_columns(2).striped(true).show(ui, |ui| {
            for (key, label) in KNOWN_FIELDS {
                ui.label(*label);
                let mut value = self.store.fields().get(key).to_string();
                let multiline = matches!(*key, "notes" | "recommendations" | "photoNote");
                let response = if multiline {
                    ui.add(egui::TextEdit::multiline(&mut value).desired_rows(2))
                } else {
                    ui.text_edit_singleline(&mut value)
                };
                if response.changed() {
                    self.store.set_field(key, value);
                }
                ui.end_row();
            }
        });
    }

    fn render_checklist(&mut self, ui: &mut egui::Ui) {
        let template = self.store.template();
        let mut number = 0;
        let mut evidence_request = None;
        for group in &template.groups {
            ui.label(RichText::new(format!("{}. {}", group.id, group.title)).strong());
            for item in &group.items {
                number += 1;
                let Some(answer) = self.store.answer(&item.id).cloned() else {
                    continue;
                };
                ui.group(|ui| {
                    ui.label(format!("{number}. {}", item.text));
                    ui.label(RichText::new(&item.subtext).italics().color(Color32::from_gray(150)));
                    ui.horizontal(|ui| {
                        let mut status = answer.status;
                        for choice in Status::CHOICES {
                            ui.radio_value(&mut status, choice, choice.mark());
                        }
                        if status != answer.status {
                            if let Err(err) = self.store.set_status(&item.id, status) {
                                self.status = Some(StatusLine::error(err.to_string()));
                            }
                        }
                        if ui.button("Evidence…").clicked() {
                            evidence_request = Some(item.id.clone());
                        }
                        if let Some(evidence) = self.store.evidence(&item.id) {
                            ui.label(RichText::new(&evidence.file_name).color(Color32::from_rgb(90, 160, 90)));
                        }
                    });
                    let mut remark = answer.remark.clone();
                    if ui
                        .add(egui::TextEdit::singleline(&mut remark).hint_text("Remark / Keterangan"))
                        .changed()
                    {
                        if let Err(err) = self.store.set_remark(&item.id, remark) {
                            self.status = Some(StatusLine::error(err.to_string()));
                        }
                    }
                });
            }
        }
        if let Some(item_id) = evidence_request {
            self.pick_evidence(&item_id);
        }
    }

    fn render_photos(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Tambah foto…").clicked() {
                self.pick_photos();
            }
            ui.label(format!("{}/3", self.store.photos().len()));
        });

        let mut remove = None;
        ui.horizontal(|ui| {
            if self.store.photos().is_empty() {
                ui.label(signoff_common::layout::NO_PHOTO_TEXT);
            }
            for (index, photo) in self.store.photos().iter().enumerate() {
                ui.vertical(|ui| {
                    match self.thumbs.get(index).and_then(Option::as_ref) {
                        Some(texture) => {
                            ui.add(egui::Image::new(texture).max_width(THUMB_SIZE[0] as f32));
                        }
                        None => {
                            ui.label(RichText::new(&photo.file_name).color(Color32::from_rgb(200, 80, 80)));
                        }
                    }
                    if ui.small_button("Hapus").clicked() {
                        remove = Some(index);
                    }
                });
            }
        });
        if let Some(index) = remove {
            self.store.remove_photo(index);
            self.thumbs_dirty = true;
        }
    }

    /// 報告書プレビューの集計行
    fn render_summary(&self, ui: &mut egui::Ui) {
        let summary = self.store.summary();
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new(format!("Preview Laporan: {}", self.store.template().title)).strong());
            ui.separator();
            ui.label(format!("Completion: {}%", summary.completion_percent()));
            ui.label(format!("Checklist: {}/{}", summary.answered(), summary.items));
            ui.separator();
            ui.label(format!("Y: {}", summary.yes));
            ui.label(format!("N: {}", summary.no));
            ui.label(format!("N/A: {}", summary.not_available));
            ui.separator();
            ui.label(format!("Foto Evidence: {}", summary.evidence));
            ui.label(format!("Foto Umum: {}", summary.photos));
            ui.label(format!("Tanda Tangan: {}/3", summary.signatures));
        });
    }

    fn render_signatures(&mut self, ui: &mut egui::Ui) {
        let mut load_request = None;
        ui.horizontal_top(|ui| {
            for (index, pad) in self.pads.iter_mut().enumerate() {
                ui.vertical(|ui| {
                    if let Some(update) = pad.show(ui, PAD_WIDTH) {
                        self.store.set_signature(pad.role, update);
                    }
                    if ui.small_button("Load…").clicked() {
                        load_request = Some(index);
                    }
                });
            }
        });
        if let Some(index) = load_request {
            self.load_signature(index);
        }
    }
}

pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\meiryo.ttc",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    ];

    for path in candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts.font_data.insert("fallback".to_string(), FontData::from_owned(data));
            fonts.families
                .entry(FontFamily::Proportional)
                .or_default()
                .push("fallback".to_string());
            ctx.set_fonts(fonts);
            return;
        }
    }
}

impl eframe::App for SignoffApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.inflight > 0 {
            ctx.request_repaint();
        }
        self.poll_messages();
        self.refresh_thumbs(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let current = self.store.template().key.clone();
                let mut selected = current.clone();
                for template in catalog() {
                    ui.selectable_value(&mut selected, template.key.clone(), template.key.as_str());
                }
                if selected != current {
                    self.select_template(&selected);
                }

                ui.separator();
                egui::ComboBox::from_label("PDF")
                    .selected_text(self.pdf_quality.to_string())
                    .show_ui(ui, |ui| {
                        for quality in [PdfQuality::High, PdfQuality::Medium, PdfQuality::Low] {
                            ui.selectable_value(&mut self.pdf_quality, quality, quality.to_string());
                        }
                    });
                if ui.button("Export PDF").clicked() {
                    self.run_export();
                }

                if let Some(status) = &self.status {
                    let color = match status.kind {
                        StatusKind::Info => Color32::from_gray(170),
                        StatusKind::Error => Color32::from_rgb(230, 90, 90),
                    };
                    ui.label(RichText::new(&status.text).color(color));
                }
            });
            self.render_summary(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let template = self.store.template();
                ui.heading(template.title.as_str());
                for line in template.subtitle_lines() {
                    ui.label(RichText::new(line).strong());
                }
                ui.separator();
                self.render_fields(ui);
                ui.separator();
                self.render_checklist(ui);
                ui.separator();
                ui.heading(signoff_common::layout::PHOTO_SECTION_TITLE);
                self.render_photos(ui);
                ui.separator();
                ui.heading(signoff_common::layout::SIGNATURE_HEADING);
                self.render_signatures(ui);
            });
        });
    }
}
