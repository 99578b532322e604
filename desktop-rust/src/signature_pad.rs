use coal_signoff::pointer::{local_position, PointerInput, SurfaceRect};
use coal_signoff::signature::{RecorderState, SignatureUpdate, StrokeRecorder};
use eframe::egui::{self, Color32, RichText};
use signoff_common::SignatureRole;

/// One drawing surface bound to one signature slot.
pub struct SignaturePad {
    pub role: SignatureRole,
    pub recorder: StrokeRecorder,
    texture: Option<egui::TextureHandle>,
    dirty: bool,
}

impl SignaturePad {
    pub fn new(role: SignatureRole) -> Self {
        Self {
            role,
            recorder: StrokeRecorder::default(),
            texture: None,
            dirty: true,
        }
    }

    pub fn reset(&mut self) {
        self.recorder.clear();
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Draw the pad; returns what the form should store, if anything changed.
    pub fn show(&mut self, ui: &mut egui::Ui, display_width: f32) -> Option<SignatureUpdate> {
        let mut update = None;
        let (raster_w, raster_h) = self.recorder.size();
        let scale = display_width / raster_w as f32;
        let size = egui::vec2(display_width, raster_h as f32 * scale);

        ui.label(RichText::new(self.role.label()).strong());
        let (response, painter) = ui.allocate_painter(size, egui::Sense::drag());
        let rect = response.rect;
        let surface = SurfaceRect::new(rect.left(), rect.top(), rect.width(), rect.height());
        let touching = ui.input(|i| i.any_touches());

        let to_raster = |pos: egui::Pos2| {
            let input = if touching {
                PointerInput::touch(pos.x, pos.y)
            } else {
                PointerInput::mouse(pos.x, pos.y)
            };
            local_position(&input, &surface)
        };

        if response.drag_started() {
            if let Some(p) = response.interact_pointer_pos().and_then(to_raster) {
                self.recorder.begin(surface.scaled_to(p, raster_w, raster_h));
            }
        } else if response.dragged() && self.recorder.state() == RecorderState::Drawing {
            if let Some(p) = response.interact_pointer_pos().and_then(to_raster) {
                if surface.contains(p) {
                    if self.recorder.extend(surface.scaled_to(p, raster_w, raster_h)) {
                        self.dirty = true;
                    }
                } else {
                    // 描画面の外に出たらストローク終了
                    update = self.finish_stroke();
                }
            }
        }
        if response.drag_stopped() {
            update = self.finish_stroke().or(update);
        }

        self.refresh_texture(ui.ctx());
        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(rect, 4.0, egui::Stroke::new(1.0, Color32::from_gray(120)));

        ui.horizontal(|ui| {
            if ui.button("Hapus").clicked() {
                update = Some(self.recorder.clear());
                self.dirty = true;
            }
            let state = if self.recorder.has_ink() { "signed" } else { "empty" };
            ui.label(RichText::new(state).color(Color32::from_gray(150)));
        });

        update
    }

    fn finish_stroke(&mut self) -> Option<SignatureUpdate> {
        match self.recorder.end() {
            Ok(update) => update,
            Err(err) => {
                tracing::warn!(role = self.role.key(), error = %err, "signature encode failed");
                None
            }
        }
    }

    fn refresh_texture(&mut self, ctx: &egui::Context) {
        if !self.dirty && self.texture.is_some() {
            return;
        }
        let canvas = self.recorder.canvas();
        let size = [canvas.width() as usize, canvas.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, canvas.as_raw());
        match &mut self.texture {
            Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture(
                    format!("signature_{}", self.role.key()),
                    image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }
        self.dirty = false;
    }
}
