//! 手書き署名の記録
//!
//! `Idle` / `Drawing` の2状態。線は入力ごとに即座にラスタへ描画し、
//! ストローク終了時にだけPNGとしてフォームへ渡す。

mod brush;

pub use brush::{PenStyle, BACKGROUND};

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::{Result, SignoffError};
use crate::pointer::SurfacePoint;

pub const DEFAULT_WIDTH: u32 = 350;
pub const DEFAULT_HEIGHT: u32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Drawing,
}

/// PNG-encoded signature image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSignature {
    png: Vec<u8>,
}

impl EncodedSignature {
    /// Wrap stored PNG bytes. The bytes must at least carry a PNG header;
    /// full decoding is deferred to the point of use.
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
        if !png.starts_with(PNG_MAGIC) {
            return Err(SignoffError::InvalidSignature("PNGではありません".into()));
        }
        Ok(Self { png })
    }

    pub fn as_png(&self) -> &[u8] {
        &self.png
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map_err(|e| SignoffError::ImageDecode(format!("署名: {}", e)))
    }
}

/// What the owning form receives from a recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureUpdate {
    Signed(EncodedSignature),
    Cleared,
}

/// Issued before an off-thread restore; see [`StrokeRecorder::apply_restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreTicket {
    clear_epoch: u64,
}

pub struct StrokeRecorder {
    canvas: RgbaImage,
    pen: PenStyle,
    state: RecorderState,
    has_ink: bool,
    last: Option<SurfacePoint>,
    clear_epoch: u64,
}

impl Default for StrokeRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl StrokeRecorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_pen(width, height, PenStyle::default())
    }

    pub fn with_pen(width: u32, height: u32, pen: PenStyle) -> Self {
        let mut canvas = RgbaImage::new(width, height);
        brush::fill_background(&mut canvas);
        Self {
            canvas,
            pen,
            state: RecorderState::Idle,
            has_ink: false,
            last: None,
            clear_epoch: 0,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn has_ink(&self) -> bool {
        self.has_ink
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// `idle → drawing`: open a path at `p`.
    pub fn begin(&mut self, p: SurfacePoint) {
        self.state = RecorderState::Drawing;
        self.has_ink = true;
        self.last = Some(p);
    }

    /// `drawing → drawing`: extend the path to `p` and paint it now.
    /// Ignored while idle; returns whether anything was painted.
    pub fn extend(&mut self, p: SurfacePoint) -> bool {
        if self.state != RecorderState::Drawing {
            return false;
        }
        let from = self.last.unwrap_or(p);
        brush::draw_segment(&mut self.canvas, from, p, &self.pen);
        self.last = Some(p);
        true
    }

    /// `drawing → idle` (pointer up or leaving the surface). Emits the
    /// surface as PNG; `None` when no stroke was open.
    pub fn end(&mut self) -> Result<Option<SignatureUpdate>> {
        if self.state != RecorderState::Drawing {
            return Ok(None);
        }
        self.state = RecorderState::Idle;
        self.last = None;
        let encoded = self.snapshot_png()?;
        tracing::debug!(bytes = encoded.as_png().len(), "signature stroke finished");
        Ok(Some(SignatureUpdate::Signed(encoded)))
    }

    /// Valid from any state: blank surface, no ink, back to idle.
    pub fn clear(&mut self) -> SignatureUpdate {
        brush::fill_background(&mut self.canvas);
        self.state = RecorderState::Idle;
        self.has_ink = false;
        self.last = None;
        self.clear_epoch += 1;
        SignatureUpdate::Cleared
    }

    pub fn snapshot_png(&self) -> Result<EncodedSignature> {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(self.canvas.clone())
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| SignoffError::ImageDecode(format!("署名PNG変換: {}", e)))?;
        Ok(EncodedSignature { png })
    }

    pub fn restore_ticket(&self) -> RestoreTicket {
        RestoreTicket {
            clear_epoch: self.clear_epoch,
        }
    }

    /// Composite a previously stored signature at (0,0).
    ///
    /// Strokes drawn while the restore was in flight are painted over
    /// (last writer wins). A restore whose ticket predates a `clear()` is
    /// dropped. Returns whether the image was applied.
    pub fn apply_restore(&mut self, ticket: RestoreTicket, image: &DynamicImage) -> bool {
        if ticket.clear_epoch != self.clear_epoch {
            tracing::debug!("discarding signature restore issued before clear");
            return false;
        }
        image::imageops::overlay(&mut self.canvas, &image.to_rgba8(), 0, 0);
        self.has_ink = true;
        true
    }

    /// Synchronous restore from stored PNG bytes.
    pub fn restore(&mut self, signature: &EncodedSignature) -> Result<()> {
        let ticket = self.restore_ticket();
        let image = signature.decode()?;
        self.apply_restore(ticket, &image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> SurfacePoint {
        SurfacePoint::new(x, y)
    }

    #[test]
    fn test_initial_state() {
        let recorder = StrokeRecorder::default();
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(!recorder.has_ink());
        assert_eq!(recorder.size(), (DEFAULT_WIDTH, DEFAULT_HEIGHT));
        assert_eq!(brush::ink_pixels(recorder.canvas()), 0);
    }

    #[test]
    fn test_stroke_emits_exactly_one_signature() {
        // begin → move* → end のどの長さでも通知は1回
        for moves in 0..4 {
            let mut recorder = StrokeRecorder::new(60, 40);
            recorder.begin(p(5.0, 5.0));
            for i in 0..moves {
                assert!(recorder.extend(p(10.0 + i as f32 * 10.0, 20.0)));
            }
            let update = recorder.end().unwrap();
            assert!(matches!(update, Some(SignatureUpdate::Signed(_))));
            assert!(recorder.has_ink());
            assert_eq!(recorder.state(), RecorderState::Idle);
            assert_eq!(recorder.end().unwrap(), None);
        }
    }

    #[test]
    fn test_emitted_png_decodes_to_surface() {
        let mut recorder = StrokeRecorder::new(60, 40);
        recorder.begin(p(5.0, 5.0));
        recorder.extend(p(50.0, 30.0));
        let Some(SignatureUpdate::Signed(sig)) = recorder.end().unwrap() else {
            panic!("expected signature");
        };
        let decoded = sig.decode().unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (60, 40));
        assert_eq!(&decoded, recorder.canvas());
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let mut recorder = StrokeRecorder::new(60, 40);
        assert!(!recorder.extend(p(10.0, 10.0)));
        assert!(!recorder.extend(p(30.0, 30.0)));
        assert_eq!(brush::ink_pixels(recorder.canvas()), 0);
        assert!(!recorder.has_ink());
        assert_eq!(recorder.end().unwrap(), None);
    }

    #[test]
    fn test_clear_from_any_state() {
        let mut idle = StrokeRecorder::new(60, 40);
        assert_eq!(idle.clear(), SignatureUpdate::Cleared);
        assert!(!idle.has_ink());

        let mut drawing = StrokeRecorder::new(60, 40);
        drawing.begin(p(1.0, 1.0));
        drawing.extend(p(40.0, 30.0));
        assert_eq!(drawing.clear(), SignatureUpdate::Cleared);
        assert!(!drawing.has_ink());
        assert_eq!(drawing.state(), RecorderState::Idle);
        assert_eq!(brush::ink_pixels(drawing.canvas()), 0);

        let mut finished = StrokeRecorder::new(60, 40);
        finished.begin(p(1.0, 1.0));
        finished.extend(p(40.0, 30.0));
        finished.end().unwrap();
        assert_eq!(finished.clear(), SignatureUpdate::Cleared);
        assert!(!finished.has_ink());
    }

    #[test]
    fn test_restore_applies_and_sets_ink() {
        let mut source = StrokeRecorder::new(60, 40);
        source.begin(p(5.0, 5.0));
        source.extend(p(50.0, 30.0));
        let sig = source.snapshot_png().unwrap();

        let mut target = StrokeRecorder::new(60, 40);
        target.restore(&sig).unwrap();
        assert!(target.has_ink());
        assert_eq!(target.canvas(), source.canvas());
    }

    #[test]
    fn test_restore_after_clear_is_discarded() {
        let mut source = StrokeRecorder::new(60, 40);
        source.begin(p(5.0, 5.0));
        source.extend(p(50.0, 30.0));
        let image = source.snapshot_png().unwrap().decode().unwrap();

        let mut target = StrokeRecorder::new(60, 40);
        let ticket = target.restore_ticket();
        target.clear();
        assert!(!target.apply_restore(ticket, &image));
        assert!(!target.has_ink());
        assert_eq!(brush::ink_pixels(target.canvas()), 0);
    }

    #[test]
    fn test_restore_racing_a_stroke_last_writer_wins() {
        let mut source = StrokeRecorder::new(60, 40);
        source.begin(p(5.0, 5.0));
        source.extend(p(50.0, 30.0));
        let image = source.snapshot_png().unwrap().decode().unwrap();

        let mut target = StrokeRecorder::new(60, 40);
        let ticket = target.restore_ticket();
        target.begin(p(5.0, 35.0));
        target.extend(p(55.0, 35.0));
        assert!(target.apply_restore(ticket, &image));
        // 復元画像は不透明なので後から書いた方が見える
        assert_eq!(target.canvas(), source.canvas());
    }

    #[test]
    fn test_encoded_signature_requires_png() {
        assert!(EncodedSignature::from_png(b"not a png".to_vec()).is_err());
        let sig = StrokeRecorder::new(4, 4).snapshot_png().unwrap();
        assert!(EncodedSignature::from_png(sig.as_png().to_vec()).is_ok());
    }
}
