//! ポインタ入力の正規化
//!
//! マウスとタッチのどちらの入力でも、描画面のローカル座標に変換する。

/// Position in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub client_x: f32,
    pub client_y: f32,
}

/// Raw input in absolute client (window) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { client_x: f32, client_y: f32 },
    /// Only the first touch is tracked.
    Touch { touches: Vec<TouchPoint> },
}

impl PointerInput {
    pub fn mouse(client_x: f32, client_y: f32) -> Self {
        PointerInput::Mouse { client_x, client_y }
    }

    pub fn touch(client_x: f32, client_y: f32) -> Self {
        PointerInput::Touch {
            touches: vec![TouchPoint { client_x, client_y }],
        }
    }

    /// Absolute coordinates, `None` for a touch event without touches.
    pub fn client_position(&self) -> Option<(f32, f32)> {
        match self {
            PointerInput::Mouse { client_x, client_y } => Some((*client_x, *client_y)),
            PointerInput::Touch { touches } => touches.first().map(|t| (t.client_x, t.client_y)),
        }
    }
}

/// On-screen placement of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn contains(&self, point: SurfacePoint) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    /// Map a local point onto a raster of `raster_w` x `raster_h` pixels
    /// when the surface is displayed at a different size than its backing
    /// raster. Identity when the sizes match.
    pub fn scaled_to(&self, point: SurfacePoint, raster_w: u32, raster_h: u32) -> SurfacePoint {
        if self.width <= 0.0 || self.height <= 0.0 {
            return point;
        }
        SurfacePoint {
            x: point.x * raster_w as f32 / self.width,
            y: point.y * raster_h as f32 / self.height,
        }
    }
}

/// Client coordinates minus the surface origin. The caller treats `None`
/// as a no-op.
pub fn local_position(input: &PointerInput, surface: &SurfaceRect) -> Option<SurfacePoint> {
    let (client_x, client_y) = input.client_position()?;
    Some(SurfacePoint {
        x: client_x - surface.left,
        y: client_y - surface.top,
    })
}
