//! Grid and calibration patterns for aligning the projected image.
//!
//! Patterns are white one-pixel lines on an opaque black background, drawn at
//! the full surface resolution so they are shown without offset.

use crate::pixel::{ArgbBitmap, Bitmap};

pub const BACKGROUND: u32 = 0xFF00_0000;
pub const LINE: u32 = 0xFFFF_FFFF;

/// Renders patterns into a bitmap that is kept between calls while the
/// surface size stays the same.
#[derive(Debug, Default)]
pub struct CalibrationOverlay {
    canvas: Option<ArgbBitmap>,
}

impl CalibrationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Square grid with `spacing` pixels between lines. A spacing of 0 gives
    /// a blank bitmap.
    pub fn grid(&mut self, width: u32, height: u32, spacing: u32) -> &ArgbBitmap {
        let canvas = self.canvas(width, height);
        draw_grid(canvas, spacing, spacing);
        canvas
    }

    /// Grid with independent horizontal and vertical spacing plus a cross
    /// through the centre of the surface.
    pub fn calibration(
        &mut self,
        width: u32,
        height: u32,
        x_spacing: u32,
        y_spacing: u32,
    ) -> &ArgbBitmap {
        let canvas = self.canvas(width, height);
        draw_grid(canvas, x_spacing, y_spacing);
        draw_vline(canvas, width / 2, height);
        draw_hline(canvas, height / 2, width);
        canvas
    }

    fn canvas(&mut self, width: u32, height: u32) -> &mut ArgbBitmap {
        let reuse = matches!(&self.canvas, Some(c) if c.width() == width && c.height() == height);
        if !reuse {
            self.canvas = None;
        }
        let canvas = self
            .canvas
            .get_or_insert_with(|| ArgbBitmap::filled(width, height, BACKGROUND));
        canvas.fill(BACKGROUND);
        canvas
    }
}

fn draw_grid(canvas: &mut ArgbBitmap, x_spacing: u32, y_spacing: u32) {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return;
    }
    if x_spacing > 0 {
        for x in (0..width).step_by(x_spacing as usize) {
            draw_vline(canvas, x, height);
        }
        draw_vline(canvas, width - 1, height);
    }
    if y_spacing > 0 {
        for y in (0..height).step_by(y_spacing as usize) {
            draw_hline(canvas, y, width);
        }
        draw_hline(canvas, height - 1, width);
    }
}

fn draw_vline(canvas: &mut ArgbBitmap, x: u32, height: u32) {
    for y in 0..height {
        canvas.set(x, y, LINE);
    }
}

fn draw_hline(canvas: &mut ArgbBitmap, y: u32, width: u32) {
    for x in 0..width {
        canvas.set(x, y, LINE);
    }
}
