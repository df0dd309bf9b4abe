//! Repacking of ARGB bitmaps into pitch-aligned native pixel buffers.
//!
//! The compositor reads resource data row by row, each row starting on a
//! 32-byte boundary. [`convert`] writes every source pixel into that layout in
//! one of the two [`PixelFormat`]s; the padding at the end of each row is
//! allocated but never written.

use serde::{Deserialize, Serialize};

use crate::compositor::ImageType;

/// Row alignment required by the compositor, in bytes.
pub const PITCH_ALIGNMENT: u32 = 32;

/// Source of 32-bit `0xAARRGGBB` pixels.
pub trait Bitmap {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// The pixel at `(x, y)` packed as `0xAARRGGBB`. Callers stay within bounds.
    fn argb(&self, x: u32, y: u32) -> u32;
}

/// An owned, row-major ARGB bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgbBitmap {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl ArgbBitmap {
    /// A bitmap filled with `argb`.
    pub fn filled(width: u32, height: u32, argb: u32) -> Self {
        ArgbBitmap {
            width,
            height,
            pixels: vec![argb; (width as usize) * (height as usize)],
        }
    }

    /// Wraps row-major pixels. Returns `None` when the length does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(ArgbBitmap { width, height, pixels })
    }

    /// Builds a bitmap from tightly packed RGBA8 bytes (4 bytes per pixel).
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        let pixels = rgba
            .chunks_exact(4)
            .map(|p| u32::from_be_bytes([p[3], p[0], p[1], p[2]]))
            .collect();
        Some(ArgbBitmap { width, height, pixels })
    }

    pub fn set(&mut self, x: u32, y: u32, argb: u32) {
        if x < self.width && y < self.height {
            let idx = (y as usize) * (self.width as usize) + x as usize;
            self.pixels[idx] = argb;
        }
    }

    pub fn fill(&mut self, argb: u32) {
        self.pixels.iter_mut().for_each(|p| *p = argb);
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

impl Bitmap for ArgbBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn argb(&self, x: u32, y: u32) -> u32 {
        self.pixels[(y as usize) * (self.width as usize) + x as usize]
    }
}

/// Target encodings for native buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 32-bit packed A,R,G,B.
    #[default]
    Argb8888,
    /// 16-bit packed 5-6-5 R,G,B.
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Argb8888 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }

    pub fn image_type(self) -> ImageType {
        match self {
            PixelFormat::Argb8888 => ImageType::Argb8888,
            PixelFormat::Rgb565 => ImageType::Rgb565,
        }
    }
}

/// Row stride in bytes for `width` pixels, rounded up to [`PITCH_ALIGNMENT`].
pub fn pitch(width: u32, bytes_per_pixel: u32) -> u32 {
    (bytes_per_pixel * width + (PITCH_ALIGNMENT - 1)) & !(PITCH_ALIGNMENT - 1)
}

/// Packs an ARGB pixel into RGB565.
pub fn rgb565(argb: u32) -> u16 {
    let r = (argb >> 16) & 0xFF;
    let g = (argb >> 8) & 0xFF;
    let b = argb & 0xFF;
    (((r & 0xF8) << 8) | ((g & 0xFC) << 3) | (b >> 3)) as u16
}

/// A converted image laid out the way the compositor reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePixelBuffer {
    data: Vec<u8>,
    pitch: u32,
    width: u32,
    height: u32,
    format: PixelFormat,
}

impl NativePixelBuffer {
    fn allocate(format: PixelFormat, width: u32, height: u32) -> Self {
        let pitch = pitch(width, format.bytes_per_pixel());
        NativePixelBuffer {
            data: vec![0; pitch as usize * height as usize],
            pitch,
            width,
            height,
            format,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes currently allocated for pixel data.
    pub fn allocation_len(&self) -> usize {
        self.data.len()
    }

    /// Address of the backing allocation, to tell reused buffers from new ones.
    pub fn as_ptr(&self) -> *const u8 {
        self.data.as_ptr()
    }
}

/// Converts `bitmap` into `format`, overwriting `existing` in place when its
/// allocation is large enough and allocating a fresh buffer otherwise.
pub fn convert(
    bitmap: &dyn Bitmap,
    format: PixelFormat,
    existing: Option<NativePixelBuffer>,
) -> NativePixelBuffer {
    let (width, height) = (bitmap.width(), bitmap.height());
    let pitch = pitch(width, format.bytes_per_pixel());
    let needed = pitch as usize * height as usize;

    let mut buffer = match existing {
        Some(mut buffer) if buffer.data.len() >= needed => {
            buffer.pitch = pitch;
            buffer.width = width;
            buffer.height = height;
            buffer.format = format;
            buffer
        }
        _ => NativePixelBuffer::allocate(format, width, height),
    };

    let row_len = pitch as usize;
    if row_len == 0 {
        return buffer;
    }
    for (y, row) in buffer.data.chunks_exact_mut(row_len).take(height as usize).enumerate() {
        match format {
            PixelFormat::Argb8888 => {
                for (x, px) in row.chunks_exact_mut(4).take(width as usize).enumerate() {
                    px.copy_from_slice(&bitmap.argb(x as u32, y as u32).to_ne_bytes());
                }
            }
            PixelFormat::Rgb565 => {
                for (x, px) in row.chunks_exact_mut(2).take(width as usize).enumerate() {
                    px.copy_from_slice(&rgb565(bitmap.argb(x as u32, y as u32)).to_ne_bytes());
                }
            }
        }
    }

    buffer
}
