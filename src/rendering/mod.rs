//! Postcard rendering: layout, a small paint command list, and the
//! rasterizer that turns it into PNG bytes.

pub mod layout;
pub mod paint;
pub mod raster;

pub use layout::Rect;
pub use paint::{DisplayList, PaintCommand, TextStyle};

/// RGBA colour.
pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [0xff, 0xff, 0xff, 0xff];
pub const TEXT_GREY: Rgba = [0x33, 0x33, 0x33, 0xff];
/// `rgba(0, 0, 0, 0.3)`
pub const SHADOW: Rgba = [0, 0, 0, 77];

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
        }
    }
}

/// An encoded image ready to be written out.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub png_data: Vec<u8>,
}
