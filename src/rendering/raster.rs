//! Rasterizer: executes a display list onto an RGBA canvas and encodes PNG

use super::layout::GLYPH_SIZE;
use super::{DisplayList, PaintCommand, Rect, RenderedImage, Rgba, TextStyle};
use crate::{Error, Result};
use font8x8::UnicodeFonts;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageEncoder, Pixel, RgbaImage};

/// Paint `list` in order. `photo` backs any `Image` command.
pub fn rasterize(list: &DisplayList, photo: Option<&DynamicImage>) -> Result<RgbaImage> {
    let mut canvas = RgbaImage::new(list.size.width, list.size.height);

    for cmd in &list.commands {
        match cmd {
            PaintCommand::Fill { rgba } => {
                for px in canvas.pixels_mut() {
                    *px = image::Rgba(*rgba);
                }
            }
            PaintCommand::SolidRect { rect, rgba } => fill_rect(&mut canvas, *rect, *rgba),
            PaintCommand::Shadow {
                rect,
                rgba,
                blur,
                offset,
            } => {
                let mut layer = RgbaImage::new(canvas.width(), canvas.height());
                fill_rect(&mut layer, rect.offset(offset.0, offset.1), *rgba);
                // canvas shadowBlur is twice the gaussian sigma
                let layer = if *blur > 0.0 {
                    imageops::blur(&layer, *blur / 2.0)
                } else {
                    layer
                };
                imageops::overlay(&mut canvas, &layer, 0, 0);
            }
            PaintCommand::Image { rect } => {
                let photo = photo.ok_or_else(|| {
                    Error::RenderError("display list draws an image but none was supplied".into())
                })?;
                let scaled = photo
                    .resize_exact(rect.width, rect.height, FilterType::Triangle)
                    .to_rgba8();
                imageops::overlay(&mut canvas, &scaled, i64::from(rect.x), i64::from(rect.y));
            }
            PaintCommand::Text {
                x,
                baseline,
                text,
                scale,
                style,
                rgba,
            } => draw_text(&mut canvas, *x, *baseline, text, *scale, *style, *rgba),
        }
    }

    Ok(canvas)
}

/// Encode an RGBA canvas as PNG.
pub fn encode_png(canvas: &RgbaImage) -> Result<RenderedImage> {
    let mut png_data = Vec::new();
    PngEncoder::new(&mut png_data)
        .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ColorType::Rgba8)
        .map_err(|e| Error::RenderError(format!("PNG encoding failed: {}", e)))?;
    Ok(RenderedImage {
        width: canvas.width(),
        height: canvas.height(),
        png_data,
    })
}

fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, rgba: Rgba) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    canvas
        .get_pixel_mut(x as u32, y as u32)
        .blend(&image::Rgba(rgba));
}

fn fill_rect(canvas: &mut RgbaImage, rect: Rect, rgba: Rgba) {
    for dy in 0..rect.height as i32 {
        for dx in 0..rect.width as i32 {
            blend_pixel(canvas, rect.x + dx, rect.y + dy, rgba);
        }
    }
}

fn glyph(c: char) -> [u8; 8] {
    font8x8::BASIC_FONTS
        .get(c)
        .or_else(|| font8x8::LATIN_FONTS.get(c))
        .or_else(|| font8x8::BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_text(canvas: &mut RgbaImage, x: i32, baseline: i32, text: &str, scale: u32, style: TextStyle, rgba: Rgba) {
    let scale = scale.max(1) as i32;
    let advance = GLYPH_SIZE as i32 * scale;
    let top = baseline - advance;

    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as i32 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            let row = row as i32;
            // shear rows to the right towards the top for italics
            let slant = match style {
                TextStyle::Italic => (7 - row) * scale / 4,
                _ => 0,
            };
            for col in 0..8i32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col * scale + slant;
                let py = top + row * scale;
                let extra = if style == TextStyle::Bold { 1 } else { 0 };
                for sy in 0..scale {
                    for sx in 0..scale + extra {
                        blend_pixel(canvas, px + sx, py + sy, rgba);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::{CanvasSize, TEXT_GREY, WHITE};

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| x.abs_diff(*y) <= 2)
    }

    fn list(size: CanvasSize) -> DisplayList {
        let mut l = DisplayList::new(size);
        l.push(PaintCommand::Fill { rgba: WHITE });
        l
    }

    #[test]
    fn fill_and_rect_paint_pixels() {
        let mut l = list(CanvasSize { width: 20, height: 10 });
        l.push(PaintCommand::SolidRect {
            rect: Rect { x: 2, y: 2, width: 3, height: 3 },
            rgba: [255, 0, 0, 255],
        });
        let c = rasterize(&l, None).unwrap();
        assert_eq!(c.get_pixel(0, 0).0, WHITE);
        assert!(close(c.get_pixel(3, 3).0, [255, 0, 0, 255]));
        assert_eq!(c.get_pixel(5, 5).0, WHITE);
    }

    #[test]
    fn text_draws_dark_pixels_above_baseline() {
        let mut l = list(CanvasSize { width: 40, height: 20 });
        l.push(PaintCommand::Text {
            x: 0,
            baseline: 16,
            text: "H".into(),
            scale: 2,
            style: TextStyle::Bold,
            rgba: TEXT_GREY,
        });
        let c = rasterize(&l, None).unwrap();
        let dark_rows: Vec<u32> = (0..20)
            .filter(|y| (0..40).any(|x| close(c.get_pixel(x, *y).0, TEXT_GREY)))
            .collect();
        assert!(!dark_rows.is_empty());
        assert!(dark_rows.iter().all(|y| *y < 16));
    }

    #[test]
    fn image_command_requires_photo() {
        let mut l = list(CanvasSize { width: 10, height: 10 });
        l.push(PaintCommand::Image {
            rect: Rect { x: 0, y: 0, width: 5, height: 5 },
        });
        assert!(matches!(rasterize(&l, None), Err(Error::RenderError(_))));

        let photo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255])));
        let c = rasterize(&l, Some(&photo)).unwrap();
        assert!(close(c.get_pixel(2, 2).0, [0, 0, 255, 255]));
        assert_eq!(c.get_pixel(8, 8).0, WHITE);
    }

    #[test]
    fn shadow_darkens_below_rect() {
        let mut l = list(CanvasSize { width: 60, height: 60 });
        l.push(PaintCommand::Shadow {
            rect: Rect { x: 20, y: 20, width: 20, height: 20 },
            rgba: crate::rendering::SHADOW,
            blur: 4.0,
            offset: (0, 10),
        });
        let c = rasterize(&l, None).unwrap();
        let under = c.get_pixel(30, 45).0;
        assert!(under[0] < 255);
        assert!(close(c.get_pixel(1, 1).0, WHITE));
    }

    #[test]
    fn encodes_decodable_png() {
        let c = rasterize(&list(CanvasSize { width: 8, height: 4 }), None).unwrap();
        let png = encode_png(&c).unwrap();
        assert_eq!(&png.png_data[1..4], b"PNG");
        let back = image::load_from_memory(&png.png_data).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (8, 4));
    }
}
