//! Layout primitives for the postcard canvas

use super::CanvasSize;

/// Width and height of one glyph of the built-in bitmap font at scale 1.
pub const GLYPH_SIZE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn offset(self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && y >= self.y
            && x < self.x + self.width as i32
            && y < self.y + self.height as i32
    }
}

/// Scale a `src_width`×`src_height` image to fit within `fraction` of the
/// canvas in both dimensions, keeping its aspect ratio, and center it.
///
/// Width is tried first; if the resulting height is too tall the image is
/// height-bound instead. Returns `None` for empty sources.
pub fn fit_centered(src_width: u32, src_height: u32, canvas: CanvasSize, fraction: f64) -> Option<Rect> {
    if src_width == 0 || src_height == 0 {
        return None;
    }
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let aspect = f64::from(src_width) / f64::from(src_height);

    let mut draw_w = cw * fraction;
    let mut draw_h = draw_w / aspect;
    if draw_h > ch * fraction {
        draw_h = ch * fraction;
        draw_w = draw_h * aspect;
    }

    let x = (cw - draw_w) / 2.0;
    let y = (ch - draw_h) / 2.0;
    Some(Rect {
        x: x.round() as i32,
        y: y.round() as i32,
        width: (draw_w.round() as u32).max(1),
        height: (draw_h.round() as u32).max(1),
    })
}

/// Pixel width of `text` at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Largest scale ≤ `preferred` at which `text` fits in `max_width`, never below 1.
pub fn fit_text_scale(text: &str, preferred: u32, max_width: u32) -> u32 {
    let mut scale = preferred.max(1);
    while scale > 1 && text_width(text, scale) > max_width {
        scale -= 1;
    }
    scale
}

/// Left x that centers `text` horizontally on the canvas.
pub fn centered_text_x(text: &str, scale: u32, canvas: CanvasSize) -> i32 {
    (canvas.width as i32 - text_width(text, scale) as i32) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_image_is_width_bound() {
        let r = fit_centered(1000, 500, CanvasSize::default(), 0.7).unwrap();
        assert_eq!(r, Rect { x: 90, y: 95, width: 420, height: 210 });
    }

    #[test]
    fn portrait_image_is_height_bound() {
        let r = fit_centered(300, 600, CanvasSize::default(), 0.7).unwrap();
        assert_eq!(r, Rect { x: 230, y: 60, width: 140, height: 280 });
    }

    #[test]
    fn empty_source_has_no_placement() {
        assert!(fit_centered(0, 10, CanvasSize::default(), 0.7).is_none());
    }

    #[test]
    fn text_scale_shrinks_to_fit() {
        assert_eq!(fit_text_scale("Oak", 3, 600), 3);
        let long = "x".repeat(40);
        // 40 glyphs: 960px at 3, 640px at 2, 320px at 1
        assert_eq!(fit_text_scale(&long, 3, 600), 1);
        assert_eq!(centered_text_x("ab", 2, CanvasSize::default()), 284);
    }
}
