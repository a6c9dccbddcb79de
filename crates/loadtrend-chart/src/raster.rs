//! Minimal drawing primitives over an RGB pixel buffer.
//!
//! Text uses the 8x8 bitmap font from `font8x8`; characters outside ASCII are
//! drawn as `?`.

use font8x8::legacy::BASIC_LEGACY;
use image::{Rgb as Pixel, RgbImage};
use loadtrend_core::Rgb;

/// Width and height of one glyph, in pixels.
pub const GLYPH_SIZE: u32 = 8;

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const BLACK: Rgb = Rgb::new(0, 0, 0);
pub const GRID: Rgb = Rgb::new(220, 220, 220);
pub const AXIS: Rgb = Rgb::new(128, 128, 128);

fn pixel(color: Rgb) -> Pixel<u8> {
    Pixel([color.r, color.g, color.b])
}

fn glyph(c: char) -> [u8; 8] {
    let code = if c.is_ascii() { c as usize } else { '?' as usize };
    BASIC_LEGACY[code]
}

/// Width in pixels of `text` drawn at `scale`.
#[must_use]
pub fn text_width(text: &str, scale: u32) -> u32 {
    let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    chars.saturating_mul(GLYPH_SIZE * scale)
}

/// Drawing surface. Coordinates outside the image are clipped.
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgb) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, pixel(background)),
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 {
            return;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, pixel(color));
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb) {
        for dy in 0..i64::from(height) {
            for dx in 0..i64::from(width) {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    pub fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, color);
        }
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, color);
        }
    }

    /// Bresenham line between two points, both included.
    pub fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            self.put(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Line two pixels thick.
    pub fn thick_line(&mut self, from: (i64, i64), to: (i64, i64), color: Rgb) {
        self.line(from, to, color);
        self.line((from.0, from.1 + 1), (to.0, to.1 + 1), color);
    }

    /// Square point marker centred on `(x, y)`.
    pub fn marker(&mut self, x: i64, y: i64, color: Rgb) {
        self.fill_rect(x - 2, y - 2, 5, 5, color);
    }

    /// Horizontal text with its top-left corner at `(x, y)`.
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb) {
        let step = i64::from(GLYPH_SIZE * scale);
        for (i, c) in text.chars().enumerate() {
            let origin = x + i as i64 * step;
            self.glyph(c, scale, color, |col, row| (origin + col, y + row));
        }
    }

    /// Horizontal text drawn twice, one pixel apart.
    pub fn bold_text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb) {
        self.text(x, y, text, scale, color);
        self.text(x + 1, y, text, scale, color);
    }

    /// Text rotated 90° counter-clockwise, reading bottom to top, with the
    /// first character's baseline-left corner at `(x, y)`.
    pub fn text_up(&mut self, x: i64, y: i64, text: &str, color: Rgb) {
        let step = i64::from(GLYPH_SIZE);
        for (i, c) in text.chars().enumerate() {
            let origin = y - i as i64 * step;
            self.glyph(c, 1, color, |col, row| (x + row, origin - col));
        }
    }

    fn glyph(&mut self, c: char, scale: u32, color: Rgb, at: impl Fn(i64, i64) -> (i64, i64)) {
        let scale = i64::from(scale.max(1));
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..8i64 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let (px, py) = at(col * scale + sx, row as i64 * scale + sy);
                        self.put(px, py, color);
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(canvas: &Canvas, x: u32, y: u32) -> Rgb {
        let Pixel([r, g, b]) = *canvas.image.get_pixel(x, y);
        Rgb::new(r, g, b)
    }

    fn count(canvas: &Canvas, color: Rgb) -> usize {
        canvas
            .image
            .pixels()
            .filter(|p| **p == pixel(color))
            .count()
    }

    #[test]
    fn test_clipping() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.put(-1, 0, BLACK);
        canvas.put(0, 4, BLACK);
        canvas.fill_rect(2, 2, 10, 10, BLACK);
        assert_eq!(count(&canvas, BLACK), 4);
    }

    #[test]
    fn test_line_endpoints_and_length() {
        let mut canvas = Canvas::new(20, 20, WHITE);
        canvas.line((1, 1), (10, 5), BLACK);
        assert_eq!(at(&canvas, 1, 1), BLACK);
        assert_eq!(at(&canvas, 10, 5), BLACK);
        assert_eq!(count(&canvas, BLACK), 10);
    }

    #[test]
    fn test_text_draws_inside_its_box() {
        let mut canvas = Canvas::new(40, 10, WHITE);
        canvas.text(0, 0, "#1", 1, BLACK);
        assert!(count(&canvas, BLACK) > 0);
        for y in 0..10 {
            for x in 16..40 {
                assert_eq!(at(&canvas, x, y), WHITE);
            }
        }
    }

    #[test]
    fn test_rotated_text_extends_upwards() {
        let mut canvas = Canvas::new(10, 40, WHITE);
        canvas.text_up(0, 39, "##", BLACK);
        assert!(count(&canvas, BLACK) > 0);
        for y in 0..23 {
            for x in 0..10 {
                assert_eq!(at(&canvas, x, y), WHITE);
            }
        }
    }

    #[test]
    fn test_non_ascii_falls_back() {
        let mut plain = Canvas::new(8, 8, WHITE);
        plain.text(0, 0, "?", 1, BLACK);
        let mut accented = Canvas::new(8, 8, WHITE);
        accented.text(0, 0, "é", 1, BLACK);
        assert_eq!(plain.into_image(), accented.into_image());
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("Error Rate", 1), 80);
        assert_eq!(text_width("ab", 2), 32);
    }
}
