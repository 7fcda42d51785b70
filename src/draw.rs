// Window + software drawing utilities.
// What ends up on screen:
// 1) Left panel: the live camera image, the tracked hand outline and the finger count.
// 2) Right panel: the playfield with the character sprite at the player position.
// 3) A tiny 5x7 bitmap font for the HUD text.

use image::imageops::{self, FilterType};
use imageproc::point::Point;
use minifb::{Key, Window, WindowOptions};

use crate::contour::Contour;
use crate::error::Error;
use crate::gesture::Position;
use crate::sprites::SpriteImage;
use crate::types::FrameBuffer;

pub const OUTLINE_GREEN: u32 = 0x00_00_FF_00;
pub const VALLEY_RED: u32 = 0x00_FF_30_30;
pub const HUD_WHITE: u32 = 0x00_FF_FF_FF;
pub const PANEL_DARK: u32 = 0x00_10_10_10;
pub const PLAYFIELD_BG: u32 = 0x00_20_28_30;

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window of the given size, capped at `fps` updates per second.
    pub fn new(title: &str, width: usize, height: usize, fps: usize) -> Result<Self, Error> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        window.set_target_fps(fps);
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen (also pumps window events).
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down (we exit when this is pressed).
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }
}

/* ---------- Software drawing: pixels, lines, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Fill a `size`×`size` block with its top-left corner at (x,y).
#[inline]
fn put_block(fb: &mut FrameBuffer, x: i32, y: i32, size: i32, color: u32) {
    for dy in 0..size {
        for dx in 0..size {
            put_pixel(fb, x + dx, y + dy, color);
        }
    }
}

/// Draw a line between (x0,y0) and (x1,y1) using Bresenham, `thickness` pixels wide.
pub fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, thickness: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_block(fb, x0, y0, thickness.max(1), color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Draw a contour as a closed outline, mapping contour coordinates by (scale_x, scale_y).
pub fn draw_contour(fb: &mut FrameBuffer, contour: &Contour, scale_x: f32, scale_y: f32, thickness: i32, color: u32) {
    let map = |p: &Point<i32>| ((p.x as f32 * scale_x) as i32, (p.y as f32 * scale_y) as i32);
    let n = contour.points.len();
    match n {
        0 => {}
        1 => {
            let (x, y) = map(&contour.points[0]);
            put_block(fb, x, y, thickness.max(1), color);
        }
        _ => {
            for i in 0..n {
                let (x0, y0) = map(&contour.points[i]);
                let (x1, y1) = map(&contour.points[(i + 1) % n]);
                draw_line(fb, x0, y0, x1, y1, thickness, color);
            }
        }
    }
}

/* ---------- 5x7 bitmap font (uppercase subset for the HUD) ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // "FINGERS", "NO CAMERA", "NO HAND"
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),

        // Punctuation: space, colon, minus
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), each glyph pixel a `scale`×`scale` block,
/// with a one-block black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        for (pass_color, offset) in [(0x00000000, scale), (color, 0)] {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (rowbits & (1 << (4 - rx))) != 0 {
                        let px = x + rx * scale + offset;
                        let py = y + ry as i32 * scale + offset;
                        put_block(fb, px, py, scale, pass_color);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs (6 columns per character incl. spacing).
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, color: u32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch.to_ascii_uppercase(), scale, color);
        x += 6 * scale;
    }
}

/* ---------- Panels ---------- */

/// Camera panel: the frame scaled to `width`×`height`, the hand outline on top, and the
/// debounced finger count in the corner.
pub fn render_camera_panel(
    frame: &image::RgbImage,
    hand: Option<&Contour>,
    valleys: &[Point<i32>],
    fingers: i32,
    width: u32,
    height: u32,
) -> FrameBuffer {
    let mut fb = if frame.dimensions() == (width, height) {
        FrameBuffer::from_rgb(frame)
    } else if frame.width() == 0 || frame.height() == 0 {
        FrameBuffer::filled(width as usize, height as usize, PANEL_DARK)
    } else {
        FrameBuffer::from_rgb(&imageops::resize(frame, width, height, FilterType::Nearest))
    };

    let sx = width as f32 / frame.width().max(1) as f32;
    let sy = height as f32 / frame.height().max(1) as f32;
    if let Some(hand) = hand {
        draw_contour(&mut fb, hand, sx, sy, 2, OUTLINE_GREEN);
    }
    for v in valleys {
        put_block(&mut fb, (v.x as f32 * sx) as i32 - 3, (v.y as f32 * sy) as i32 - 3, 7, VALLEY_RED);
    }
    draw_text_5x7(&mut fb, 20, 20, &format!("FINGERS: {fingers}"), 2, HUD_WHITE);
    fb
}

/// Camera panel before any frame arrived (or after capture died).
pub fn render_camera_placeholder(width: u32, height: u32, message: &str) -> FrameBuffer {
    let mut fb = FrameBuffer::filled(width as usize, height as usize, PANEL_DARK);
    draw_text_5x7(&mut fb, 20, 20, message, 2, HUD_WHITE);
    fb
}

/// Playfield panel: background plus the (already scaled) sprite with its top-left at
/// `pos`. Alpha below 50% is transparent.
pub fn render_playfield(width: u32, height: u32, sprite: &SpriteImage, pos: Position) -> FrameBuffer {
    let mut fb = FrameBuffer::filled(width as usize, height as usize, PLAYFIELD_BG);
    let x0 = pos.x.round() as i32;
    let y0 = pos.y.round() as i32;
    for (dx, dy, px) in sprite.image.enumerate_pixels() {
        if px[3] < 128 {
            continue;
        }
        let color = ((px[0] as u32) << 16) | ((px[1] as u32) << 8) | px[2] as u32;
        put_pixel(&mut fb, x0 + dx as i32, y0 + dy as i32, color);
    }
    fb
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn count(fb: &FrameBuffer, color: u32) -> usize {
        fb.pixels.iter().filter(|&&p| p == color).count()
    }

    #[test]
    fn every_hud_character_has_a_glyph() {
        for ch in "FINGERS: 0123456789 NO CAMERA NO HAND -".chars() {
            assert!(glyph5x7(ch).is_some(), "missing glyph {ch:?}");
        }
    }

    #[test]
    fn text_is_drawn_scaled() {
        let mut fb = FrameBuffer::filled(40, 20, 0x00_11_11_11);
        draw_text_5x7(&mut fb, 0, 0, "1", 2, HUD_WHITE);
        // glyph '1' has 10 lit cells, each a 2x2 block
        assert_eq!(count(&fb, HUD_WHITE), 10 * 4);
    }

    #[test]
    fn lines_clip_at_edges() {
        let mut fb = FrameBuffer::filled(10, 10, 0);
        draw_line(&mut fb, -5, 5, 20, 5, 1, 9);
        assert_eq!(count(&fb, 9), 10);
    }

    #[test]
    fn contour_outline_is_closed() {
        let mut fb = FrameBuffer::filled(20, 20, 0);
        let c = Contour::new(vec![
            Point::new(2, 2),
            Point::new(12, 2),
            Point::new(12, 12),
            Point::new(2, 12),
        ]);
        draw_contour(&mut fb, &c, 1.0, 1.0, 1, OUTLINE_GREEN);
        assert_eq!(count(&fb, OUTLINE_GREEN), 40);
        assert_eq!(fb.pixels[7 * 20 + 2], OUTLINE_GREEN);
        assert_eq!(fb.pixels[7 * 20 + 7], 0);
    }

    #[test]
    fn camera_panel_scales_frame_and_outline() {
        let frame = RgbImage::from_pixel(100, 50, Rgb([0, 0, 255]));
        let hand = Contour::new(vec![
            Point::new(10, 10),
            Point::new(40, 10),
            Point::new(40, 40),
            Point::new(10, 40),
        ]);
        let valleys = [Point::new(25, 40)];
        let fb = render_camera_panel(&frame, Some(&hand), &valleys, 3, 200, 100);
        assert_eq!((fb.width, fb.height), (200, 100));
        assert_eq!(fb.pixels[99 * 200 + 199], 0x00_00_00_FF);
        // the right edge of the hand lands at x = 80 after 2x scaling
        assert_eq!(fb.pixels[50 * 200 + 80], OUTLINE_GREEN);
        assert!(count(&fb, HUD_WHITE) > 0);
        // valley marker centred on (50, 80) after scaling
        assert_eq!(fb.pixels[80 * 200 + 50], VALLEY_RED);
        assert_eq!(count(&fb, VALLEY_RED), 49);
    }

    #[test]
    fn playfield_places_sprite_with_alpha_test() {
        let mut img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        for y in 5..10 {
            for x in 5..10 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 0]));
            }
        }
        let sprite = SpriteImage { image: img };
        let fb = render_playfield(50, 40, &sprite, Position { x: 5.0, y: 3.0 });
        assert_eq!(fb.pixels[3 * 50 + 5], 0x00_FF_00_00);
        assert_eq!(fb.pixels[12 * 50 + 14], PLAYFIELD_BG); // transparent quadrant
        assert_eq!(fb.pixels[0], PLAYFIELD_BG);
        assert_eq!(count(&fb, 0x00_FF_00_00), 75);
    }
}
