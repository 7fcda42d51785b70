// Display-side pixel buffer shared by the drawing code.

#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the buffer is on screen (pixels)
    pub height: usize,     // how tall the buffer is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// A buffer filled with one color.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Pack an RGB image as 0x00RRGGBB pixels.
    pub fn from_rgb(img: &image::RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for pixel in img.pixels() {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            out.push((r << 16) | (g << 8) | b);
        }
        Self {
            width: w as usize,
            height: h as usize,
            pixels: out,
        }
    }

    /// Copy `src` into this buffer with its top-left corner at (x0, y0), clipping at the edges.
    pub fn blit(&mut self, src: &FrameBuffer, x0: usize, y0: usize) {
        for sy in 0..src.height {
            let dy = y0 + sy;
            if dy >= self.height {
                break;
            }
            let n = src.width.min(self.width.saturating_sub(x0));
            if n == 0 {
                return;
            }
            let s = sy * src.width;
            let d = dy * self.width + x0;
            self.pixels[d..d + n].copy_from_slice(&src.pixels[s..s + n]);
        }
    }
}
