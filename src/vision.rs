// Skin segmentation: RGB frame -> binary skin mask.
// The mask is what the contour tracer sees; 255 = "likely skin", 0 = background.
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use crate::config::SkinSettings;

pub const SKIN: u8 = 255;
pub const BACKGROUND: u8 = 0;

/// One pixel in 8-bit HSV: hue in 0..=179 (degrees / 2), saturation and value in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { diff * 255.0 / max } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    // 360 degrees folds back to 0 after halving and rounding
    let h8 = (h / 2.0).round() as u32 % 180;

    Hsv {
        h: h8 as u8,
        s: s.round().clamp(0.0, 255.0) as u8,
        v: max as u8,
    }
}

impl SkinSettings {
    /// Inclusive range test on every channel.
    #[inline]
    pub fn contains(&self, px: Hsv) -> bool {
        (self.hue.0..=self.hue.1).contains(&px.h)
            && (self.saturation.0..=self.saturation.1).contains(&px.s)
            && (self.value.0..=self.value.1).contains(&px.v)
    }
}

/// Threshold the frame into 255/0 by the HSV range, before any smoothing.
pub fn threshold_hsv(frame: &RgbImage, skin: &SkinSettings) -> GrayImage {
    let (w, h) = frame.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in frame.enumerate_pixels() {
        let hsv = rgb_to_hsv(px[0], px[1], px[2]);
        if skin.contains(hsv) {
            mask.put_pixel(x, y, Luma([SKIN]));
        }
    }
    mask
}

/// Full segmentation: HSV threshold, Gaussian smoothing, then re-binarize above `mask_cutoff`.
/// Same frame in, same mask out.
pub fn skin_mask(frame: &RgbImage, skin: &SkinSettings) -> GrayImage {
    let raw = threshold_hsv(frame, skin);
    if raw.width() == 0 || raw.height() == 0 {
        return raw;
    }

    let mut smoothed = gaussian_blur_f32(&raw, skin.blur_sigma());
    for px in smoothed.pixels_mut() {
        px[0] = if px[0] > skin.mask_cutoff { SKIN } else { BACKGROUND };
    }
    smoothed
}

/// True when no pixel is set.
pub fn is_empty(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p[0] == BACKGROUND)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const SKIN_RGB: Rgb<u8> = Rgb([220, 170, 140]);

    fn frame_with_square(w: u32, h: u32, x0: u32, y0: u32, side: u32) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                img.put_pixel(x, y, SKIN_RGB);
            }
        }
        img
    }

    #[test]
    fn hsv_matches_8bit_convention() {
        assert_eq!(rgb_to_hsv(0, 0, 0), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv(255, 255, 255), Hsv { h: 0, s: 0, v: 255 });
        assert_eq!(rgb_to_hsv(255, 0, 0), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 255, 0), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(0, 0, 255), Hsv { h: 120, s: 255, v: 255 });
        // magenta-ish red wraps near the top of the hue circle
        assert_eq!(rgb_to_hsv(255, 0, 1).h, 0);
        assert_eq!(rgb_to_hsv(255, 0, 128).h, 165);
    }

    #[test]
    fn typical_skin_tone_is_in_range() {
        let hsv = rgb_to_hsv(SKIN_RGB[0], SKIN_RGB[1], SKIN_RGB[2]);
        assert_eq!(hsv.v, 220);
        assert_eq!(hsv.s, 93);
        assert_eq!(hsv.h, 11);
        assert!(SkinSettings::default().contains(hsv));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let skin = SkinSettings::default();
        assert!(skin.contains(Hsv { h: 20, s: 20, v: 70 }));
        assert!(skin.contains(Hsv { h: 0, s: 255, v: 255 }));
        assert!(!skin.contains(Hsv { h: 21, s: 100, v: 100 }));
        assert!(!skin.contains(Hsv { h: 10, s: 19, v: 100 }));
        assert!(!skin.contains(Hsv { h: 10, s: 100, v: 69 }));
    }

    #[test]
    fn blue_frame_gives_empty_mask() {
        let img = RgbImage::from_pixel(32, 24, Rgb([20, 40, 200]));
        let mask = skin_mask(&img, &SkinSettings::default());
        assert_eq!(mask.dimensions(), (32, 24));
        assert!(is_empty(&mask));
    }

    #[test]
    fn zero_sized_frame_gives_zero_sized_mask() {
        let mask = skin_mask(&RgbImage::new(0, 0), &SkinSettings::default());
        assert_eq!(mask.dimensions(), (0, 0));
        assert!(is_empty(&mask));
    }

    #[test]
    fn mask_is_binary_and_covers_the_square() {
        let img = frame_with_square(40, 40, 10, 10, 20);
        let mask = skin_mask(&img, &SkinSettings::default());
        assert!(mask.pixels().all(|p| p[0] == SKIN || p[0] == BACKGROUND));
        assert_eq!(mask.get_pixel(20, 20)[0], SKIN);
        assert_eq!(mask.get_pixel(10, 10)[0], SKIN);
        assert_eq!(mask.get_pixel(0, 0)[0], BACKGROUND);
        assert_eq!(mask.get_pixel(39, 39)[0], BACKGROUND);
    }

    #[test]
    fn mask_is_deterministic() {
        let mut img = frame_with_square(64, 48, 5, 7, 30);
        img.put_pixel(60, 40, SKIN_RGB);
        let skin = SkinSettings::default();
        assert_eq!(skin_mask(&img, &skin), skin_mask(&img, &skin));
    }

    #[test]
    fn higher_cutoff_suppresses_single_pixel_speckle() {
        let mut img = RgbImage::new(21, 21);
        img.put_pixel(10, 10, SKIN_RGB);
        let skin = SkinSettings {
            mask_cutoff: 127,
            ..SkinSettings::default()
        };
        assert!(is_empty(&skin_mask(&img, &skin)));
    }
}
