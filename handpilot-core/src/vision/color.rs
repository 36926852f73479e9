// File: handpilot-core/src/vision/color.rs
//
// RGB -> HSV in the 8-bit convention used by common vision toolkits:
// H in [0, 180), S and V in [0, 255].

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv(pixel: Rgb<u8>) -> Hsv {
    let [r, g, b] = pixel.0;
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { (255 * diff + v / 2) / v };

    let h = if diff == 0 {
        0.0
    } else {
        let diff = diff as f32;
        let mut deg = if v == r {
            60.0 * (g - b) as f32 / diff
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff
        };
        if deg < 0.0 {
            deg += 360.0;
        }
        deg
    };

    let mut h = (h / 2.0).round() as i32;
    if h >= 180 {
        h -= 180;
    }

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

/// Inclusive HSV bounds for skin segmentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SkinRange {
    pub hue: (u8, u8),
    pub saturation: (u8, u8),
    pub value: (u8, u8),
}

impl Default for SkinRange {
    fn default() -> Self {
        Self {
            hue: (0, 20),
            saturation: (30, 150),
            value: (60, 255),
        }
    }
}

impl SkinRange {
    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.hue.0..=self.hue.1).contains(&hsv.h)
            && (self.saturation.0..=self.saturation.1).contains(&hsv.s)
            && (self.value.0..=self.value.1).contains(&hsv.v)
    }
}

/// Binary skin mask: 255 where the pixel falls inside `range`, 0 elsewhere.
pub fn skin_mask(image: &RgbImage, range: &SkinRange) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        if range.contains(rgb_to_hsv(*image.get_pixel(x, y))) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(Rgb([0, 255, 0])), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 255])), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn test_greys_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 0])), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv(Rgb([128, 128, 128])), Hsv { h: 0, s: 0, v: 128 });
    }

    #[test]
    fn test_skin_tone_is_inside_default_range() {
        let range = SkinRange::default();
        let hsv = rgb_to_hsv(Rgb([200, 150, 120]));
        assert_eq!(hsv.v, 200);
        assert!(hsv.h <= 20, "hue was {}", hsv.h);
        assert!(range.contains(hsv));

        // saturated red, blue and black are not skin
        assert!(!range.contains(rgb_to_hsv(Rgb([255, 0, 0]))));
        assert!(!range.contains(rgb_to_hsv(Rgb([0, 0, 255]))));
        assert!(!range.contains(rgb_to_hsv(Rgb([0, 0, 0]))));
    }

    #[test]
    fn test_skin_mask_marks_only_skin_pixels() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(1, 0, Rgb([200, 150, 120]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));
        let mask = skin_mask(&img, &SkinRange::default());
        let values: Vec<u8> = mask.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 255, 0, 0]);
    }
}
