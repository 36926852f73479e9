//! handpilot-core/src/vision/mod.rs
//!
//! Heuristic hand-pose classifier:
//! skin-color segmentation -> largest external contour -> convex hull ->
//! convexity defects -> count of "finger valleys" -> `Gesture`.
//!
//! The classifier is stateless; every intermediate image is owned by the
//! call that created it and dropped before the call returns.

pub mod color;
pub mod geometry;

use std::f64::consts::FRAC_PI_2;

use image::{GrayImage, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::filter::separable_filter_equal;
use imageproc::geometry::contour_area;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::trace;

use handpilot_common::models::{Frame, Gesture};

pub use color::{rgb_to_hsv, skin_mask, Hsv, SkinRange};
pub use geometry::{convex_hull_indices, convexity_defects, valley_angle, Defect};

/// 5-tap Gaussian, `[1, 4, 6, 4, 1] / 16`.
const GAUSSIAN_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub skin: SkinRange,
    /// Smallest contour area (pixels at the working resolution) that can be a hand.
    pub min_area: f64,
    /// Blurred mask values above this become foreground.
    pub blur_threshold: u8,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            skin: SkinRange::default(),
            min_area: 2000.0,
            blur_threshold: 127,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies one frame, consuming it.
    pub fn classify(&self, frame: Frame) -> Gesture {
        if frame.is_empty() {
            trace!("frame {} is empty", frame.seq);
            return Gesture::None;
        }
        let gesture = self.classify_image(frame.image());
        trace!("frame {} => {}", frame.seq, gesture);
        gesture
    }

    pub fn classify_image(&self, image: &RgbImage) -> Gesture {
        if image.width() == 0 || image.height() == 0 {
            return Gesture::None;
        }
        let mask = skin_mask(image, &self.config.skin);
        self.classify_mask(&mask)
    }

    /// Runs everything after color segmentation on a binary mask
    /// (non-zero = skin).
    pub fn classify_mask(&self, mask: &GrayImage) -> Gesture {
        if mask.width() == 0 || mask.height() == 0 {
            return Gesture::None;
        }
        let binary = self.smooth(mask);

        let Some((points, area)) = largest_external_contour(&binary) else {
            return Gesture::None;
        };
        if area < self.config.min_area {
            trace!("largest contour too small: area={:.0}", area);
            return Gesture::None;
        }

        match count_valleys(&points) {
            Some(valleys) => Gesture::from_finger_valleys(valleys),
            None => Gesture::None,
        }
    }

    /// Gaussian 5x5 then hard threshold, to knock out speckle.
    fn smooth(&self, mask: &GrayImage) -> GrayImage {
        let mut blurred: GrayImage = separable_filter_equal(mask, &GAUSSIAN_5);
        let threshold = self.config.blur_threshold;
        for p in blurred.pixels_mut() {
            p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
        }
        blurred
    }
}

/// Outer borders with no parent, i.e. contours not nested inside a hole.
fn largest_external_contour(binary: &GrayImage) -> Option<(Vec<Point<i32>>, f64)> {
    let contours: Vec<Contour<i32>> = find_contours(binary);
    contours
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| {
            let area = contour_area(&c.points);
            (c.points, area)
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// Number of convexity defects whose valley angle is at most 90 degrees.
/// `None` when the hull is too small for defect analysis.
pub fn count_valleys(points: &[Point<i32>]) -> Option<usize> {
    let hull = convex_hull_indices(points);
    if hull.len() <= 3 {
        trace!("hull has only {} points", hull.len());
        return None;
    }
    let valleys = convexity_defects(points, &hull)
        .into_iter()
        .filter(|d| {
            valley_angle(points[d.start], points[d.end], points[d.far])
                .is_some_and(|angle| angle <= FRAC_PI_2)
        })
        .count();
    Some(valleys)
}
