// File: handpilot-common/src/models/frame.rs

use image::RgbImage;

/// One immutable video frame, 8-bit RGB.
///
/// Frames are moved from the source to the classifier, never shared.
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(seq: u64, image: RgbImage) -> Self {
        Self { seq, image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// A frame with no pixels (the source handed us an empty buffer).
    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}
