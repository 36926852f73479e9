// File: handpilot-core/src/sources/mod.rs

pub mod image_sequence;

pub use image_sequence::ImageSequenceSource;
