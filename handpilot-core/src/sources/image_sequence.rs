// File: handpilot-core/src/sources/image_sequence.rs
//
// Replays still images from a directory as a frame stream. Files are read in
// name order; anything the `image` crate cannot decode surfaces as a
// transient frame error so the worker skips it.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use handpilot_common::models::Frame;
use handpilot_common::traits::FrameSource;
use handpilot_common::Error;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
    looping: bool,
    seq: u64,
}

impl ImageSequenceSource {
    /// Scans `dir` (non-recursively) for image files.
    pub fn open(dir: impl AsRef<Path>, looping: bool) -> Result<Self, Error> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(Error::Config(format!("no image files in {}", dir.display())));
        }
        info!("Replaying {} frame(s) from {} (loop={})", paths.len(), dir.display(), looping);
        Ok(Self::from_paths(paths, looping))
    }

    pub fn from_paths(paths: Vec<PathBuf>, looping: bool) -> Self {
        Self {
            paths,
            cursor: 0,
            looping,
            seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        if self.cursor >= self.paths.len() {
            if !self.looping || self.paths.is_empty() {
                return Ok(None);
            }
            debug!("image sequence wrapped after {} frame(s)", self.seq);
            self.cursor = 0;
        }
        let path = &self.paths[self.cursor];
        self.cursor += 1;
        self.seq += 1;

        let image = image::open(path)
            .map_err(|e| Error::Image(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        Ok(Some(Frame::new(self.seq, image)))
    }
}
