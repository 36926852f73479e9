use crate::error::Error;
use crate::models::frame::Frame;

/// Pull source of video frames (camera, stream, file replay...).
pub trait FrameSource: Send {
    /// `Ok(None)` means end of stream. An `Err` is a transient frame error;
    /// callers skip the frame and keep reading.
    fn read_frame(&mut self) -> Result<Option<Frame>, Error>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        (**self).read_frame()
    }
}
