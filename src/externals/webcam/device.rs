use thiserror::Error;

use crate::models::frame::{Frame, Resolution};

/// A video device able to produce frames. Implementations are owned by the
/// capture thread for their whole life, so they don't need to be `Send`
/// themselves; only their opener does.
pub trait CaptureDevice {
    /// Resolution actually negotiated with the device.
    fn resolution(&self) -> Resolution;

    /// Block until the device produced the next frame.
    fn grab_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Stop streaming and hand the device back to the OS.
    fn release(&mut self) -> Result<(), CaptureError>;
}

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The device could not be opened. It might be missing or in use.
    #[error("Capture device unavailable: {0}")]
    Unavailable(String),

    /// The device was open but did not produce a frame.
    #[error("Failed to read frame from capture device: {0}")]
    FrameRead(String),

    /// The crate was built without a capture backend.
    #[error("Built without webcam support.")]
    NotSupported,

    /// The capture thread died before reporting whether the device opened.
    #[error("Capture device thread exited unexpectedly.")]
    DeviceThreadLost,
}
