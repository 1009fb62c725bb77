pub mod device;
#[cfg(feature = "webcam")]
pub mod nokhwa_device;
pub mod source;

use tracing::debug;

use crate::config::{CAMERA_INDEX, REQUESTED_RESOLUTION};

use self::{device::CaptureError, source::CaptureSource};

/// Open the default camera at the requested resolution.
/// Without the `webcam` feature there is no backend and this always fails.
pub fn open_default_camera() -> Result<CaptureSource, CaptureError> {
    debug!(
        "Requesting camera {} at {}.",
        CAMERA_INDEX, REQUESTED_RESOLUTION
    );

    #[cfg(feature = "webcam")]
    {
        CaptureSource::open(|| {
            nokhwa_device::NokhwaDevice::open(CAMERA_INDEX, REQUESTED_RESOLUTION)
        })
    }

    #[cfg(not(feature = "webcam"))]
    {
        Err(CaptureError::NotSupported)
    }
}
