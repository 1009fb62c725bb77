use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution as CameraResolution,
    },
    Camera,
};
use tracing::{debug, info};

use crate::models::frame::{Frame, Resolution};

use super::device::{CaptureDevice, CaptureError};

const REQUESTED_FRAME_RATE: u32 = 30;

/// A physical camera driven through nokhwa's native backend.
pub struct NokhwaDevice {
    camera: Camera,
    resolution: Resolution,
}

impl NokhwaDevice {
    /// Open camera `index` asking for the format closest to `requested`.
    /// The device is free to pick something else; the negotiated resolution
    /// is what [`CaptureDevice::resolution`] reports.
    pub fn open(index: u32, requested: Resolution) -> Result<Self, CaptureError> {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                CameraResolution::new(requested.width, requested.height),
                FrameFormat::MJPEG,
                REQUESTED_FRAME_RATE,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(index), format)
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        let negotiated = camera.resolution();
        let resolution = Resolution::new(negotiated.width(), negotiated.height());
        info!(
            "Opened camera {} ({}) at {}.",
            index,
            camera.info().human_name(),
            resolution
        );

        Ok(Self { camera, resolution })
    }
}

impl CaptureDevice for NokhwaDevice {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::FrameRead(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        let image = RgbImage::from_raw(width, height, decoded.into_raw()).ok_or_else(|| {
            CaptureError::FrameRead(format!("decoded buffer does not hold {width}x{height} pixels"))
        })?;
        Ok(image.into())
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        debug!("Stopping camera stream.");
        self.camera
            .stop_stream()
            .map_err(|e| CaptureError::Unavailable(e.to_string()))
    }
}
