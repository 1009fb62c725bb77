use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{
    contrast::threshold,
    distance_transform::Norm,
    filter::separable_filter_equal,
    map::{map_colors, map_colors2},
    morphology::dilate,
};
use thiserror::Error;
use tracing::trace;

use crate::{
    config::{BINARIZATION_THRESHOLD, BLUR_KERNEL_SIZE, DILATION_ITERATIONS},
    models::{
        frame::{Frame, Resolution},
        motion_status::MotionStatus,
    },
};

use super::regions::{extract_regions, Region};

/// Binomial approximation of a gaussian, the fixed 5-tap kernel used when no
/// sigma is given.
const GAUSSIAN_KERNEL_5: [f32; BLUR_KERNEL_SIZE] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Result of one motion detection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionReport {
    pub status: MotionStatus,
    pub regions: Vec<Region>,
}

impl MotionReport {
    pub fn largest_region(&self) -> Option<&Region> {
        self.regions.iter().max_by_key(|region| region.area)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum MotionError {
    /// Consecutive frames must come from the same device configuration.
    #[error("Frame size changed from {previous} to {current}.")]
    FrameSizeMismatch {
        previous: Resolution,
        current: Resolution,
    },
}

/// Compare two consecutive frames and decide whether something moved.
pub fn detect_motion(previous: &Frame, current: &Frame) -> Result<MotionReport, MotionError> {
    let difference = absolute_difference(previous.image(), current.image())?;
    let smoothed = separable_filter_equal(&intensity(&difference), &GAUSSIAN_KERNEL_5);
    // Strictly above the threshold becomes 255, the rest 0.
    let mask = threshold(&smoothed, BINARIZATION_THRESHOLD);
    // Chebyshev distance k is k passes of a 3x3 square element.
    let dilated = dilate(&mask, Norm::LInf, DILATION_ITERATIONS);
    let regions = extract_regions(&dilated);
    trace!("Extracted {} motion regions.", regions.len());

    let status = if regions.is_empty() {
        MotionStatus::NoMotion
    } else {
        MotionStatus::MotionDetected
    };
    Ok(MotionReport { status, regions })
}

/// Per channel `|previous - current|`.
pub fn absolute_difference(
    previous: &RgbImage,
    current: &RgbImage,
) -> Result<RgbImage, MotionError> {
    if previous.dimensions() != current.dimensions() {
        return Err(MotionError::FrameSizeMismatch {
            previous: Resolution::new(previous.width(), previous.height()),
            current: Resolution::new(current.width(), current.height()),
        });
    }

    Ok(map_colors2(previous, current, |a: Rgb<u8>, b: Rgb<u8>| {
        Rgb([a[0].abs_diff(b[0]), a[1].abs_diff(b[1]), a[2].abs_diff(b[2])])
    }))
}

/// Single channel intensity with BT.601 weights, rounded to nearest.
pub fn intensity(image: &RgbImage) -> GrayImage {
    map_colors(image, |Rgb([r, g, b]): Rgb<u8>| {
        let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        Luma([((weighted + 500) / 1000) as u8])
    })
}
