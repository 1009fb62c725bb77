//! Frame-differencing motion detection.
//!
//! Two consecutive frames go through a fixed chain of image operations:
//! absolute difference, intensity, 5x5 gaussian smoothing, binarization,
//! dilation and finally connected region extraction. Any surviving region
//! counts as motion.

pub mod pipeline;
pub mod regions;
