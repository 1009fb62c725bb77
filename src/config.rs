//! Fixed tunables for the simulation. Nothing here is configurable at
//! runtime.

use std::time::Duration;

use crate::models::frame::Resolution;

/// Resolution requested from the capture device when opening it.
pub const REQUESTED_RESOLUTION: Resolution = Resolution::new(1920, 1080);

/// Canvas size used when no capture device could be opened.
pub const FALLBACK_RESOLUTION: Resolution = Resolution::new(480, 360);

/// Window over which a single cpu utilization reading is averaged.
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// Pause between two cpu utilization readings.
pub const VITAL_SIGN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The air conditioner runs when cpu utilization is strictly above this.
pub const AC_ACTIVATION_THRESHOLD_PERCENT: f32 = 20.0;

/// Pause between two motion detection passes.
pub const MOTION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Side of the square gaussian kernel used to smooth the difference image.
pub const BLUR_KERNEL_SIZE: usize = 5;

/// Smoothed intensities strictly above this are considered changed.
pub const BINARIZATION_THRESHOLD: u8 = 20;

/// Number of 3x3 dilation passes applied to the binary mask.
pub const DILATION_ITERATIONS: u8 = 3;

/// Refresh period of the presentation layer.
pub const UI_REFRESH_INTERVAL: Duration = Duration::from_millis(30);

/// Number of log lines retained for the diagnostics panel.
pub const LOG_BUFFER_CAPACITY: usize = 200;

/// Consecutive failed grabs after which the capture device is given up.
pub const MAX_CONSECUTIVE_FRAME_FAILURES: u32 = 30;

/// Pause before retrying a failed grab.
pub const FRAME_RETRY_DELAY: Duration = Duration::from_millis(30);

/// Index of the camera opened at startup.
pub const CAMERA_INDEX: u32 = 0;
