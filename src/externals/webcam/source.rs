use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc, Arc, Mutex,
    },
    thread::{self, JoinHandle},
};

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{FALLBACK_RESOLUTION, FRAME_RETRY_DELAY, MAX_CONSECUTIVE_FRAME_FAILURES},
    models::frame::{Frame, Resolution},
};

use super::device::{CaptureDevice, CaptureError};

/// Latest frame slot. `None` means the last grab failed or the device stopped.
type FrameSlot = Option<Frame>;

/// The single owner of the video device.
///
/// A dedicated capture thread opens the device, grabs frames as fast as the
/// device delivers them and publishes each one into a watch channel. Readers
/// never talk to the device directly: the presentation layer copies out the
/// latest frame without blocking, the motion monitor subscribes to a stream
/// of new frames.
pub struct CaptureSource {
    resolution: Resolution,
    frames: Option<watch::Receiver<FrameSlot>>,
    running: Arc<AtomicBool>,
    released: AtomicBool,
    device_thread: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureSource {
    /// Open a device on the capture thread and wait for it to report in.
    /// The returned source keeps the resolution the device negotiated for
    /// the rest of the process lifetime.
    pub fn open<D, F>(opener: F) -> Result<Self, CaptureError>
    where
        D: CaptureDevice + 'static,
        F: FnOnce() -> Result<D, CaptureError> + Send + 'static,
    {
        let (tx_ready, rx_ready) = mpsc::channel::<Result<Resolution, CaptureError>>();
        let (tx_frames, rx_frames) = watch::channel::<FrameSlot>(None);
        let running = Arc::new(AtomicBool::new(true));

        let running_clone = running.clone();
        let handle = thread::Builder::new()
            .name("capture-device".into())
            .spawn(move || {
                let mut device = match opener() {
                    Ok(device) => device,
                    Err(e) => {
                        let _ = tx_ready.send(Err(e));
                        return;
                    }
                };
                if tx_ready.send(Ok(device.resolution())).is_err() {
                    warn!("Nobody waited for the capture device. Releasing it.");
                    release_device(&mut device);
                    return;
                }
                run_device(device, tx_frames, running_clone);
            })
            .map_err(|e| CaptureError::Unavailable(e.to_string()))?;

        match rx_ready.recv() {
            Ok(Ok(resolution)) => {
                info!("Capture device opened at {}.", resolution);
                Ok(Self {
                    resolution,
                    frames: Some(rx_frames),
                    running,
                    released: AtomicBool::new(false),
                    device_thread: Mutex::new(Some(handle)),
                })
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::DeviceThreadLost)
            }
        }
    }

    /// A source with no device behind it. Reports the fallback resolution
    /// and never yields a frame.
    pub fn unavailable() -> Self {
        Self {
            resolution: FALLBACK_RESOLUTION,
            frames: None,
            running: Arc::new(AtomicBool::new(false)),
            released: AtomicBool::new(false),
            device_thread: Mutex::new(None),
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Whether a device was opened and has not been released yet.
    pub fn is_available(&self) -> bool {
        self.frames.is_some() && !self.released.load(Ordering::SeqCst)
    }

    /// Copy out the most recent frame. Never blocks on the device.
    pub fn read_frame(&self) -> Option<Frame> {
        if self.released.load(Ordering::SeqCst) {
            return None;
        }
        self.frames.as_ref()?.borrow().clone()
    }

    /// Stream of frames published after this call. Yields `None` for a
    /// failed grab and ends once the device stopped. `None` is returned when
    /// no device is available at all.
    pub fn frame_stream(&self) -> Option<impl Stream<Item = Option<Frame>> + Send + Unpin> {
        if !self.is_available() {
            return None;
        }
        let frames = self.frames.as_ref()?.clone();
        Some(WatchStream::from_changes(frames).boxed())
    }

    /// Stop the capture thread and give the device back. Safe to call more
    /// than once and on a source that never opened a device.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            trace!("Capture source already released.");
            return;
        }
        self.running.store(false, Ordering::SeqCst);

        let handle = match self.device_thread.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            debug!("Waiting for the capture thread to stop.");
            if handle.join().is_err() {
                error!("Capture thread panicked.");
            } else {
                info!("Capture device released.");
            }
        }
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Capture thread body. Publishes frames until asked to stop, every reader
/// is gone or the device keeps failing.
fn run_device<D: CaptureDevice>(
    mut device: D,
    tx_frames: watch::Sender<FrameSlot>,
    running: Arc<AtomicBool>,
) {
    let mut consecutive_failures = 0u32;
    while running.load(Ordering::SeqCst) {
        match device.grab_frame() {
            Ok(frame) => {
                consecutive_failures = 0;
                if tx_frames.send(Some(frame)).is_err() {
                    debug!("No frame readers left.");
                    break;
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                warn!(
                    "Failed to grab frame ({}/{}). Error: {}",
                    consecutive_failures, MAX_CONSECUTIVE_FRAME_FAILURES, e
                );
                let _ = tx_frames.send(None);
                if consecutive_failures >= MAX_CONSECUTIVE_FRAME_FAILURES {
                    error!("Capture device stopped producing frames. Giving up.");
                    break;
                }
                thread::sleep(FRAME_RETRY_DELAY);
            }
        }
    }
    let _ = tx_frames.send(None);
    release_device(&mut device);
}

fn release_device<D: CaptureDevice>(device: &mut D) {
    if let Err(e) = device.release() {
        warn!("Failed to release capture device. Error: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use image::{Rgb, RgbImage};

    use super::*;

    /// Produces solid frames of increasing brightness, optionally failing
    /// forever after `good_frames` grabs.
    pub(crate) struct SyntheticDevice {
        pub resolution: Resolution,
        pub good_frames: Option<u32>,
        pub grabbed: u32,
        pub released: Arc<AtomicBool>,
    }

    impl SyntheticDevice {
        pub(crate) fn new(resolution: Resolution) -> Self {
            Self {
                resolution,
                good_frames: None,
                grabbed: 0,
                released: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl CaptureDevice for SyntheticDevice {
        fn resolution(&self) -> Resolution {
            self.resolution
        }

        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            thread::sleep(Duration::from_millis(1));
            if let Some(good_frames) = self.good_frames {
                if self.grabbed >= good_frames {
                    return Err(CaptureError::FrameRead("synthetic failure".into()));
                }
            }
            self.grabbed += 1;
            let shade = (self.grabbed % 256) as u8;
            Ok(Frame::new(RgbImage::from_pixel(
                self.resolution.width,
                self.resolution.height,
                Rgb([shade, shade, shade]),
            )))
        }

        fn release(&mut self) -> Result<(), CaptureError> {
            self.released.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn wait_for_frame(source: &CaptureSource) -> Option<Frame> {
        for _ in 0..500 {
            if let Some(frame) = source.read_frame() {
                return Some(frame);
            }
            thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn test_failed_open_is_reported() {
        let source = CaptureSource::open(|| -> Result<SyntheticDevice, CaptureError> {
            Err(CaptureError::Unavailable("no camera".into()))
        });
        assert!(matches!(source, Err(CaptureError::Unavailable(_))));
    }

    #[test]
    fn test_unavailable_source() {
        let source = CaptureSource::unavailable();
        assert!(!source.is_available());
        assert_eq!(source.resolution(), Resolution::new(480, 360));
        assert!(source.read_frame().is_none());
        assert!(source.frame_stream().is_none());

        source.release();
        source.release();
    }

    #[test]
    fn test_open_reports_device_resolution() {
        let source = CaptureSource::open(|| Ok(SyntheticDevice::new(Resolution::new(64, 48))))
            .expect("Failed to open synthetic device.");

        assert!(source.is_available());
        assert_eq!(source.resolution(), Resolution::new(64, 48));

        let frame = wait_for_frame(&source).expect("Synthetic device produced no frame.");
        assert_eq!(frame.resolution(), Resolution::new(64, 48));
    }

    #[test]
    fn test_release_is_idempotent_and_releases_device_once() {
        let device = SyntheticDevice::new(Resolution::new(8, 8));
        let released = device.released.clone();
        let source = CaptureSource::open(move || Ok(device)).expect("Failed to open device.");

        source.release();
        assert!(released.load(Ordering::SeqCst));
        assert!(!source.is_available());
        assert!(source.read_frame().is_none());

        source.release();
    }

    #[test]
    fn test_failing_device_clears_latest_frame() {
        let mut device = SyntheticDevice::new(Resolution::new(8, 8));
        device.good_frames = Some(1);
        let released = device.released.clone();
        let source = CaptureSource::open(move || Ok(device)).expect("Failed to open device.");

        for _ in 0..2000 {
            if released.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(released.load(Ordering::SeqCst));
        assert!(source.read_frame().is_none());
    }

    #[tokio::test]
    async fn test_frame_stream_yields_new_frames() {
        let source = CaptureSource::open(|| Ok(SyntheticDevice::new(Resolution::new(8, 8))))
            .expect("Failed to open device.");
        let mut stream = source.frame_stream().expect("Source should be streaming.");

        let first = stream.next().await.flatten().expect("Missing first frame.");
        let second = stream.next().await.flatten().expect("Missing second frame.");
        assert_eq!(first.resolution(), Resolution::new(8, 8));
        assert_ne!(first, second);
    }
}
