use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::MOTION_POLL_INTERVAL,
    controls::light_status_for,
    models::{frame::Frame, observable_state::ObservableState},
    motion::pipeline::{detect_motion, MotionError, MotionReport},
};

/// Outcome of pulling one frame off the capture stream.
enum FrameRead {
    Frame(Frame),
    Failed,
    Cancelled,
}

/// Task: Motion monitor. Compares consecutive frames every half second and
/// drives the room light from the result.
/// Does not start when the first two frames can't be read, and ends on the
/// first failed read after that. Can be cancelled.
#[tracing::instrument(skip_all)]
pub async fn task_monitor_motion<S>(
    token: CancellationToken,
    mut frames: S,
    state: Arc<ObservableState>,
) where
    S: Stream<Item = Option<Frame>> + Unpin,
{
    info!("Started.");

    let mut previous = match read_frame(&token, &mut frames).await {
        FrameRead::Frame(frame) => frame,
        FrameRead::Failed => {
            warn!("Failed to read the first frame. Motion monitoring disabled.");
            return;
        }
        FrameRead::Cancelled => {
            warn!("Cancelled.");
            return;
        }
    };
    let mut current = match read_frame(&token, &mut frames).await {
        FrameRead::Frame(frame) => frame,
        FrameRead::Failed => {
            warn!("Failed to read the second frame. Motion monitoring disabled.");
            return;
        }
        FrameRead::Cancelled => {
            warn!("Cancelled.");
            return;
        }
    };

    loop {
        let (report, latest) = match run_detection(previous, current).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Motion detection pass did not complete. Stopping. Error: {}", e);
                break;
            }
        };
        match report {
            Ok(report) => apply_motion_report(&report, &state),
            Err(e) => {
                error!("Failed to compare frames. Stopping. Error: {}", e);
                break;
            }
        }

        previous = latest;
        current = match read_frame(&token, &mut frames).await {
            FrameRead::Frame(frame) => frame,
            FrameRead::Failed => {
                error!("Failed to read frame. Motion monitoring stopped.");
                break;
            }
            FrameRead::Cancelled => {
                warn!("Cancelled.");
                break;
            }
        };

        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            _ = tokio::time::sleep(MOTION_POLL_INTERVAL) => {}
        };
    }
}

async fn read_frame<S>(token: &CancellationToken, frames: &mut S) -> FrameRead
where
    S: Stream<Item = Option<Frame>> + Unpin,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => FrameRead::Cancelled,
        frame = frames.next() => match frame.flatten() {
            Some(frame) => FrameRead::Frame(frame),
            None => FrameRead::Failed,
        },
    }
}

/// Run the image pipeline off the async workers. Hands `current` back so it
/// can become the previous frame of the next pass.
async fn run_detection(
    previous: Frame,
    current: Frame,
) -> Result<(Result<MotionReport, MotionError>, Frame), tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || {
        let report = detect_motion(&previous, &current);
        (report, current)
    })
    .await
}

/// Publish the motion decision and the light status derived from it.
pub fn apply_motion_report(report: &MotionReport, state: &ObservableState) {
    trace!("Applying motion report.");
    state.set_motion_status(report.status);

    let light_status = light_status_for(report.status);
    let previous = state.set_light_status(light_status);
    if previous != light_status {
        info!("{}. Room light switched {}.", report.status, light_status);
    }
    if let Some(region) = report.largest_region() {
        debug!(
            "{} motion regions, largest {}x{} at ({}, {}) covering {} pixels with {} holes.",
            report.regions.len(),
            region.width,
            region.height,
            region.x,
            region.y,
            region.area,
            region.holes
        );
    }
}
