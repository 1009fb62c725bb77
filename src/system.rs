use std::{fmt::Display, sync::Arc};

use tokio::runtime::Handle;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{debug, warn};

use crate::{
    externals::{
        host_sensors::{services::HostCpuUtilizationService, task::task_poll_vital_signs},
        webcam::source::CaptureSource,
    },
    models::observable_state::ObservableState,
    tasks::motion_monitor::task_monitor_motion,
};

/// Which background monitors were handed to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitors {
    pub vital_signs: bool,
    pub motion: bool,
}

impl Display for Monitors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = |running: bool| if running { "enabled" } else { "disabled" };
        write!(
            f,
            "Vital-sign monitoring {}. Motion monitoring {}.",
            state(self.vital_signs),
            state(self.motion)
        )
    }
}

/// Spawn the vital-sign monitor and, when a video device is available, the
/// motion monitor onto `handle`. Both stop when `token` is cancelled.
#[tracing::instrument(skip_all)]
pub fn spawn_monitors<S>(
    tracker: &TaskTracker,
    handle: &Handle,
    token: &CancellationToken,
    state: &Arc<ObservableState>,
    capture: &CaptureSource,
    cpu_service: S,
) -> Monitors
where
    S: HostCpuUtilizationService + Clone + Send + 'static,
{
    let token_clone = token.clone();
    let state_clone = state.clone();
    tracker.spawn_on(
        async move { task_poll_vital_signs(token_clone, cpu_service, state_clone).await },
        handle,
    );

    let motion = match capture.frame_stream() {
        Some(frames) => {
            let token_clone = token.clone();
            let state_clone = state.clone();
            tracker.spawn_on(
                async move { task_monitor_motion(token_clone, frames, state_clone).await },
                handle,
            );
            true
        }
        None => {
            warn!("Motion monitoring disabled: webcam unavailable.");
            false
        }
    };

    debug!("Spawned {} monitor(s).", tracker.len());

    Monitors {
        vital_signs: true,
        motion,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{
        config::FALLBACK_RESOLUTION,
        externals::{
            host_sensors::services::CpuUtilizationServiceError,
            webcam::source::tests::SyntheticDevice,
        },
        models::{
            actuator_status::ActuatorStatus, cpu_percent::CpuPercent, frame::Resolution,
            motion_status::MotionStatus,
        },
    };

    use super::*;

    #[derive(Clone, Copy)]
    struct FixedCpuService(f32);

    impl HostCpuUtilizationService for FixedCpuService {
        fn sample_cpu_utilization(
            &self,
            _window: Duration,
        ) -> Result<CpuPercent, CpuUtilizationServiceError> {
            CpuPercent::try_from(self.0).map_err(CpuUtilizationServiceError::FailedToParse)
        }
    }

    #[tokio::test]
    async fn test_without_webcam_only_vital_signs_run() {
        let tracker = TaskTracker::new();
        let token = CancellationToken::new();
        let state = Arc::new(ObservableState::new());
        let capture = CaptureSource::unavailable();

        let monitors = spawn_monitors(
            &tracker,
            &Handle::current(),
            &token,
            &state,
            &capture,
            FixedCpuService(55.0),
        );

        assert_eq!(
            monitors,
            Monitors {
                vital_signs: true,
                motion: false
            }
        );
        assert_eq!(
            monitors.to_string(),
            "Vital-sign monitoring enabled. Motion monitoring disabled."
        );
        assert_eq!(capture.resolution(), FALLBACK_RESOLUTION);

        while state.cpu_percent().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(state.ac_status(), ActuatorStatus::On);
        assert_eq!(state.motion_status(), MotionStatus::NoMotion);
        assert_eq!(state.light_status(), ActuatorStatus::Off);

        token.cancel();
        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test]
    async fn test_with_webcam_both_monitors_run() {
        let tracker = TaskTracker::new();
        let token = CancellationToken::new();
        let state = Arc::new(ObservableState::new());
        let capture = CaptureSource::open(|| Ok(SyntheticDevice::new(Resolution::new(64, 48))))
            .expect("Failed to open synthetic device.");

        let monitors = spawn_monitors(
            &tracker,
            &Handle::current(),
            &token,
            &state,
            &capture,
            FixedCpuService(5.0),
        );

        assert!(monitors.motion);
        assert_eq!(
            monitors.to_string(),
            "Vital-sign monitoring enabled. Motion monitoring enabled."
        );
        assert_eq!(capture.resolution(), Resolution::new(64, 48));

        token.cancel();
        tracker.close();
        tracker.wait().await;
        capture.release();
        assert_eq!(state.ac_status(), ActuatorStatus::Off);
    }
}
