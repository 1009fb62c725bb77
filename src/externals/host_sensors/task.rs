use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::{
    config::{CPU_SAMPLE_WINDOW, VITAL_SIGN_POLL_INTERVAL},
    controls::ac_status_for,
    models::{
        actuator_status::ActuatorStatus, cpu_percent::CpuPercent,
        observable_state::ObservableState,
    },
};

use super::services::{CpuUtilizationServiceError, HostCpuUtilizationService};

/// Task: Vital-sign monitor. Periodically samples host cpu utilization and
/// drives the air conditioner from it.
/// A failed sample ends the task, leaving the last reading on display.
/// Can be cancelled.
#[tracing::instrument(skip_all)]
pub async fn task_poll_vital_signs<S>(
    token: CancellationToken,
    service: S,
    state: Arc<ObservableState>,
) where
    S: HostCpuUtilizationService + Clone + Send + 'static,
{
    info!("Started.");
    loop {
        let sample = tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            sample = sample_cpu_utilization(service.clone()) => sample,
        };

        match sample {
            Ok(reading) => {
                apply_cpu_reading(reading, &state);
            }
            Err(e) => {
                error!("Failed to sample cpu utilization. Stopping. Error: {}", e);
                break;
            }
        }

        tokio::select! {
            _ = token.cancelled() => {
                warn!("Cancelled.");
                break;
            },
            _ = tokio::time::sleep(VITAL_SIGN_POLL_INTERVAL) => {}
        };
    }
}

/// Run the blocking sampler off the async workers.
async fn sample_cpu_utilization<S>(service: S) -> Result<CpuPercent, CpuUtilizationServiceError>
where
    S: HostCpuUtilizationService + Send + 'static,
{
    match tokio::task::spawn_blocking(move || service.sample_cpu_utilization(CPU_SAMPLE_WINDOW))
        .await
    {
        Ok(result) => result,
        Err(e) => Err(CpuUtilizationServiceError::Interrupted(e.to_string())),
    }
}

/// Publish a reading and the air conditioner decision derived from it.
/// Returns the new air conditioner status.
pub fn apply_cpu_reading(reading: CpuPercent, state: &ObservableState) -> ActuatorStatus {
    trace!("Applying cpu reading.");
    state.set_cpu_percent(reading);

    let ac_status = ac_status_for(reading);
    let previous = state.set_ac_status(ac_status);
    if previous != ac_status {
        info!("Air conditioner switched {} at {} cpu.", ac_status, reading);
    } else {
        debug!("Cpu at {}. Air conditioner stays {}.", reading, ac_status);
    }
    ac_status
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        io,
        sync::Mutex,
        time::Duration,
    };

    use super::*;

    /// Replays a fixed list of readings, then fails. Records the air
    /// conditioner status visible at the start of every sample after the
    /// first, which is the status derived from the previous reading.
    #[derive(Clone)]
    struct ScriptedCpuService {
        readings: Arc<Mutex<VecDeque<f32>>>,
        observed: Arc<Mutex<Vec<ActuatorStatus>>>,
        samples_taken: Arc<Mutex<usize>>,
        state: Arc<ObservableState>,
    }

    impl ScriptedCpuService {
        fn new(readings: Vec<f32>, state: Arc<ObservableState>) -> Self {
            Self {
                readings: Arc::new(Mutex::new(readings.into())),
                observed: Arc::new(Mutex::new(vec![])),
                samples_taken: Arc::new(Mutex::new(0)),
                state,
            }
        }

        fn observed(&self) -> Vec<ActuatorStatus> {
            self.observed.lock().unwrap().clone()
        }
    }

    impl HostCpuUtilizationService for ScriptedCpuService {
        fn sample_cpu_utilization(
            &self,
            _window: Duration,
        ) -> Result<CpuPercent, CpuUtilizationServiceError> {
            let mut samples_taken = self.samples_taken.lock().unwrap();
            if *samples_taken > 0 {
                self.observed.lock().unwrap().push(self.state.ac_status());
            }
            *samples_taken += 1;

            match self.readings.lock().unwrap().pop_front() {
                Some(raw) => {
                    CpuPercent::try_from(raw).map_err(CpuUtilizationServiceError::FailedToParse)
                }
                None => Err(CpuUtilizationServiceError::FailedToRead(io::Error::new(
                    io::ErrorKind::Other,
                    "script exhausted",
                ))),
            }
        }
    }

    fn percent(value: f32) -> CpuPercent {
        CpuPercent::try_from(value).expect("Failed to get cpu percent.")
    }

    #[test]
    fn test_apply_cpu_reading_sequence() {
        let state = ObservableState::new();
        let statuses: Vec<ActuatorStatus> = [5f32, 10f32, 25f32, 15f32]
            .into_iter()
            .map(|raw| apply_cpu_reading(percent(raw), &state))
            .collect();

        assert_eq!(
            statuses,
            vec![
                ActuatorStatus::Off,
                ActuatorStatus::Off,
                ActuatorStatus::On,
                ActuatorStatus::Off
            ]
        );
        assert_eq!(state.cpu_percent(), Some(percent(15f32)));
    }

    #[test]
    fn test_apply_cpu_reading_boundary() {
        let state = ObservableState::new();
        assert_eq!(apply_cpu_reading(percent(20f32), &state), ActuatorStatus::Off);
        assert_eq!(state.ac_status(), ActuatorStatus::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_drives_ac_from_reading_stream() {
        let state = Arc::new(ObservableState::new());
        let service = ScriptedCpuService::new(vec![5f32, 10f32, 25f32, 15f32], state.clone());
        let started = tokio::time::Instant::now();

        task_poll_vital_signs(CancellationToken::new(), service.clone(), state.clone()).await;

        assert_eq!(
            service.observed(),
            vec![
                ActuatorStatus::Off,
                ActuatorStatus::Off,
                ActuatorStatus::On,
                ActuatorStatus::Off
            ]
        );
        // One pause after each of the four successful readings.
        assert!(started.elapsed() >= VITAL_SIGN_POLL_INTERVAL * 4);
        // The failed fifth sample leaves the last reading frozen.
        assert_eq!(state.cpu_percent(), Some(percent(15f32)));
        assert_eq!(state.ac_status(), ActuatorStatus::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_stops_when_cancelled() {
        let state = Arc::new(ObservableState::new());
        let service = ScriptedCpuService::new(vec![50f32; 100], state.clone());
        let token = CancellationToken::new();
        token.cancel();

        task_poll_vital_signs(token, service, state.clone()).await;

        assert_eq!(state.cpu_percent(), None);
        assert_eq!(state.ac_status(), ActuatorStatus::Off);
    }
}
