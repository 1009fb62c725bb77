use std::{io, thread, time::Duration};

use systemstat::{Platform, System};
use thiserror::Error;

use crate::models::cpu_percent::{CpuPercent, CpuPercentError};

/// This service allows separation of the external logic of measuring host
/// cpu utilization from the monitor loop which makes the loop easier to
/// unit test.
pub trait HostCpuUtilizationService {
    /// Measure the aggregate cpu utilization over `window`. Blocks the
    /// calling thread for the duration of the window.
    fn sample_cpu_utilization(&self, window: Duration)
        -> Result<CpuPercent, CpuUtilizationServiceError>;
}

#[derive(Debug, Clone, Copy)]
pub struct HostCpuUtilizationServiceActual;

#[derive(Error, Debug)]
pub enum CpuUtilizationServiceError {
    /// This occurs if systemstat fails to report the cpu load.
    #[error("Failed to read cpu utilization.")]
    FailedToRead(#[source] io::Error),

    /// This occurs if the raw load doesn't convert into a CpuPercent model.
    #[error("Failed to parse cpu utilization.")]
    FailedToParse(#[source] CpuPercentError),

    /// This occurs if the blocking sampler never reported back.
    #[error("Cpu utilization sampling was interrupted: {0}")]
    Interrupted(String),
}

impl HostCpuUtilizationService for HostCpuUtilizationServiceActual {
    /// Use the systemstat crate to provide platform specific implementations
    /// of the aggregate cpu load. Utilization is the share of the window not
    /// spent idle.
    fn sample_cpu_utilization(
        &self,
        window: Duration,
    ) -> Result<CpuPercent, CpuUtilizationServiceError> {
        let measurement = System::new()
            .cpu_load_aggregate()
            .map_err(CpuUtilizationServiceError::FailedToRead)?;
        thread::sleep(window);
        let load = measurement
            .done()
            .map_err(CpuUtilizationServiceError::FailedToRead)?;

        // Rounding in the platform counters can land a hair outside 0-100.
        let raw = ((1f32 - load.idle) * 100f32).clamp(0f32, 100f32);
        CpuPercent::try_from(raw).map_err(CpuUtilizationServiceError::FailedToParse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actual_service_reads_host_cpu() {
        let service = HostCpuUtilizationServiceActual;
        let reading = service
            .sample_cpu_utilization(Duration::from_millis(50))
            .expect("Failed to sample host cpu utilization.");
        assert!((0f32..=100f32).contains(&reading.value()));
    }
}
