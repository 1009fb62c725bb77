use std::fmt::Display;

use thiserror::Error;

/// Host cpu utilization in the 0-100% range.
///
/// ```ignore
/// let reading = CpuPercent::try_from(25.5f32).expect("Failed to get cpu percent.");
/// assert_eq!(reading.value(), 25.5f32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CpuPercent {
    value: f32,
}

#[derive(Error, Debug, PartialEq)]
pub enum CpuPercentError {
    /// The reading was negative, above 100% or not a number.
    #[error("Cpu utilization {0} outside of valid state space representation!")]
    OutOfValidStateSpace(f32),
}

impl CpuPercent {
    /// Get the underlying utilization value.
    pub fn value(&self) -> f32 {
        self.value
    }
}

impl TryFrom<f32> for CpuPercent {
    type Error = CpuPercentError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        if !(0f32..=100f32).contains(&value) {
            return Err(CpuPercentError::OutOfValidStateSpace(value));
        }
        Ok(Self { value })
    }
}

impl Display for CpuPercent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.value)
    }
}
