use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use super::{
    actuator_status::ActuatorStatus, cpu_percent::CpuPercent, motion_status::MotionStatus,
};

/// Bit pattern stored before the first cpu reading. It is a NaN, which a
/// `CpuPercent` can never hold.
const CPU_NOT_SAMPLED: u32 = u32::MAX;

/// Values derived by the monitors and displayed by the presentation layer.
///
/// Every field has exactly one writer:
/// - `cpu_percent` and `ac_status` belong to the vital-sign monitor.
/// - `motion_status` and `light_status` belong to the motion monitor.
///
/// Fields are independent atomics. Readers never block and may observe a
/// field from a newer pass than its neighbour; there is no multi-field
/// consistency.
#[derive(Debug)]
pub struct ObservableState {
    cpu_percent: AtomicU32,
    motion_status: AtomicU8,
    ac_status: AtomicU8,
    light_status: AtomicU8,
}

/// A copy of the observable state taken field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub cpu_percent: Option<CpuPercent>,
    pub motion_status: MotionStatus,
    pub ac_status: ActuatorStatus,
    pub light_status: ActuatorStatus,
}

impl ObservableState {
    pub fn new() -> Self {
        Self {
            cpu_percent: AtomicU32::new(CPU_NOT_SAMPLED),
            motion_status: AtomicU8::new(MotionStatus::default().into()),
            ac_status: AtomicU8::new(ActuatorStatus::default().into()),
            light_status: AtomicU8::new(ActuatorStatus::default().into()),
        }
    }

    /// `None` until the vital-sign monitor produced its first reading.
    pub fn cpu_percent(&self) -> Option<CpuPercent> {
        let bits = self.cpu_percent.load(Ordering::Relaxed);
        if bits == CPU_NOT_SAMPLED {
            return None;
        }
        CpuPercent::try_from(f32::from_bits(bits)).ok()
    }

    pub fn set_cpu_percent(&self, value: CpuPercent) {
        self.cpu_percent
            .store(value.value().to_bits(), Ordering::Relaxed);
    }

    pub fn motion_status(&self) -> MotionStatus {
        self.motion_status.load(Ordering::Relaxed).into()
    }

    pub fn set_motion_status(&self, value: MotionStatus) {
        self.motion_status.store(value.into(), Ordering::Relaxed);
    }

    pub fn ac_status(&self) -> ActuatorStatus {
        self.ac_status.load(Ordering::Relaxed).into()
    }

    /// Store a new air conditioner status, returning the previous one.
    pub fn set_ac_status(&self, value: ActuatorStatus) -> ActuatorStatus {
        self.ac_status.swap(value.into(), Ordering::Relaxed).into()
    }

    pub fn light_status(&self) -> ActuatorStatus {
        self.light_status.load(Ordering::Relaxed).into()
    }

    /// Store a new room light status, returning the previous one.
    pub fn set_light_status(&self, value: ActuatorStatus) -> ActuatorStatus {
        self.light_status.swap(value.into(), Ordering::Relaxed).into()
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            cpu_percent: self.cpu_percent(),
            motion_status: self.motion_status(),
            ac_status: self.ac_status(),
            light_status: self.light_status(),
        }
    }
}

impl Default for ObservableState {
    fn default() -> Self {
        Self::new()
    }
}
