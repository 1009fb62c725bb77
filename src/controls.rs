use crate::{
    config::AC_ACTIVATION_THRESHOLD_PERCENT,
    models::{actuator_status::ActuatorStatus, cpu_percent::CpuPercent, motion_status::MotionStatus},
};

/// The air conditioner runs only while cpu utilization is strictly above
/// the activation threshold.
pub fn ac_status_for(cpu_percent: CpuPercent) -> ActuatorStatus {
    (cpu_percent.value() > AC_ACTIVATION_THRESHOLD_PERCENT).into()
}

/// The room light follows the motion sensor.
pub fn light_status_for(motion_status: MotionStatus) -> ActuatorStatus {
    motion_status.is_detected().into()
}
