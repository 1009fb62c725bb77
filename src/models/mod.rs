pub mod actuator_status;
pub mod cpu_percent;
pub mod frame;
pub mod motion_status;
pub mod observable_state;
