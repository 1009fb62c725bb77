pub mod host_sensors;
pub mod webcam;
