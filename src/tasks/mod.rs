pub mod motion_monitor;
