pub mod config;
pub mod controls;
pub mod externals;
pub mod models;
pub mod motion;
pub mod system;
pub mod tasks;
pub mod ui;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{info, level_filters::LevelFilter, warn};

use crate::{
    config::LOG_BUFFER_CAPACITY,
    externals::{
        host_sensors::services::HostCpuUtilizationServiceActual,
        webcam::{open_default_camera, source::CaptureSource},
    },
    models::observable_state::ObservableState,
    system::spawn_monitors,
    ui::{app::App, log_buffer::LogBuffer},
};

fn main() -> Result<()> {
    let logs = LogBuffer::new(LOG_BUFFER_CAPACITY);
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(LevelFilter::DEBUG)
        .with_writer(logs.clone())
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let capture = Arc::new(match open_default_camera() {
        Ok(capture) => capture,
        Err(e) => {
            warn!(
                "Could not open the webcam. Check that it is connected and not in use. Error: {}",
                e
            );
            CaptureSource::unavailable()
        }
    });
    info!("Video resolution: {}.", capture.resolution());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("monitor")
        .build()?;
    let tracker = TaskTracker::new();
    let token = CancellationToken::new();
    let state = Arc::new(ObservableState::new());

    let monitors = spawn_monitors(
        &tracker,
        runtime.handle(),
        &token,
        &state,
        &capture,
        HostCpuUtilizationServiceActual,
    );
    tracker.close();
    info!("{}", monitors);

    let mut app = App::new(state, capture.clone(), logs.clone());
    let result = ui::run(&mut app);

    info!("Window closed. Shutting down.");
    token.cancel();
    capture.release();
    if !tracker.is_empty() {
        info!("Abandoning {} monitor(s) still running.", tracker.len());
    }
    runtime.shutdown_background();

    for line in logs.lines() {
        eprintln!("{line}");
    }

    result
}
