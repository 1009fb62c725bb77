use std::sync::Arc;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    externals::webcam::source::CaptureSource,
    models::{
        frame::{Frame, Resolution},
        observable_state::{ObservableState, StateSnapshot},
    },
};

use super::log_buffer::LogBuffer;

/// Everything the presentation layer shows on one refresh.
pub struct App {
    state: Arc<ObservableState>,
    capture: Arc<CaptureSource>,
    logs: LogBuffer,
    pub snapshot: StateSnapshot,
    pub frame: Option<Frame>,
    pub should_quit: bool,
}

impl App {
    pub fn new(state: Arc<ObservableState>, capture: Arc<CaptureSource>, logs: LogBuffer) -> Self {
        let snapshot = state.snapshot();
        Self {
            state,
            capture,
            logs,
            snapshot,
            frame: None,
            should_quit: false,
        }
    }

    /// Copy out the latest frame and monitor values. Never blocks on the
    /// device or the monitors.
    pub fn refresh(&mut self) {
        self.frame = self.capture.read_frame();
        self.snapshot = self.state.snapshot();
    }

    /// Size of the video canvas, fixed once the device has been opened.
    pub fn canvas(&self) -> Resolution {
        self.capture.resolution()
    }

    pub fn recent_logs(&self, count: usize) -> Vec<String> {
        self.logs.recent(count)
    }

    /// `q`, `Esc` and `Ctrl-C` close the window.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true
            }
            _ => {}
        }
    }
}
